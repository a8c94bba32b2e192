use std::collections::HashSet;
use std::fs;
use std::time::Instant;

use chrono::{DateTime, Utc};
#[cfg(feature = "parallel-scan")]
use rayon::prelude::*;
use tokio::sync::mpsc::UnboundedSender;
use walkdir::WalkDir;

use super::catalog::CatalogRoot;
use super::types::{ScanError, ScanProgress, ScanResult, TempFileEntry};

/// Read-only walker over a fixed set of catalog roots.
pub struct Scanner {
    roots: Vec<CatalogRoot>,
}

impl Scanner {
    pub fn new(roots: Vec<CatalogRoot>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[CatalogRoot] {
        &self.roots
    }

    /// Walk every root and collect regular files. Blocking; run it off the
    /// async runtime.
    pub fn scan(&self, progress: Option<&UnboundedSender<ScanProgress>>) -> Result<ScanResult, ScanError> {
        let started = Instant::now();
        let total_roots = self.roots.len();

        let report = |index: usize, root: &CatalogRoot, found: usize| {
            if let Some(tx) = progress {
                let _ = tx.send(ScanProgress {
                    root_index: index,
                    total_roots,
                    category: root.category.clone(),
                    files_found: found,
                });
            }
        };

        #[cfg(feature = "parallel-scan")]
        let per_root: Vec<Option<Vec<TempFileEntry>>> = self
            .roots
            .par_iter()
            .enumerate()
            .map(|(index, root)| {
                let walked = walk_root(root);
                report(index, root, walked.as_ref().map_or(0, Vec::len));
                walked
            })
            .collect();

        #[cfg(not(feature = "parallel-scan"))]
        let per_root: Vec<Option<Vec<TempFileEntry>>> = self
            .roots
            .iter()
            .enumerate()
            .map(|(index, root)| {
                let walked = walk_root(root);
                report(index, root, walked.as_ref().map_or(0, Vec::len));
                walked
            })
            .collect();

        let readable = per_root.iter().filter(|r| r.is_some()).count();
        if readable == 0 {
            return Err(ScanError::NoReadableRoots(total_roots));
        }

        // Overlapping roots: the first root in catalog order keeps the file
        let mut seen = HashSet::new();
        let files: Vec<TempFileEntry> = per_root
            .into_iter()
            .flatten()
            .flatten()
            .filter(|entry| seen.insert(entry.path.clone()))
            .collect();

        let result = ScanResult::from_entries(files);
        log::info!(
            "scan finished: {} files, {} across {}/{} roots in {} ms",
            result.files.len(),
            bytesize::ByteSize::b(result.total_size),
            readable,
            total_roots,
            started.elapsed().as_millis()
        );
        Ok(result)
    }
}

/// `None` when the root is missing or cannot be listed.
fn walk_root(root: &CatalogRoot) -> Option<Vec<TempFileEntry>> {
    if fs::read_dir(&root.path).is_err() {
        log::debug!("skipping unreadable root {}", root.path.display());
        return None;
    }

    let root_path = root.path.to_string_lossy().to_string();
    let mut entries = Vec::new();

    let walker = WalkDir::new(&root.path)
        .max_depth(root.max_depth)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        // Symlinks report their own type here, so they never pass
        if !entry.file_type().is_file() {
            continue;
        }
        // Vanished between listing and stat
        let Ok(metadata) = entry.metadata() else {
            continue;
        };

        let size = metadata.len();
        let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
        if !root.filter.accepts(entry.path(), size, modified) {
            continue;
        }

        entries.push(TempFileEntry {
            path: entry.path().to_string_lossy().to_string(),
            name: entry.file_name().to_string_lossy().to_string(),
            size,
            category: root.category.clone(),
            root_path: root_path.clone(),
        });
    }

    Some(entries)
}
