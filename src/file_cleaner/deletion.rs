use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use super::types::{
    DeleteError, DeleteFailureKind, DeleteItemError, DeletionOutcome, DeletionProgress,
};
use crate::ops::{OperationKind, OperationSlot};

/// Filesystem removal seam.
pub trait Remover: Send + Sync {
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

pub struct FsRemover;

impl Remover for FsRemover {
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }
}

/// Sequential batch deleter. One batch at a time per engine.
pub struct DeletionEngine {
    slot: OperationSlot,
    remover: Arc<dyn Remover>,
    protected: Arc<RwLock<Vec<PathBuf>>>,
}

impl Default for DeletionEngine {
    fn default() -> Self {
        Self::new(Arc::new(FsRemover))
    }
}

impl DeletionEngine {
    pub fn new(remover: Arc<dyn Remover>) -> Self {
        Self {
            slot: OperationSlot::new(OperationKind::FileClean),
            remover,
            protected: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Replace the set of catalog roots that must survive any batch.
    pub fn set_protected_roots<I>(&self, roots: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let resolved: Vec<PathBuf> = roots.into_iter().map(|p| canonical_or_raw(&p)).collect();
        if let Ok(mut protected) = self.protected.write() {
            *protected = resolved;
        }
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    /// Ask the running batch to stop before its next path.
    pub fn cancel(&self) -> bool {
        self.slot.cancel()
    }

    /// Delete `paths` in order, sending one progress event per path.
    ///
    /// The last event always has `current == total`. An empty batch sends
    /// nothing and frees nothing.
    pub async fn delete(
        &self,
        paths: Vec<String>,
        progress: UnboundedSender<DeletionProgress>,
    ) -> Result<DeletionOutcome, DeleteError> {
        if paths.is_empty() {
            return Ok(DeletionOutcome::default());
        }

        let Some(guard) = self.slot.try_begin(true) else {
            if let Some(active) = self.slot.current() {
                log::warn!(
                    "rejecting delete batch: {:?} {} running since {}",
                    active.kind,
                    active.id,
                    active.started_at_ms
                );
            }
            return Err(DeleteError::BatchInProgress);
        };
        let token = guard.token().clone();
        let op_id = guard.id().to_string();
        let remover = Arc::clone(&self.remover);
        let protected = self
            .protected
            .read()
            .map(|p| p.clone())
            .unwrap_or_default();

        log::info!("[{}] deleting {} paths", op_id, paths.len());

        let outcome = tokio::task::spawn_blocking(move || {
            run_batch(&paths, remover.as_ref(), &protected, &token, &progress)
        })
        .await
        .map_err(|e| DeleteError::Join(e.to_string()))?;

        log::info!(
            "[{}] removed {} paths, freed {}, {} failed, {} skipped{} ({} ms)",
            op_id,
            outcome.deleted,
            bytesize::ByteSize::b(outcome.freed_bytes),
            outcome.failures.len(),
            outcome.skipped,
            if outcome.cancelled { ", cancelled" } else { "" },
            guard.elapsed_ms()
        );
        drop(guard);
        Ok(outcome)
    }
}

fn run_batch(
    paths: &[String],
    remover: &dyn Remover,
    protected: &[PathBuf],
    token: &CancellationToken,
    progress: &UnboundedSender<DeletionProgress>,
) -> DeletionOutcome {
    let total = paths.len();
    let mut outcome = DeletionOutcome::default();

    for (index, raw) in paths.iter().enumerate() {
        if token.is_cancelled() {
            // Unattempted paths count as processed so the stream still closes at 100%
            outcome.cancelled = true;
            outcome.skipped = total - index;
            let _ = progress.send(DeletionProgress::new(total, total, outcome.freed_bytes));
            break;
        }

        match delete_one(Path::new(raw), remover, protected) {
            Ok(freed) => {
                outcome.freed_bytes += freed;
                outcome.deleted += 1;
            }
            Err(err) => {
                log::debug!("delete failed: {}", err);
                outcome.failures.push(err);
            }
        }

        let _ = progress.send(DeletionProgress::new(index + 1, total, outcome.freed_bytes));
    }

    outcome
}

fn delete_one(
    path: &Path,
    remover: &dyn Remover,
    protected: &[PathBuf],
) -> Result<u64, DeleteItemError> {
    let failure = |kind: DeleteFailureKind, detail: Option<String>| DeleteItemError {
        path: path.to_string_lossy().to_string(),
        kind,
        detail,
    };

    // Sized now, not at scan time
    let metadata =
        fs::symlink_metadata(path).map_err(|e| failure(classify(&e), Some(e.to_string())))?;

    if metadata.is_dir() {
        // A root's ancestors would take the root down with them
        let resolved = canonical_or_raw(path);
        if protected.iter().any(|root| root.starts_with(&resolved)) {
            return Err(failure(DeleteFailureKind::ProtectedRoot, None));
        }
        let size = dir_size(path);
        remover
            .remove_dir_all(path)
            .map_err(|e| failure(classify(&e), Some(e.to_string())))?;
        Ok(size)
    } else {
        remover
            .remove_file(path)
            .map_err(|e| failure(classify(&e), Some(e.to_string())))?;
        Ok(metadata.len())
    }
}

fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

pub(crate) fn classify(err: &io::Error) -> DeleteFailureKind {
    if err.raw_os_error().is_some_and(is_in_use) {
        return DeleteFailureKind::InUse;
    }
    match err.kind() {
        io::ErrorKind::NotFound => DeleteFailureKind::NotFound,
        io::ErrorKind::PermissionDenied => DeleteFailureKind::PermissionDenied,
        _ => DeleteFailureKind::Other,
    }
}

#[cfg(unix)]
fn is_in_use(code: i32) -> bool {
    code == libc::EBUSY || code == libc::ETXTBSY
}

// ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
#[cfg(windows)]
fn is_in_use(code: i32) -> bool {
    code == 32 || code == 33
}

#[cfg(not(any(unix, windows)))]
fn is_in_use(_code: i32) -> bool {
    false
}
