use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One file discovered under a catalog root.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TempFileEntry {
    pub path: String,
    pub name: String,
    pub size: u64,
    pub category: String,
    pub root_path: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub name: String,
    pub size: u64,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ScanResult {
    pub files: Vec<TempFileEntry>,
    pub total_size: u64,
    pub categories: Vec<CategoryReport>,
}

impl ScanResult {
    /// Build a result from discovered entries. `total_size` and the
    /// per-category rollup are derived here and nowhere else.
    pub fn from_entries(files: Vec<TempFileEntry>) -> Self {
        let mut categories: Vec<CategoryReport> = Vec::new();
        let mut total_size = 0u64;

        for file in &files {
            total_size += file.size;
            match categories.iter_mut().find(|c| c.name == file.category) {
                Some(report) => {
                    report.size += file.size;
                    report.count += 1;
                }
                None => categories.push(CategoryReport {
                    name: file.category.clone(),
                    size: file.size,
                    count: 1,
                }),
            }
        }

        ScanResult {
            files,
            total_size,
            categories,
        }
    }
}

/// Emitted once per finished catalog root.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    pub root_index: usize,
    pub total_roots: usize,
    pub category: String,
    pub files_found: usize,
}

/// Payload of the `delete-progress` event.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DeletionProgress {
    pub current: usize,
    pub total: usize,
    pub percentage: f64,
    pub deleted_size: u64,
}

impl DeletionProgress {
    pub fn new(current: usize, total: usize, deleted_size: u64) -> Self {
        let percentage = if total == 0 || current >= total {
            100.0
        } else {
            current as f64 / total as f64 * 100.0
        };
        DeletionProgress {
            current: current.min(total),
            total,
            percentage,
            deleted_size,
        }
    }

    pub fn is_final(&self) -> bool {
        self.current == self.total
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeleteFailureKind {
    NotFound,
    PermissionDenied,
    InUse,
    ProtectedRoot,
    Other,
}

impl fmt::Display for DeleteFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeleteFailureKind::NotFound => "not found",
            DeleteFailureKind::PermissionDenied => "permission denied",
            DeleteFailureKind::InUse => "in use",
            DeleteFailureKind::ProtectedRoot => "catalog root is protected",
            DeleteFailureKind::Other => "failed",
        };
        f.write_str(label)
    }
}

/// Per-path failure; recorded, never fatal to the batch.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[error("{path}: {kind}{}", .detail.as_ref().map(|d| format!(" ({})", d)).unwrap_or_default())]
pub struct DeleteItemError {
    pub path: String,
    pub kind: DeleteFailureKind,
    pub detail: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DeletionOutcome {
    pub freed_bytes: u64,
    pub deleted: usize,
    pub failures: Vec<DeleteItemError>,
    pub skipped: usize,
    pub cancelled: bool,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to load temp catalog: {0}")]
    Catalog(String),
    #[error("none of the {0} catalog roots could be read")]
    NoReadableRoots(usize),
    #[error("scan worker failed: {0}")]
    Join(String),
}

#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("a deletion batch is already running")]
    BatchInProgress,
    #[error("deletion worker failed: {0}")]
    Join(String),
}
