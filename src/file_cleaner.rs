pub mod catalog;
mod deletion;
mod scanner;
pub mod types;

#[cfg(test)]
mod tests;

pub use catalog::{expand_path, Catalog, CatalogRoot, CategoryRule};
pub use deletion::{DeletionEngine, FsRemover, Remover};
pub use scanner::Scanner;
pub use types::{
    CategoryReport, DeleteError, DeleteFailureKind, DeleteItemError, DeletionOutcome,
    DeletionProgress, ScanError, ScanProgress, ScanResult, TempFileEntry,
};
