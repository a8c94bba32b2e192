pub mod backend;
pub mod config;
pub mod file_cleaner;
pub mod memory_optimizer;
mod ops;
pub mod process_supervisor;
pub mod system_info;

pub use backend::{Backend, RevealError};
pub use config::BoosterConfig;
pub use file_cleaner::{
    Catalog, DeleteError, DeletionEngine, DeletionOutcome, DeletionProgress, ScanError,
    ScanProgress, ScanResult, Scanner, TempFileEntry,
};
pub use memory_optimizer::{MemoryError, MemoryOptimizationResult, MemoryOptimizer};
pub use process_supervisor::{ProcessError, ProcessRecord, ProcessSupervisor};
pub use system_info::{DiskRecord, SystemInfoError, SystemInfoProvider, SystemSnapshot};

#[cfg(feature = "app")]
mod app;

#[cfg(feature = "app")]
pub use app::run;
