use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::BoosterConfig;
use crate::file_cleaner::{
    Catalog, DeleteError, DeletionEngine, DeletionOutcome, DeletionProgress, ScanError,
    ScanProgress, ScanResult, Scanner,
};
use crate::memory_optimizer::{MemoryError, MemoryOptimizationResult, MemoryOptimizer};
use crate::ops::{OperationKind, OperationSlot};
use crate::process_supervisor::{ProcessError, ProcessRecord, ProcessSupervisor};
use crate::system_info::{DiskRecord, SystemInfoError, SystemInfoProvider, SystemSnapshot};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RevealError {
    #[error("path does not exist: {0}")]
    NotFound(String),
}

/// Async entry points for every command, independent of the UI bridge.
#[derive(Clone)]
pub struct Backend {
    config: Arc<BoosterConfig>,
    scan_slot: OperationSlot,
    deletion: Arc<DeletionEngine>,
    processes: ProcessSupervisor,
    memory: Arc<MemoryOptimizer>,
    system: SystemInfoProvider,
}

impl Backend {
    pub fn new(config: BoosterConfig) -> Self {
        Self::with_deletion_engine(config, DeletionEngine::default())
    }

    pub fn with_deletion_engine(config: BoosterConfig, deletion: DeletionEngine) -> Self {
        // Protect catalog roots even if a delete arrives before the first scan
        match Catalog::load(&config) {
            Ok(catalog) => deletion.set_protected_roots(
                catalog.resolve_roots(&config).into_iter().map(|root| root.path),
            ),
            Err(e) => log::warn!("catalog unavailable at startup: {}", e),
        }

        Self {
            scan_slot: OperationSlot::new(OperationKind::FileScan),
            deletion: Arc::new(deletion),
            processes: ProcessSupervisor::new(&config),
            memory: Arc::new(MemoryOptimizer::new(&config)),
            system: SystemInfoProvider::new(&config),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &BoosterConfig {
        &self.config
    }

    /// Scans queue behind each other rather than failing.
    pub async fn scan_temp_files(
        &self,
        progress: Option<UnboundedSender<ScanProgress>>,
    ) -> Result<ScanResult, ScanError> {
        let _guard = self.scan_slot.begin(false).await;
        let config = Arc::clone(&self.config);
        let deletion = Arc::clone(&self.deletion);

        tokio::task::spawn_blocking(move || {
            let catalog = Catalog::load(&config)?;
            let roots = catalog.resolve_roots(&config);
            deletion.set_protected_roots(roots.iter().map(|root| root.path.clone()));
            Scanner::new(roots).scan(progress.as_ref())
        })
        .await
        .map_err(|e| ScanError::Join(e.to_string()))?
    }

    pub async fn delete_temp_files(
        &self,
        paths: Vec<String>,
        progress: UnboundedSender<DeletionProgress>,
    ) -> Result<DeletionOutcome, DeleteError> {
        self.deletion.delete(paths, progress).await
    }

    pub fn cancel_delete(&self) -> bool {
        self.deletion.cancel()
    }

    /// Validate a path before handing it to the platform file manager.
    pub fn reveal_target(path: &str) -> Result<PathBuf, RevealError> {
        let trimmed = path.trim();
        if trimmed.is_empty() || Path::new(trimmed).symlink_metadata().is_err() {
            return Err(RevealError::NotFound(trimmed.to_string()));
        }
        Ok(PathBuf::from(trimmed))
    }

    pub async fn get_system_info(&self) -> Result<SystemSnapshot, SystemInfoError> {
        self.system.system_info().await
    }

    pub async fn get_disk_info(&self) -> Result<Vec<DiskRecord>, SystemInfoError> {
        self.system.disk_info().await
    }

    pub async fn get_processes(&self) -> Vec<ProcessRecord> {
        self.processes.list_processes().await
    }

    pub async fn kill_process(&self, pid: u32) -> Result<(), ProcessError> {
        self.processes.kill(pid).await
    }

    pub async fn optimize_memory(&self) -> Result<MemoryOptimizationResult, MemoryError> {
        self.memory.optimize().await
    }
}
