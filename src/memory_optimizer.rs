mod admin;
mod non_admin;
mod stats;


use std::sync::Arc;
use std::time::Duration;

use bytesize::ByteSize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BoosterConfig;
use crate::ops::{OperationKind, OperationSlot};

pub use admin::is_elevated;
pub use stats::SysinfoProbe;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MemoryOptimizationResult {
    pub before_used: u64,
    pub after_used: u64,
    pub freed: u64,
    pub success: bool,
    pub message: String,
    pub is_admin: bool,
    pub optimizations_performed: Vec<String>,
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("failed to read memory usage: {0}")]
    Probe(String),
    #[error("a memory optimization is already running")]
    AlreadyRunning,
    #[error("memory optimization worker failed: {0}")]
    Join(String),
}

/// Source of the "used memory" figure, in bytes.
pub trait MemoryProbe: Send + Sync {
    fn used_memory(&self) -> Result<u64, MemoryError>;
}

/// Runs the platform reclaim steps and reports the ones that took effect.
pub trait Trimmer: Send + Sync {
    fn trim(&self, is_admin: bool) -> Vec<String>;
}

pub struct PlatformTrimmer;

impl Trimmer for PlatformTrimmer {
    fn trim(&self, is_admin: bool) -> Vec<String> {
        let mut performed = non_admin::run_steps();
        if is_admin {
            performed.extend(admin::run_privileged_steps());
        }
        performed
    }
}

pub struct MemoryOptimizer {
    probe: Arc<dyn MemoryProbe>,
    trimmer: Arc<dyn Trimmer>,
    is_admin: bool,
    settle_delay: Duration,
    slot: OperationSlot,
}

impl MemoryOptimizer {
    pub fn new(config: &BoosterConfig) -> Self {
        Self::with_parts(
            Arc::new(SysinfoProbe),
            Arc::new(PlatformTrimmer),
            is_elevated(),
            config.settle_delay(),
        )
    }

    pub fn with_parts(
        probe: Arc<dyn MemoryProbe>,
        trimmer: Arc<dyn Trimmer>,
        is_admin: bool,
        settle_delay: Duration,
    ) -> Self {
        Self {
            probe,
            trimmer,
            is_admin,
            settle_delay,
            slot: OperationSlot::new(OperationKind::MemOptimize),
        }
    }

    pub async fn optimize(&self) -> Result<MemoryOptimizationResult, MemoryError> {
        let guard = self.slot.try_begin(false).ok_or(MemoryError::AlreadyRunning)?;
        let is_admin = self.is_admin;

        let probe = Arc::clone(&self.probe);
        let trimmer = Arc::clone(&self.trimmer);
        let (before, performed) = tokio::task::spawn_blocking(move || {
            let before = probe.used_memory()?;
            Ok::<_, MemoryError>((before, trimmer.trim(is_admin)))
        })
        .await
        .map_err(|e| MemoryError::Join(e.to_string()))??;

        // Let the kernel finish reclaiming before re-sampling
        tokio::time::sleep(self.settle_delay).await;

        let probe = Arc::clone(&self.probe);
        let after = tokio::task::spawn_blocking(move || probe.used_memory())
            .await
            .map_err(|e| MemoryError::Join(e.to_string()))??;

        let result = summarize(before, after, performed, is_admin);
        log::info!(
            "[{}] memory optimization: {} -> {} ({}) in {} ms",
            guard.id(),
            ByteSize::b(before),
            ByteSize::b(after),
            result.message,
            guard.elapsed_ms()
        );
        Ok(result)
    }
}

/// Pure accounting for one optimization run.
pub fn summarize(
    before_used: u64,
    after_used: u64,
    optimizations_performed: Vec<String>,
    is_admin: bool,
) -> MemoryOptimizationResult {
    let freed = before_used.saturating_sub(after_used);
    let applied = !optimizations_performed.is_empty();
    let success = freed > 0 && applied;

    let mut message = if success {
        format!("Freed {} of memory", ByteSize::b(freed))
    } else if !applied {
        "No optimization step could be applied".to_string()
    } else {
        "Memory usage did not decrease; the system may already be lean".to_string()
    };
    if !is_admin {
        message.push_str(". Run as administrator for a deeper clean");
    }

    MemoryOptimizationResult {
        before_used,
        after_used,
        freed,
        success,
        message,
        is_admin,
        optimizations_performed,
    }
}
