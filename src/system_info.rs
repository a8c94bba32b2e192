mod cpu;
mod disk;

#[cfg(test)]
mod tests;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sysinfo::System;
use thiserror::Error;

use crate::config::BoosterConfig;

pub use cpu::CpuReading;
pub use disk::DiskRecord;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SystemSnapshot {
    pub cpu_name: String,
    pub cpu_cores: usize,
    pub total_memory: u64,
    pub used_memory: u64,
    pub os_name: String,
    pub os_version: String,
    pub kernel_version: String,
    pub host_name: String,
    pub physical_cores: usize,
    pub available_memory: u64,
    pub total_swap: u64,
    pub used_swap: u64,
    pub cpu_usage: f32,
    pub uptime: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SystemInfoError {
    #[error("no CPUs were reported by the operating system")]
    NoCpus,
    #[error("total memory was reported as zero")]
    NoMemory,
    #[error("no disks were discovered")]
    NoDisks,
    #[error("system sampling worker failed: {0}")]
    Join(String),
}

#[derive(Debug, Clone, Default)]
pub struct MemoryReading {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub total_swap: u64,
    pub used_swap: u64,
}

#[derive(Debug, Clone, Default)]
pub struct OsReading {
    pub name: String,
    pub version: String,
    pub kernel_version: String,
    pub host_name: String,
    pub uptime: u64,
}

impl OsReading {
    fn current() -> Self {
        OsReading {
            name: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
            version: System::os_version()
                .or_else(System::long_os_version)
                .unwrap_or_else(|| "unknown".to_string()),
            kernel_version: System::kernel_version().unwrap_or_else(|| "unknown".to_string()),
            host_name: System::host_name().unwrap_or_default(),
            uptime: System::uptime(),
        }
    }
}

/// Assemble and validate a snapshot; never returns zeroed structures.
pub fn build_snapshot(
    cpu: CpuReading,
    memory: MemoryReading,
    os: OsReading,
) -> Result<SystemSnapshot, SystemInfoError> {
    if cpu.logical_cores == 0 {
        return Err(SystemInfoError::NoCpus);
    }
    if memory.total == 0 {
        return Err(SystemInfoError::NoMemory);
    }

    Ok(SystemSnapshot {
        cpu_name: cpu.brand,
        cpu_cores: cpu.logical_cores,
        total_memory: memory.total,
        used_memory: memory.used.min(memory.total),
        os_name: os.name,
        os_version: os.version,
        kernel_version: os.kernel_version,
        host_name: os.host_name,
        physical_cores: cpu.physical_cores,
        available_memory: memory.available,
        total_swap: memory.total_swap,
        used_swap: memory.used_swap,
        cpu_usage: cpu.usage,
        uptime: os.uptime,
    })
}

/// Machine and disk facts. Holds one `System` so the CPU figure has a baseline.
#[derive(Clone)]
pub struct SystemInfoProvider {
    state: Arc<Mutex<cpu::CpuSamplerState>>,
    warmup_window: Duration,
}

impl SystemInfoProvider {
    pub fn new(config: &BoosterConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(cpu::CpuSamplerState::new())),
            warmup_window: config.cpu_sample_window(),
        }
    }

    pub async fn system_info(&self) -> Result<SystemSnapshot, SystemInfoError> {
        let state = Arc::clone(&self.state);
        let window = self.warmup_window;
        tokio::task::spawn_blocking(move || {
            let mut guard = state
                .lock()
                .map_err(|_| SystemInfoError::Join("sampler lock poisoned".to_string()))?;
            let cpu = cpu::collect_cpu_reading(&mut guard, window);

            let system = guard.system_mut();
            system.refresh_memory();
            let memory = MemoryReading {
                total: system.total_memory(),
                used: system.used_memory(),
                available: system.available_memory(),
                total_swap: system.total_swap(),
                used_swap: system.used_swap(),
            };
            drop(guard);

            build_snapshot(cpu, memory, OsReading::current())
        })
        .await
        .map_err(|e| SystemInfoError::Join(e.to_string()))?
    }

    pub async fn disk_info(&self) -> Result<Vec<DiskRecord>, SystemInfoError> {
        tokio::task::spawn_blocking(disk::collect_disks)
            .await
            .map_err(|e| SystemInfoError::Join(e.to_string()))?
    }
}
