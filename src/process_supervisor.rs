mod signal;


use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sysinfo::{Pid, Process, ProcessStatus, System};
use thiserror::Error;

use crate::config::BoosterConfig;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    /// Percent of total machine capacity, 0 to 100.
    pub cpu_usage: f32,
    /// Resident set size in bytes.
    pub memory: u64,
    /// Bytes read plus written since the process started.
    pub disk_usage: u64,
    pub status: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessError {
    #[error("process {0} not found")]
    NotFound(u32),
    #[error("access denied to process {0}")]
    AccessDenied(u32),
    #[error("failed to terminate process {pid}: {reason}")]
    Other { pid: u32, reason: String },
}

struct SamplerState {
    system: System,
    warmed_up: bool,
}

/// Enumerates and terminates processes. Keeps one `System` between calls so
/// CPU usage is measured since the previous listing.
#[derive(Clone)]
pub struct ProcessSupervisor {
    state: Arc<Mutex<SamplerState>>,
    warmup_window: Duration,
    kill_protected: bool,
}

impl ProcessSupervisor {
    pub fn new(config: &BoosterConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(SamplerState {
                system: System::new(),
                warmed_up: false,
            })),
            warmup_window: config.cpu_sample_window(),
            kill_protected: config.kill_protected,
        }
    }

    pub async fn list_processes(&self) -> Vec<ProcessRecord> {
        let state = Arc::clone(&self.state);
        let window = self.warmup_window;
        match tokio::task::spawn_blocking(move || sample_locked(&state, window)).await {
            Ok(records) => records,
            Err(e) => {
                log::warn!("process sampling task failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Send a graceful termination request to `pid`.
    pub async fn kill(&self, pid: u32) -> Result<(), ProcessError> {
        let state = Arc::clone(&self.state);
        let kill_protected = self.kill_protected;
        let result = tokio::task::spawn_blocking(move || {
            let mut guard = state.lock().map_err(|_| ProcessError::Other {
                pid,
                reason: "sampler lock poisoned".to_string(),
            })?;
            let system = &mut guard.system;
            let target = Pid::from_u32(pid);
            system.refresh_process(target);
            let name = system.process(target).map(|p| p.name().to_string());

            if kill_protected && signal::is_protected(pid, name.as_deref()) {
                log::warn!("refusing to terminate protected pid {} ({:?})", pid, name);
                return Err(ProcessError::AccessDenied(pid));
            }
            signal::terminate(system, pid)
        })
        .await
        .map_err(|e| ProcessError::Other {
            pid,
            reason: e.to_string(),
        })?;

        match &result {
            Ok(()) => log::info!("sent termination request to pid {}", pid),
            Err(e) => log::debug!("kill {} failed: {}", pid, e),
        }
        result
    }
}

fn sample_locked(state: &Mutex<SamplerState>, window: Duration) -> Vec<ProcessRecord> {
    let Ok(mut guard) = state.lock() else {
        return Vec::new();
    };
    let state = &mut *guard;

    if !state.warmed_up {
        // First sample has no baseline, so take two
        state.system.refresh_cpu();
        state.system.refresh_processes();
        std::thread::sleep(window);
        state.warmed_up = true;
    }
    state.system.refresh_cpu();
    state.system.refresh_processes();

    let cores = logical_cores(&state.system);
    let mut records: Vec<ProcessRecord> = state
        .system
        .processes()
        .iter()
        .map(|(pid, process)| to_record(*pid, process, cores))
        .collect();

    records.sort_by(|a, b| {
        b.cpu_usage
            .partial_cmp(&a.cpu_usage)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.memory.cmp(&a.memory))
    });
    records
}

fn logical_cores(system: &System) -> usize {
    let listed = system.cpus().len();
    if listed > 0 {
        return listed;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn to_record(pid: Pid, process: &Process, cores: usize) -> ProcessRecord {
    let io = process.disk_usage();
    ProcessRecord {
        pid: pid.as_u32(),
        name: process.name().to_string(),
        cpu_usage: normalize_cpu(process.cpu_usage(), cores),
        memory: process.memory(),
        disk_usage: io.total_read_bytes.saturating_add(io.total_written_bytes),
        status: status_label(process.status()).to_string(),
    }
}

/// sysinfo reports per-core percentages summed across cores; scale to whole-machine.
pub fn normalize_cpu(raw: f32, logical_cores: usize) -> f32 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0.0;
    }
    (raw / logical_cores.max(1) as f32).clamp(0.0, 100.0)
}

pub fn status_label(status: ProcessStatus) -> &'static str {
    match status {
        ProcessStatus::Run => "running",
        ProcessStatus::Sleep
        | ProcessStatus::Idle
        | ProcessStatus::UninterruptibleDiskSleep
        | ProcessStatus::Waking
        | ProcessStatus::Parked
        | ProcessStatus::LockBlocked => "sleeping",
        ProcessStatus::Stop | ProcessStatus::Tracing => "suspended",
        ProcessStatus::Zombie => "zombie",
        ProcessStatus::Dead => "dead",
        _ => "other",
    }
}
