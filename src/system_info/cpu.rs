use std::time::Duration;

use sysinfo::System;

pub struct CpuSamplerState {
    system: System,
    warmed_up: bool,
}

impl CpuSamplerState {
    pub fn new() -> Self {
        CpuSamplerState {
            system: System::new(),
            warmed_up: false,
        }
    }

    pub fn system_mut(&mut self) -> &mut System {
        &mut self.system
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuReading {
    pub brand: String,
    pub logical_cores: usize,
    pub physical_cores: usize,
    /// Mean across cores, 0 to 100.
    pub usage: f32,
}

pub fn collect_cpu_reading(state: &mut CpuSamplerState, window: Duration) -> CpuReading {
    if !state.warmed_up {
        state.system.refresh_cpu();
        std::thread::sleep(window);
        state.system.refresh_cpu();
        state.warmed_up = true;
    } else {
        state.system.refresh_cpu();
    }

    let cpus = state.system.cpus();
    if cpus.is_empty() {
        return CpuReading::default();
    }

    let usage = cpus.iter().map(|cpu| cpu.cpu_usage()).sum::<f32>() / cpus.len() as f32;
    let brand = cpus
        .first()
        .map(|cpu| {
            let brand = cpu.brand().trim();
            if brand.is_empty() {
                cpu.vendor_id().trim().to_string()
            } else {
                brand.to_string()
            }
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Unknown CPU".to_string());

    CpuReading {
        brand,
        logical_cores: cpus.len(),
        physical_cores: state.system.physical_core_count().unwrap_or(0),
        usage: usage.clamp(0.0, 100.0),
    }
}
