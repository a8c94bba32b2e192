use sysinfo::System;

use super::{MemoryError, MemoryProbe};

/// Reads used memory through sysinfo on every call.
pub struct SysinfoProbe;

impl MemoryProbe for SysinfoProbe {
    fn used_memory(&self) -> Result<u64, MemoryError> {
        let mut system = System::new();
        system.refresh_memory();
        if system.total_memory() == 0 {
            return Err(MemoryError::Probe("total memory reported as zero".to_string()));
        }
        Ok(system.used_memory())
    }
}
