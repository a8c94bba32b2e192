// src/config.rs

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

pub const CATALOG_OVERRIDE_ENV: &str = "PC_BOOSTER_CATALOG_OVERRIDE";
pub const SETTLE_MS_ENV: &str = "PC_BOOSTER_SETTLE_MS";
pub const CPU_WINDOW_MS_ENV: &str = "PC_BOOSTER_CPU_WINDOW_MS";

/// Hard ceiling on walk depth, whatever a catalog rule asks for.
pub const MAX_WALK_DEPTH: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoosterConfig {
    // Scanning
    pub catalog_override: Option<PathBuf>, // Default: none, embedded catalog
    pub default_max_depth: usize,          // Default: 6

    // Process sampling
    pub cpu_sample_window_ms: u64, // Default: 250

    // Memory optimization
    pub settle_delay_ms: u64, // Default: 1500

    // Refuse to signal init, the kernel idle task and this process
    pub kill_protected: bool, // Default: true
}

impl Default for BoosterConfig {
    fn default() -> Self {
        BoosterConfig {
            catalog_override: None,
            default_max_depth: 6,
            cpu_sample_window_ms: 250,
            settle_delay_ms: 1500,
            kill_protected: true,
        }
    }
}

impl BoosterConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = BoosterConfig::default();

        if let Some(path) = env::var_os(CATALOG_OVERRIDE_ENV) {
            if !path.is_empty() {
                config.catalog_override = Some(PathBuf::from(path));
            }
        }
        if let Some(ms) = read_u64(SETTLE_MS_ENV) {
            config.settle_delay_ms = ms;
        }
        if let Some(ms) = read_u64(CPU_WINDOW_MS_ENV) {
            config.cpu_sample_window_ms = ms;
        }

        config
    }

    pub fn walk_depth(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_max_depth)
            .clamp(1, MAX_WALK_DEPTH)
    }

    pub fn cpu_sample_window(&self) -> Duration {
        Duration::from_millis(self.cpu_sample_window_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

fn read_u64(key: &str) -> Option<u64> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("ignoring {}={:?}: {}", key, raw, err);
            None
        }
    }
}

// Global configuration
lazy_static! {
    pub static ref DEFAULT_CONFIG: BoosterConfig = BoosterConfig::from_env();
}
