use serde::{Deserialize, Serialize};
use sysinfo::{DiskKind, Disks};

use super::SystemInfoError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DiskRecord {
    pub name: String,
    pub mount_point: String,
    pub total_space: u64,
    pub available_space: u64,
    pub is_removable: bool,
    pub file_system: String,
    pub used_space: u64,
    /// `ssd`, `hdd` or `unknown`.
    pub kind: String,
}

pub fn collect_disks() -> Result<Vec<DiskRecord>, SystemInfoError> {
    let disks = Disks::new_with_refreshed_list();
    let records: Vec<DiskRecord> = disks
        .list()
        .iter()
        .map(|disk| {
            let total_space = disk.total_space();
            let available_space = disk.available_space();
            DiskRecord {
                name: disk.name().to_string_lossy().to_string(),
                mount_point: disk.mount_point().to_string_lossy().to_string(),
                total_space,
                available_space,
                is_removable: disk.is_removable(),
                file_system: disk.file_system().to_string_lossy().to_string(),
                used_space: total_space.saturating_sub(available_space),
                kind: kind_label(disk.kind()).to_string(),
            }
        })
        .collect();

    if records.is_empty() {
        return Err(SystemInfoError::NoDisks);
    }
    Ok(records)
}

fn kind_label(kind: DiskKind) -> &'static str {
    match kind {
        DiskKind::SSD => "ssd",
        DiskKind::HDD => "hdd",
        DiskKind::Unknown(_) => "unknown",
    }
}
