#[cfg(test)]
mod tests {
    use super::super::*;

    fn cpu(cores: usize) -> CpuReading {
        CpuReading {
            brand: "Test CPU".to_string(),
            logical_cores: cores,
            physical_cores: cores / 2,
            usage: 12.5,
        }
    }

    fn memory(total: u64, used: u64) -> MemoryReading {
        MemoryReading {
            total,
            used,
            available: total.saturating_sub(used),
            ..MemoryReading::default()
        }
    }

    #[test]
    fn test_empty_cpu_list_is_an_error() {
        let err = build_snapshot(cpu(0), memory(1024, 512), OsReading::default()).unwrap_err();
        assert_eq!(err, SystemInfoError::NoCpus);
    }

    #[test]
    fn test_zero_memory_is_an_error() {
        let err = build_snapshot(cpu(8), memory(0, 0), OsReading::default()).unwrap_err();
        assert_eq!(err, SystemInfoError::NoMemory);
    }

    #[test]
    fn test_snapshot_carries_readings() {
        let snapshot = build_snapshot(cpu(8), memory(2048, 4096), OsReading::default()).unwrap();
        assert_eq!(snapshot.cpu_name, "Test CPU");
        assert_eq!(snapshot.cpu_cores, 8);
        assert_eq!(snapshot.physical_cores, 4);
        assert_eq!(snapshot.total_memory, 2048);
        assert_eq!(snapshot.used_memory, 2048, "used is capped at total");
    }

    #[tokio::test]
    async fn test_live_snapshot_is_populated() {
        let provider = SystemInfoProvider::new(&BoosterConfig {
            cpu_sample_window_ms: 20,
            ..BoosterConfig::default()
        });
        let snapshot = provider.system_info().await.unwrap();

        assert!(snapshot.cpu_cores > 0);
        assert!(!snapshot.cpu_name.is_empty());
        assert!(snapshot.total_memory > 0);
        assert!(snapshot.used_memory <= snapshot.total_memory);
        assert!(!snapshot.os_name.is_empty());
        assert!((0.0..=100.0).contains(&snapshot.cpu_usage));
    }

    #[tokio::test]
    async fn test_live_disks_are_consistent() {
        let provider = SystemInfoProvider::new(&BoosterConfig::default());
        // Containers can legitimately expose no disks at all
        match provider.disk_info().await {
            Ok(disks) => {
                assert!(!disks.is_empty());
                for disk in disks {
                    assert_eq!(
                        disk.used_space,
                        disk.total_space.saturating_sub(disk.available_space)
                    );
                    assert!(["ssd", "hdd", "unknown"].contains(&disk.kind.as_str()));
                }
            }
            Err(err) => assert_eq!(err, SystemInfoError::NoDisks),
        }
    }
}
