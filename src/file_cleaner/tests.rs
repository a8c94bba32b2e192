#[cfg(test)]
mod tests {
    use super::super::catalog::EntryFilter;
    use super::super::*;
    use crate::config::BoosterConfig;
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::{mpsc, Arc, Mutex};
    use tempfile::TempDir;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn root(category: &str, path: &Path) -> CatalogRoot {
        CatalogRoot {
            category: category.to_string(),
            path: path.to_path_buf(),
            max_depth: 6,
            filter: EntryFilter::default(),
        }
    }

    fn write_sized(dir: &Path, name: &str, size: usize) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, vec![0u8; size]).unwrap();
        path
    }

    fn as_strings(paths: &[PathBuf]) -> Vec<String> {
        paths.iter().map(|p| p.to_string_lossy().to_string()).collect()
    }

    fn drain(rx: &mut UnboundedReceiver<DeletionProgress>) -> Vec<DeletionProgress> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[cfg(unix)]
    fn in_use_error() -> io::Error {
        io::Error::from_raw_os_error(libc::EBUSY)
    }

    #[cfg(windows)]
    fn in_use_error() -> io::Error {
        io::Error::from_raw_os_error(32)
    }

    /// Behaves like a file held open by another process.
    struct LockedRemover {
        locked: PathBuf,
    }

    impl Remover for LockedRemover {
        fn remove_file(&self, path: &Path) -> io::Result<()> {
            if path == self.locked {
                return Err(in_use_error());
            }
            fs::remove_file(path)
        }

        fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
            fs::remove_dir_all(path)
        }
    }

    /// Blocks inside the first removal until the test opens the gate.
    struct GatedRemover {
        entered: Mutex<mpsc::Sender<()>>,
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl Remover for GatedRemover {
        fn remove_file(&self, path: &Path) -> io::Result<()> {
            let _ = self.entered.lock().unwrap().send(());
            let _ = self.gate.lock().unwrap().recv();
            fs::remove_file(path)
        }

        fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
            fs::remove_dir_all(path)
        }
    }

    fn gated_engine() -> (Arc<DeletionEngine>, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (gate_tx, gate_rx) = mpsc::channel();
        let remover = GatedRemover {
            entered: Mutex::new(entered_tx),
            gate: Mutex::new(gate_rx),
        };
        (
            Arc::new(DeletionEngine::new(Arc::new(remover))),
            entered_rx,
            gate_tx,
        )
    }

    #[test]
    fn test_scan_reports_every_file_and_total() {
        let temp_dir = TempDir::new().unwrap();
        let cache = temp_dir.path().join("Cache");
        let downloads = temp_dir.path().join("Downloads");
        write_sized(&cache, "a.tmp", 100);
        write_sized(&cache, "b.tmp", 200);
        write_sized(&cache.join("nested"), "c.tmp", 300);
        write_sized(&downloads, "d.bin", 50);

        let scanner = Scanner::new(vec![root("Cache", &cache), root("Downloads", &downloads)]);
        let result = scanner.scan(None).unwrap();

        assert_eq!(result.files.len(), 4);
        assert_eq!(result.total_size, 650);
        assert_eq!(
            result.total_size,
            result.files.iter().map(|f| f.size).sum::<u64>()
        );
        assert_eq!(
            result.categories,
            vec![
                CategoryReport {
                    name: "Cache".to_string(),
                    size: 600,
                    count: 3
                },
                CategoryReport {
                    name: "Downloads".to_string(),
                    size: 50,
                    count: 1
                },
            ]
        );

        let d = result.files.iter().find(|f| f.name == "d.bin").unwrap();
        assert_eq!(d.category, "Downloads");
        assert_eq!(d.root_path, downloads.to_string_lossy());
    }

    #[test]
    fn test_scan_emits_regular_files_only() {
        let temp_dir = TempDir::new().unwrap();
        let cache = temp_dir.path().join("Cache");
        write_sized(&cache.join("empty_dir_parent"), "keep.tmp", 8);
        fs::create_dir_all(cache.join("empty_dir")).unwrap();

        let result = Scanner::new(vec![root("Cache", &cache)]).scan(None).unwrap();
        assert_eq!(result.files.len(), 1);
        assert!(result.files.iter().all(|f| Path::new(&f.path).is_file()));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_does_not_follow_or_report_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let outside = temp_dir.path().join("outside");
        let cache = temp_dir.path().join("Cache");
        write_sized(&outside, "precious.doc", 64);
        write_sized(&cache, "real.tmp", 16);
        std::os::unix::fs::symlink(outside.join("precious.doc"), cache.join("link.tmp")).unwrap();
        std::os::unix::fs::symlink(&outside, cache.join("linked_dir")).unwrap();

        let result = Scanner::new(vec![root("Cache", &cache)]).scan(None).unwrap();
        let names: Vec<_> = result.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["real.tmp"]);
    }

    #[test]
    fn test_overlapping_roots_keep_first_category() {
        let temp_dir = TempDir::new().unwrap();
        let parent = temp_dir.path().join("cache");
        let child = parent.join("browser");
        write_sized(&child, "entry.bin", 10);

        let scanner = Scanner::new(vec![root("Caches", &parent), root("Browser Cache", &child)]);
        let result = scanner.scan(None).unwrap();

        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].category, "Caches");
        assert_eq!(result.total_size, 10);
    }

    #[test]
    fn test_missing_roots_are_skipped_until_none_remain() {
        let temp_dir = TempDir::new().unwrap();
        let present = temp_dir.path().join("present");
        write_sized(&present, "x.tmp", 5);
        let missing = temp_dir.path().join("missing");

        let ok = Scanner::new(vec![root("Gone", &missing), root("Here", &present)])
            .scan(None)
            .unwrap();
        assert_eq!(ok.files.len(), 1);

        let err = Scanner::new(vec![root("Gone", &missing)]).scan(None).unwrap_err();
        assert!(matches!(err, ScanError::NoReadableRoots(1)));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        // Permission bits do not bind root
        if unsafe { libc::geteuid() } == 0 {
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("Temp");
        let readable = write_sized(&base, "keep.tmp", 12);
        let locked = base.join("locked");
        write_sized(&locked, "hidden.tmp", 40);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let result = Scanner::new(vec![root("Temp", &base)]).scan(None);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let result = result.unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].path, readable.to_string_lossy());
        assert_eq!(
            result.total_size,
            result.files.iter().map(|f| f.size).sum::<u64>()
        );
        assert_eq!(result.total_size, 12);
    }

    #[test]
    fn test_scan_progress_reports_each_root() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        write_sized(&a, "1.tmp", 1);
        write_sized(&b, "2.tmp", 1);
        write_sized(&b, "3.tmp", 1);

        let (tx, mut rx) = unbounded_channel();
        Scanner::new(vec![root("A", &a), root("B", &b)])
            .scan(Some(&tx))
            .unwrap();
        drop(tx);

        let mut seen = Vec::new();
        while let Ok(progress) = rx.try_recv() {
            assert_eq!(progress.total_roots, 2);
            seen.push((progress.root_index, progress.files_found));
        }
        seen.sort();
        assert_eq!(seen, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_catalog_rules_filter_young_and_small_files() {
        let temp_dir = TempDir::new().unwrap();
        let downloads = temp_dir.path().join("Downloads");
        write_sized(&downloads, "fresh.iso", 4096);

        let catalog: Catalog = serde_json::from_value(serde_json::json!({
            "categories": [{
                "name": "Old Downloads",
                "paths": [downloads.to_string_lossy()],
                "max_depth": 1,
                "min_age_days": 90,
                "min_size_kb": 1
            }]
        }))
        .unwrap();

        let roots = catalog.resolve_roots(&BoosterConfig::default());
        assert_eq!(roots.len(), 1);
        let result = Scanner::new(roots).scan(None).unwrap();
        assert!(result.files.is_empty());
        assert_eq!(result.total_size, 0);
    }

    #[tokio::test]
    async fn test_locked_file_is_recorded_and_batch_completes() {
        let temp_dir = TempDir::new().unwrap();
        let cache = temp_dir.path().join("Cache");
        let locked = write_sized(&cache, "a.tmp", 100);
        let b = write_sized(&cache, "b.tmp", 200);
        let c = write_sized(&cache, "c.tmp", 300);

        let engine = DeletionEngine::new(Arc::new(LockedRemover {
            locked: locked.clone(),
        }));
        let (tx, mut rx) = unbounded_channel();
        let outcome = engine
            .delete(as_strings(&[locked.clone(), b.clone(), c.clone()]), tx)
            .await
            .unwrap();

        assert_eq!(outcome.freed_bytes, 500);
        assert_eq!(outcome.deleted, 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].kind, DeleteFailureKind::InUse);
        assert!(locked.exists());
        assert!(!b.exists() && !c.exists());

        let events = drain(&mut rx);
        assert_eq!(events.len(), 3);
        assert!(events
            .windows(2)
            .all(|w| w[0].percentage <= w[1].percentage && w[0].current < w[1].current));
        let last = events.last().unwrap();
        assert_eq!((last.current, last.total), (3, 3));
        assert_eq!(last.percentage, 100.0);
        assert_eq!(last.deleted_size, 500);
        assert!(events[..2].iter().all(|e| e.percentage < 100.0));
    }

    #[tokio::test]
    async fn test_empty_batch_frees_nothing_and_is_silent() {
        let engine = DeletionEngine::default();
        let (tx, mut rx) = unbounded_channel();
        let outcome = engine.delete(Vec::new(), tx).await.unwrap();

        assert_eq!(outcome.freed_bytes, 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_missing_path_does_not_abort_batch() {
        let temp_dir = TempDir::new().unwrap();
        let gone = temp_dir.path().join("never-existed.tmp");
        let real = write_sized(temp_dir.path(), "real.tmp", 42);

        let engine = DeletionEngine::default();
        let (tx, mut rx) = unbounded_channel();
        let outcome = engine
            .delete(as_strings(&[gone, real.clone()]), tx)
            .await
            .unwrap();

        assert_eq!(outcome.freed_bytes, 42);
        assert_eq!(outcome.failures[0].kind, DeleteFailureKind::NotFound);
        let last = drain(&mut rx).pop().unwrap();
        assert_eq!(last.current, last.total);
        assert_eq!(last.percentage, 100.0);
    }

    #[tokio::test]
    async fn test_all_failures_still_reach_one_hundred_percent() {
        let temp_dir = TempDir::new().unwrap();
        let paths = vec![temp_dir.path().join("x"), temp_dir.path().join("y")];

        let engine = DeletionEngine::default();
        let (tx, mut rx) = unbounded_channel();
        let outcome = engine.delete(as_strings(&paths), tx).await.unwrap();

        assert_eq!(outcome.freed_bytes, 0);
        assert_eq!(outcome.failures.len(), 2);
        let last = drain(&mut rx).pop().unwrap();
        assert_eq!((last.current, last.total, last.deleted_size), (2, 2, 0));
        assert_eq!(last.percentage, 100.0);
    }

    #[tokio::test]
    async fn test_directories_are_sized_recursively_but_roots_are_protected() {
        let temp_dir = TempDir::new().unwrap();
        let cache = temp_dir.path().join("Cache");
        let bundle = cache.join("bundle");
        write_sized(&bundle, "one", 10);
        write_sized(&bundle.join("deeper"), "two", 20);

        let engine = DeletionEngine::default();
        engine.set_protected_roots(vec![cache.clone()]);

        let (tx, _rx) = unbounded_channel();
        let outcome = engine
            .delete(as_strings(&[cache.clone(), bundle.clone()]), tx)
            .await
            .unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].kind, DeleteFailureKind::ProtectedRoot);
        assert_eq!(outcome.freed_bytes, 30);
        assert!(cache.exists());
        assert!(!bundle.exists());
    }

    #[tokio::test]
    async fn test_parent_of_a_protected_root_is_refused() {
        let temp_dir = TempDir::new().unwrap();
        let cache = temp_dir.path().join("cache");
        let chrome = cache.join("google-chrome");
        write_sized(&chrome, "blob", 16);
        write_sized(&cache, "loose.tmp", 4);

        let engine = DeletionEngine::default();
        engine.set_protected_roots(vec![chrome.clone()]);

        let (tx, _rx) = unbounded_channel();
        let outcome = engine.delete(as_strings(&[cache.clone()]), tx).await.unwrap();

        assert_eq!(outcome.deleted, 0);
        assert_eq!(outcome.freed_bytes, 0);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].kind, DeleteFailureKind::ProtectedRoot);
        assert!(chrome.join("blob").exists());
        assert!(cache.join("loose.tmp").exists());
    }

    #[tokio::test]
    async fn test_second_batch_is_rejected_while_first_runs() {
        let temp_dir = TempDir::new().unwrap();
        let first_file = write_sized(temp_dir.path(), "first.tmp", 1);
        let second_file = write_sized(temp_dir.path(), "second.tmp", 1);
        let (engine, entered_rx, gate_tx) = gated_engine();

        let first = {
            let engine = Arc::clone(&engine);
            let paths = as_strings(&[first_file]);
            tokio::spawn(async move {
                let (tx, _rx) = unbounded_channel();
                engine.delete(paths, tx).await
            })
        };
        tokio::task::spawn_blocking(move || entered_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(engine.is_busy());

        let (tx, _rx) = unbounded_channel();
        let err = engine
            .delete(as_strings(&[second_file.clone()]), tx)
            .await
            .unwrap_err();
        assert!(matches!(err, DeleteError::BatchInProgress));
        assert!(second_file.exists());

        gate_tx.send(()).unwrap();
        let outcome = first.await.unwrap().unwrap();
        assert_eq!(outcome.deleted, 1);
        assert!(!engine.is_busy());

        gate_tx.send(()).unwrap();
        let (tx, _rx) = unbounded_channel();
        let outcome = engine
            .delete(as_strings(&[second_file]), tx)
            .await
            .unwrap();
        assert_eq!(outcome.deleted, 1);
    }

    #[tokio::test]
    async fn test_cancel_skips_remaining_paths() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_sized(temp_dir.path(), "a.tmp", 10);
        let b = write_sized(temp_dir.path(), "b.tmp", 20);
        let c = write_sized(temp_dir.path(), "c.tmp", 30);
        let (engine, entered_rx, gate_tx) = gated_engine();

        let (tx, mut rx) = unbounded_channel();
        let batch = {
            let engine = Arc::clone(&engine);
            let paths = as_strings(&[a.clone(), b.clone(), c.clone()]);
            tokio::spawn(async move { engine.delete(paths, tx).await })
        };
        tokio::task::spawn_blocking(move || entered_rx.recv())
            .await
            .unwrap()
            .unwrap();

        assert!(engine.cancel());
        gate_tx.send(()).unwrap();
        let outcome = batch.await.unwrap().unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.deleted, 1);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.freed_bytes, 10);
        assert!(b.exists() && c.exists());

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].current, 1);
        assert!(events[1].is_final());
        assert_eq!(events[1].percentage, 100.0);
        assert_eq!(events[1].deleted_size, 10);
    }

    #[test]
    fn test_progress_percentage_hits_exactly_one_hundred() {
        let p = DeletionProgress::new(1, 3, 0);
        assert!(p.percentage > 33.0 && p.percentage < 34.0);
        assert!(!p.is_final());
        assert_eq!(DeletionProgress::new(3, 3, 0).percentage, 100.0);
        assert_eq!(DeletionProgress::new(7, 3, 0).current, 3);
    }
}
