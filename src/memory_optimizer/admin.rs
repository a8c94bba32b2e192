// src/memory_optimizer/admin.rs

#[cfg(unix)]
pub fn is_elevated() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(windows)]
pub fn is_elevated() -> bool {
    unsafe { winapi::um::shlobj::IsUserAnAdmin() != 0 }
}

#[cfg(not(any(unix, windows)))]
pub fn is_elevated() -> bool {
    false
}

#[cfg(target_os = "linux")]
pub(crate) fn run_privileged_steps() -> Vec<String> {
    let mut performed = Vec::new();
    let knobs = [
        ("/proc/sys/vm/drop_caches", "Dropped clean page cache"),
        ("/proc/sys/vm/compact_memory", "Compacted physical memory"),
    ];
    for (knob, label) in knobs {
        match std::fs::write(knob, "1") {
            Ok(()) => performed.push(label.to_string()),
            Err(e) => log::warn!("could not write {}: {}", knob, e),
        }
    }
    performed
}

#[cfg(target_os = "macos")]
pub(crate) fn run_privileged_steps() -> Vec<String> {
    match std::process::Command::new("purge").output() {
        Ok(output) if output.status.success() => vec!["Purged inactive memory".to_string()],
        Ok(output) => {
            log::warn!(
                "purge exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            Vec::new()
        }
        Err(e) => {
            log::warn!("failed to run purge: {}", e);
            Vec::new()
        }
    }
}

// Working-set trimming already covers elevated runs
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub(crate) fn run_privileged_steps() -> Vec<String> {
    Vec::new()
}
