use sysinfo::System;

use super::ProcessError;

#[cfg(windows)]
const CRITICAL_NAMES: &[&str] = &[
    "system",
    "registry",
    "smss.exe",
    "csrss.exe",
    "wininit.exe",
    "winlogon.exe",
    "services.exe",
    "lsass.exe",
    "svchost.exe",
    "dwm.exe",
];

#[cfg(not(windows))]
const CRITICAL_NAMES: &[&str] = &[
    "init",
    "systemd",
    "kthreadd",
    "launchd",
    "kernel_task",
    "windowserver",
    "loginwindow",
];

/// Idle task, init, critical system services and this process itself.
pub fn is_protected(pid: u32, name: Option<&str>) -> bool {
    if pid <= 1 || pid == std::process::id() {
        return true;
    }
    name.map(|n| {
        let lower = n.to_lowercase();
        CRITICAL_NAMES.iter().any(|critical| *critical == lower)
    })
    .unwrap_or(false)
}

#[cfg(unix)]
pub fn terminate(_system: &System, pid: u32) -> Result<(), ProcessError> {
    let raw = match libc::pid_t::try_from(pid) {
        Ok(raw) => raw,
        Err(_) => return Err(ProcessError::NotFound(pid)),
    };
    // 0 and negatives address process groups
    if raw <= 0 {
        return Err(ProcessError::AccessDenied(pid));
    }

    let rc = unsafe { libc::kill(raw, libc::SIGTERM) };
    if rc == 0 {
        return Ok(());
    }
    Err(map_errno(pid, std::io::Error::last_os_error()))
}

#[cfg(unix)]
fn map_errno(pid: u32, err: std::io::Error) -> ProcessError {
    match err.raw_os_error() {
        Some(libc::ESRCH) => ProcessError::NotFound(pid),
        Some(libc::EPERM) => ProcessError::AccessDenied(pid),
        _ => ProcessError::Other {
            pid,
            reason: err.to_string(),
        },
    }
}

#[cfg(not(unix))]
pub fn terminate(system: &System, pid: u32) -> Result<(), ProcessError> {
    let process = system
        .process(sysinfo::Pid::from_u32(pid))
        .ok_or(ProcessError::NotFound(pid))?;
    if process.kill() {
        Ok(())
    } else {
        Err(rejected_kill(
            pid,
            std::io::Error::last_os_error().raw_os_error(),
        ))
    }
}

// ERROR_ACCESS_DENIED
#[cfg_attr(unix, allow(dead_code))]
const WIN_ACCESS_DENIED: i32 = 5;

/// Classify a refused `Process::kill` from the thread's last OS error.
#[cfg_attr(unix, allow(dead_code))]
fn rejected_kill(pid: u32, os_error: Option<i32>) -> ProcessError {
    match os_error {
        Some(WIN_ACCESS_DENIED) => ProcessError::AccessDenied(pid),
        _ => ProcessError::Other {
            pid,
            reason: "termination request rejected".to_string(),
        },
    }
}
