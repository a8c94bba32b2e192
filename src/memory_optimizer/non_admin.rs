// src/memory_optimizer/non_admin.rs

/// Steps any user may run. Returns labels of the ones that took effect.
pub(crate) fn run_steps() -> Vec<String> {
    let mut performed = Vec::new();

    #[cfg(unix)]
    {
        // Flush dirty pages so the page cache becomes reclaimable
        unsafe { libc::sync() };
        performed.push("Flushed dirty pages to disk".to_string());
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    {
        if unsafe { libc::malloc_trim(0) } == 1 {
            performed.push("Returned free heap pages to the OS".to_string());
        }
    }

    #[cfg(windows)]
    {
        let trimmed = trim_working_sets();
        if trimmed > 0 {
            performed.push(format!("Trimmed working sets of {} processes", trimmed));
        }
    }

    performed
}

#[cfg(windows)]
fn trim_working_sets() -> usize {
    use sysinfo::System;
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::processthreadsapi::OpenProcess;
    use winapi::um::psapi::EmptyWorkingSet;
    use winapi::um::winnt::{PROCESS_QUERY_INFORMATION, PROCESS_SET_QUOTA};

    let mut system = System::new();
    system.refresh_processes();

    let mut trimmed = 0;
    for pid in system.processes().keys() {
        let raw = pid.as_u32();
        // Idle and System
        if raw == 0 || raw == 4 {
            continue;
        }
        unsafe {
            let handle = OpenProcess(PROCESS_SET_QUOTA | PROCESS_QUERY_INFORMATION, 0, raw);
            if handle.is_null() {
                continue;
            }
            if EmptyWorkingSet(handle) != 0 {
                trimmed += 1;
            }
            CloseHandle(handle);
        }
    }
    trimmed
}
