use serde::Serialize;
use tauri::{AppHandle, Emitter, State};
use tokio::sync::mpsc::unbounded_channel;

use crate::backend::Backend;
use crate::config::DEFAULT_CONFIG;
use crate::file_cleaner::ScanResult;
use crate::memory_optimizer::MemoryOptimizationResult;
use crate::process_supervisor::ProcessRecord;
use crate::system_info::{DiskRecord, SystemSnapshot};

pub const DELETE_PROGRESS_EVENT: &str = "delete-progress";
pub const SCAN_PROGRESS_EVENT: &str = "scan-progress";

struct AppState {
    backend: Backend,
}

/// Relay everything from `rx` to the UI as `event` until the sender closes.
fn forward_events<T>(
    app: AppHandle,
    event: &'static str,
    mut rx: tokio::sync::mpsc::UnboundedReceiver<T>,
) -> tauri::async_runtime::JoinHandle<()>
where
    T: Serialize + Clone + Send + 'static,
{
    tauri::async_runtime::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if let Err(e) = app.emit(event, payload) {
                log::warn!("failed to emit {}: {}", event, e);
            }
        }
    })
}

#[tauri::command]
async fn scan_temp_files(app: AppHandle, state: State<'_, AppState>) -> Result<ScanResult, String> {
    let (tx, rx) = unbounded_channel();
    let relay = forward_events(app, SCAN_PROGRESS_EVENT, rx);
    let result = state.backend.scan_temp_files(Some(tx)).await;
    let _ = relay.await;
    result.map_err(|e| e.to_string())
}

#[tauri::command]
async fn delete_temp_files(
    app: AppHandle,
    state: State<'_, AppState>,
    paths: Vec<String>,
) -> Result<u64, String> {
    let (tx, rx) = unbounded_channel();
    let relay = forward_events(app, DELETE_PROGRESS_EVENT, rx);
    let result = state.backend.delete_temp_files(paths, tx).await;
    // Drain so the terminal 100% event reaches the UI before the reply
    let _ = relay.await;
    result.map(|outcome| outcome.freed_bytes).map_err(|e| e.to_string())
}

#[tauri::command]
fn cancel_delete(state: State<'_, AppState>) -> bool {
    state.backend.cancel_delete()
}

#[tauri::command]
fn open_folder_location(path: String) -> Result<(), String> {
    let target = Backend::reveal_target(&path).map_err(|e| e.to_string())?;
    tauri_plugin_opener::reveal_item_in_dir(&target).map_err(|e| e.to_string())
}

#[tauri::command]
async fn get_system_info(state: State<'_, AppState>) -> Result<SystemSnapshot, String> {
    state.backend.get_system_info().await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn get_disk_info(state: State<'_, AppState>) -> Result<Vec<DiskRecord>, String> {
    state.backend.get_disk_info().await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn get_processes(state: State<'_, AppState>) -> Result<Vec<ProcessRecord>, String> {
    Ok(state.backend.get_processes().await)
}

#[tauri::command]
async fn kill_process(state: State<'_, AppState>, pid: u32) -> Result<(), String> {
    state.backend.kill_process(pid).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn optimize_memory(state: State<'_, AppState>) -> Result<MemoryOptimizationResult, String> {
    state.backend.optimize_memory().await.map_err(|e| e.to_string())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let backend = Backend::new(DEFAULT_CONFIG.clone());

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .manage(AppState { backend })
        .invoke_handler(tauri::generate_handler![
            scan_temp_files,
            delete_temp_files,
            cancel_delete,
            open_folder_location,
            get_system_info,
            get_disk_info,
            get_processes,
            kill_process,
            optimize_memory
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
