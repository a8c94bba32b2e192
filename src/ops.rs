use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

pub type OperationId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    FileScan,
    FileClean,
    MemOptimize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpState {
    pub id: OperationId,
    pub kind: OperationKind,
    pub started_at_ms: u128,
    pub cancellable: bool,
}

struct ActiveOp {
    state: OpState,
    token: CancellationToken,
}

/// Single-permit guard for one class of operation.
///
/// Holding an [`OpGuard`] is the only way to run the guarded operation, so
/// "at most one in flight" holds for every caller sharing the slot.
#[derive(Clone)]
pub struct OperationSlot {
    kind: OperationKind,
    permit: Arc<Semaphore>,
    active: Arc<Mutex<Option<ActiveOp>>>,
}

impl OperationSlot {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            permit: Arc::new(Semaphore::new(1)),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Claim the slot if it is free. Returns `None` while another operation holds it.
    pub fn try_begin(&self, cancellable: bool) -> Option<OpGuard> {
        let permit = Arc::clone(&self.permit).try_acquire_owned().ok()?;
        Some(self.install(permit, cancellable))
    }

    /// Wait for the slot, queueing behind the current holder.
    pub async fn begin(&self, cancellable: bool) -> OpGuard {
        let permit = Arc::clone(&self.permit)
            .acquire_owned()
            .await
            .expect("operation semaphore is never closed");
        self.install(permit, cancellable)
    }

    fn install(&self, permit: OwnedSemaphorePermit, cancellable: bool) -> OpGuard {
        let id = uuid::Uuid::new_v4().to_string();
        let token = CancellationToken::new();
        let state = OpState {
            id: id.clone(),
            kind: self.kind,
            started_at_ms: now_ms(),
            cancellable,
        };
        if let Ok(mut active) = self.active.lock() {
            *active = Some(ActiveOp {
                state,
                token: token.clone(),
            });
        }
        OpGuard {
            id,
            token,
            started: Instant::now(),
            active: Arc::clone(&self.active),
            _permit: permit,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.permit.available_permits() == 0
    }

    pub fn current(&self) -> Option<OpState> {
        self.active
            .lock()
            .ok()
            .and_then(|active| active.as_ref().map(|op| op.state.clone()))
    }

    /// Request cancellation of the running operation. Returns false when idle
    /// or when the running operation cannot be cancelled.
    pub fn cancel(&self) -> bool {
        match self.active.lock() {
            Ok(active) => match active.as_ref() {
                Some(op) if op.state.cancellable => {
                    op.token.cancel();
                    true
                }
                _ => false,
            },
            Err(_) => false,
        }
    }
}

pub struct OpGuard {
    id: OperationId,
    token: CancellationToken,
    started: Instant,
    active: Arc<Mutex<Option<ActiveOp>>>,
    _permit: OwnedSemaphorePermit,
}

impl OpGuard {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }
}

impl Drop for OpGuard {
    fn drop(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            let ours = active
                .as_ref()
                .map(|op| op.state.id == self.id)
                .unwrap_or(false);
            if ours {
                *active = None;
            }
        }
    }
}

fn now_ms() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}
