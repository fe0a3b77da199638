//! Background persistence queue.
//!
//! The extension wrote to storage fire-and-forget from event handlers; the
//! sidecar keeps that shape (callers never await a disk write) but routes
//! every write through one queue with a background task, so writes apply
//! in submission order and a best-effort `flush()` on teardown shrinks the
//! lose-the-last-write window to a deliberate choice instead of an
//! accident.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use super::kv::KvStore;

#[derive(Debug)]
enum WriteOp {
    Set { key: String, value: String },
    Remove { key: String },
    /// Marker: everything enqueued before it has been applied.
    Flush(oneshot::Sender<()>),
}

/// Cheap handle for enqueueing writes. Enqueue failures (task gone during
/// shutdown) are swallowed: persistence here is best-effort by contract.
#[derive(Clone)]
pub struct FlushHandle {
    tx: mpsc::UnboundedSender<WriteOp>,
}

impl FlushHandle {
    pub fn set(&self, key: impl Into<String>, value: String) {
        let key = key.into();
        if self.tx.send(WriteOp::Set { key: key.clone(), value }).is_err() {
            tracing::debug!("Flush task gone, dropping write for {}", key);
        }
    }

    pub fn remove(&self, key: impl Into<String>) {
        let key = key.into();
        if self.tx.send(WriteOp::Remove { key: key.clone() }).is_err() {
            tracing::debug!("Flush task gone, dropping removal of {}", key);
        }
    }

    /// Wait until every previously enqueued write has been applied.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(WriteOp::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

/// Spawn the background task applying writes to the store. A failed write
/// is logged and dropped; there is exactly one attempt per write.
pub fn spawn_flush_task(store: Arc<dyn KvStore>) -> FlushHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<WriteOp>();

    tokio::spawn(async move {
        while let Some(op) = rx.recv().await {
            match op {
                WriteOp::Set { key, value } => {
                    if let Err(e) = store.set(&key, value).await {
                        tracing::warn!("Persist failed for {}: {}", key, e);
                    }
                }
                WriteOp::Remove { key } => {
                    if let Err(e) = store.remove(&key).await {
                        tracing::warn!("Removal failed for {}: {}", key, e);
                    }
                }
                WriteOp::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        tracing::debug!("Flush task stopped");
    });

    FlushHandle { tx }
}
