//! Auto-save — debounced background writer for image-plan drawings.
//!
//! DESIGN
//! ======
//! Every modification on an image plan hands the current drawing snapshot to
//! a worker over a bounded queue. The worker keeps only the newest snapshot
//! and writes it once the queue has been quiet for the debounce period, so a
//! burst of edits costs a single request. Writes are serialized; the last
//! snapshot written always wins.
//!
//! ERROR HANDLING
//! ==============
//! Retryable failures are retried with linear back-off. A snapshot that still
//! fails is dropped with a warning; the next modification carries the full
//! drawing again, so nothing is lost beyond the failed write itself.

use std::sync::Arc;
use std::time::Duration;

use plan_canvas::doc::DrawingSnapshot;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::gateway::PlanStore;

const AUTOSAVE_QUEUE_CAPACITY: usize = 16;
const AUTOSAVE_RETRIES: usize = 3;
const AUTOSAVE_RETRY_BASE_MS: u64 = 50;

/// Sending side of a running auto-save worker.
pub struct AutoSave {
    tx: mpsc::Sender<DrawingSnapshot>,
    worker: JoinHandle<()>,
}

impl AutoSave {
    /// Queue a snapshot for the next debounced write.
    ///
    /// Non-blocking. Returns `false` if the snapshot was dropped.
    pub fn request(&self, snapshot: DrawingSnapshot) -> bool {
        match self.tx.try_send(snapshot) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("autosave queue full; dropping snapshot");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!("autosave worker stopped; dropping snapshot");
                false
            }
        }
    }

    /// Close the queue and wait for the pending snapshot to be written.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            warn!(error = %e, "autosave worker ended abnormally");
        }
    }
}

/// Spawn the auto-save worker for one plan.
#[must_use]
pub fn spawn_autosave_worker(store: Arc<dyn PlanStore>, plan_id: i64, debounce: Duration) -> AutoSave {
    let (tx, mut rx) = mpsc::channel::<DrawingSnapshot>(AUTOSAVE_QUEUE_CAPACITY);
    info!(plan_id, ?debounce, "autosave worker configured");

    let worker = tokio::spawn(async move {
        while let Some(first) = rx.recv().await {
            let mut latest = first;
            let mut closed = false;
            loop {
                match tokio::time::timeout(debounce, rx.recv()).await {
                    Ok(Some(next)) => latest = next,
                    Ok(None) => {
                        closed = true;
                        break;
                    }
                    Err(_) => break,
                }
            }
            save_with_retry(store.as_ref(), plan_id, &latest).await;
            if closed {
                break;
            }
        }
    });

    AutoSave { tx, worker }
}

async fn save_with_retry(store: &dyn PlanStore, plan_id: i64, snapshot: &DrawingSnapshot) {
    let count = snapshot.objects.len();
    for attempt in 1..=AUTOSAVE_RETRIES {
        match store.save_drawing(plan_id, snapshot).await {
            Ok(()) => {
                info!(plan_id, count, "drawing auto-saved");
                return;
            }
            Err(e) if e.retryable() && attempt < AUTOSAVE_RETRIES => {
                warn!(error = %e, attempt, total = AUTOSAVE_RETRIES, plan_id, "auto-save failed; retrying");
                tokio::time::sleep(Duration::from_millis((attempt as u64) * AUTOSAVE_RETRY_BASE_MS)).await;
            }
            Err(e) => {
                warn!(error = %e, plan_id, count, "auto-save failed; dropping snapshot");
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "autosave_test.rs"]
mod tests;
