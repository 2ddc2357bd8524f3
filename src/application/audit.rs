//! Best-effort click audit pipeline.
//!
//! Click handling must never wait on the audit trail, so records are pushed
//! through a bounded channel to a single writer task. Delivery is at most
//! once: a full queue drops the record, a failed write is logged and
//! swallowed, and records still queued at process exit are lost.

use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::application::repos::ClickAuditRepo;
use crate::domain::entities::ClickAuditRecord;

/// Sending half of the audit pipeline; cheap to clone into request state.
#[derive(Clone)]
pub struct ClickAudit {
    tx: mpsc::Sender<ClickAuditRecord>,
}

impl ClickAudit {
    /// Start the writer task and return the handle used to enqueue records.
    pub fn spawn(repo: Arc<dyn ClickAuditRepo>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(write_records(repo, rx));
        (Self { tx }, worker)
    }

    /// Enqueue a record without blocking. Overflow drops the record.
    pub fn record(&self, record: ClickAuditRecord) {
        match self.tx.try_send(record) {
            Ok(()) => {
                counter!("dealstack_click_audit_enqueued_total").increment(1);
            }
            Err(TrySendError::Full(record)) => {
                counter!("dealstack_click_audit_dropped_total").increment(1);
                warn!(offer_ref = %record.offer_ref, "audit queue full, dropping click record");
            }
            Err(TrySendError::Closed(record)) => {
                counter!("dealstack_click_audit_dropped_total").increment(1);
                warn!(offer_ref = %record.offer_ref, "audit writer gone, dropping click record");
            }
        }
    }
}

async fn write_records(repo: Arc<dyn ClickAuditRepo>, mut rx: mpsc::Receiver<ClickAuditRecord>) {
    while let Some(record) = rx.recv().await {
        if let Err(error) = repo.append_click(record).await {
            counter!("dealstack_click_audit_failed_total").increment(1);
            warn!(error = %error, "click audit write failed");
        }
    }
}
