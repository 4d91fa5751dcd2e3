//! Pending-operation queue for writes that failed against the remote.
//!
//! Failed creates/updates/deletes are queued and replayed later in their
//! original FIFO order (last writer wins). An `update` or `delete` whose
//! target the server reports as already gone is dropped and recorded as a
//! non-fatal reconciliation notice; any other failure stops the replay and
//! keeps the remaining operations queued for the next attempt.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RemoteError;
use crate::gateway::RemoteDataGateway;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PendingKind {
    Create,
    Update,
    Delete,
}

/// One queued write, stamped when the original attempt failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOperation {
    pub id: Uuid,
    pub kind: PendingKind,
    pub collection: String,
    /// Target row id; `None` for creates.
    pub target_id: Option<String>,
    /// Payload; `None` for deletes.
    pub data: Option<Record>,
    pub queued_at: DateTime<Utc>,
}

impl PendingOperation {
    fn new(
        kind: PendingKind,
        collection: impl Into<String>,
        target_id: Option<String>,
        data: Option<Record>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            collection: collection.into(),
            target_id,
            data,
            queued_at: Utc::now(),
        }
    }

    pub fn create(collection: impl Into<String>, data: Record) -> Self {
        Self::new(PendingKind::Create, collection, None, Some(data))
    }

    pub fn update(collection: impl Into<String>, id: impl Into<String>, patch: Record) -> Self {
        Self::new(PendingKind::Update, collection, Some(id.into()), Some(patch))
    }

    pub fn delete(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(PendingKind::Delete, collection, Some(id.into()), None)
    }
}

/// A queued operation dropped during replay because its target no longer
/// exists server-side. Surfaced as a notice, never as a failure.
#[derive(Debug, Clone)]
pub struct ReconciliationNotice {
    pub operation: PendingOperation,
    pub message: String,
}

/// Outcome of one replay pass.
#[derive(Debug, Default)]
pub struct ReplayReport {
    pub applied: usize,
    pub dropped: Vec<ReconciliationNotice>,
    /// Operations still queued after the pass (non-zero when a failure
    /// stopped the replay early).
    pub remaining: usize,
}

impl ReplayReport {
    pub fn fully_applied(&self) -> bool {
        self.remaining == 0
    }
}

/// FIFO queue of writes awaiting replay.
#[derive(Debug, Default)]
pub struct OfflineQueue {
    operations: VecDeque<PendingOperation>,
}

impl OfflineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operation: PendingOperation) {
        tracing::debug!(
            collection = %operation.collection,
            kind = ?operation.kind,
            "queued pending operation"
        );
        self.operations.push_back(operation);
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingOperation> {
        self.operations.iter()
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }

    /// Replay queued operations in FIFO order against the gateway.
    pub async fn replay(&mut self, gateway: &dyn RemoteDataGateway) -> ReplayReport {
        let mut report = ReplayReport::default();

        while let Some(operation) = self.operations.pop_front() {
            match Self::execute(gateway, &operation).await {
                Ok(()) => {
                    report.applied += 1;
                }
                Err(e) if e.is_not_found() && operation.kind != PendingKind::Create => {
                    // Target vanished server-side: drop and reconcile.
                    let message = format!(
                        "Se descartó una operación pendiente: el registro {} de '{}' ya no existe",
                        operation.target_id.as_deref().unwrap_or("?"),
                        operation.collection
                    );
                    tracing::info!(%message, "dropped stale pending operation");
                    report.dropped.push(ReconciliationNotice { operation, message });
                }
                Err(e) => {
                    // Still failing: put it back and try again another time.
                    tracing::warn!(error = %e, "replay stopped, keeping remaining operations");
                    self.operations.push_front(operation);
                    break;
                }
            }
        }

        report.remaining = self.operations.len();
        tracing::info!(
            applied = report.applied,
            dropped = report.dropped.len(),
            remaining = report.remaining,
            "offline replay finished"
        );
        report
    }

    async fn execute(
        gateway: &dyn RemoteDataGateway,
        operation: &PendingOperation,
    ) -> Result<(), RemoteError> {
        match operation.kind {
            PendingKind::Create => {
                let data = operation.data.clone().unwrap_or_default();
                gateway.create(&operation.collection, data).await.map(|_| ())
            }
            PendingKind::Update => {
                let id = operation.target_id.as_deref().unwrap_or_default();
                let patch = operation.data.clone().unwrap_or_default();
                gateway
                    .update(&operation.collection, id, patch)
                    .await
                    .map(|_| ())
            }
            PendingKind::Delete => {
                let id = operation.target_id.as_deref().unwrap_or_default();
                gateway.delete(&operation.collection, id).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;
    use crate::gateway::MemoryGateway;
    use serde_json::json;

    fn row(id: i64, nombre: &str) -> Record {
        Record::new()
            .with_field("id", json!(id))
            .with_field("nombre", json!(nombre))
    }

    #[tokio::test]
    async fn test_replay_applies_in_fifo_order() {
        let gw = MemoryGateway::new();
        gw.seed("patients", vec![row(1, "Ana")]);

        let mut queue = OfflineQueue::new();
        queue.push(PendingOperation::update(
            "patients",
            "1",
            Record::new().with_field("nombre", json!("Ana María")),
        ));
        queue.push(PendingOperation::create("patients", row(2, "Luis")));

        let report = queue.replay(&gw).await;
        assert_eq!(report.applied, 2);
        assert!(report.fully_applied());
        assert_eq!(gw.rows("patients")[0].get_str("nombre"), Some("Ana María"));
        assert_eq!(gw.rows("patients").len(), 2);
    }

    #[tokio::test]
    async fn test_update_against_gone_target_is_dropped() {
        let gw = MemoryGateway::new();
        gw.seed("patients", vec![row(1, "Ana")]);

        let mut queue = OfflineQueue::new();
        queue.push(PendingOperation::update(
            "patients",
            "99",
            Record::new().with_field("nombre", json!("X")),
        ));
        queue.push(PendingOperation::delete("patients", "1"));

        let report = queue.replay(&gw).await;
        assert_eq!(report.applied, 1);
        assert_eq!(report.dropped.len(), 1);
        assert!(report.dropped[0].message.contains("99"));
        assert!(report.fully_applied());
        assert!(gw.rows("patients").is_empty());
    }

    #[tokio::test]
    async fn test_other_failures_stop_replay_and_keep_tail() {
        let gw = MemoryGateway::new();
        gw.seed("patients", vec![row(1, "Ana")]);
        gw.push_error(RemoteError::new("offline", codes::NETWORK));

        let mut queue = OfflineQueue::new();
        queue.push(PendingOperation::delete("patients", "1"));
        queue.push(PendingOperation::create("patients", row(2, "Luis")));

        let report = queue.replay(&gw).await;
        assert_eq!(report.applied, 0);
        assert_eq!(report.remaining, 2);
        assert!(!report.fully_applied());

        // Next pass succeeds.
        let report = queue.replay(&gw).await;
        assert_eq!(report.applied, 2);
        assert!(queue.is_empty());
    }
}
