//! Audit logging
//!
//! Append-only record of privileged actions. Writes happen synchronously
//! inside the triggering operation: impersonation does not return a token
//! unless its audit entry landed. The sink is a trait so deployments can
//! point it at durable storage and tests can substitute a failing one.

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Kinds of privileged action that are audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Impersonate,
    RolesChanged,
    ActiveChanged,
}

/// Immutable audit record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub target_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl AuditLogEntry {
    pub fn new(actor_id: Uuid, action: AuditAction, target_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id,
            action,
            target_id,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Destination for audit records
///
/// `record` must not report success unless the entry is durably appended;
/// callers treat its failure as a hard error and abort the operation.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditLogEntry) -> Result<(), AppError>;

    async fn entries(&self) -> Vec<AuditLogEntry>;
}

/// In-memory append-only audit log
pub struct AuditLog {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Entries matching one action kind
    pub async fn entries_for_action(&self, action: AuditAction) -> Vec<AuditLogEntry> {
        let entries = self.entries.read().await;
        entries.iter().filter(|e| e.action == action).cloned().collect()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for AuditLog {
    async fn record(&self, entry: AuditLogEntry) -> Result<(), AppError> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }

    async fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_record_appends() {
        let log = AuditLog::new();
        let actor = Uuid::new_v4();
        let target = Uuid::new_v4();

        log.record(AuditLogEntry::new(actor, AuditAction::Impersonate, target))
            .await
            .unwrap();
        log.record(AuditLogEntry::new(actor, AuditAction::RolesChanged, target))
            .await
            .unwrap();

        let entries = log.entries().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, AuditAction::Impersonate);
        assert_eq!(entries[1].action, AuditAction::RolesChanged);
    }

    #[tokio::test]
    async fn test_filter_by_action() {
        let log = AuditLog::new();
        let actor = Uuid::new_v4();

        log.record(AuditLogEntry::new(actor, AuditAction::Impersonate, Uuid::new_v4()))
            .await
            .unwrap();
        log.record(AuditLogEntry::new(actor, AuditAction::ActiveChanged, Uuid::new_v4()))
            .await
            .unwrap();

        let impersonations = log.entries_for_action(AuditAction::Impersonate).await;
        assert_eq!(impersonations.len(), 1);
    }

    #[test]
    fn test_action_wire_form() {
        let entry = AuditLogEntry::new(Uuid::new_v4(), AuditAction::Impersonate, Uuid::new_v4())
            .with_metadata(json!({"targetUsername": "agent"}));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["action"], "IMPERSONATE");
        assert_eq!(value["metadata"]["targetUsername"], "agent");
    }
}
