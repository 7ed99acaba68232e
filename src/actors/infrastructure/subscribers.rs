use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::audit::AuditLog;
use crate::cache::AlumniSummaryCache;
use crate::error::AppError;
use crate::event_sourcing::OutboxMessage;

// ============================================================================
// Outbox Subscribers
// ============================================================================
//
// Each subscriber gets every message it accepts. Delivery is at-least-once,
// so handlers must tolerate seeing a message twice.
//
// ============================================================================

#[async_trait]
pub trait OutboxSubscriber: Send + Sync {
    fn name(&self) -> &'static str;

    fn accepts(&self, _message: &OutboxMessage) -> bool {
        true
    }

    async fn handle(&self, message: &OutboxMessage) -> Result<()>;
}

/// Writes every event to the audit log
pub struct AuditTrail {
    audit: Arc<AuditLog>,
}

impl AuditTrail {
    pub fn new(audit: Arc<AuditLog>) -> Self {
        Self { audit }
    }
}

#[async_trait]
impl OutboxSubscriber for AuditTrail {
    fn name(&self) -> &'static str {
        "audit_trail"
    }

    async fn handle(&self, message: &OutboxMessage) -> Result<()> {
        if !self.audit.record(message).await? {
            tracing::debug!(message_id = %message.id, "Audit entry already written");
        }
        Ok(())
    }
}

/// Rebuilds the alumni summary when the profile or the wallet changes
pub struct SummaryRefresh {
    cache: Arc<AlumniSummaryCache>,
}

impl SummaryRefresh {
    pub fn new(cache: Arc<AlumniSummaryCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl OutboxSubscriber for SummaryRefresh {
    fn name(&self) -> &'static str {
        "summary_refresh"
    }

    fn accepts(&self, message: &OutboxMessage) -> bool {
        matches!(message.aggregate_type.as_str(), "Alumni" | "Wallet")
    }

    async fn handle(&self, message: &OutboxMessage) -> Result<()> {
        // Wallet ids are alumni ids
        let alumni_id = message.aggregate_id;
        self.cache.invalidate(alumni_id).await;

        match self.cache.rebuild(alumni_id).await {
            Ok(_) => Ok(()),
            // A wallet opened before its alumni registered has nothing to show yet
            Err(AppError::NotFound { .. }) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
