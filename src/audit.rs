/// Audit Trail
///
/// Structured records of security-relevant events (logins, session renewal and
/// rejection, logout) and inventory mutations. Entries are emitted as `tracing`
/// events so they land in the same JSON log stream as everything else.
/// Never put passwords or raw tokens in an entry; use `tokens::fingerprint`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    Success,
    Failure,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "SUCCESS",
            AuditStatus::Failure => "FAILURE",
        }
    }
}

/// One audit trail entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditLog {
    pub log_id: String,
    pub timestamp: DateTime<Utc>,
    /// LOGIN, LOGOUT, AUTHORIZE, RENEW, REGISTER, STOCK, UNSTOCK, ...
    pub action: &'static str,
    /// session, user, product, warehouse, stock
    pub resource_type: &'static str,
    pub resource_id: Option<String>,
    pub user: Option<String>,
    pub status: AuditStatus,
    pub message: String,
}

impl AuditLog {
    pub fn new(
        action: &'static str,
        resource_type: &'static str,
        status: AuditStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            log_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action,
            resource_type,
            resource_id: None,
            user: None,
            status,
            message: message.into(),
        }
    }

    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Emit the entry; failures at `warn`, everything else at `info`
    pub fn record(&self) {
        match self.status {
            AuditStatus::Failure => tracing::warn!(
                log_id = %self.log_id,
                action = self.action,
                resource_type = self.resource_type,
                resource_id = ?self.resource_id,
                user = ?self.user,
                status = self.status.as_str(),
                message = %self.message,
                "Audit log entry"
            ),
            AuditStatus::Success => tracing::info!(
                log_id = %self.log_id,
                action = self.action,
                resource_type = self.resource_type,
                resource_id = ?self.resource_id,
                user = ?self.user,
                status = self.status.as_str(),
                message = %self.message,
                "Audit log entry"
            ),
        }
    }
}
