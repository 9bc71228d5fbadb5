/// Session audit trail
///
/// Structured entries for login, refresh and revoke. Failures record the
/// precise internal kind (expired, revoked, unknown, ...) which the HTTP
/// layer deliberately hides from clients.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOutcome {
    Success,
    Failure,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "SUCCESS",
            AuditOutcome::Failure => "FAILURE",
        }
    }
}

/// One audit entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditLog {
    pub log_id: String,
    pub timestamp: DateTime<Utc>,
    /// LOGIN, REFRESH, REVOKE, ...
    pub action: String,
    /// session, refresh_token, user
    pub resource_type: String,
    pub user_id: Option<String>,
    pub outcome: AuditOutcome,
    pub failure_kind: Option<&'static str>,
    pub message: String,
}

impl AuditLog {
    pub fn new(action: &str, resource_type: &str, outcome: AuditOutcome, message: &str) -> Self {
        Self {
            log_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            user_id: None,
            outcome,
            failure_kind: None,
            message: message.to_string(),
        }
    }

    pub fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn with_failure(mut self, error: &AuthError) -> Self {
        self.failure_kind = Some(error.kind());
        self
    }

    /// Build the entry for the result of a session operation
    pub fn for_result<T>(
        action: &str,
        resource_type: &str,
        user_id: Option<Uuid>,
        result: &Result<T, AuthError>,
    ) -> Self {
        let entry = match result {
            Ok(_) => AuditLog::new(action, resource_type, AuditOutcome::Success, "completed"),
            Err(e) => AuditLog::new(action, resource_type, AuditOutcome::Failure, &e.to_string())
                .with_failure(e),
        };

        match user_id {
            Some(id) => entry.with_user_id(id),
            None => entry,
        }
    }
}

pub struct AuditLogger;

impl AuditLogger {
    pub fn log(audit_log: &AuditLog) {
        if audit_log.outcome == AuditOutcome::Failure {
            tracing::warn!(
                log_id = %audit_log.log_id,
                action = %audit_log.action,
                resource_type = %audit_log.resource_type,
                user_id = ?audit_log.user_id,
                outcome = audit_log.outcome.as_str(),
                failure_kind = ?audit_log.failure_kind,
                message = %audit_log.message,
                "Audit log entry"
            );
        } else {
            tracing::info!(
                log_id = %audit_log.log_id,
                action = %audit_log.action,
                resource_type = %audit_log.resource_type,
                user_id = ?audit_log.user_id,
                outcome = audit_log.outcome.as_str(),
                "Audit log entry"
            );
        }
    }
}
