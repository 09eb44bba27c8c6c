//! Append-only audit trail of ticket activity.

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::{
    domain::{TicketId, UserId},
    errors::Error,
    formatting::truncate_chars,
    Result,
};

const AUDIT_MAX_TEXT: usize = 500;

#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEvent {
    fn base(event: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event: event.to_string(),
            ticket_id: None,
            user_id: None,
            username: None,
            content: None,
            target: None,
            delivered: None,
            failed: None,
            error: None,
        }
    }

    pub fn ticket_created(ticket: &TicketId, user: UserId, username: Option<&str>) -> Self {
        Self {
            ticket_id: Some(ticket.to_string()),
            user_id: Some(user.0),
            username: username.map(|s| s.to_string()),
            ..Self::base("ticket_created")
        }
    }

    pub fn user_message(ticket: &TicketId, user: UserId, content: &str) -> Self {
        Self {
            ticket_id: Some(ticket.to_string()),
            user_id: Some(user.0),
            content: Some(content.to_string()),
            ..Self::base("user_message")
        }
    }

    pub fn staff_reply(ticket: &TicketId, content: &str) -> Self {
        Self {
            ticket_id: Some(ticket.to_string()),
            content: Some(content.to_string()),
            ..Self::base("staff_reply")
        }
    }

    pub fn ticket_closed(ticket: &TicketId, owner: UserId) -> Self {
        Self {
            ticket_id: Some(ticket.to_string()),
            user_id: Some(owner.0),
            ..Self::base("ticket_closed")
        }
    }

    pub fn ticket_reopened(ticket: &TicketId, owner: UserId) -> Self {
        Self {
            ticket_id: Some(ticket.to_string()),
            user_id: Some(owner.0),
            ..Self::base("ticket_reopened")
        }
    }

    pub fn broadcast(target: &str, content: &str, delivered: usize, failed: usize) -> Self {
        Self {
            target: Some(target.to_string()),
            content: Some(content.to_string()),
            delivered: Some(delivered),
            failed: Some(failed),
            ..Self::base("broadcast")
        }
    }

    pub fn delivery_failure(ticket: Option<&TicketId>, user: Option<UserId>, error: &str) -> Self {
        Self {
            ticket_id: ticket.map(|t| t.to_string()),
            user_id: user.map(|u| u.0),
            error: Some(error.to_string()),
            ..Self::base("delivery_failure")
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuditLogger {
    path: PathBuf,
    json: bool,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, mut event: AuditEvent) -> Result<()> {
        if let Some(s) = &event.content {
            event.content = Some(truncate_chars(s, AUDIT_MAX_TEXT));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(&event)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        // Plain text format for readability.
        let mut out = String::new();
        out.push('\n');
        out.push_str(&"=".repeat(60));

        let value = serde_json::to_value(&event)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::External(
                "audit event is not a JSON object".to_string(),
            ));
        };
        for (k, v) in obj {
            out.push('\n');
            out.push_str(k);
            out.push_str(": ");
            match v {
                serde_json::Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
        }
        out.push('\n');

        file.write_all(out.as_bytes())?;
        Ok(())
    }

    /// Write, logging instead of failing. Audit problems never block a relay.
    pub fn record(&self, event: AuditEvent) {
        let kind = event.event.clone();
        if let Err(e) = self.write(event) {
            tracing::warn!(event = %kind, error = %e, "audit write failed");
        }
    }
}
