//! Tickets: the data model, id allocation and the in-memory store.

pub mod id;
pub mod store;

use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::{TicketId, UserId};

pub use id::{CounterIdGenerator, IdGenerator, RandomIdGenerator};
pub use store::TicketStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TicketStatus {
    Pending,
    Processing,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "Pending",
            TicketStatus::Processing => "Processing",
            TicketStatus::Closed => "Closed",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, TicketStatus::Closed)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub speaker: String,
    pub content: String,
    pub at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct Ticket {
    pub id: TicketId,
    pub status: TicketStatus,
    pub owner_id: UserId,
    /// Owner's handle as it was when the ticket was created. Never re-synced.
    pub owner_handle: Option<String>,
    pub created_at: DateTime<Utc>,
    pub transcript: Vec<TranscriptEntry>,
}

impl Ticket {
    fn new(id: TicketId, owner_id: UserId, owner_handle: Option<String>) -> Self {
        Self {
            id,
            status: TicketStatus::Pending,
            owner_id,
            owner_handle,
            created_at: Utc::now(),
            transcript: Vec::new(),
        }
    }
}

/// Which tickets a `list` request wants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListFilter {
    Open,
    Closed,
}

impl ListFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "open" | "opened" => Some(Self::Open),
            "close" | "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    pub fn matches(&self, status: TicketStatus) -> bool {
        match self {
            ListFilter::Open => !status.is_closed(),
            ListFilter::Closed => status.is_closed(),
        }
    }
}

/// Ticket-domain failures. None of these are process-level faults; the desk
/// turns each one into a short notice for whoever asked.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TicketError {
    #[error("ticket not found: {0}")]
    NotFound(TicketId),

    #[error("user already has an active ticket: {0}")]
    DuplicateActiveTicket(TicketId),

    #[error("ticket {0} is already closed")]
    AlreadyClosed(TicketId),

    #[error("ticket {0} is not closed")]
    TicketNotClosed(TicketId),

    #[error("ticket {0} is closed")]
    TicketClosed(TicketId),

    #[error("no recipient found")]
    NoRecipientFound,

    #[error("could not allocate a unique ticket id after {0} attempts")]
    IdSpaceExhausted(usize),
}
