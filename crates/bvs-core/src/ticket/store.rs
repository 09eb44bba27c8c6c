use std::collections::{BTreeSet, HashMap};

use chrono::Utc;

use crate::domain::{MessageId, TicketId, UserId};

use super::{IdGenerator, ListFilter, Ticket, TicketError, TicketStatus, TranscriptEntry};

const MAX_ID_ATTEMPTS: usize = 64;

/// Authoritative in-memory record of every ticket.
///
/// Owns the ticket table, the active-ticket index, per-owner history and the
/// relay bindings. Every mutation goes through a method here; nothing else
/// holds references into these tables across an await point.
pub struct TicketStore {
    ids: Box<dyn IdGenerator>,
    tickets: HashMap<TicketId, Ticket>,
    /// Creation order, for listings.
    order: Vec<TicketId>,
    active: HashMap<UserId, TicketId>,
    history: HashMap<UserId, Vec<TicketId>>,
    /// Owners in order of their first ticket.
    owner_order: Vec<UserId>,
    relay: HashMap<MessageId, TicketId>,
}

impl TicketStore {
    pub fn new(ids: Box<dyn IdGenerator>) -> Self {
        Self {
            ids,
            tickets: HashMap::new(),
            order: Vec::new(),
            active: HashMap::new(),
            history: HashMap::new(),
            owner_order: Vec::new(),
            relay: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Allocate a fresh `Pending` ticket and make it the owner's active one.
    pub fn create_ticket(
        &mut self,
        owner: UserId,
        owner_handle: Option<String>,
    ) -> Result<Ticket, TicketError> {
        if let Some(existing) = self.active.get(&owner) {
            return Err(TicketError::DuplicateActiveTicket(existing.clone()));
        }

        let id = self.allocate_id()?;
        let ticket = Ticket::new(id.clone(), owner, owner_handle);

        self.tickets.insert(id.clone(), ticket.clone());
        self.order.push(id.clone());
        self.active.insert(owner, id.clone());
        let owned = self.history.entry(owner).or_default();
        if owned.is_empty() {
            self.owner_order.push(owner);
        }
        owned.push(id);

        Ok(ticket)
    }

    /// Undo a `create_ticket` whose ticket never carried a message.
    ///
    /// Only the newest ticket of its owner with an empty transcript can be
    /// discarded; anything else is left alone and reported as `false`.
    pub fn discard_unused(&mut self, id: &TicketId) -> bool {
        let Some(ticket) = self.tickets.get(id) else {
            return false;
        };
        let owner = ticket.owner_id;
        let newest = self.tickets_of(owner).last() == Some(id);
        if !ticket.transcript.is_empty() || !newest {
            return false;
        }

        self.tickets.remove(id);
        self.order.retain(|t| t != id);
        self.clear_active(owner, id);
        if let Some(owned) = self.history.get_mut(&owner) {
            owned.pop();
            if owned.is_empty() {
                self.history.remove(&owner);
                self.owner_order.retain(|o| *o != owner);
            }
        }
        true
    }

    fn allocate_id(&mut self) -> Result<TicketId, TicketError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = self.ids.next_id();
            if !self.tickets.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        Err(TicketError::IdSpaceExhausted(MAX_ID_ATTEMPTS))
    }

    pub fn get(&self, id: &TicketId) -> Result<&Ticket, TicketError> {
        self.tickets
            .get(id)
            .ok_or_else(|| TicketError::NotFound(id.clone()))
    }

    /// Append to a ticket's transcript. Unknown tickets are ignored.
    pub fn append_transcript(&mut self, id: &TicketId, speaker: &str, content: &str) {
        let Some(ticket) = self.tickets.get_mut(id) else {
            tracing::debug!(ticket_id = %id, "transcript append for unknown ticket ignored");
            return;
        };
        ticket.transcript.push(TranscriptEntry {
            speaker: speaker.to_string(),
            content: content.to_string(),
            at: Utc::now(),
        });
    }

    pub fn set_status(&mut self, id: &TicketId, status: TicketStatus) -> Result<(), TicketError> {
        let ticket = self
            .tickets
            .get_mut(id)
            .ok_or_else(|| TicketError::NotFound(id.clone()))?;
        ticket.status = status;
        Ok(())
    }

    pub fn active_ticket(&self, owner: UserId) -> Option<&TicketId> {
        self.active.get(&owner)
    }

    pub fn set_active(&mut self, owner: UserId, id: TicketId) {
        self.active.insert(owner, id);
    }

    /// Drop the owner's active entry if (and only if) it points at `id`.
    pub fn clear_active(&mut self, owner: UserId, id: &TicketId) -> bool {
        if self.active.get(&owner) == Some(id) {
            self.active.remove(&owner);
            return true;
        }
        false
    }

    /// All tickets ever created by `owner`, oldest first.
    pub fn tickets_of(&self, owner: UserId) -> &[TicketId] {
        self.history
            .get(&owner)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Record which ticket a staff-channel message represents.
    ///
    /// Bindings are written once; a second write for the same message id is
    /// ignored and reported as `false`.
    pub fn bind_relay(&mut self, message_id: MessageId, ticket: TicketId) -> bool {
        if let Some(existing) = self.relay.get(&message_id) {
            tracing::warn!(
                message_id = message_id.0,
                ticket_id = %existing,
                "relay binding already present; keeping first"
            );
            return false;
        }
        self.relay.insert(message_id, ticket);
        true
    }

    pub fn ticket_for_relay(&self, message_id: MessageId) -> Option<&TicketId> {
        self.relay.get(&message_id)
    }

    pub fn relay_binding_count(&self) -> usize {
        self.relay.len()
    }

    /// Every distinct user that has ever created a ticket.
    pub fn owners(&self) -> BTreeSet<UserId> {
        self.owner_order.iter().copied().collect()
    }

    /// Owners of every ticket whose snapshotted handle matches, ignoring case.
    pub fn owners_with_handle(&self, handle: &str) -> BTreeSet<UserId> {
        let wanted = handle.trim_start_matches('@').to_lowercase();
        if wanted.is_empty() {
            return BTreeSet::new();
        }
        self.tickets
            .values()
            .filter(|t| {
                t.owner_handle
                    .as_deref()
                    .is_some_and(|h| h.to_lowercase() == wanted)
            })
            .map(|t| t.owner_id)
            .collect()
    }

    pub fn tickets_with_status(&self, filter: ListFilter) -> Vec<&Ticket> {
        self.order
            .iter()
            .filter_map(|id| self.tickets.get(id))
            .filter(|t| filter.matches(t.status))
            .collect()
    }

    /// One row per owner, in order of first contact, with the handle from
    /// that owner's first ticket.
    pub fn user_directory(&self) -> Vec<(UserId, Option<String>)> {
        self.owner_order
            .iter()
            .map(|owner| {
                let handle = self
                    .tickets_of(*owner)
                    .first()
                    .and_then(|id| self.tickets.get(id))
                    .and_then(|t| t.owner_handle.clone());
                (*owner, handle)
            })
            .collect()
    }
}
