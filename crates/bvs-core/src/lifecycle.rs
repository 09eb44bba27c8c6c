//! Ticket lifecycle: `Pending -> Processing -> Closed`, and `Closed -> Processing`
//! on reopen. No other transitions exist.
//!
//! These functions only touch the store. Notifying the owner is the caller's
//! job and must not happen while a guard violation is being reported.

use crate::{
    domain::{TicketId, UserProfile},
    ticket::{Ticket, TicketError, TicketStatus, TicketStore},
};

/// Open a new ticket for `profile`, unless one is already active.
pub fn create(store: &mut TicketStore, profile: &UserProfile) -> Result<Ticket, TicketError> {
    let ticket = store.create_ticket(profile.id, profile.handle.clone())?;
    tracing::info!(ticket_id = %ticket.id, user_id = profile.id.0, "ticket created");
    Ok(ticket)
}

/// The user's active ticket, creating one when there is none.
///
/// Returns the ticket id and whether it was created by this call.
pub fn ensure_active(
    store: &mut TicketStore,
    profile: &UserProfile,
) -> Result<(TicketId, bool), TicketError> {
    if let Some(id) = store.active_ticket(profile.id).cloned() {
        let open = store.get(&id).is_ok_and(|t| !t.status.is_closed());
        if open {
            return Ok((id, false));
        }
        // Index out of step with the ticket table; repair rather than block the user.
        tracing::warn!(ticket_id = %id, user_id = profile.id.0, "stale active ticket entry dropped");
        store.clear_active(profile.id, &id);
    }
    create(store, profile).map(|t| (t.id, true))
}

/// Status a ticket will have once an inbound user message is accepted.
pub fn status_after_inbound(status: TicketStatus) -> TicketStatus {
    match status {
        TicketStatus::Pending => TicketStatus::Processing,
        other => other,
    }
}

/// Apply `Pending -> Processing` for an accepted inbound message.
///
/// Idempotent; returns whether the transition fired.
pub fn record_inbound(store: &mut TicketStore, id: &TicketId) -> Result<bool, TicketError> {
    let current = store.get(id)?.status;
    if current != TicketStatus::Pending {
        return Ok(false);
    }
    store.set_status(id, TicketStatus::Processing)?;
    tracing::debug!(ticket_id = %id, "ticket moved to processing");
    Ok(true)
}

/// Close a ticket and free the owner's active slot.
pub fn close(store: &mut TicketStore, id: &TicketId) -> Result<Ticket, TicketError> {
    let ticket = store.get(id)?;
    if ticket.status.is_closed() {
        return Err(TicketError::AlreadyClosed(id.clone()));
    }
    let owner = ticket.owner_id;

    store.set_status(id, TicketStatus::Closed)?;
    store.clear_active(owner, id);
    tracing::info!(ticket_id = %id, user_id = owner.0, "ticket closed");

    store.get(id).cloned()
}

/// Reopen a closed ticket. It always reclaims the owner's active slot.
pub fn reopen(store: &mut TicketStore, id: &TicketId) -> Result<Ticket, TicketError> {
    let ticket = store.get(id)?;
    if !ticket.status.is_closed() {
        return Err(TicketError::TicketNotClosed(id.clone()));
    }
    let owner = ticket.owner_id;

    store.set_status(id, TicketStatus::Processing)?;
    if let Some(displaced) = store.active_ticket(owner).filter(|a| *a != id) {
        tracing::info!(ticket_id = %id, displaced = %displaced, "reopen reclaims active slot");
    }
    store.set_active(owner, id.clone());
    tracing::info!(ticket_id = %id, user_id = owner.0, "ticket reopened");

    store.get(id).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::UserId, ticket::CounterIdGenerator};

    fn store() -> TicketStore {
        TicketStore::new(Box::new(CounterIdGenerator::new("BV-", 4)))
    }

    fn user(id: i64) -> UserProfile {
        UserProfile::new(UserId(id), Some(format!("u{id}")), Some(format!("User {id}")))
    }

    /// Active entry present iff that ticket is not closed.
    fn assert_index_consistent(s: &TicketStore, owner: UserId) {
        match s.active_ticket(owner) {
            Some(id) => assert!(!s.get(id).unwrap().status.is_closed()),
            None => {
                if let Some(last) = s.tickets_of(owner).last() {
                    assert!(s.get(last).unwrap().status.is_closed());
                }
            }
        }
    }

    #[test]
    fn duplicate_create_reports_existing() {
        let mut s = store();
        let t = create(&mut s, &user(1)).unwrap();
        assert_eq!(
            create(&mut s, &user(1)).unwrap_err(),
            TicketError::DuplicateActiveTicket(t.id)
        );
    }

    #[test]
    fn first_inbound_fires_once() {
        let mut s = store();
        let t = create(&mut s, &user(1)).unwrap();
        assert!(record_inbound(&mut s, &t.id).unwrap());
        assert!(!record_inbound(&mut s, &t.id).unwrap());
        assert!(!record_inbound(&mut s, &t.id).unwrap());
        assert_eq!(s.get(&t.id).unwrap().status, TicketStatus::Processing);
    }

    #[test]
    fn close_twice_is_already_closed_both_times() {
        let mut s = store();
        let t = create(&mut s, &user(1)).unwrap();
        close(&mut s, &t.id).unwrap();
        for _ in 0..2 {
            assert_eq!(
                close(&mut s, &t.id).unwrap_err(),
                TicketError::AlreadyClosed(t.id.clone())
            );
            assert_eq!(s.get(&t.id).unwrap().status, TicketStatus::Closed);
        }
        assert_index_consistent(&s, UserId(1));
    }

    #[test]
    fn reopen_open_ticket_is_rejected_without_change() {
        let mut s = store();
        let t = create(&mut s, &user(1)).unwrap();
        assert_eq!(
            reopen(&mut s, &t.id).unwrap_err(),
            TicketError::TicketNotClosed(t.id.clone())
        );
        assert_eq!(s.get(&t.id).unwrap().status, TicketStatus::Pending);
        assert_eq!(s.active_ticket(UserId(1)), Some(&t.id));
    }

    #[test]
    fn close_then_message_opens_fresh_ticket() {
        let mut s = store();
        let t1 = create(&mut s, &user(1)).unwrap();
        close(&mut s, &t1.id).unwrap();
        assert!(s.active_ticket(UserId(1)).is_none());

        let (t2, created) = ensure_active(&mut s, &user(1)).unwrap();
        assert!(created);
        assert_ne!(t1.id, t2);
        assert_eq!(s.tickets_of(UserId(1)), &[t1.id, t2]);
        assert_index_consistent(&s, UserId(1));
    }

    #[test]
    fn ensure_active_reuses_open_ticket() {
        let mut s = store();
        let t = create(&mut s, &user(1)).unwrap();
        let (again, created) = ensure_active(&mut s, &user(1)).unwrap();
        assert!(!created);
        assert_eq!(again, t.id);
    }

    #[test]
    fn reopen_reclaims_slot_and_close_of_displaced_keeps_it() {
        let mut s = store();
        let t1 = create(&mut s, &user(1)).unwrap();
        close(&mut s, &t1.id).unwrap();
        let t2 = create(&mut s, &user(1)).unwrap();

        let reopened = reopen(&mut s, &t1.id).unwrap();
        assert_eq!(reopened.status, TicketStatus::Processing);
        assert_eq!(s.active_ticket(UserId(1)), Some(&t1.id));

        close(&mut s, &t2.id).unwrap();
        assert_eq!(s.active_ticket(UserId(1)), Some(&t1.id));
        assert_index_consistent(&s, UserId(1));
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let mut s = store();
        let id = TicketId::from("BV-none");
        assert_eq!(close(&mut s, &id).unwrap_err(), TicketError::NotFound(id.clone()));
        assert_eq!(reopen(&mut s, &id).unwrap_err(), TicketError::NotFound(id.clone()));
        assert_eq!(record_inbound(&mut s, &id).unwrap_err(), TicketError::NotFound(id));
    }
}
