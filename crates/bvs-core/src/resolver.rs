//! Staff-side addressing: turns a target token into recipient user ids.
//!
//! Token grammar, first match wins:
//! 1. the broadcast marker (`@all`): every owner that ever opened a ticket
//! 2. `PREFIX...` ticket id: that ticket's owner, refused if closed
//! 3. `@handle`: owners of every ticket snapshotted with that handle
//! 4. a raw numeric user id, taken as-is. Anything else resolves to nobody

use std::collections::BTreeSet;

use crate::{
    domain::{TicketId, UserId},
    ticket::{TicketError, TicketStore},
};

pub const HANDLE_MARKER: char = '@';

/// The configurable parts of the token grammar.
#[derive(Clone, Debug)]
pub struct TargetSyntax {
    pub broadcast_marker: String,
    pub ticket_prefix: String,
}

impl TargetSyntax {
    pub fn new(broadcast_marker: impl Into<String>, ticket_prefix: impl Into<String>) -> Self {
        Self {
            broadcast_marker: broadcast_marker.into(),
            ticket_prefix: ticket_prefix.into(),
        }
    }

    pub fn is_ticket_id(&self, token: &str) -> bool {
        token.len() > self.ticket_prefix.len() && token.starts_with(&self.ticket_prefix)
    }
}

/// A classified target token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Broadcast,
    Ticket(TicketId),
    Handle(String),
    User(UserId),
    Unrecognized,
}

pub fn parse_target(token: &str, syntax: &TargetSyntax) -> Target {
    let token = token.trim();
    if token == syntax.broadcast_marker {
        return Target::Broadcast;
    }
    if syntax.is_ticket_id(token) {
        return Target::Ticket(TicketId::from(token));
    }
    if let Some(handle) = token.strip_prefix(HANDLE_MARKER) {
        return Target::Handle(handle.to_string());
    }
    match token.parse::<i64>() {
        Ok(id) => Target::User(UserId(id)),
        Err(_) => Target::Unrecognized,
    }
}

/// Resolve a token to the users a staff message should reach.
///
/// Never mutates the store. An empty set is a valid answer; callers report it
/// as "no recipient".
pub fn resolve(
    token: &str,
    store: &TicketStore,
    syntax: &TargetSyntax,
) -> Result<BTreeSet<UserId>, TicketError> {
    match parse_target(token, syntax) {
        Target::Broadcast => Ok(store.owners()),
        Target::Ticket(id) => {
            let ticket = store.get(&id)?;
            if ticket.status.is_closed() {
                return Err(TicketError::TicketClosed(id));
            }
            Ok(BTreeSet::from([ticket.owner_id]))
        }
        Target::Handle(handle) => Ok(store.owners_with_handle(&handle)),
        Target::User(id) => Ok(BTreeSet::from([id])),
        Target::Unrecognized => Ok(BTreeSet::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::{CounterIdGenerator, TicketStatus};

    fn syntax() -> TargetSyntax {
        TargetSyntax::new("@all", "BV-")
    }

    fn store() -> TicketStore {
        TicketStore::new(Box::new(CounterIdGenerator::new("BV-", 4)))
    }

    #[test]
    fn classification_order() {
        let s = syntax();
        assert_eq!(parse_target("@all", &s), Target::Broadcast);
        // Only the literal marker broadcasts; other casings are handles.
        assert_eq!(parse_target("@ALL", &s), Target::Handle("ALL".into()));
        assert_eq!(
            parse_target("BV-0001", &s),
            Target::Ticket(TicketId::from("BV-0001"))
        );
        assert_eq!(parse_target("@bob", &s), Target::Handle("bob".into()));
        assert_eq!(parse_target("42", &s), Target::User(UserId(42)));
        assert_eq!(parse_target("-100", &s), Target::User(UserId(-100)));
        assert_eq!(parse_target("bob", &s), Target::Unrecognized);
        assert_eq!(parse_target("BV-", &s), Target::Unrecognized);
    }

    #[test]
    fn broadcast_includes_owners_of_closed_tickets() {
        let mut st = store();
        let a = st.create_ticket(UserId(1), None).unwrap();
        let b = st.create_ticket(UserId(2), None).unwrap();
        st.create_ticket(UserId(3), None).unwrap();
        st.set_status(&a.id, TicketStatus::Closed).unwrap();
        st.set_status(&b.id, TicketStatus::Closed).unwrap();

        let got = resolve("@all", &st, &syntax()).unwrap();
        assert_eq!(got, BTreeSet::from([UserId(1), UserId(2), UserId(3)]));
    }

    #[test]
    fn ticket_token_errors() {
        let mut st = store();
        let t = st.create_ticket(UserId(7), None).unwrap();

        assert_eq!(
            resolve(t.id.as_str(), &st, &syntax()).unwrap(),
            BTreeSet::from([UserId(7)])
        );

        assert_eq!(
            resolve("BV-9999", &st, &syntax()).unwrap_err(),
            TicketError::NotFound(TicketId::from("BV-9999"))
        );

        st.set_status(&t.id, TicketStatus::Closed).unwrap();
        assert_eq!(
            resolve(t.id.as_str(), &st, &syntax()).unwrap_err(),
            TicketError::TicketClosed(t.id.clone())
        );
    }

    #[test]
    fn handles_and_raw_ids() {
        let mut st = store();
        st.create_ticket(UserId(1), Some("Carol".into())).unwrap();

        assert_eq!(
            resolve("@carol", &st, &syntax()).unwrap(),
            BTreeSet::from([UserId(1)])
        );
        assert!(resolve("@nobody", &st, &syntax()).unwrap().is_empty());
        assert_eq!(
            resolve("555", &st, &syntax()).unwrap(),
            BTreeSet::from([UserId(555)])
        );
        assert!(resolve("not-a-target", &st, &syntax()).unwrap().is_empty());
    }
}
