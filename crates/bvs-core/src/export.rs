//! Plain-text exports sent to the staff group as files.

use std::fmt::Write as _;

use crate::{domain::UserId, ticket::Ticket};

/// Serialize a ticket's transcript. Pure read.
pub fn export_transcript(ticket: &Ticket) -> Vec<u8> {
    let mut out = String::new();
    let _ = writeln!(out, "Ticket ID: {}", ticket.id);
    let _ = writeln!(out, "Status: {}", ticket.status);
    match ticket.owner_handle.as_deref() {
        Some(h) => {
            let _ = writeln!(out, "Owner: {} (@{h})", ticket.owner_id);
        }
        None => {
            let _ = writeln!(out, "Owner: {}", ticket.owner_id);
        }
    }
    let _ = writeln!(out, "Created: {}", ticket.created_at.to_rfc3339());
    out.push_str("\nConversation Log\n\n");

    for entry in &ticket.transcript {
        let _ = writeln!(out, "{}: {}", entry.speaker, entry.content);
    }
    out.into_bytes()
}

/// `<ticket id>.txt`, with the id exactly as staff see it.
pub fn transcript_file_name(ticket: &Ticket) -> String {
    format!("{}.txt", ticket.id)
}

/// Everyone who ever opened a ticket, one line each.
pub fn export_user_directory(title: &str, rows: &[(UserId, Option<String>)]) -> Vec<u8> {
    let mut out = format!("{title} User list\n\n");
    for (i, (id, handle)) in rows.iter().enumerate() {
        let _ = writeln!(out, "{} : @{} — {}", i + 1, handle.as_deref().unwrap_or(""), id);
    }
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::TicketId,
        ticket::{CounterIdGenerator, TicketStatus, TicketStore},
    };

    #[test]
    fn transcript_has_header_then_lines_in_order() {
        let mut s = TicketStore::new(Box::new(CounterIdGenerator::new("BV-", 3)));
        let t = s.create_ticket(UserId(11), Some("dana".into())).unwrap();
        s.append_transcript(&t.id, "Dana", "hello");
        s.append_transcript(&t.id, "Support", "[Photo]");
        s.set_status(&t.id, TicketStatus::Processing).unwrap();

        let text = String::from_utf8(export_transcript(s.get(&t.id).unwrap())).unwrap();
        assert!(text.starts_with("Ticket ID: BV-001\nStatus: Processing\nOwner: 11 (@dana)\nCreated: "));
        assert!(text.ends_with("\nConversation Log\n\nDana: hello\nSupport: [Photo]\n"));
    }

    #[test]
    fn file_name_keeps_id_verbatim() {
        let mut s = TicketStore::new(Box::new(CounterIdGenerator::new("BV-", 3)));
        let mut t = s.create_ticket(UserId(1), None).unwrap();
        t.id = TicketId::from("BV-a#b$c");
        assert_eq!(transcript_file_name(&t), "BV-a#b$c.txt");
    }

    #[test]
    fn directory_lines_are_numbered() {
        let rows = vec![(UserId(5), Some("eve".to_string())), (UserId(6), None)];
        let text = String::from_utf8(export_user_directory("Acme", &rows)).unwrap();
        assert_eq!(text, "Acme User list\n\n1 : @eve — 5\n2 : @ — 6\n");
    }
}
