//! Telegram HTML helpers and the envelope layouts used by the bridge.

use crate::{
    domain::{TicketId, UserProfile},
    ticket::TicketStatus,
};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Ticket id in monospace, so staff can tap-to-copy it.
pub fn code(id: &TicketId) -> String {
    format!("<code>{}</code>", escape_html(id.as_str()))
}

pub fn user_info_block(profile: &UserProfile) -> String {
    format!(
        "User Information\n\
• User ID   : {}\n\
• Username  : @{}\n\
• Full Name : {}\n\n",
        profile.id,
        escape_html(profile.handle.as_deref().unwrap_or("")),
        escape_html(&profile.display_name),
    )
}

/// Header of a user → staff envelope; the message body follows it.
pub fn staff_envelope_header(id: &TicketId, status: TicketStatus, profile: &UserProfile) -> String {
    format!(
        "🎫 Ticket ID: {}\nStatus: {}\n\n{}Message:\n",
        code(id),
        status,
        user_info_block(profile)
    )
}

/// Header of a staff → user envelope.
pub fn user_envelope_header(id: &TicketId) -> String {
    format!("🎫 Ticket ID: {}\n\n", code(id))
}

pub fn status_line(id: &TicketId, status: &str) -> String {
    format!("🎫 Ticket ID: {}\nStatus: {}", code(id), escape_html(status))
}

/// Numbered list of ticket ids, one per line.
pub fn numbered_ids<'a>(ids: impl IntoIterator<Item = &'a TicketId>) -> Vec<String> {
    ids.into_iter()
        .enumerate()
        .map(|(i, id)| format!("{}. {}", i + 1, code(id)))
        .collect()
}

/// Pack lines into messages no longer than `limit` bytes.
///
/// Lines are never split; a single over-long line becomes its own message.
pub fn chunk_lines(lines: &[String], limit: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    for line in lines {
        let extra = if cur.is_empty() { line.len() } else { line.len() + 1 };
        if !cur.is_empty() && cur.len() + extra > limit {
            out.push(std::mem::take(&mut cur));
        }
        if !cur.is_empty() {
            cur.push('\n');
        }
        cur.push_str(line);
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

/// Trim to at most `max_chars` characters, marking the cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;

    #[test]
    fn escapes_user_info() {
        let p = UserProfile::new(UserId(5), Some("a<b".into()), Some("Tom & Jerry".into()));
        let block = user_info_block(&p);
        assert!(block.contains("@a&lt;b"));
        assert!(block.contains("Tom &amp; Jerry"));
        assert!(block.contains("User ID   : 5"));
    }

    #[test]
    fn staff_header_carries_id_and_status() {
        let p = UserProfile::new(UserId(5), None, None);
        let h = staff_envelope_header(&TicketId::from("BV-1&2"), TicketStatus::Processing, &p);
        assert!(h.starts_with("🎫 Ticket ID: <code>BV-1&amp;2</code>\nStatus: Processing"));
        assert!(h.ends_with("Message:\n"));
    }

    #[test]
    fn chunking_keeps_lines_whole() {
        let lines: Vec<String> = (0..5).map(|i| format!("line-{i}")).collect();
        let chunks = chunk_lines(&lines, 14);
        assert_eq!(chunks, vec!["line-0\nline-1", "line-2\nline-3", "line-4"]);
        assert!(chunk_lines(&[], 10).is_empty());
    }

    #[test]
    fn truncation_marks_cut() {
        assert_eq!(truncate_chars("abcdef", 4), "abc…");
        assert_eq!(truncate_chars("abc", 4), "abc");
    }
}
