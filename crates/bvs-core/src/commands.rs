//! Slash-command parsing for both sides of the bridge.

use crate::{domain::TicketId, ticket::ListFilter};

/// Split `/cmd@botname arg1 ...` into a lowercase command name and the rest.
pub fn parse_command(text: &str) -> Option<(String, String)> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }
    let mut parts = text.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    if cmd.is_empty() {
        return None;
    }
    Some((cmd, rest))
}

fn first_arg(rest: &str) -> Option<&str> {
    rest.split_whitespace().next()
}

/// Commands accepted in the staff group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StaffCommand {
    Help,
    Status(TicketId),
    Send { target: String, text: String },
    /// `None` means "the ticket of the message this command replies to".
    Close(Option<TicketId>),
    Open(TicketId),
    History(String),
    List(ListFilter),
    Export(TicketId),
    Users,
    /// Known command, wrong arguments. Carries the usage text to show.
    Usage(&'static str),
    Unknown(String),
}

pub const USAGE_STATUS: &str = "/status BV-XXXXXXXX";
pub const USAGE_SEND: &str = "/send BV-XXXXXXXX your message\n\
/send @username your message\n\
/send user_id your message\n\
/send @all your message\n\n\
Closed tickets are refused; usernames and ids must match a known user.";
pub const USAGE_CLOSE: &str = "/close BV-XXXXXXXX, or reply /close to a ticket message";
pub const USAGE_OPEN: &str = "/open BV-XXXXXXXX";
pub const USAGE_HISTORY: &str = "/history user_id | @username | BV-XXXXXXXX";
pub const USAGE_LIST: &str = "/list open | closed";
pub const USAGE_EXPORT: &str = "/export BV-XXXXXXXX";

pub fn parse_staff_command(text: &str) -> Option<StaffCommand> {
    let (cmd, rest) = parse_command(text)?;
    let arg = first_arg(&rest);

    let parsed = match cmd.as_str() {
        "start" | "help" => StaffCommand::Help,
        "status" => match arg {
            Some(id) => StaffCommand::Status(TicketId::from(id)),
            None => StaffCommand::Usage(USAGE_STATUS),
        },
        "send" => {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let target = parts.next().unwrap_or("").trim();
            let body = parts.next().unwrap_or("").trim();
            if target.is_empty() || body.is_empty() {
                StaffCommand::Usage(USAGE_SEND)
            } else {
                StaffCommand::Send {
                    target: target.to_string(),
                    text: body.to_string(),
                }
            }
        }
        "close" => StaffCommand::Close(arg.map(TicketId::from)),
        "open" | "reopen" => match arg {
            Some(id) => StaffCommand::Open(TicketId::from(id)),
            None => StaffCommand::Usage(USAGE_OPEN),
        },
        "history" => match arg {
            Some(t) => StaffCommand::History(t.to_string()),
            None => StaffCommand::Usage(USAGE_HISTORY),
        },
        "list" => match arg.and_then(ListFilter::parse) {
            Some(f) => StaffCommand::List(f),
            None => StaffCommand::Usage(USAGE_LIST),
        },
        "export" => match arg {
            Some(id) => StaffCommand::Export(TicketId::from(id)),
            None => StaffCommand::Usage(USAGE_EXPORT),
        },
        "user" | "users" => StaffCommand::Users,
        other => StaffCommand::Unknown(other.to_string()),
    };
    Some(parsed)
}

/// Commands a user may issue in a private chat. Anything else is relayed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserCommand {
    Start,
    Create,
    Status(Option<TicketId>),
}

pub fn parse_user_command(text: &str) -> Option<UserCommand> {
    let (cmd, rest) = parse_command(text)?;
    match cmd.as_str() {
        "start" | "help" => Some(UserCommand::Start),
        "create" | "new" => Some(UserCommand::Create),
        "status" => Some(UserCommand::Status(first_arg(&rest).map(TicketId::from))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bot_suffix_and_lowercases() {
        assert_eq!(
            parse_command("/Close@BlockVeilBot BV-1"),
            Some(("close".to_string(), "BV-1".to_string()))
        );
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("/"), None);
    }

    #[test]
    fn send_keeps_full_message_text() {
        assert_eq!(
            parse_staff_command("/send @all  we are back online\nthanks"),
            Some(StaffCommand::Send {
                target: "@all".into(),
                text: "we are back online\nthanks".into()
            })
        );
        assert_eq!(
            parse_staff_command("/send @all"),
            Some(StaffCommand::Usage(USAGE_SEND))
        );
    }

    #[test]
    fn close_with_and_without_id() {
        assert_eq!(
            parse_staff_command("/close BV-x"),
            Some(StaffCommand::Close(Some(TicketId::from("BV-x"))))
        );
        assert_eq!(
            parse_staff_command("/close"),
            Some(StaffCommand::Close(None))
        );
    }

    #[test]
    fn list_aliases() {
        assert_eq!(
            parse_staff_command("/list opened"),
            Some(StaffCommand::List(ListFilter::Open))
        );
        assert_eq!(
            parse_staff_command("/list CLOSE"),
            Some(StaffCommand::List(ListFilter::Closed))
        );
        assert_eq!(
            parse_staff_command("/list everything"),
            Some(StaffCommand::Usage(USAGE_LIST))
        );
    }

    #[test]
    fn missing_arguments_yield_usage() {
        assert_eq!(
            parse_staff_command("/open"),
            Some(StaffCommand::Usage(USAGE_OPEN))
        );
        assert_eq!(
            parse_staff_command("/status"),
            Some(StaffCommand::Usage(USAGE_STATUS))
        );
        assert_eq!(
            parse_staff_command("/wat"),
            Some(StaffCommand::Unknown("wat".into()))
        );
    }

    #[test]
    fn user_commands() {
        assert_eq!(parse_user_command("/start"), Some(UserCommand::Start));
        assert_eq!(parse_user_command("/create"), Some(UserCommand::Create));
        assert_eq!(
            parse_user_command("/status BV-1"),
            Some(UserCommand::Status(Some(TicketId::from("BV-1"))))
        );
        assert_eq!(parse_user_command("/whatever"), None);
        assert_eq!(parse_user_command("plain text"), None);
    }
}
