//! The support desk: one service per bot process.
//!
//! Owns the ticket store behind a single mutex. Each inbound event (user
//! message, staff reply, staff command) holds the lock for its whole unit of
//! work so the check-then-act sequences in the lifecycle stay atomic.
//! Broadcast deliveries and owner notices happen after the lock is released.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    audit::{AuditEvent, AuditLogger},
    bridge::RelayBridge,
    commands::{StaffCommand, USAGE_CLOSE},
    config::Config,
    domain::{ChatId, MessageId, TicketId, UserId, UserProfile},
    errors::Error,
    export::{export_transcript, export_user_directory, transcript_file_name},
    formatting::{
        chunk_lines, code, escape_html, numbered_ids, status_line, user_envelope_header,
    },
    lifecycle,
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, MessageContent},
    },
    resolver::{self, parse_target, Target, TargetSyntax},
    ticket::{self, ListFilter, Ticket, TicketError, TicketStatus, TicketStore},
    Result,
};

pub const CREATE_TICKET_CALLBACK: &str = "create_ticket";

pub const NO_TICKETS_NOTICE: &str =
    "ℹ️ You have no tickets yet. Send a message or use /create to open one.";

pub const STAFF_HELP: &str = "<b>Staff commands</b>\n\n\
/status BV-XXXXXXXX : ticket status\n\
/send &lt;ticket | @username | user_id | @all&gt; text : message users\n\
/close BV-XXXXXXXX : close (or reply /close to a ticket message)\n\
/open BV-XXXXXXXX : reopen a closed ticket\n\
/history &lt;user_id | @username | BV-XXXXXXXX&gt; : tickets of a user\n\
/list open | closed : list tickets\n\
/export BV-XXXXXXXX : transcript as a file\n\
/users : user directory as a file\n\n\
Reply to a forwarded ticket message to answer the user.";

#[derive(Clone, Debug)]
pub struct DeskSettings {
    pub staff_chat: ChatId,
    pub support_label: String,
    pub brand_name: String,
    pub syntax: TargetSyntax,
    /// Longest text message the desk will emit before splitting.
    pub safe_limit: usize,
}

impl DeskSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            staff_chat: cfg.staff_chat_id,
            support_label: cfg.support_label.clone(),
            brand_name: cfg.brand_name.clone(),
            syntax: TargetSyntax::new(cfg.broadcast_marker.clone(), cfg.ticket_id_prefix.clone()),
            safe_limit: cfg.telegram_safe_limit,
        }
    }
}

/// Something the desk wants posted back into the staff group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Html(String),
    Document { file_name: String, bytes: Vec<u8> },
}

/// Result of relaying one user message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRelay {
    pub ticket_id: TicketId,
    /// The message opened a new ticket.
    pub created: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

pub struct SupportDesk {
    store: Mutex<TicketStore>,
    bridge: RelayBridge,
    messenger: Arc<dyn MessagingPort>,
    settings: DeskSettings,
    audit: Option<AuditLogger>,
}

impl SupportDesk {
    pub fn new(store: TicketStore, messenger: Arc<dyn MessagingPort>, settings: DeskSettings) -> Self {
        let bridge = RelayBridge::new(
            messenger.clone(),
            settings.staff_chat,
            settings.support_label.clone(),
        );
        Self {
            store: Mutex::new(store),
            bridge,
            messenger,
            settings,
            audit: None,
        }
    }

    pub fn from_config(cfg: &Config, messenger: Arc<dyn MessagingPort>) -> Self {
        let store = TicketStore::new(ticket::id::from_config(cfg));
        Self::new(store, messenger, DeskSettings::from_config(cfg))
            .with_audit(AuditLogger::new(cfg.audit_log_path.clone(), cfg.audit_log_json))
    }

    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn settings(&self) -> &DeskSettings {
        &self.settings
    }

    pub fn is_staff_chat(&self, chat: ChatId) -> bool {
        chat == self.settings.staff_chat
    }

    fn audit(&self, event: AuditEvent) {
        if let Some(log) = &self.audit {
            log.record(event);
        }
    }

    // ---------------------------------------------------------------------
    // User side
    // ---------------------------------------------------------------------

    pub fn welcome(&self) -> (String, InlineKeyboard) {
        let text = format!(
            "👋 Welcome to <b>{}</b>!\n\n\
Send a message here and our team will get back to you, \
or open a ticket with the button below.",
            escape_html(&self.settings.brand_name)
        );
        (text, InlineKeyboard::single("🎫 Create Ticket", CREATE_TICKET_CALLBACK))
    }

    /// Explicit ticket creation (`/create` or the welcome button).
    pub async fn create_ticket(&self, profile: &UserProfile) -> Result<TicketId> {
        let mut store = self.store.lock().await;
        let ticket = lifecycle::create(&mut store, profile)?;
        self.audit(AuditEvent::ticket_created(
            &ticket.id,
            profile.id,
            profile.handle.as_deref(),
        ));
        Ok(ticket.id)
    }

    pub fn created_notice(&self, id: &TicketId) -> String {
        format!(
            "✅ Ticket created: {}\nStatus: {}\n\nSend your message and our team will reply here.",
            code(id),
            TicketStatus::Pending
        )
    }

    /// Relay a private-chat message into the staff group.
    ///
    /// Opens a ticket when the user has none. The ticket only moves to
    /// `Processing` once the staff channel has accepted the envelope.
    pub async fn handle_user_message(
        &self,
        profile: &UserProfile,
        content: &MessageContent,
    ) -> Result<UserRelay> {
        let mut store = self.store.lock().await;

        let (id, created) = lifecycle::ensure_active(&mut store, profile)?;

        let shown = lifecycle::status_after_inbound(store.get(&id)?.status);
        if let Err(e) = self
            .bridge
            .forward_user_message(&mut store, &id, shown, profile, content)
            .await
        {
            // Roll back a ticket opened for this message.
            if created && store.discard_unused(&id) {
                tracing::info!(ticket_id = %id, user_id = profile.id.0, "unrelayed ticket discarded");
            }
            self.audit(AuditEvent::delivery_failure(
                Some(&id),
                Some(profile.id),
                &e.to_string(),
            ));
            return Err(e);
        }
        if created {
            self.audit(AuditEvent::ticket_created(
                &id,
                profile.id,
                profile.handle.as_deref(),
            ));
        }
        lifecycle::record_inbound(&mut store, &id)?;
        self.audit(AuditEvent::user_message(&id, profile.id, content.summary()));

        Ok(UserRelay {
            ticket_id: id,
            created,
        })
    }

    pub fn user_relay_notice(&self, relay: &UserRelay) -> Option<String> {
        relay.created.then(|| {
            format!(
                "🎫 Ticket {} has been opened. Our team will reply here.",
                code(&relay.ticket_id)
            )
        })
    }

    /// `/status` from a user. Only the user's own tickets are visible; other
    /// ids read as not found.
    pub async fn user_status(&self, user: UserId, id: Option<TicketId>) -> Result<String> {
        let store = self.store.lock().await;
        let id = match id {
            Some(id) => id,
            None => match store
                .active_ticket(user)
                .or_else(|| store.tickets_of(user).last())
            {
                Some(id) => id.clone(),
                None => return Ok(NO_TICKETS_NOTICE.to_string()),
            },
        };
        match store.get(&id) {
            Ok(t) if t.owner_id == user => Ok(status_line(&t.id, t.status.as_str())),
            _ => Err(TicketError::NotFound(id).into()),
        }
    }

    // ---------------------------------------------------------------------
    // Staff side
    // ---------------------------------------------------------------------

    /// A staff message replying to a relayed ticket message.
    pub async fn handle_staff_reply(
        &self,
        replied_to: MessageId,
        content: &MessageContent,
    ) -> Result<Option<TicketId>> {
        let mut store = self.store.lock().await;
        match self
            .bridge
            .forward_staff_reply(&mut store, replied_to, content)
            .await
        {
            Ok(Some(id)) => {
                self.audit(AuditEvent::staff_reply(&id, content.summary()));
                Ok(Some(id))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                let id = store.ticket_for_relay(replied_to).cloned();
                self.audit(AuditEvent::delivery_failure(id.as_ref(), None, &e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn close_ticket(&self, id: &TicketId) -> Result<Ticket> {
        let ticket = {
            let mut store = self.store.lock().await;
            lifecycle::close(&mut store, id)?
        };
        self.audit(AuditEvent::ticket_closed(&ticket.id, ticket.owner_id));
        self.notify_owner(
            &ticket,
            "This ticket has been closed. Send a new message any time to open a new one.",
            "Closed",
        )
        .await;
        Ok(ticket)
    }

    pub async fn reopen_ticket(&self, id: &TicketId) -> Result<Ticket> {
        let ticket = {
            let mut store = self.store.lock().await;
            lifecycle::reopen(&mut store, id)?
        };
        self.audit(AuditEvent::ticket_reopened(&ticket.id, ticket.owner_id));
        self.notify_owner(
            &ticket,
            "This ticket has been reopened. You can continue the conversation here.",
            "Reopened",
        )
        .await;
        Ok(ticket)
    }

    /// Owner notices are best effort: the state change already happened.
    async fn notify_owner(&self, ticket: &Ticket, body: &str, status: &str) {
        let html = format!("{}\n\n{}", status_line(&ticket.id, status), escape_html(body));
        if let Err(e) = self
            .messenger
            .send_html(ChatId::from(ticket.owner_id), &html)
            .await
        {
            tracing::warn!(
                ticket_id = %ticket.id,
                user_id = ticket.owner_id.0,
                error = %e,
                "owner notice failed"
            );
            self.audit(AuditEvent::delivery_failure(
                Some(&ticket.id),
                Some(ticket.owner_id),
                &e.to_string(),
            ));
        }
    }

    /// `/send <target> <text>`.
    ///
    /// A ticket target is delivered and recorded under the lock, so a
    /// concurrent close cannot land between the status check and the
    /// transcript append. Other targets are resolved under the lock and
    /// delivered after it is released. One recipient failing never stops the
    /// others.
    pub async fn send_to_target(&self, target: &str, text: &str) -> Result<DeliveryReport> {
        let mut store = self.store.lock().await;
        let recipients = resolver::resolve(target, &store, &self.settings.syntax)?;
        if recipients.is_empty() {
            return Err(TicketError::NoRecipientFound.into());
        }

        let report = match parse_target(target, &self.settings.syntax) {
            Target::Ticket(id) => {
                let html = format!("{}{}", user_envelope_header(&id), escape_html(text));
                let report = self.deliver(&recipients, &html).await;
                if report.delivered > 0 {
                    store.append_transcript(&id, &self.settings.support_label, text);
                }
                report
            }
            _ => {
                drop(store);
                let html = format!(
                    "📩 {}:\n\n{}",
                    escape_html(&self.settings.brand_name),
                    escape_html(text)
                );
                self.deliver(&recipients, &html).await
            }
        };

        tracing::info!(
            target = target,
            delivered = report.delivered,
            failed = report.failed,
            "staff message sent"
        );
        self.audit(AuditEvent::broadcast(target, text, report.delivered, report.failed));
        Ok(report)
    }

    async fn deliver(&self, recipients: &BTreeSet<UserId>, html: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for user in recipients {
            match self.messenger.send_html(ChatId::from(*user), html).await {
                Ok(_) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(user_id = user.0, error = %e, "delivery to user failed");
                    self.audit(AuditEvent::delivery_failure(None, Some(*user), &e.to_string()));
                }
            }
        }
        report
    }

    pub async fn status(&self, id: &TicketId) -> Result<String> {
        let store = self.store.lock().await;
        let t = store.get(id)?;
        Ok(status_line(&t.id, t.status.as_str()))
    }

    /// Ticket ids (with status) of every user a history token names.
    ///
    /// A ticket id names its owner whatever the ticket's status.
    pub async fn history(&self, token: &str) -> Result<Vec<String>> {
        let store = self.store.lock().await;
        let owners: BTreeSet<UserId> = match parse_target(token, &self.settings.syntax) {
            Target::Ticket(id) => BTreeSet::from([store.get(&id)?.owner_id]),
            Target::Handle(h) => store.owners_with_handle(&h),
            Target::User(u) => BTreeSet::from([u]),
            Target::Broadcast | Target::Unrecognized => BTreeSet::new(),
        };

        let mut lines = Vec::new();
        for owner in owners {
            let ids = store.tickets_of(owner);
            if ids.is_empty() {
                continue;
            }
            lines.push(format!("<b>User {owner}</b>"));
            for (line, id) in numbered_ids(ids).into_iter().zip(ids) {
                let status = store.get(id).map(|t| t.status.as_str()).unwrap_or("Unknown");
                lines.push(format!("{line} ({status})"));
            }
        }
        if lines.is_empty() {
            return Err(TicketError::NoRecipientFound.into());
        }
        Ok(lines)
    }

    pub async fn list(&self, filter: ListFilter) -> Vec<String> {
        let store = self.store.lock().await;
        let tickets = store.tickets_with_status(filter);
        let title = match filter {
            ListFilter::Open => "Open tickets",
            ListFilter::Closed => "Closed tickets",
        };
        if tickets.is_empty() {
            return vec![format!("<b>{title}</b>\n\nNone.")];
        }
        let mut lines = vec![format!("<b>{title}</b> ({})", tickets.len())];
        lines.extend(numbered_ids(tickets.iter().map(|t| &t.id)));
        chunk_lines(&lines, self.settings.safe_limit)
    }

    pub async fn export(&self, id: &TicketId) -> Result<Reply> {
        let store = self.store.lock().await;
        let ticket = store.get(id)?;
        Ok(Reply::Document {
            file_name: transcript_file_name(ticket),
            bytes: export_transcript(ticket),
        })
    }

    pub async fn user_directory(&self) -> Reply {
        let rows = self.store.lock().await.user_directory();
        Reply::Document {
            file_name: "users.txt".to_string(),
            bytes: export_user_directory(&self.settings.brand_name, &rows),
        }
    }

    /// Run one staff command. Failures come back as notices, never errors.
    ///
    /// `reply_to` is the message the command replied to, used by `/close`
    /// without an argument.
    pub async fn execute(&self, cmd: StaffCommand, reply_to: Option<MessageId>) -> Vec<Reply> {
        let html = |s: String| vec![Reply::Html(s)];

        match cmd {
            StaffCommand::Help => html(STAFF_HELP.to_string()),
            StaffCommand::Usage(usage) => html(format!("Usage:\n{}", escape_html(usage))),
            StaffCommand::Unknown(name) => html(format!(
                "Unknown command /{}. Try /help.",
                escape_html(&name)
            )),
            StaffCommand::Status(id) => html(self.status(&id).await.unwrap_or_else(|e| notice_for(&e))),
            StaffCommand::Send { target, text } => html(match self.send_to_target(&target, &text).await {
                Ok(r) if r.failed == 0 => format!("✅ Sent to {} recipient(s).", r.delivered),
                Ok(r) => format!(
                    "⚠️ Sent to {} recipient(s), {} failed.",
                    r.delivered, r.failed
                ),
                Err(e) => notice_for(&e),
            }),
            StaffCommand::Close(id) => {
                let id = match (id, reply_to) {
                    (Some(id), _) => id,
                    (None, Some(msg)) => match self.store.lock().await.ticket_for_relay(msg).cloned() {
                        Some(id) => id,
                        None => return html("❌ That message is not linked to a ticket.".to_string()),
                    },
                    (None, None) => return html(format!("Usage:\n{}", escape_html(USAGE_CLOSE))),
                };
                html(match self.close_ticket(&id).await {
                    Ok(t) => format!("✅ Ticket {} closed.", code(&t.id)),
                    Err(e) => notice_for(&e),
                })
            }
            StaffCommand::Open(id) => html(match self.reopen_ticket(&id).await {
                Ok(t) => format!("✅ Ticket {} reopened.", code(&t.id)),
                Err(e) => notice_for(&e),
            }),
            StaffCommand::History(token) => match self.history(&token).await {
                Ok(lines) => chunk_lines(&lines, self.settings.safe_limit)
                    .into_iter()
                    .map(Reply::Html)
                    .collect(),
                Err(e) => html(notice_for(&e)),
            },
            StaffCommand::List(filter) => self.list(filter).await.into_iter().map(Reply::Html).collect(),
            StaffCommand::Export(id) => match self.export(&id).await {
                Ok(doc) => vec![doc],
                Err(e) => html(notice_for(&e)),
            },
            StaffCommand::Users => vec![self.user_directory().await],
        }
    }
}

/// Short HTML notice for a failed desk operation.
pub fn notice_for(err: &Error) -> String {
    match err {
        Error::Ticket(e) => match e {
            TicketError::NotFound(id) => format!("❌ Ticket {} not found.", code(id)),
            TicketError::DuplicateActiveTicket(id) => {
                format!("ℹ️ You already have an active ticket: {}", code(id))
            }
            TicketError::AlreadyClosed(id) => format!("ℹ️ Ticket {} is already closed.", code(id)),
            TicketError::TicketNotClosed(id) => format!("ℹ️ Ticket {} is not closed.", code(id)),
            TicketError::TicketClosed(id) => {
                format!("❌ Ticket {} is closed. Message not sent.", code(id))
            }
            TicketError::NoRecipientFound => "❌ No recipient found.".to_string(),
            TicketError::IdSpaceExhausted(_) => {
                "❌ Could not open a ticket right now. Please try again later.".to_string()
            }
        },
        Error::Delivery(_) => "❌ Message could not be delivered. Please try again.".to_string(),
        _ => "❌ Something went wrong. Please try again.".to_string(),
    }
}
