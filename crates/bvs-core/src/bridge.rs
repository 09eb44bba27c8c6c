//! Relay bridge: moves one message across the user/staff boundary and keeps
//! the relay bindings that let staff replies find their ticket.
//!
//! Every forward is all-or-nothing. Bindings and transcript entries are only
//! written after the outbound send has succeeded.

use std::sync::Arc;

use crate::{
    domain::{ChatId, MessageId, MessageRef, TicketId, UserProfile},
    errors::Error,
    formatting::{escape_html, staff_envelope_header, truncate_chars, user_envelope_header},
    messaging::{
        port::MessagingPort,
        types::{Envelope, MessageContent, UNSUPPORTED_LABEL},
    },
    ticket::{TicketStatus, TicketStore},
    Result,
};

pub struct RelayBridge {
    messenger: Arc<dyn MessagingPort>,
    staff_chat: ChatId,
    support_label: String,
}

impl RelayBridge {
    pub fn new(
        messenger: Arc<dyn MessagingPort>,
        staff_chat: ChatId,
        support_label: impl Into<String>,
    ) -> Self {
        Self {
            messenger,
            staff_chat,
            support_label: support_label.into(),
        }
    }

    /// Forward a user message into the staff channel.
    ///
    /// `status` is what the envelope shows; the caller decides it. On success
    /// the staff message id is bound to the ticket and the message is appended
    /// to the transcript under the user's display name.
    pub async fn forward_user_message(
        &self,
        store: &mut TicketStore,
        ticket: &TicketId,
        status: TicketStatus,
        profile: &UserProfile,
        content: &MessageContent,
    ) -> Result<MessageRef> {
        let envelope = self.staff_envelope(ticket, status, profile, content);

        let sent = self
            .messenger
            .send_envelope(self.staff_chat, &envelope)
            .await
            .map_err(|e| {
                tracing::warn!(ticket_id = %ticket, error = %e, "forward to staff failed");
                Error::Delivery(format!("staff channel: {e}"))
            })?;

        store.bind_relay(sent.message_id, ticket.clone());
        store.append_transcript(ticket, &profile.display_name, content.summary());
        tracing::debug!(
            ticket_id = %ticket,
            relay_message_id = sent.message_id.0,
            "user message relayed"
        );
        Ok(sent)
    }

    /// Forward a staff reply to the owner of the ticket the replied-to
    /// message belongs to.
    ///
    /// Replies to messages the bridge never sent are dropped silently
    /// (`Ok(None)`). Closed tickets still receive replies.
    pub async fn forward_staff_reply(
        &self,
        store: &mut TicketStore,
        replied_to: MessageId,
        content: &MessageContent,
    ) -> Result<Option<TicketId>> {
        let Some(id) = store.ticket_for_relay(replied_to).cloned() else {
            tracing::trace!(message_id = replied_to.0, "reply to unbound message ignored");
            return Ok(None);
        };
        let Ok(ticket) = store.get(&id) else {
            tracing::warn!(ticket_id = %id, "relay binding points at unknown ticket");
            return Ok(None);
        };
        let owner = ticket.owner_id;

        let Some(envelope) = self.user_envelope(&id, content) else {
            tracing::debug!(ticket_id = %id, "unsupported staff reply not relayed");
            return Ok(None);
        };

        self.messenger
            .send_envelope(ChatId::from(owner), &envelope)
            .await
            .map_err(|e| {
                tracing::warn!(ticket_id = %id, user_id = owner.0, error = %e, "reply to user failed");
                Error::Delivery(format!("user {owner}: {e}"))
            })?;

        store.append_transcript(&id, &self.support_label, content.summary());
        Ok(Some(id))
    }

    fn staff_envelope(
        &self,
        ticket: &TicketId,
        status: TicketStatus,
        profile: &UserProfile,
        content: &MessageContent,
    ) -> Envelope {
        let header = staff_envelope_header(ticket, status, profile);
        let caps = self.messenger.capabilities();

        match content {
            MessageContent::Text(text) => {
                Envelope::text(fit(&header, text, caps.max_message_len))
            }
            MessageContent::Media {
                kind,
                file_id,
                caption,
            } => {
                let mut lead = format!("{header}{}", kind.placeholder());
                let caption = caption.as_deref().unwrap_or("").trim();
                if !caption.is_empty() {
                    lead.push('\n');
                }
                Envelope::with_media(fit(&lead, caption, caps.max_caption_len), *kind, file_id)
            }
            MessageContent::Unsupported => Envelope::text(format!("{header}{UNSUPPORTED_LABEL}")),
        }
    }

    fn user_envelope(&self, id: &TicketId, content: &MessageContent) -> Option<Envelope> {
        let header = user_envelope_header(id);
        let caps = self.messenger.capabilities();

        match content {
            MessageContent::Text(text) => Some(Envelope::text(fit(&header, text, caps.max_message_len))),
            MessageContent::Media {
                kind,
                file_id,
                caption,
            } => {
                let caption = caption.as_deref().unwrap_or("").trim();
                Some(Envelope::with_media(
                    fit(&header, caption, caps.max_caption_len),
                    *kind,
                    file_id,
                ))
            }
            MessageContent::Unsupported => None,
        }
    }
}

/// `lead` followed by the escaped `body`, with the body cut so the message
/// stays within `max_chars`. Telegram counts entities after parsing, so the
/// raw text length is what has to fit.
fn fit(lead: &str, body: &str, max_chars: usize) -> String {
    let room = max_chars.saturating_sub(lead.chars().count());
    format!("{lead}{}", escape_html(&truncate_chars(body, room)))
}
