//! In-memory messenger for tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{Envelope, InlineKeyboard, MessagingCapabilities},
    },
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sent {
    Envelope(ChatId, Envelope),
    Html(ChatId, String),
    Document(ChatId, String, Vec<u8>),
    Keyboard(ChatId, String),
}

impl Sent {
    pub fn chat(&self) -> ChatId {
        match self {
            Sent::Envelope(c, _) | Sent::Html(c, _) | Sent::Document(c, _, _) | Sent::Keyboard(c, _) => *c,
        }
    }

    pub fn html(&self) -> &str {
        match self {
            Sent::Envelope(_, e) => &e.html,
            Sent::Html(_, h) | Sent::Keyboard(_, h) => h,
            Sent::Document(_, name, _) => name,
        }
    }
}

#[derive(Default)]
pub struct FakeMessenger {
    next_id: Mutex<i32>,
    sent: Mutex<Vec<Sent>>,
    failing: Mutex<HashSet<i64>>,
}

impl FakeMessenger {
    /// Every send to `chat` fails until `heal` is called.
    pub fn fail_chat(&self, chat: ChatId) {
        self.failing.lock().unwrap().insert(chat.0);
    }

    pub fn heal(&self, chat: ChatId) {
        self.failing.lock().unwrap().remove(&chat.0);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat: ChatId) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|s| s.chat() == chat)
            .collect()
    }

    pub fn last_id(&self) -> MessageId {
        MessageId(*self.next_id.lock().unwrap())
    }

    fn record(&self, chat_id: ChatId, item: Sent) -> Result<MessageRef> {
        if self.failing.lock().unwrap().contains(&chat_id.0) {
            return Err(Error::External(format!(
                "telegram error: chat {} unreachable",
                chat_id.0
            )));
        }
        self.sent.lock().unwrap().push(item);
        let mut guard = self.next_id.lock().unwrap();
        *guard += 1;
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(*guard),
        })
    }
}

// Every send yields once first, so concurrent desk calls can interleave.
#[async_trait]
impl MessagingPort for FakeMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: 4096,
            max_caption_len: 1024,
        }
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        tokio::task::yield_now().await;
        self.record(chat_id, Sent::Html(chat_id, html.to_string()))
    }

    async fn send_envelope(&self, chat_id: ChatId, envelope: &Envelope) -> Result<MessageRef> {
        tokio::task::yield_now().await;
        self.record(chat_id, Sent::Envelope(chat_id, envelope.clone()))
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<MessageRef> {
        tokio::task::yield_now().await;
        self.record(chat_id, Sent::Document(chat_id, file_name.to_string(), bytes))
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        _keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        tokio::task::yield_now().await;
        self.record(chat_id, Sent::Keyboard(chat_id, html.to_string()))
    }

    async fn answer_callback_query(&self, _callback_id: &str, _text: Option<&str>) -> Result<()> {
        Ok(())
    }
}
