//! Telegram adapter (teloxide).
//!
//! This crate implements the `bvs-core` MessagingPort over the Telegram Bot
//! API and routes updates into the support desk.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode},
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use bvs_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{Envelope, InlineKeyboard, MediaKind, MessagingCapabilities},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn sent(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        tracing::debug!(retry_after = ?d, "telegram rate limited, retrying");
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: 4096,
            max_caption_len: 1024,
        }
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
            })
            .await?;
        Ok(Self::sent(chat_id, &msg))
    }

    async fn send_envelope(&self, chat_id: ChatId, envelope: &Envelope) -> Result<MessageRef> {
        let Some(media) = &envelope.media else {
            return self.send_html(chat_id, &envelope.html).await;
        };
        let chat = Self::tg_chat(chat_id);
        let caption = envelope.html.clone();
        let file = || InputFile::file_id(media.file_id.clone());

        // Media is re-sent by file reference; nothing is downloaded.
        let msg = match media.kind {
            MediaKind::Photo => {
                self.with_retry(|| {
                    self.bot
                        .send_photo(chat, file())
                        .caption(caption.clone())
                        .parse_mode(ParseMode::Html)
                })
                .await?
            }
            MediaKind::Voice => {
                self.with_retry(|| {
                    self.bot
                        .send_voice(chat, file())
                        .caption(caption.clone())
                        .parse_mode(ParseMode::Html)
                })
                .await?
            }
            MediaKind::Video => {
                self.with_retry(|| {
                    self.bot
                        .send_video(chat, file())
                        .caption(caption.clone())
                        .parse_mode(ParseMode::Html)
                })
                .await?
            }
            MediaKind::Document => {
                self.with_retry(|| {
                    self.bot
                        .send_document(chat, file())
                        .caption(caption.clone())
                        .parse_mode(ParseMode::Html)
                })
                .await?
            }
        };
        Ok(Self::sent(chat_id, &msg))
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot.send_document(
                    Self::tg_chat(chat_id),
                    InputFile::memory(bytes.clone()).file_name(file_name.to_string()),
                )
            })
            .await?;
        Ok(Self::sent(chat_id, &msg))
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
            .buttons
            .into_iter()
            .map(|b| vec![InlineKeyboardButton::callback(b.label, b.callback_data)])
            .collect();
        let markup = InlineKeyboardMarkup::new(rows);

        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
                    .reply_markup(markup.clone())
            })
            .await?;
        Ok(Self::sent(chat_id, &msg))
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }
}
