//! Telegram update handlers.
//!
//! Messages from the configured staff group go to the staff handler, private
//! chats go to the user handler, and everything else is ignored.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use bvs_core::domain::ChatId;

use crate::router::AppState;

mod callback;
mod content;
mod staff;
mod user;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    callback::handle_callback(q, state).await
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat = ChatId(msg.chat.id.0);

    if state.desk.is_staff_chat(chat) {
        return staff::handle_staff_message(msg, state).await;
    }
    if msg.chat.is_private() {
        return user::handle_user_message(msg, state).await;
    }

    tracing::trace!(chat_id = chat.0, "message from unrelated chat ignored");
    Ok(())
}
