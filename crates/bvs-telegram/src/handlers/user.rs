use std::sync::Arc;

use teloxide::prelude::*;

use bvs_core::{
    commands::{parse_user_command, UserCommand},
    desk::notice_for,
    domain::ChatId,
    messaging::port::MessagingPort,
};

use super::content::{message_content, profile_of};
use crate::router::AppState;

pub async fn handle_user_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let profile = profile_of(user);
    let chat = ChatId(msg.chat.id.0);
    let desk = &state.desk;

    if let Some(cmd) = msg.text().and_then(parse_user_command) {
        let reply = match cmd {
            UserCommand::Start => {
                let (text, keyboard) = desk.welcome();
                if let Err(e) = state.messenger.send_inline_keyboard(chat, &text, keyboard).await {
                    tracing::warn!(user_id = profile.id.0, error = %e, "welcome not sent");
                }
                return Ok(());
            }
            UserCommand::Create => match desk.create_ticket(&profile).await {
                Ok(id) => desk.created_notice(&id),
                Err(e) => notice_for(&e),
            },
            UserCommand::Status(id) => desk
                .user_status(profile.id, id)
                .await
                .unwrap_or_else(|e| notice_for(&e)),
        };
        send(state.messenger.as_ref(), chat, &reply).await;
        return Ok(());
    }

    let content = message_content(&msg);
    match desk.handle_user_message(&profile, &content).await {
        Ok(relay) => {
            if let Some(notice) = desk.user_relay_notice(&relay) {
                send(state.messenger.as_ref(), chat, &notice).await;
            }
        }
        Err(e) => {
            tracing::warn!(user_id = profile.id.0, error = %e, "user message not relayed");
            send(state.messenger.as_ref(), chat, &notice_for(&e)).await;
        }
    }
    Ok(())
}

async fn send(messenger: &dyn MessagingPort, chat: ChatId, html: &str) {
    if let Err(e) = messenger.send_html(chat, html).await {
        tracing::warn!(chat_id = chat.0, error = %e, "reply to user failed");
    }
}
