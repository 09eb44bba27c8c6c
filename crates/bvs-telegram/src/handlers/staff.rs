use std::sync::Arc;

use teloxide::prelude::*;

use bvs_core::{
    commands::parse_staff_command,
    desk::{notice_for, Reply},
    domain::MessageId,
};

use super::content::message_content;
use crate::router::AppState;

pub async fn handle_staff_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let reply_to = msg.reply_to_message().map(|m| MessageId(m.id.0));

    if let Some(cmd) = msg.text().and_then(parse_staff_command) {
        tracing::debug!(command = ?cmd, "staff command");
        let replies = state.desk.execute(cmd, reply_to).await;
        post(&state, replies).await;
        return Ok(());
    }

    // Only replies to relayed ticket messages leave the group.
    let Some(replied_to) = reply_to else {
        return Ok(());
    };
    let content = message_content(&msg);
    if let Err(e) = state.desk.handle_staff_reply(replied_to, &content).await {
        post(&state, vec![Reply::Html(notice_for(&e))]).await;
    }
    Ok(())
}

async fn post(state: &AppState, replies: Vec<Reply>) {
    let chat = state.desk.settings().staff_chat;
    for reply in replies {
        let sent = match reply {
            Reply::Html(html) => state.messenger.send_html(chat, &html).await,
            Reply::Document { file_name, bytes } => {
                state.messenger.send_document(chat, &file_name, bytes).await
            }
        };
        if let Err(e) = sent {
            tracing::warn!(error = %e, "staff reply not posted");
        }
    }
}
