use std::sync::Arc;

use teloxide::prelude::*;

use bvs_core::{
    desk::{notice_for, CREATE_TICKET_CALLBACK},
    domain::ChatId,
};

use super::content::profile_of;
use crate::router::AppState;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let data = q.data.as_deref().unwrap_or_default();
    let private = q.message.as_ref().is_some_and(|m| m.chat.is_private());

    // Always answer, or the client keeps the button spinning.
    if data != CREATE_TICKET_CALLBACK || !private {
        let _ = state.messenger.answer_callback_query(&q.id, None).await;
        return Ok(());
    }

    let profile = profile_of(&q.from);
    let (toast, html) = match state.desk.create_ticket(&profile).await {
        Ok(id) => ("Ticket created", state.desk.created_notice(&id)),
        Err(e) => ("No new ticket", notice_for(&e)),
    };
    let _ = state.messenger.answer_callback_query(&q.id, Some(toast)).await;

    if let Err(e) = state
        .messenger
        .send_html(ChatId::from(profile.id), &html)
        .await
    {
        tracing::warn!(user_id = profile.id.0, error = %e, "ticket notice not sent");
    }
    Ok(())
}
