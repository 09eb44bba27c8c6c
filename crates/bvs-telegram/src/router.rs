use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use bvs_core::{config::Config, desk::SupportDesk, messaging::port::MessagingPort};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub desk: Arc<SupportDesk>,
    pub messenger: Arc<dyn MessagingPort>,
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!(bot = %me.username(), "bvs started"),
        Err(e) => tracing::warn!(error = %e, "get_me failed; continuing"),
    }
    tracing::info!(
        staff_chat = cfg.staff_chat_id.0,
        ticket_prefix = %cfg.ticket_id_prefix,
        strategy = ?cfg.ticket_id_strategy,
        audit_log = %cfg.audit_log_path.display(),
        "support desk configured"
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let desk = Arc::new(SupportDesk::from_config(&cfg, messenger.clone()));

    let state = Arc::new(AppState {
        desk,
        messenger,
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    tracing::info!("dispatcher stopped");
    Ok(())
}
