use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::info;

use dmr_core::{
    config::Config,
    dispatcher::RelayDispatcher,
    domain::{ChatId, UserId},
    messaging::port::SessionPort,
};

use crate::handlers;
use crate::TelegramSession;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<RelayDispatcher>,
    pub own_id: UserId,
}

/// Connect, resolve the destination, announce, then relay until interrupted.
///
/// Fatal errors (bad token, unresolvable destination) are returned as `dmr_core::Error` so the
/// caller can print the matching diagnostic.
pub async fn run(cfg: Arc<Config>) -> anyhow::Result<()> {
    let session = Arc::new(TelegramSession::new(
        Bot::new(cfg.telegram_bot_token.clone()),
        cfg.owner_id.map(ChatId),
        cfg.scan_chats.iter().copied().map(ChatId).collect(),
    ));
    let port: Arc<dyn SessionPort> = session.clone();

    let own_id = port.own_user_id().await?;
    info!(own_id = own_id.0, "connected to Telegram");

    // Resolved exactly once, before any update is accepted; read-only afterwards.
    let dispatcher = RelayDispatcher::start(port, &cfg.destination, cfg.startup_notification)
        .await
        .map_err(dmr_core::Error::from)?;

    let state = Arc::new(AppState {
        dispatcher: Arc::new(dispatcher),
        own_id,
    });

    let handler = Update::filter_message().endpoint(handlers::handle_message);

    Dispatcher::builder(session.bot(), handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("interrupt received, shutting down");
    Ok(())
}
