//! Telegram update handlers.
//!
//! Each incoming message is converted once, checked against the relay guards, and handed to
//! the dispatcher on its own task so the update loop never waits on a relay.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::debug;

use dmr_core::guards::should_relay;

use crate::router::AppState;

pub mod convert;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let incoming = convert::incoming_message(&msg);

    if !should_relay(&incoming, state.own_id) {
        debug!(
            chat_id = incoming.source.chat_id.0,
            private = incoming.private,
            service = incoming.service,
            "ignoring update"
        );
        return Ok(());
    }

    state.dispatcher.spawn(incoming);
    Ok(())
}
