use chrono::Utc;
use tracing::{info, warn};

use crate::{
    domain::MessageRef,
    formatting::startup_announcement,
    messaging::port::SessionPort,
    resolver::ResolvedDestination,
    retry::with_retry,
    Result,
};

/// Send the one-shot "now online" message to the destination.
pub async fn announce_startup(
    session: &dyn SessionPort,
    dest: &ResolvedDestination,
) -> Result<MessageRef> {
    let text = startup_announcement(dest, Utc::now());
    with_retry("startup_notification", || {
        session.send_html(dest.chat_id(), &text)
    })
    .await
}

/// Best-effort variant used at startup: a failure is logged and otherwise ignored.
pub async fn notify_startup(session: &dyn SessionPort, dest: &ResolvedDestination) {
    match announce_startup(session, dest).await {
        Ok(_) => info!(chat_id = dest.chat_id().0, "startup notification sent"),
        Err(e) => warn!(
            chat_id = dest.chat_id().0,
            error = %e,
            "startup notification failed"
        ),
    }
}
