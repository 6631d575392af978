//! Per-message relay: announce the sender, then forward the original.
//!
//! Each message moves through `ANNOUNCE` (or `SERVICE_ANNOUNCE`) then `FORWARD`; a rate limit at
//! either step suspends the task and retries that step once. Any failure drops the message
//! and leaves every other message untouched.

use std::{fmt, sync::Arc};

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::{
    domain::MessageRef,
    errors::{Error, ResolutionError},
    formatting::{format_identity, format_service_identity},
    messaging::{port::SessionPort, types::IncomingMessage},
    notifier::notify_startup,
    resolver::{DestinationResolver, ResolvedDestination},
    retry::with_retry,
};

/// Step of the relay sequence a failure happened in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayStage {
    Announce,
    ServiceAnnounce,
    Forward,
}

impl RelayStage {
    pub fn as_str(self) -> &'static str {
        match self {
            RelayStage::Announce => "announce",
            RelayStage::ServiceAnnounce => "service_announce",
            RelayStage::Forward => "forward",
        }
    }
}

impl fmt::Display for RelayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message could not be relayed. Never fatal to the process.
#[derive(Debug, thiserror::Error)]
#[error(
    "relay of message {} from chat {} failed during {stage}: {source}",
    .message.message_id.0,
    .message.chat_id
)]
pub struct RelayError {
    pub stage: RelayStage,
    pub message: MessageRef,
    #[source]
    pub source: Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Annotation sent, then the original forwarded.
    Done {
        annotation: MessageRef,
        copy: MessageRef,
    },
    /// The event carried no sender identity; nothing was sent.
    NoSender,
}

/// Relays incoming messages to the one destination it was built with.
pub struct RelayDispatcher {
    session: Arc<dyn SessionPort>,
    destination: ResolvedDestination,
}

impl RelayDispatcher {
    pub fn new(session: Arc<dyn SessionPort>, destination: ResolvedDestination) -> Self {
        Self {
            session,
            destination,
        }
    }

    /// Resolve `descriptor`, optionally announce startup there, and return a dispatcher bound to
    /// it. The announcement completes before this returns, so it precedes every relayed message.
    pub async fn start(
        session: Arc<dyn SessionPort>,
        descriptor: &str,
        announce: bool,
    ) -> Result<Self, ResolutionError> {
        let destination = DestinationResolver::new(session.clone())
            .resolve(descriptor)
            .await?;

        if announce {
            notify_startup(session.as_ref(), &destination).await;
        }

        info!(
            chat_id = destination.chat_id().0,
            "relaying incoming direct messages"
        );
        Ok(Self::new(session, destination))
    }

    /// Run the announce → forward sequence for one message.
    pub async fn relay(&self, msg: &IncomingMessage) -> Result<RelayOutcome, RelayError> {
        let Some(sender) = msg.sender.as_ref() else {
            return Ok(RelayOutcome::NoSender);
        };

        let (stage, text) = if msg.service {
            (RelayStage::ServiceAnnounce, format_service_identity(sender))
        } else {
            (RelayStage::Announce, format_identity(sender))
        };
        let to = self.destination.chat_id();
        let fail = |stage: RelayStage| {
            move |source: Error| RelayError {
                stage,
                message: msg.source,
                source,
            }
        };

        let annotation = with_retry(stage.as_str(), || {
            self.session.send_html(to, &text)
        })
        .await
        .map_err(fail(stage))?;

        let copy = with_retry(RelayStage::Forward.as_str(), || {
            self.session.forward(to, msg.source)
        })
        .await
        .map_err(fail(RelayStage::Forward))?;

        Ok(RelayOutcome::Done { annotation, copy })
    }

    /// Relay one message and log the result. Never fails: a broken message is dropped.
    pub async fn handle(&self, msg: IncomingMessage) {
        let sender_id = msg.sender.as_ref().map(|s| s.user_id.0).unwrap_or_default();
        let sender_name = msg
            .sender
            .as_ref()
            .map(|s| s.full_name())
            .unwrap_or_default();

        match self.relay(&msg).await {
            Ok(RelayOutcome::Done { .. }) => {
                let username = msg
                    .sender
                    .as_ref()
                    .and_then(|s| s.username.as_deref())
                    .unwrap_or("none");
                info!(
                    sender_name = %sender_name,
                    sender_id,
                    username,
                    service = msg.service,
                    "relayed message"
                );
            }
            Ok(RelayOutcome::NoSender) => {
                warn!(
                    chat_id = msg.source.chat_id.0,
                    message_id = msg.source.message_id.0,
                    "incoming message has no sender, skipping"
                );
            }
            Err(e) => {
                error!(
                    sender_name = %sender_name,
                    sender_id,
                    stage = %e.stage,
                    error = %e.source,
                    "relay failed, message dropped"
                );
            }
        }
    }

    /// Handle `msg` on its own task so slow sends and rate-limit waits never block ingestion.
    pub fn spawn(self: &Arc<Self>, msg: IncomingMessage) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.handle(msg).await })
    }
}
