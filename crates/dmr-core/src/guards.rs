//! Predicates deciding which incoming events reach the dispatcher.
//!
//! Evaluated once per event, before dispatch.

use crate::{domain::UserId, messaging::types::IncomingMessage};

pub fn is_private(msg: &IncomingMessage) -> bool {
    msg.private
}

pub fn is_incoming(msg: &IncomingMessage) -> bool {
    !msg.outgoing
}

pub fn is_from_self(msg: &IncomingMessage, own_id: UserId) -> bool {
    msg.sender.as_ref().is_some_and(|s| s.user_id == own_id)
}

pub fn is_from_bot(msg: &IncomingMessage) -> bool {
    msg.sender.as_ref().is_some_and(|s| s.is_bot)
}

pub fn is_service(msg: &IncomingMessage) -> bool {
    msg.service
}

/// Private, incoming, not our own. Ordinary messages from bots are skipped; their service
/// events (calls and the like) still go through.
pub fn should_relay(msg: &IncomingMessage, own_id: UserId) -> bool {
    is_private(msg)
        && is_incoming(msg)
        && !is_from_self(msg, own_id)
        && (is_service(msg) || !is_from_bot(msg))
}
