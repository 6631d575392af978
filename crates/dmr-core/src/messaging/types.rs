use crate::domain::{ChatId, MessageRef, UserId};

/// Profile fields of the person who sent an incoming message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sender {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub is_verified: bool,
    pub is_premium: bool,
    pub is_bot: bool,
}

impl Sender {
    /// First + last name, trimmed. Empty when the profile has neither.
    pub fn full_name(&self) -> String {
        let last = self.last_name.as_deref().unwrap_or("");
        format!("{} {}", self.first_name, last).trim().to_string()
    }
}

/// Cross-messenger incoming message model.
///
/// Telegram-specific fields live in the Telegram adapter; the relay only needs the sender,
/// a few routing flags and a reference it can forward.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub source: MessageRef,
    pub sender: Option<Sender>,
    /// Platform-generated event (call notification, pin, ...) rather than user content.
    pub service: bool,
    /// One-to-one conversation.
    pub private: bool,
    /// Sent by this account rather than received.
    pub outgoing: bool,
}

/// A conversation as reported by the messaging platform.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conversation {
    pub id: ChatId,
    pub title: Option<String>,
    pub username: Option<String>,
    pub invite_link: Option<String>,
}
