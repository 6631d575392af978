use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef, UserId},
    messaging::types::Conversation,
    Result,
};

/// Connected-session port.
///
/// Telegram is the only implementation; the relay core depends on nothing else from the
/// platform. Implementations report rate limits as `Error::RateLimited` and username lookup
/// failures as `ChatNotFound` / `ChannelPrivate`.
#[async_trait]
pub trait SessionPort: Send + Sync {
    /// Send `html` (Telegram HTML parse mode) with link previews left on.
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    /// Forward `source` verbatim (not re-sent as new content).
    async fn forward(&self, chat_id: ChatId, source: MessageRef) -> Result<MessageRef>;

    async fn conversation_info(&self, chat_id: ChatId) -> Result<Conversation>;

    async fn lookup_username(&self, username: &str) -> Result<Conversation>;

    async fn join_invite_link(&self, link: &str) -> Result<Conversation>;

    /// Conversations this account is already a member of.
    async fn conversations(&self) -> Result<Vec<Conversation>>;

    /// The account's own conversation ("Saved Messages" for user accounts).
    async fn own_conversation(&self) -> Result<ChatId>;

    async fn own_user_id(&self) -> Result<UserId>;
}
