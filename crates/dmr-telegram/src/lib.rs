//! Telegram adapter (teloxide).
//!
//! This crate implements the `dmr-core` SessionPort over the Telegram Bot API and feeds
//! incoming updates into the relay dispatcher.

use std::sync::Arc;

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{ParseMode, Recipient},
    ApiError, RequestError,
};

use tokio::sync::OnceCell;
use tracing::warn;

pub mod handlers;
pub mod router;

use dmr_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    messaging::{
        port::SessionPort,
        types::Conversation,
    },
    Result,
};

use crate::handlers::convert::conversation;

#[derive(Clone)]
pub struct TelegramSession {
    bot: Bot,
    owner: Option<ChatId>,
    scan_chats: Vec<ChatId>,
    me: Arc<OnceCell<UserId>>,
}

impl TelegramSession {
    pub fn new(bot: Bot, owner: Option<ChatId>, scan_chats: Vec<ChatId>) -> Self {
        Self {
            bot,
            owner,
            scan_chats,
            me: Arc::new(OnceCell::new()),
        }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: RequestError) -> Error {
        match e {
            RequestError::RetryAfter(d) => Error::RateLimited { retry_after: d },
            RequestError::Api(ApiError::ChatNotFound) => {
                Error::ChatNotFound("chat not found".to_string())
            }
            RequestError::Api(e @ (ApiError::BotKicked | ApiError::BotKickedFromSupergroup)) => {
                Error::ChannelPrivate(e.to_string())
            }
            RequestError::Api(ApiError::Unknown(text)) => {
                let lower = text.to_lowercase();
                // e.g. "Forbidden: bot is not a member of the channel chat"
                if lower.starts_with("forbidden:") || lower.contains("not enough rights") {
                    Error::ChannelPrivate(text)
                } else if lower.contains("not found") {
                    Error::ChatNotFound(text)
                } else {
                    Error::External(format!("telegram error: {text}"))
                }
            }
            other => Error::External(format!("telegram error: {other}")),
        }
    }
}

#[async_trait]
impl SessionPort for TelegramSession {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_message(Self::tg_chat(chat_id), html.to_string())
            .parse_mode(ParseMode::Html)
            .disable_web_page_preview(false)
            .await
            .map_err(Self::map_err)?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn forward(&self, chat_id: ChatId, source: MessageRef) -> Result<MessageRef> {
        let msg = self
            .bot
            .forward_message(
                Self::tg_chat(chat_id),
                Self::tg_chat(source.chat_id),
                Self::tg_msg_id(source.message_id),
            )
            .await
            .map_err(Self::map_err)?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn conversation_info(&self, chat_id: ChatId) -> Result<Conversation> {
        let chat = self
            .bot
            .get_chat(Self::tg_chat(chat_id))
            .await
            .map_err(Self::map_err)?;
        Ok(conversation(&chat))
    }

    async fn lookup_username(&self, username: &str) -> Result<Conversation> {
        let chat = self
            .bot
            .get_chat(Recipient::ChannelUsername(format!("@{username}")))
            .await
            .map_err(Self::map_err)?;
        Ok(conversation(&chat))
    }

    async fn join_invite_link(&self, _link: &str) -> Result<Conversation> {
        // The Bot API has no join call; a bot has to be added to the chat by a member.
        Err(Error::External(
            "bot accounts cannot join chats through invite links".to_string(),
        ))
    }

    async fn conversations(&self) -> Result<Vec<Conversation>> {
        let mut out = Vec::with_capacity(self.scan_chats.len());
        for &chat_id in &self.scan_chats {
            match self.conversation_info(chat_id).await {
                Ok(conv) => out.push(conv),
                Err(e @ Error::RateLimited { .. }) => return Err(e),
                Err(e) => warn!(chat_id = chat_id.0, error = %e, "skipping unreachable chat"),
            }
        }
        Ok(out)
    }

    async fn own_conversation(&self) -> Result<ChatId> {
        self.owner.ok_or_else(|| {
            Error::Config(
                "RELAY_DESTINATION=me needs RELAY_OWNER_ID (bots have no Saved Messages chat)"
                    .to_string(),
            )
        })
    }

    async fn own_user_id(&self) -> Result<UserId> {
        let id = self
            .me
            .get_or_try_init(|| async {
                let me = self.bot.get_me().await.map_err(Self::map_err)?;
                Ok::<_, Error>(UserId(me.id.0 as i64))
            })
            .await?;
        Ok(*id)
    }
}
