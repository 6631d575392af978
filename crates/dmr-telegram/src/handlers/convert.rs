//! teloxide types → platform-neutral relay types.

use teloxide::types::{Chat, Message, MessageKind, User};

use dmr_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::types::{Conversation, IncomingMessage, Sender},
};

pub fn incoming_message(msg: &Message) -> IncomingMessage {
    IncomingMessage {
        source: MessageRef {
            chat_id: ChatId(msg.chat.id.0),
            message_id: MessageId(msg.id.0),
        },
        // teloxide only keeps `from` for ordinary messages. In a private chat the chat is the
        // other person, so service events still get an identity.
        sender: msg.from().map(sender).or_else(|| private_peer(&msg.chat)),
        // Anything that is not ordinary user content (pins, call notices, ...) is a service event.
        service: !matches!(msg.kind, MessageKind::Common(_)),
        private: msg.chat.is_private(),
        // The Bot API only delivers messages sent to the bot.
        outgoing: false,
    }
}

pub fn sender(user: &User) -> Sender {
    Sender {
        user_id: UserId(user.id.0 as i64),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
        // Not exposed by the Bot API.
        is_verified: false,
        is_premium: user.is_premium,
        is_bot: user.is_bot,
    }
}

fn private_peer(chat: &Chat) -> Option<Sender> {
    if !chat.is_private() {
        return None;
    }
    Some(Sender {
        user_id: UserId(chat.id.0),
        first_name: chat.first_name().unwrap_or_default().to_string(),
        last_name: chat.last_name().map(str::to_string),
        username: chat.username().map(str::to_string),
        ..Default::default()
    })
}

pub fn conversation(chat: &Chat) -> Conversation {
    Conversation {
        id: ChatId(chat.id.0),
        title: chat
            .title()
            .or_else(|| chat.first_name())
            .map(str::to_string),
        username: chat.username().map(str::to_string),
        invite_link: chat.invite_link().map(str::to_string),
    }
}
