//! Scripted in-memory session used by the unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    messaging::{
        port::SessionPort,
        types::Conversation,
    },
    Result,
};

/// A failure the fake hands out instead of succeeding.
#[derive(Clone, Debug)]
pub(crate) enum Fault {
    RateLimited(Duration),
    NotFound,
    ChannelPrivate,
    External(&'static str),
}

impl Fault {
    fn into_error(self, what: &str) -> Error {
        match self {
            Fault::RateLimited(d) => Error::RateLimited { retry_after: d },
            Fault::NotFound => Error::ChatNotFound(what.to_string()),
            Fault::ChannelPrivate => Error::ChannelPrivate(what.to_string()),
            Fault::External(msg) => Error::External(msg.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    SendHtml { chat_id: ChatId, text: String },
    Forward { chat_id: ChatId, source: MessageRef },
    ConversationInfo(ChatId),
    LookupUsername(String),
    JoinInviteLink(String),
    Conversations,
    OwnConversation,
}

pub(crate) struct FakeSession {
    next_id: Mutex<i32>,
    calls: Mutex<Vec<Call>>,
    send_faults: Mutex<VecDeque<Fault>>,
    forward_faults: Mutex<HashMap<MessageId, VecDeque<Fault>>>,
    lookup_faults: Mutex<VecDeque<Fault>>,
    known: Vec<Conversation>,
    members: Vec<Conversation>,
    usernames: HashMap<String, std::result::Result<Conversation, Fault>>,
    joinable: HashMap<String, Conversation>,
    own: Option<ChatId>,
    me: UserId,
}

impl FakeSession {
    pub(crate) fn new() -> Self {
        Self {
            next_id: Mutex::new(1),
            calls: Mutex::new(Vec::new()),
            send_faults: Mutex::new(VecDeque::new()),
            forward_faults: Mutex::new(HashMap::new()),
            lookup_faults: Mutex::new(VecDeque::new()),
            known: Vec::new(),
            members: Vec::new(),
            usernames: HashMap::new(),
            joinable: HashMap::new(),
            own: None,
            me: UserId(1),
        }
    }

    /// Reachable by id (numeric resolution, startup title lookups).
    pub(crate) fn with_conversation(mut self, conv: Conversation) -> Self {
        self.known.push(conv);
        self
    }

    /// Already a member (returned by the membership scan).
    pub(crate) fn with_member(mut self, conv: Conversation) -> Self {
        self.members.push(conv);
        self
    }

    pub(crate) fn with_username(mut self, name: &str, conv: Conversation) -> Self {
        self.usernames.insert(name.to_string(), Ok(conv));
        self
    }

    pub(crate) fn with_username_fault(mut self, name: &str, fault: Fault) -> Self {
        self.usernames.insert(name.to_string(), Err(fault));
        self
    }

    pub(crate) fn with_joinable(mut self, link: &str, conv: Conversation) -> Self {
        self.joinable.insert(link.to_string(), conv);
        self
    }

    pub(crate) fn with_own(mut self, chat_id: ChatId) -> Self {
        self.own = Some(chat_id);
        self
    }

    /// Consumed in order by successive `send_html` calls.
    pub(crate) fn fail_sends(self, faults: impl IntoIterator<Item = Fault>) -> Self {
        self.send_faults.lock().unwrap().extend(faults);
        self
    }

    /// Consumed in order by successive forwards of the given source message.
    pub(crate) fn fail_forwards(
        self,
        message_id: MessageId,
        faults: impl IntoIterator<Item = Fault>,
    ) -> Self {
        self.forward_faults
            .lock()
            .unwrap()
            .entry(message_id)
            .or_default()
            .extend(faults);
        self
    }

    /// Consumed in order by successive `conversation_info` / `lookup_username` calls.
    pub(crate) fn fail_lookups(self, faults: impl IntoIterator<Item = Fault>) -> Self {
        self.lookup_faults.lock().unwrap().extend(faults);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn sent_texts(&self) -> Vec<(ChatId, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SendHtml { chat_id, text } => Some((chat_id, text)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn network_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn alloc(&self, chat_id: ChatId) -> MessageRef {
        let mut guard = self.next_id.lock().unwrap();
        let id = *guard;
        *guard += 1;
        MessageRef {
            chat_id,
            message_id: MessageId(id),
        }
    }

    fn next_lookup_fault(&self) -> Option<Fault> {
        self.lookup_faults.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl SessionPort for FakeSession {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.record(Call::SendHtml {
            chat_id,
            text: html.to_string(),
        });
        if let Some(fault) = self.send_faults.lock().unwrap().pop_front() {
            return Err(fault.into_error("send"));
        }
        Ok(self.alloc(chat_id))
    }

    async fn forward(&self, chat_id: ChatId, source: MessageRef) -> Result<MessageRef> {
        self.record(Call::Forward { chat_id, source });
        let fault = self
            .forward_faults
            .lock()
            .unwrap()
            .get_mut(&source.message_id)
            .and_then(|q| q.pop_front());
        if let Some(fault) = fault {
            return Err(fault.into_error("forward"));
        }
        Ok(self.alloc(chat_id))
    }

    async fn conversation_info(&self, chat_id: ChatId) -> Result<Conversation> {
        self.record(Call::ConversationInfo(chat_id));
        if let Some(fault) = self.next_lookup_fault() {
            return Err(fault.into_error(&chat_id.to_string()));
        }
        self.known
            .iter()
            .chain(self.members.iter())
            .find(|c| c.id == chat_id)
            .cloned()
            .ok_or_else(|| Error::ChatNotFound(chat_id.to_string()))
    }

    async fn lookup_username(&self, username: &str) -> Result<Conversation> {
        self.record(Call::LookupUsername(username.to_string()));
        if let Some(fault) = self.next_lookup_fault() {
            return Err(fault.into_error(username));
        }
        match self.usernames.get(username) {
            Some(Ok(conv)) => Ok(conv.clone()),
            Some(Err(fault)) => Err(fault.clone().into_error(username)),
            None => Err(Error::ChatNotFound(username.to_string())),
        }
    }

    async fn join_invite_link(&self, link: &str) -> Result<Conversation> {
        self.record(Call::JoinInviteLink(link.to_string()));
        self.joinable
            .get(link)
            .cloned()
            .ok_or_else(|| Error::External("INVITE_HASH_EXPIRED".to_string()))
    }

    async fn conversations(&self) -> Result<Vec<Conversation>> {
        self.record(Call::Conversations);
        Ok(self.members.clone())
    }

    async fn own_conversation(&self) -> Result<ChatId> {
        self.record(Call::OwnConversation);
        self.own
            .ok_or_else(|| Error::Config("own conversation is not configured".to_string()))
    }

    async fn own_user_id(&self) -> Result<UserId> {
        Ok(self.me)
    }
}
