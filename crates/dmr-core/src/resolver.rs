//! Destination descriptor → conversation handle.
//!
//! Accepted descriptors, checked in this order:
//! - `me` / `self`: the account's own conversation
//! - a numeric id, optionally negative (`-1001234567890`)
//! - a private invite link (`https://t.me/+hash`, `https://t.me/joinchat/hash`)
//! - a username (`@name`, `name`, `https://t.me/name`)
//!
//! Resolution runs once at startup; the result is cached for the life of the resolver.

use std::{fmt, sync::Arc, sync::OnceLock};

use regex::Regex;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::{
    domain::ChatId,
    errors::{Error, ResolutionError},
    messaging::{port::SessionPort, types::Conversation},
    retry::with_retry,
};

pub const MAX_USERNAME_LEN: usize = 32;

/// How a destination was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionMethod {
    OwnConversation,
    Numeric,
    InviteLink,
    Username,
    MembershipScan,
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResolutionMethod::OwnConversation => "own conversation",
            ResolutionMethod::Numeric => "numeric id",
            ResolutionMethod::InviteLink => "invite link",
            ResolutionMethod::Username => "username lookup",
            ResolutionMethod::MembershipScan => "existing membership",
        };
        f.write_str(s)
    }
}

/// The relay target. Built once; every relay reads it, nothing writes it again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedDestination {
    chat_id: ChatId,
    title: Option<String>,
    method: ResolutionMethod,
}

impl ResolvedDestination {
    pub fn new(chat_id: ChatId, title: Option<String>, method: ResolutionMethod) -> Self {
        Self {
            chat_id,
            title,
            method,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn method(&self) -> ResolutionMethod {
        self.method
    }
}

/// A descriptor after cleaning, before any network call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Descriptor {
    OwnConversation,
    Numeric(i64),
    InviteLink(String),
    Username(String),
}

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+$").expect("valid regex"))
}

fn link_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:https?://)?t\.me/").expect("valid regex"))
}

/// Telegram's username alphabet: a letter first, then letters, digits or `_`; at least four
/// characters. Over-long names are rejected earlier with their own error.
fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{3,31}$").expect("valid regex"))
}

fn invite_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)t\.me/(\+|joinchat/)").expect("valid regex"))
}

/// Classify a raw descriptor. Pure; rejects malformed usernames without touching the network.
pub fn classify(raw: &str) -> Result<Descriptor, ResolutionError> {
    let trimmed = raw.trim();
    let cleaned = strip_link_prefix(trimmed);

    if cleaned.eq_ignore_ascii_case("me") || cleaned.eq_ignore_ascii_case("self") {
        return Ok(Descriptor::OwnConversation);
    }

    if numeric_re().is_match(cleaned) {
        return cleaned
            .parse::<i64>()
            .map(Descriptor::Numeric)
            .map_err(|e| ResolutionError::Unreachable {
                descriptor: raw.to_string(),
                reason: format!("numeric id out of range: {e}"),
            });
    }

    if invite_re().is_match(trimmed) {
        return Ok(Descriptor::InviteLink(trimmed.to_string()));
    }

    // `t.me/name/123` (message link) and `t.me/name?start=x` still name the chat `name`.
    let username = cleaned
        .split(['/', '?'])
        .next()
        .unwrap_or_default()
        .to_string();
    let len = username.chars().count();
    if len == 0 || len > MAX_USERNAME_LEN {
        return Err(ResolutionError::UsernameTooLong { username, len });
    }
    if !username_re().is_match(&username) {
        return Err(ResolutionError::InvalidUsername { username });
    }
    Ok(Descriptor::Username(username))
}

fn strip_link_prefix(s: &str) -> &str {
    let rest = match link_prefix_re().find(s) {
        Some(m) => &s[m.end()..],
        None => s,
    };
    rest.strip_prefix('@').unwrap_or(rest)
}

/// The hash part of a private invite link; `+hash` and `joinchat/hash` name the same invite.
fn invite_hash(link: &str) -> Option<&str> {
    let link = link.trim();
    let lower = link.to_ascii_lowercase();
    let at = lower.find("t.me/")? + "t.me/".len();
    let rest = &link[at..];
    let hash = rest
        .strip_prefix('+')
        .or_else(|| {
            rest.get(..9)
                .filter(|p| p.eq_ignore_ascii_case("joinchat/"))
                .map(|_| &rest[9..])
        })?;
    let hash = hash.split(['/', '?']).next().unwrap_or_default();
    (!hash.is_empty()).then_some(hash)
}

fn same_invite(a: &str, b: &str) -> bool {
    matches!((invite_hash(a), invite_hash(b)), (Some(x), Some(y)) if x == y)
}

/// Turns the configured descriptor into a [`ResolvedDestination`], once.
pub struct DestinationResolver {
    session: Arc<dyn SessionPort>,
    resolved: OnceCell<ResolvedDestination>,
}

impl DestinationResolver {
    pub fn new(session: Arc<dyn SessionPort>) -> Self {
        Self {
            session,
            resolved: OnceCell::new(),
        }
    }

    /// The cached destination, if resolution already succeeded.
    pub fn resolved(&self) -> Option<&ResolvedDestination> {
        self.resolved.get()
    }

    /// Resolve `descriptor`. After the first success every call returns the cached value
    /// without touching the session (no repeated joins or lookups).
    pub async fn resolve(&self, descriptor: &str) -> Result<ResolvedDestination, ResolutionError> {
        self.resolved
            .get_or_try_init(|| self.resolve_uncached(descriptor))
            .await
            .cloned()
    }

    async fn resolve_uncached(
        &self,
        descriptor: &str,
    ) -> Result<ResolvedDestination, ResolutionError> {
        let dest = match classify(descriptor)? {
            Descriptor::OwnConversation => self.resolve_own(descriptor).await?,
            Descriptor::Numeric(id) => self.resolve_numeric(descriptor, ChatId(id)).await?,
            Descriptor::InviteLink(link) => self.resolve_invite(&link).await?,
            Descriptor::Username(name) => self.resolve_username(&name).await?,
        };

        info!(
            chat_id = dest.chat_id.0,
            title = dest.title.as_deref().unwrap_or(""),
            method = %dest.method,
            "destination resolved"
        );
        Ok(dest)
    }

    async fn resolve_own(&self, descriptor: &str) -> Result<ResolvedDestination, ResolutionError> {
        let chat_id = self.session.own_conversation().await.map_err(|e| {
            ResolutionError::Unreachable {
                descriptor: descriptor.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(ResolvedDestination::new(
            chat_id,
            None,
            ResolutionMethod::OwnConversation,
        ))
    }

    async fn resolve_numeric(
        &self,
        descriptor: &str,
        chat_id: ChatId,
    ) -> Result<ResolvedDestination, ResolutionError> {
        let conv = with_retry("get_chat", || self.session.conversation_info(chat_id))
            .await
            .map_err(|e| ResolutionError::Unreachable {
                descriptor: descriptor.to_string(),
                reason: e.to_string(),
            })?;
        Ok(ResolvedDestination::new(
            chat_id,
            conv.title,
            ResolutionMethod::Numeric,
        ))
    }

    async fn resolve_invite(&self, link: &str) -> Result<ResolvedDestination, ResolutionError> {
        let join_err = match with_retry("join_chat", || self.session.join_invite_link(link)).await
        {
            Ok(conv) => {
                return Ok(ResolvedDestination::new(
                    conv.id,
                    conv.title,
                    ResolutionMethod::InviteLink,
                ))
            }
            Err(e) => e,
        };

        warn!(error = %join_err, "joining via invite link failed, scanning existing chats");

        let members = with_retry("list_chats", || self.session.conversations())
            .await
            .map_err(|e| ResolutionError::JoinFailed {
                descriptor: link.to_string(),
                reason: format!("{join_err}; listing chats also failed: {e}"),
            })?;

        match find_by_invite(&members, link) {
            Some(conv) => Ok(ResolvedDestination::new(
                conv.id,
                conv.title.clone(),
                ResolutionMethod::MembershipScan,
            )),
            None => Err(ResolutionError::JoinFailed {
                descriptor: link.to_string(),
                reason: format!(
                    "{join_err}; none of {} known chats uses this invite link",
                    members.len()
                ),
            }),
        }
    }

    async fn resolve_username(
        &self,
        username: &str,
    ) -> Result<ResolvedDestination, ResolutionError> {
        let conv = with_retry("get_chat", || self.session.lookup_username(username))
            .await
            .map_err(|e| username_error(username, e))?;
        Ok(ResolvedDestination::new(
            conv.id,
            conv.title,
            ResolutionMethod::Username,
        ))
    }
}

fn find_by_invite<'a>(members: &'a [Conversation], link: &str) -> Option<&'a Conversation> {
    members.iter().find(|c| {
        c.invite_link
            .as_deref()
            .map(|l| same_invite(l, link))
            .unwrap_or(false)
    })
}

fn username_error(username: &str, e: Error) -> ResolutionError {
    let username = username.to_string();
    match e {
        Error::ChatNotFound(_) => ResolutionError::NotFound { username },
        Error::ChannelPrivate(_) => ResolutionError::PrivateChannel { username },
        other => ResolutionError::Unreachable {
            descriptor: username,
            reason: other.to_string(),
        },
    }
}
