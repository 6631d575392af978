use std::time::Duration;

/// Core error type for the relay.
///
/// Adapter crates map their platform errors into this type so the resolver and the
/// dispatcher can tell rate limits and lookup failures apart from everything else.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("rate limited: retry after {}s", retry_after.as_secs_f64())]
    RateLimited { retry_after: Duration },

    #[error("chat not found: {0}")]
    ChatNotFound(String),

    #[error("channel is private: {0}")]
    ChannelPrivate(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// Wait duration carried by a rate-limit signal, if this is one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Operator-facing diagnostic for fatal startup errors.
    pub fn diagnostic(&self) -> String {
        match self {
            Error::Resolution(e) => e.diagnostic(),
            Error::Config(msg) => format!(
                "Configuration error: {msg}\n\n\
                 How to fix:\n\
                 1. Set the variable in the environment or in a .env file next to the binary.\n\
                 2. TELEGRAM_BOT_TOKEN comes from @BotFather; RELAY_DESTINATION names the chat \
                 that receives relayed copies (id, @username, t.me link, invite link or `me`)."
            ),
            other => format!("Fatal error: {other}"),
        }
    }
}

/// Why the destination descriptor could not be turned into a conversation handle.
///
/// Every variant is fatal: without a destination the dispatcher has nowhere to relay to.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("destination {descriptor:?} is not reachable: {reason}")]
    Unreachable { descriptor: String, reason: String },

    #[error("could not join or find destination {descriptor:?}: {reason}")]
    JoinFailed { descriptor: String, reason: String },

    #[error("username {username:?} is not a valid Telegram username")]
    InvalidUsername { username: String },

    #[error("username {username:?} must be 1-32 characters (got {len})")]
    UsernameTooLong { username: String, len: usize },

    #[error("no chat with username {username:?}")]
    NotFound { username: String },

    #[error("chat {username:?} is private")]
    PrivateChannel { username: String },
}

impl ResolutionError {
    /// The offending value as the operator wrote it (or as it was cleaned).
    pub fn value(&self) -> &str {
        match self {
            ResolutionError::Unreachable { descriptor, .. }
            | ResolutionError::JoinFailed { descriptor, .. } => descriptor,
            ResolutionError::InvalidUsername { username }
            | ResolutionError::UsernameTooLong { username, .. }
            | ResolutionError::NotFound { username }
            | ResolutionError::PrivateChannel { username } => username,
        }
    }

    fn remediation(&self) -> &'static [&'static str] {
        match self {
            ResolutionError::Unreachable { .. } => &[
                "Check that the numeric id is correct; supergroups and channels start with -100.",
                "Make sure this account is a member of the destination chat.",
                "Send any message in the chat once so the account can see it.",
            ],
            ResolutionError::JoinFailed { .. } => &[
                "Check that the invite link has not expired or been revoked.",
                "Add this account to the chat manually, then list the chat id in RELAY_SCAN_CHATS.",
                "Alternatively set RELAY_DESTINATION to the chat's numeric id.",
            ],
            ResolutionError::InvalidUsername { .. } => &[
                "Usernames start with a letter and contain only letters, digits and underscores.",
                "Use the form @name, name or https://t.me/name.",
            ],
            ResolutionError::UsernameTooLong { .. } => &[
                "Telegram usernames are at most 32 characters long.",
                "If this is an invite link, paste the full https://t.me/+... link.",
            ],
            ResolutionError::NotFound { .. } => &[
                "Check the spelling of the username.",
                "Public chats must have a username set to be found this way.",
                "For private chats use the numeric id or an invite link instead.",
            ],
            ResolutionError::PrivateChannel { .. } => &[
                "Add this account to the chat first.",
                "Then set RELAY_DESTINATION to the chat's numeric id or invite link.",
            ],
        }
    }

    /// Structured diagnostic printed before the process exits.
    pub fn diagnostic(&self) -> String {
        let mut out = format!(
            "Could not resolve RELAY_DESTINATION.\n\nValue: {}\nProblem: {self}\n\nHow to fix:",
            self.value()
        );
        for (i, step) in self.remediation().iter().enumerate() {
            out.push_str(&format!("\n{}. {step}", i + 1));
        }
        out
    }
}

pub type Result<T> = std::result::Result<T, Error>;
