use std::{env, fs, path::Path};

use crate::{errors::Error, Result};

/// Typed configuration for the relay.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    /// Destination descriptor, passed to the resolver untouched.
    pub destination: String,
    /// Chat that `me` / `self` refers to.
    pub owner_id: Option<i64>,
    /// Chats reported as existing memberships when an invite link cannot be joined.
    pub scan_chats: Vec<i64>,
    pub startup_notification: bool,
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key → value source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = required(&get, "TELEGRAM_BOT_TOKEN")?;
        let destination = required(&get, "RELAY_DESTINATION")?;

        let owner_id = match get("RELAY_OWNER_ID").and_then(non_empty) {
            Some(raw) => Some(raw.trim().parse::<i64>().map_err(|_| {
                Error::Config(format!("RELAY_OWNER_ID must be a numeric id, got {raw:?}"))
            })?),
            None => None,
        };

        let scan_chats = parse_csv_i64("RELAY_SCAN_CHATS", get("RELAY_SCAN_CHATS"))?;

        let startup_notification = get("RELAY_STARTUP_NOTIFICATION")
            .map(|s| parse_bool(&s))
            .unwrap_or(true);

        Ok(Self {
            telegram_bot_token,
            destination,
            owner_id,
            scan_chats,
            startup_notification,
        })
    }
}

fn required(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    get(key)
        .and_then(non_empty)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim().trim_start_matches("export ").trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_csv_i64(key: &str, v: Option<String>) -> Result<Vec<i64>> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| Error::Config(format!("{key} contains a non-numeric id: {s:?}")))
        })
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
