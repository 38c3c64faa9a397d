//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.delegation-coach/config.json`) and environment.
//! Every value is optional: a missing bot token never stops the client from being built,
//! it only means every call ends up on the offline fallback path.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::messaging::BotCredentials;

/// Default ProTalk API origin (the bot token is appended as `/ask/{token}`).
pub const DEFAULT_BASE_URL: &str = "https://api.pro-talk.ru/api/v1.0";

/// Bot id used when neither config nor environment provides one.
pub const DEFAULT_BOT_ID: i64 = 14896;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Remote bot API settings.
    #[serde(default)]
    pub protalk: ProTalkConfig,
}

/// ProTalk bot credentials and endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProTalkConfig {
    /// Bot token placed in the request path. Overridden by PROTALK_BOT_TOKEN env.
    pub bot_token: Option<String>,
    /// Bot id sent in the request body. Overridden by PROTALK_BOT_ID env.
    pub bot_id: Option<BotId>,
    /// API base URL. Overridden by PROTALK_API_BASE env.
    pub base_url: Option<String>,
}

/// Bot identifier: the remote API accepts either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BotId {
    Numeric(i64),
    Text(String),
}

impl BotId {
    /// Parse an environment value: integers stay numeric, anything else is kept as text.
    pub fn parse(s: &str) -> Option<Self> {
        let t = s.trim();
        if t.is_empty() {
            return None;
        }
        Some(
            t.parse::<i64>()
                .map(BotId::Numeric)
                .unwrap_or_else(|_| BotId::Text(t.to_string())),
        )
    }
}

impl Default for BotId {
    fn default() -> Self {
        BotId::Numeric(DEFAULT_BOT_ID)
    }
}

impl fmt::Display for BotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotId::Numeric(n) => write!(f, "{}", n),
            BotId::Text(s) => f.write_str(s),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Resolve the bot token: env PROTALK_BOT_TOKEN overrides config. Absent => empty string.
pub fn resolve_bot_token(config: &Config) -> String {
    resolve_bot_token_with(config, env_lookup)
}

/// [`resolve_bot_token`] reading variables through `lookup` instead of the process env.
pub fn resolve_bot_token_with(
    config: &Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> String {
    non_empty(lookup("PROTALK_BOT_TOKEN"))
        .or_else(|| non_empty(config.protalk.bot_token.clone()))
        .unwrap_or_default()
}

/// Resolve the bot id: env PROTALK_BOT_ID overrides config, then [`DEFAULT_BOT_ID`].
pub fn resolve_bot_id(config: &Config) -> BotId {
    resolve_bot_id_with(config, env_lookup)
}

pub fn resolve_bot_id_with(
    config: &Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> BotId {
    lookup("PROTALK_BOT_ID")
        .and_then(|s| BotId::parse(&s))
        .or_else(|| config.protalk.bot_id.clone())
        .unwrap_or_default()
}

/// Resolve the API base URL: env PROTALK_API_BASE overrides config, then [`DEFAULT_BASE_URL`].
pub fn resolve_base_url(config: &Config) -> String {
    resolve_base_url_with(config, env_lookup)
}

pub fn resolve_base_url_with(
    config: &Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> String {
    non_empty(lookup("PROTALK_API_BASE"))
        .or_else(|| non_empty(config.protalk.base_url.clone()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

/// Resolve the credentials every surface's client is built from.
pub fn resolve_credentials(config: &Config) -> BotCredentials {
    resolve_credentials_with(config, env_lookup)
}

pub fn resolve_credentials_with(
    config: &Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> BotCredentials {
    let token = resolve_bot_token_with(config, &lookup);
    if token.is_empty() {
        log::warn!("protalk bot token not configured; replies will come from the offline fallback");
    }
    BotCredentials::new(token, resolve_bot_id_with(config, &lookup))
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("DELEGATION_COACH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".delegation-coach").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default path). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
