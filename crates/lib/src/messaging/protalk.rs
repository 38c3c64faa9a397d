//! ProTalk bot API client: `POST {base}/ask/{token}` with `{bot_id, chat_id, message}`.
//!
//! Only the `done` string of the response body is trusted; everything else is ignored.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use super::{MessagingClient, MessagingError};
use crate::config::{BotId, DEFAULT_BASE_URL};

/// Response field carrying the completed answer.
const REPLY_FIELD: &str = "done";

/// Response bodies are cut to this many characters in errors and logs.
const LOG_BODY_LIMIT: usize = 200;

/// Static bot credentials. The token may be empty; calls then fail and fall back.
#[derive(Clone, PartialEq, Eq)]
pub struct BotCredentials {
    token: String,
    id: BotId,
}

impl BotCredentials {
    pub fn new(token: impl Into<String>, id: BotId) -> Self {
        Self {
            token: token.into(),
            id,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn id(&self) -> &BotId {
        &self.id
    }
}

impl fmt::Debug for BotCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotCredentials")
            .field("token", &if self.token.is_empty() { "" } else { "***" })
            .field("id", &self.id)
            .finish()
    }
}

/// Why a decoded response body was not accepted as a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    #[error("response body is not a json object")]
    NotAnObject,
    #[error("reply field `done` is missing")]
    MissingField,
    #[error("reply field `done` is not a string")]
    NotAString,
    #[error("reply field `done` is blank")]
    Blank,
}

/// Result of checking a decoded response against the reply schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyValidation {
    Valid(String),
    Invalid(ContractViolation),
}

/// Check the response shape: an object whose `done` is a non-blank string.
/// The accepted text is returned verbatim (not trimmed).
pub fn validate_reply(body: &Value) -> ReplyValidation {
    let Some(obj) = body.as_object() else {
        return ReplyValidation::Invalid(ContractViolation::NotAnObject);
    };
    match obj.get(REPLY_FIELD) {
        None => ReplyValidation::Invalid(ContractViolation::MissingField),
        Some(Value::String(s)) if s.trim().is_empty() => {
            ReplyValidation::Invalid(ContractViolation::Blank)
        }
        Some(Value::String(s)) => ReplyValidation::Valid(s.clone()),
        Some(_) => ReplyValidation::Invalid(ContractViolation::NotAString),
    }
}

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    bot_id: &'a BotId,
    chat_id: &'a str,
    message: &'a str,
}

/// Client for the ProTalk bot API.
#[derive(Clone)]
pub struct ProTalkClient {
    base_url: String,
    credentials: BotCredentials,
    client: reqwest::Client,
}

impl ProTalkClient {
    pub fn new(credentials: BotCredentials, base_url: Option<String>) -> Self {
        Self::with_http_client(credentials, base_url, reqwest::Client::new())
    }

    /// Use a preconfigured HTTP client (proxy, TLS, or timeout settings).
    pub fn with_http_client(
        credentials: BotCredentials,
        base_url: Option<String>,
        client: reqwest::Client,
    ) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            credentials,
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &BotCredentials {
        &self.credentials
    }

    fn endpoint(&self) -> String {
        format!("{}/ask/{}", self.base_url, self.credentials.token)
    }

    /// Endpoint with the token masked, for errors and logs.
    fn redacted_endpoint(&self) -> String {
        format!("{}/ask/***", self.base_url)
    }
}

#[async_trait]
impl MessagingClient for ProTalkClient {
    async fn ask(&self, conversation_id: &str, message: &str) -> Result<String, MessagingError> {
        let endpoint = self.redacted_endpoint();
        let body = AskRequest {
            bot_id: &self.credentials.id,
            chat_id: conversation_id,
            message,
        };
        let res = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| MessagingError::Transport {
                endpoint: endpoint.clone(),
                source: e.without_url(),
            })?;
        let status = res.status();
        let text = res.text().await.map_err(|e| MessagingError::Transport {
            endpoint: endpoint.clone(),
            source: e.without_url(),
        })?;
        if !status.is_success() {
            return Err(MessagingError::Status {
                endpoint,
                status: status.as_u16(),
                body: truncate_for_log(&text),
            });
        }
        let value: Value = serde_json::from_str(&text).map_err(|source| MessagingError::Decode {
            endpoint: endpoint.clone(),
            source,
            body: truncate_for_log(&text),
        })?;
        match validate_reply(&value) {
            ReplyValidation::Valid(reply) => {
                log::debug!(
                    "protalk: reply for chat {} ({} chars)",
                    conversation_id,
                    reply.chars().count()
                );
                Ok(reply)
            }
            ReplyValidation::Invalid(violation) => Err(MessagingError::Contract {
                endpoint,
                violation,
                body: truncate_for_log(&text),
            }),
        }
    }
}

fn truncate_for_log(s: &str) -> String {
    if s.chars().count() <= LOG_BODY_LIMIT {
        return s.to_string();
    }
    let mut out: String = s.chars().take(LOG_BODY_LIMIT).collect();
    out.push('…');
    out
}
