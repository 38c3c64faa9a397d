//! Messaging seam and the ProTalk bot API client.
//!
//! A [`MessagingClient`] performs one request per message and reports failures as
//! [`MessagingError`]. [`MessagingClient::send_message`] is the single place where a
//! failure is logged and replaced by the offline fallback; sessions go through it.

mod protalk;

pub use protalk::{
    validate_reply, BotCredentials, ContractViolation, ProTalkClient, ReplyValidation,
};

use async_trait::async_trait;

use crate::fallback;

/// Sends one message in a conversation and returns the remote reply text.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// One attempt, no retries. `conversation_id` scopes the remote dialogue.
    async fn ask(&self, conversation_id: &str, message: &str) -> Result<String, MessagingError>;

    /// Like [`ask`](Self::ask), but any failure is logged and replaced by
    /// [`fallback::reply`] for the same message. Never fails.
    async fn send_message(&self, conversation_id: &str, message: &str) -> String {
        match self.ask(conversation_id, message).await {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!(
                    "messaging: {} failure for chat {}, using offline fallback: {}",
                    e.kind().as_str(),
                    conversation_id,
                    e
                );
                fallback::reply(message)
            }
        }
    }
}

/// Which class of failure a [`MessagingError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network, DNS, timeout, refused connection.
    Transport,
    /// Non-success HTTP status.
    Protocol,
    /// Success status but an unusable body.
    Contract,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Protocol => "protocol",
            FailureKind::Contract => "contract",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("protalk request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("protalk api error at {endpoint}: {status} {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("protalk returned malformed json at {endpoint}: {source}; body: {body}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
        body: String,
    },
    #[error("protalk reply rejected at {endpoint}: {violation}; body: {body}")]
    Contract {
        endpoint: String,
        violation: ContractViolation,
        body: String,
    },
}

impl MessagingError {
    pub fn kind(&self) -> FailureKind {
        match self {
            MessagingError::Transport { .. } => FailureKind::Transport,
            MessagingError::Status { .. } => FailureKind::Protocol,
            MessagingError::Decode { .. } | MessagingError::Contract { .. } => {
                FailureKind::Contract
            }
        }
    }
}
