//! Conversation session: an append-only transcript plus the send pipeline.
//!
//! `send` appends the user turn, asks the [`MessagingClient`], and appends exactly one
//! assistant turn: the remote reply, the offline fallback when the call fails, or the
//! surface's apology when the pipeline itself panics. A busy flag rejects overlapping
//! sends and is cleared once the assistant turn is in place, even if the caller stopped
//! waiting.

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::messaging::MessagingClient;

const COACH_WELCOME: &str = "Привет! Я ваш AI Коуч по делегированию. У вас есть сомнения по поводу какой-то задачи или вы не знаете, кому её поручить? Расскажите мне ситуацию.";
const COACH_APOLOGY: &str = "Извините, произошла ошибка соединения с AI Коучем.";
const PLANNER_APOLOGY: &str = "Произошла ошибка при генерации. Пожалуйста, проверьте соединение.";

/// Which screen a session belongs to; decides id namespace, welcome and apology texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Free-form chat with the AI coach.
    Coach,
    /// Plan-to-instruction generator.
    Planner,
}

impl Surface {
    pub fn namespace(&self) -> &'static str {
        match self {
            Surface::Coach => "coach",
            Surface::Planner => "planner",
        }
    }

    /// Turn the transcript is seeded with, if any.
    pub fn welcome(&self) -> Option<&'static str> {
        match self {
            Surface::Coach => Some(COACH_WELCOME),
            Surface::Planner => None,
        }
    }

    /// Assistant text used when the send pipeline faults.
    pub fn apology(&self) -> &'static str {
        match self {
            Surface::Coach => COACH_APOLOGY,
            Surface::Planner => PLANNER_APOLOGY,
        }
    }
}

/// Opaque id scoping one dialogue on the remote side: `<namespace>_<unix millis>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn generate(namespace: &str) -> Self {
        Self(format!("{}_{}", namespace, Utc::now().timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User,
    Assistant,
}

/// One message in the transcript. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub author: Author,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(body: impl Into<String>) -> Self {
        Self::new(Author::User, body)
    }

    pub fn assistant(body: impl Into<String>) -> Self {
        Self::new(Author::Assistant, body)
    }

    fn new(author: Author, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author,
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

/// Holds the busy flag for the lifetime of one send; clears it on drop.
pub(crate) struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    /// Returns None when a send is already in flight.
    pub(crate) fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard(flag.clone()))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Send through `client` (failures already degrade to the fallback there) and
/// turn a panic into `surface`'s apology.
pub(crate) async fn exchange(
    client: &dyn MessagingClient,
    surface: Surface,
    conversation_id: &ConversationId,
    message: &str,
) -> String {
    let outcome = AssertUnwindSafe(client.send_message(conversation_id.as_str(), message))
        .catch_unwind()
        .await;
    match outcome {
        Ok(reply) => reply,
        Err(payload) => {
            log::error!(
                "{}: send pipeline panicked for chat {}: {}",
                surface.namespace(),
                conversation_id,
                panic_message(payload.as_ref())
            );
            surface.apology().to_string()
        }
    }
}

/// One chat surface's conversation with the assistant.
pub struct ConversationSession {
    id: ConversationId,
    surface: Surface,
    client: Arc<dyn MessagingClient>,
    transcript: Arc<RwLock<Vec<ConversationTurn>>>,
    busy: Arc<AtomicBool>,
}

impl ConversationSession {
    /// New session with a generated id, seeded with the surface's welcome turn.
    pub fn new(surface: Surface, client: Arc<dyn MessagingClient>) -> Self {
        Self::with_id(surface, ConversationId::generate(surface.namespace()), client)
    }

    pub fn with_id(
        surface: Surface,
        id: ConversationId,
        client: Arc<dyn MessagingClient>,
    ) -> Self {
        let transcript = surface
            .welcome()
            .map(|w| vec![ConversationTurn::assistant(w)])
            .unwrap_or_default();
        Self {
            id,
            surface,
            client,
            transcript: Arc::new(RwLock::new(transcript)),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// True while a send is in flight; input should be disabled.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Snapshot of the transcript in display order.
    pub async fn transcript(&self) -> Vec<ConversationTurn> {
        self.transcript.read().await.clone()
    }

    /// Send `text` and append the user turn and its assistant turn.
    ///
    /// Returns the assistant turn, or None (and changes nothing) when `text` is blank
    /// or another send is in flight. Once the user turn is appended, the exchange runs
    /// on its own task: dropping this future does not stop the assistant turn from
    /// being appended, and the session stays busy until it is.
    pub async fn send(&self, text: &str) -> Option<ConversationTurn> {
        if text.trim().is_empty() {
            return None;
        }
        let Some(busy) = BusyGuard::acquire(&self.busy) else {
            log::debug!("{}: send ignored, already busy", self.surface.namespace());
            return None;
        };

        // No await between this push and the spawn below.
        self.transcript
            .write()
            .await
            .push(ConversationTurn::user(text));

        let client = self.client.clone();
        let transcript = self.transcript.clone();
        let surface = self.surface;
        let id = self.id.clone();
        let text = text.to_string();
        let task = tokio::spawn(async move {
            let reply = exchange(client.as_ref(), surface, &id, &text).await;
            let turn = ConversationTurn::assistant(reply);
            transcript.write().await.push(turn.clone());
            drop(busy);
            turn
        });

        match task.await {
            Ok(turn) => Some(turn),
            Err(e) => {
                log::error!(
                    "{}: send task for chat {} failed: {}",
                    surface.namespace(),
                    self.id,
                    e
                );
                None
            }
        }
    }
}
