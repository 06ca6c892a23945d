use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::personas::Persona;

/// Who is asking and where; shared by every dispatch for one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchContext {
    pub room_id: Option<String>,
    pub requester_display_name: String,
    /// The full original message, not just the mention.
    pub source_text: String,
}

/// What a response producer receives for one addressed persona.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchRequest {
    pub persona_id: String,
    pub room_id: Option<String>,
    pub source_text: String,
    pub requester_display_name: String,
}

/// Where the text of an outcome came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResponseSource {
    Producer,
    Fallback,
}

/// A response-shaped reply for one persona, ready for the transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub persona_id: String,
    pub persona_name: String,
    pub avatar_glyph: String,
    pub text: String,
    pub source: ResponseSource,
}

impl DispatchOutcome {
    pub fn is_fallback(&self) -> bool {
        self.source == ResponseSource::Fallback
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProducerError {
    #[error("response producer unavailable: {0}")]
    Unavailable(String),

    #[error("response producer failed: {0}")]
    Failed(String),

    #[error("response producer timed out after {0:?}")]
    Timeout(Duration),

    #[error("response producer returned an empty reply")]
    EmptyResponse,
}

impl ProducerError {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProducerError::Unavailable(_) => "unavailable",
            ProducerError::Failed(_) => "failed",
            ProducerError::Timeout(_) => "timeout",
            ProducerError::EmptyResponse => "empty",
        }
    }
}

/// Turns a dispatch request into reply text. May be a remote call.
#[async_trait]
pub trait ResponseProducer: Send + Sync {
    async fn produce_response(&self, request: &DispatchRequest) -> Result<String, ProducerError>;

    /// The name of this producer implementation.
    fn name(&self) -> &str;
}

/// A producer failure that was replaced by a fallback reply.
#[derive(Debug, Clone)]
pub struct DispatchFailure {
    pub persona: Persona,
    pub room_id: Option<String>,
    pub producer: String,
    pub error: ProducerError,
}

/// Hook for watching dispatches without changing their results.
pub trait DispatchObserver: Send + Sync {
    fn on_failure(&self, failure: &DispatchFailure);

    fn on_outcome(&self, _outcome: &DispatchOutcome) {}
}

impl<F> DispatchObserver for F
where
    F: Fn(&DispatchFailure) + Send + Sync,
{
    fn on_failure(&self, failure: &DispatchFailure) {
        self(failure);
    }
}
