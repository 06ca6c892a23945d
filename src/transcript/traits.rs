//! Conversation sink traits and entry types.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatch::{DispatchOutcome, ResponseSource};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    User,
    Bot,
}

/// One message in a room's conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    pub room_id: String,
    pub sender_kind: SenderKind,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Set on bot entries produced by the fallback template.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl TranscriptEntry {
    pub fn user(room_id: &str, sender_id: &str, sender_name: &str, content: &str) -> Self {
        Self {
            room_id: room_id.to_string(),
            sender_kind: SenderKind::User,
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
            fallback: false,
        }
    }

    pub fn from_outcome(room_id: &str, outcome: &DispatchOutcome) -> Self {
        Self {
            room_id: room_id.to_string(),
            sender_kind: SenderKind::Bot,
            sender_id: outcome.persona_id.clone(),
            sender_name: format!("{} {}", outcome.avatar_glyph, outcome.persona_name),
            content: outcome.text.clone(),
            timestamp: Utc::now(),
            fallback: outcome.source == ResponseSource::Fallback,
        }
    }
}

/// Where a conversation is written after routing.
///
/// Callers record the user message first, then each outcome in the order
/// the router returned them.
#[async_trait]
pub trait ConversationSink: Send + Sync {
    async fn record(&self, entry: TranscriptEntry) -> Result<()>;

    /// The last `limit` entries of a room, oldest first.
    async fn history(&self, room_id: &str, limit: Option<usize>) -> Result<Vec<TranscriptEntry>>;

    fn name(&self) -> &str;
}

/// Keep the newest `limit` entries of an oldest-first list.
pub(crate) fn tail(entries: Vec<TranscriptEntry>, limit: Option<usize>) -> Vec<TranscriptEntry> {
    match limit {
        Some(n) => {
            let start = entries.len().saturating_sub(n);
            entries[start..].to_vec()
        }
        None => entries,
    }
}
