//! A chat room: records a message, routes its mentions, records the replies.

use anyhow::{bail, Context, Result};
use std::sync::Arc;

use crate::dispatch::{DispatchOutcome, MentionRouter};
use crate::personas::{RegistryProvider, RegistryScope};
use crate::transcript::{ConversationSink, TranscriptEntry};

/// Transcript key for messages posted outside any room.
pub const GLOBAL_ROOM: &str = "global";

/// A user message posted to a room.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// `None` posts to the global scope, where only global personas answer.
    pub room_id: Option<String>,
    pub sender_id: String,
    pub sender_name: String,
    pub text: String,
}

pub struct ChatRoom {
    personas: Arc<dyn RegistryProvider>,
    router: MentionRouter,
    transcript: Arc<dyn ConversationSink>,
}

impl ChatRoom {
    pub fn new(
        personas: Arc<dyn RegistryProvider>,
        router: MentionRouter,
        transcript: Arc<dyn ConversationSink>,
    ) -> Self {
        Self {
            personas,
            router,
            transcript,
        }
    }

    pub fn router(&self) -> &MentionRouter {
        &self.router
    }

    pub fn transcript(&self) -> &dyn ConversationSink {
        self.transcript.as_ref()
    }

    /// Post a message. The user entry is recorded first, then one entry per
    /// addressed persona in the order the router returned them.
    ///
    /// Text is trimmed; a blank message is rejected before anything is recorded.
    pub async fn post(&self, message: &InboundMessage) -> Result<Vec<DispatchOutcome>> {
        let text = message.text.trim();
        if text.is_empty() {
            bail!("message must not be empty");
        }
        let scope = match &message.room_id {
            Some(room) => RegistryScope::Room(room.clone()),
            None => RegistryScope::Global,
        };
        let transcript_room = scope.room_id().unwrap_or(GLOBAL_ROOM).to_string();

        let registry = self
            .personas
            .registry(&scope)
            .await
            .with_context(|| format!("Failed to load personas for {transcript_room}"))?;

        self.transcript
            .record(TranscriptEntry::user(
                &transcript_room,
                &message.sender_id,
                &message.sender_name,
                text,
            ))
            .await?;

        let outcomes = self
            .router
            .route(
                text,
                &registry,
                scope.room_id(),
                &message.sender_name,
            )
            .await;

        for outcome in &outcomes {
            self.transcript
                .record(TranscriptEntry::from_outcome(&transcript_room, outcome))
                .await?;
        }
        Ok(outcomes)
    }
}
