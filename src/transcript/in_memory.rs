//! In-memory conversation sink.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::traits::{tail, ConversationSink, TranscriptEntry};

/// Per-room transcripts behind a mutex-protected hash map.
pub struct InMemoryTranscript {
    rooms: Mutex<HashMap<String, Vec<TranscriptEntry>>>,
}

impl InMemoryTranscript {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryTranscript {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationSink for InMemoryTranscript {
    async fn record(&self, entry: TranscriptEntry) -> Result<()> {
        let mut rooms = self.rooms.lock();
        rooms.entry(entry.room_id.clone()).or_default().push(entry);
        Ok(())
    }

    async fn history(&self, room_id: &str, limit: Option<usize>) -> Result<Vec<TranscriptEntry>> {
        let rooms = self.rooms.lock();
        let entries = match rooms.get(room_id) {
            Some(entries) => entries.clone(),
            None => return Ok(Vec::new()),
        };
        Ok(tail(entries, limit))
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rooms_are_isolated() {
        let sink = InMemoryTranscript::new();
        sink.record(TranscriptEntry::user("room-1", "u", "Alice", "one"))
            .await
            .unwrap();
        sink.record(TranscriptEntry::user("room-2", "u", "Alice", "two"))
            .await
            .unwrap();

        let room1 = sink.history("room-1", None).await.unwrap();
        assert_eq!(room1.len(), 1);
        assert_eq!(room1[0].content, "one");
        assert!(sink.history("room-9", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_is_oldest_first_and_limited() {
        let sink = InMemoryTranscript::default();
        for text in ["a", "b", "c"] {
            sink.record(TranscriptEntry::user("room-1", "u", "Alice", text))
                .await
                .unwrap();
        }
        let last_two = sink.history("room-1", Some(2)).await.unwrap();
        let contents: Vec<_> = last_two.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, ["b", "c"]);
        assert_eq!(sink.name(), "in_memory");
    }
}
