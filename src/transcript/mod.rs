//! Transcript: where routed conversations are written.

pub mod file;
pub mod in_memory;
pub mod traits;

pub use file::FileTranscript;
pub use in_memory::InMemoryTranscript;
pub use traits::{ConversationSink, SenderKind, TranscriptEntry};

use std::path::PathBuf;

/// File-backed transcript when a directory is configured, in-memory otherwise.
pub fn create_transcript(dir: Option<PathBuf>) -> Box<dyn ConversationSink> {
    match dir {
        Some(dir) => Box::new(FileTranscript::new(dir)),
        None => Box::new(InMemoryTranscript::new()),
    }
}
