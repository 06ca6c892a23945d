//! Mention parsing: finds which personas a message addresses.

pub mod autocomplete;
pub mod matcher;

pub use autocomplete::{complete_mention, mention_trigger, suggest};
pub use matcher::{detect_mentions, MentionMatch, MentionPattern};
