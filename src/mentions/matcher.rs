//! `@name` mention detection over a registry snapshot.

use regex::{Regex, RegexBuilder};
use std::ops::Range;

use crate::personas::{Persona, Registry};

/// Compiled `@<display name>` pattern for a single persona.
///
/// Each run of whitespace in the name becomes `\s+`; everything else is
/// matched literally. Matching is case-insensitive and unanchored, so
/// `@Grammar Guruish` still contains a mention of `Grammar Guru`.
#[derive(Debug, Clone)]
pub struct MentionPattern {
    regex: Regex,
}

impl MentionPattern {
    pub fn compile(display_name: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&format!("@{}", pattern_body(display_name)))
            .case_insensitive(true)
            .build()?;
        Ok(Self { regex })
    }

    /// Byte span of the first occurrence in `text`.
    pub fn find(&self, text: &str) -> Option<Range<usize>> {
        self.regex.find(text).map(|m| m.range())
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Escaped name with each whitespace run replaced by `\s+`.
pub(crate) fn pattern_body(display_name: &str) -> String {
    display_name
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

/// A persona addressed by a message, with the text that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionMatch {
    pub persona: Persona,
    /// Byte range of the first occurrence within the source text.
    pub span: Range<usize>,
    /// The matched substring, `@` included.
    pub raw: String,
}

/// Find every persona in `registry` mentioned by `text`.
///
/// Results follow registry order, not order of appearance, and each persona
/// appears at most once no matter how often it is mentioned.
pub fn detect_mentions(text: &str, registry: &Registry) -> Vec<MentionMatch> {
    if text.is_empty() || registry.is_empty() || !text.contains('@') {
        return Vec::new();
    }

    registry
        .entries()
        .iter()
        .filter_map(|entry| {
            entry.pattern.find(text).map(|span| MentionMatch {
                persona: entry.persona.clone(),
                raw: text[span.clone()].to_string(),
                span,
            })
        })
        .collect()
}
