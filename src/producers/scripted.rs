//! Keyword-driven canned replies, for demos and offline classrooms.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::dispatch::{DispatchRequest, ProducerError, ResponseProducer};

const GENERIC_REPLY: &str = "Thanks for your message! I'm here to help you learn English.";

#[derive(Debug, Clone)]
pub struct ScriptRule {
    /// Any of these substrings (lowercase) triggers the rule.
    pub keywords: Vec<String>,
    pub reply: String,
}

impl ScriptRule {
    pub fn new(keywords: &[&str], reply: &str) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            reply: reply.to_string(),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// How one persona answers when no provider is wired up.
#[derive(Debug, Clone)]
pub struct PersonaScript {
    pub rules: Vec<ScriptRule>,
    pub default_reply: String,
    /// Append the user's message to the default reply.
    pub echo_message: bool,
}

impl PersonaScript {
    fn reply_to(&self, message: &str) -> String {
        let lowered = message.to_lowercase();
        if let Some(rule) = self.rules.iter().find(|r| r.matches(&lowered)) {
            return rule.reply.clone();
        }
        if self.echo_message {
            format!("{}{}", self.default_reply, message)
        } else {
            self.default_reply.clone()
        }
    }
}

pub struct ScriptedProducer {
    scripts: HashMap<String, PersonaScript>,
    delay: Duration,
}

impl ScriptedProducer {
    pub fn new(scripts: HashMap<String, PersonaScript>) -> Self {
        Self {
            scripts,
            delay: Duration::ZERO,
        }
    }

    /// Simulated typing delay before each reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Scripts for the demo classroom bots (`bot-1`..`bot-4`).
    pub fn demo() -> Self {
        let mut scripts = HashMap::new();
        scripts.insert(
            "bot-1".to_string(),
            PersonaScript {
                rules: vec![
                    ScriptRule::new(
                        &["help", "question"],
                        "I'm here to help with your grammar questions! What would you like to know?",
                    ),
                    ScriptRule::new(
                        &["tense"],
                        "English tenses can be tricky! Which tense are you working on - present, past, or future?",
                    ),
                    ScriptRule::new(
                        &["thanks", "thank"],
                        "You're welcome! Keep practicing and you'll master it in no time!",
                    ),
                ],
                default_reply: "That's an interesting question about grammar! Let me explain: "
                    .to_string(),
                echo_message: true,
            },
        );
        scripts.insert(
            "bot-2".to_string(),
            PersonaScript {
                rules: vec![
                    ScriptRule::new(
                        &["word", "meaning"],
                        "Great question! Let me help you understand that word better. Context is key for vocabulary!",
                    ),
                    ScriptRule::new(
                        &["synonym"],
                        "Looking for synonyms is a great way to expand your vocabulary! Let me suggest some alternatives.",
                    ),
                ],
                default_reply: "Excellent vocabulary practice! Here's what that means: "
                    .to_string(),
                echo_message: true,
            },
        );
        scripts.insert(
            "bot-3".to_string(),
            PersonaScript {
                rules: vec![
                    ScriptRule::new(
                        &["hello", "hi"],
                        "Hello! How are you doing today? Let's have a nice conversation!",
                    ),
                    ScriptRule::new(
                        &["practice"],
                        "Great! Let's practice together. Tell me about your day or any topic you'd like to discuss.",
                    ),
                ],
                default_reply: "That's great to hear! Tell me more about that. ".to_string(),
                echo_message: true,
            },
        );
        scripts.insert(
            "bot-4".to_string(),
            PersonaScript {
                rules: vec![
                    ScriptRule::new(
                        &["essay", "write"],
                        "Writing is a wonderful way to express yourself! What type of writing are you working on?",
                    ),
                    ScriptRule::new(
                        &["feedback"],
                        "I'd be happy to give you feedback! Share your writing and I'll provide constructive suggestions.",
                    ),
                ],
                default_reply: "Interesting writing topic! Let's develop that idea further: "
                    .to_string(),
                echo_message: true,
            },
        );
        Self::new(scripts)
    }
}

#[async_trait]
impl ResponseProducer for ScriptedProducer {
    async fn produce_response(&self, request: &DispatchRequest) -> Result<String, ProducerError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(match self.scripts.get(&request.persona_id) {
            Some(script) => script.reply_to(&request.source_text),
            None => GENERIC_REPLY.to_string(),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
