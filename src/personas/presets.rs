//! Built-in persona definitions.

use chrono::{TimeZone, Utc};

use super::traits::{NewPersona, Persona, StoredPersona};

/// Templates offered when creating a persona by hand.
pub fn preset_personas() -> Vec<NewPersona> {
    vec![
        NewPersona {
            name: "Citation Helper".to_string(),
            description: Some(
                "Checks APA 7th edition citations and provides formatting help".to_string(),
            ),
            avatar_glyph: Some("📚".to_string()),
            system_prompt: Some(
                "You are a citation expert specializing in APA 7th edition.".to_string(),
            ),
            is_global: true,
            room_ids: Vec::new(),
        },
        NewPersona {
            name: "Peer Reviewer".to_string(),
            description: Some("Provides constructive feedback on writing".to_string()),
            avatar_glyph: Some("✍️".to_string()),
            system_prompt: Some("You are a supportive peer reviewer.".to_string()),
            is_global: true,
            room_ids: Vec::new(),
        },
        NewPersona {
            name: "Devil's Advocate".to_string(),
            description: Some("Challenges arguments to help strengthen them".to_string()),
            avatar_glyph: Some("😈".to_string()),
            system_prompt: Some(
                "You play devil's advocate to help students strengthen their arguments."
                    .to_string(),
            ),
            is_global: true,
            room_ids: Vec::new(),
        },
    ]
}

/// Find a preset by name, ignoring case.
pub fn find_preset(name: &str) -> Option<NewPersona> {
    preset_personas()
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

fn demo(
    id: &str,
    name: &str,
    glyph: &str,
    description: &str,
    personality: &str,
    rooms: &[&str],
) -> StoredPersona {
    StoredPersona {
        persona: Persona::new(id, name).with_glyph(glyph),
        description: Some(description.to_string()),
        system_prompt: Some(personality.to_string()),
        is_global: false,
        room_ids: rooms.iter().map(|r| (*r).to_string()).collect(),
        created_at: Utc
            .with_ymd_and_hms(2024, 1, 15, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now),
    }
}

/// The demo classroom: four tutoring bots spread over five rooms.
///
/// `room-5` is the multi-bot room and carries Grammar Guru, Vocabulary
/// Victor and Conversation Coach, in that order.
pub fn demo_personas() -> Vec<StoredPersona> {
    vec![
        demo(
            "bot-1",
            "Grammar Guru",
            "📝",
            "Helps with grammar and sentence structure",
            "Friendly and patient, loves to explain grammatical rules",
            &["room-1", "room-5"],
        ),
        demo(
            "bot-2",
            "Vocabulary Victor",
            "📖",
            "Expands your vocabulary and teaches new words",
            "Enthusiastic about words and their meanings",
            &["room-2", "room-5"],
        ),
        demo(
            "bot-3",
            "Conversation Coach",
            "💬",
            "Practices conversational English",
            "Casual and encouraging, great for practice",
            &["room-3", "room-5"],
        ),
        demo(
            "bot-4",
            "Writing Wizard",
            "🪄",
            "Assists with essays and creative writing",
            "Thoughtful and detailed, provides constructive feedback",
            &["room-4"],
        ),
    ]
}
