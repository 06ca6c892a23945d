use crate::personas::Persona;

/// Reply used when the producer can't answer. Same inputs, same text.
pub fn fallback_response(persona: &Persona, requester_display_name: &str) -> String {
    let requester = match requester_display_name.trim() {
        "" => "you",
        name => name,
    };
    format!(
        "{} {} responds to {}: \"I read your message and suggest improving clarity. (offline response)\"",
        persona.glyph(),
        persona.display_name,
        requester
    )
}
