//! Composer helpers for completing a partially typed `@mention`.

use crate::personas::{Persona, Registry};

/// The partial name typed after the last `@`, if the user is still typing it.
///
/// Returns `None` when there is no `@` or a space follows it.
pub fn mention_trigger(input: &str) -> Option<&str> {
    let at = input.rfind('@')?;
    let after = &input[at + 1..];
    if after.contains(' ') {
        None
    } else {
        Some(after)
    }
}

/// Personas whose display name contains `trigger`, ignoring case.
pub fn suggest<'r>(registry: &'r Registry, trigger: &str) -> Vec<&'r Persona> {
    if trigger.is_empty() {
        return Vec::new();
    }
    let needle = trigger.to_lowercase();
    registry
        .personas()
        .filter(|p| p.display_name.to_lowercase().contains(&needle))
        .collect()
}

/// Replace the partial mention at the end of `input` with the full name.
pub fn complete_mention(input: &str, display_name: &str) -> String {
    let before = match input.rfind('@') {
        Some(at) => &input[..at],
        None => input,
    };
    format!("{before}@{display_name} ")
}
