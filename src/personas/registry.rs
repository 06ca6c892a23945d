//! Immutable persona registry snapshots.

use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use super::traits::Persona;
use crate::mentions::matcher::pattern_body;
use crate::mentions::MentionPattern;

/// Reasons a set of personas cannot form a registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("malformed persona at position {index}: {reason}")]
    MalformedPersona { index: usize, reason: String },

    #[error("duplicate persona id '{id}'")]
    DuplicateId { id: String },

    #[error("display name '{name}' is used by both '{first}' and '{second}'")]
    DuplicateName {
        name: String,
        first: String,
        second: String,
    },

    #[error("cannot build mention pattern for '{name}': {reason}")]
    Pattern { name: String, reason: String },
}

#[derive(Debug, Clone)]
pub(crate) struct RegistryEntry {
    pub(crate) persona: Persona,
    pub(crate) pattern: MentionPattern,
}

/// An ordered, validated set of personas with precompiled mention patterns.
///
/// Cloning is cheap; the entries are shared. A registry never changes after
/// it is built; refreshing means building a new one.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Arc<[RegistryEntry]>,
}

impl Registry {
    pub fn empty() -> Self {
        Self {
            entries: Arc::from(Vec::<RegistryEntry>::new()),
        }
    }

    pub fn build<I>(personas: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Persona>,
    {
        let mut builder = RegistryBuilder::new();
        builder.extend(personas);
        builder.build()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Personas in registry order.
    pub fn personas(&self) -> impl Iterator<Item = &Persona> {
        self.entries.iter().map(|e| &e.persona)
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas().find(|p| p.id == id)
    }

    pub(crate) fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::empty()
    }
}

/// Collects personas and validates them into a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    personas: Vec<Persona>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, persona: Persona) -> &mut Self {
        self.personas.push(persona);
        self
    }

    pub fn extend<I>(&mut self, personas: I) -> &mut Self
    where
        I: IntoIterator<Item = Persona>,
    {
        self.personas.extend(personas);
        self
    }

    /// Push unless a persona with the same id is already present.
    pub fn push_unique(&mut self, persona: Persona) -> &mut Self {
        if !self.personas.iter().any(|p| p.id == persona.id) {
            self.personas.push(persona);
        }
        self
    }

    /// Validate and compile. Fails on the first malformed or colliding entry.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut ids = HashSet::new();
        let mut names: Vec<(NameKey, String)> = Vec::new();
        let mut entries = Vec::with_capacity(self.personas.len());

        for (index, persona) in self.personas.into_iter().enumerate() {
            if persona.id.trim().is_empty() {
                return Err(RegistryError::MalformedPersona {
                    index,
                    reason: "missing id".to_string(),
                });
            }
            if persona.display_name.trim().is_empty() {
                return Err(RegistryError::MalformedPersona {
                    index,
                    reason: format!("persona '{}' has no display name", persona.id),
                });
            }
            if !ids.insert(persona.id.clone()) {
                return Err(RegistryError::DuplicateId { id: persona.id });
            }

            if let Some((_, first)) = names
                .iter()
                .find(|(key, _)| key.matches(&persona.display_name))
            {
                return Err(RegistryError::DuplicateName {
                    name: persona.display_name,
                    first: first.clone(),
                    second: persona.id,
                });
            }
            let key = NameKey::new(&persona.display_name).map_err(|e| RegistryError::Pattern {
                name: persona.display_name.clone(),
                reason: e.to_string(),
            })?;
            names.push((key, persona.id.clone()));

            let pattern = MentionPattern::compile(&persona.display_name).map_err(|e| {
                RegistryError::Pattern {
                    name: persona.display_name.clone(),
                    reason: e.to_string(),
                }
            })?;
            entries.push(RegistryEntry { persona, pattern });
        }

        tracing::debug!(personas = entries.len(), "Registry built");
        Ok(Registry {
            entries: Arc::from(entries),
        })
    }
}

/// Anchored, case-insensitive form of a display name.
///
/// Two names collide when the key of one matches the other in full. The key
/// is built by the same rules as [`MentionPattern`], so it folds case exactly
/// like mention detection does (`ς`, `σ` and `Σ` are one name).
#[derive(Debug, Clone)]
pub(crate) struct NameKey {
    regex: Regex,
}

impl NameKey {
    pub(crate) fn new(display_name: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&format!("^{}$", pattern_body(display_name)))
            .case_insensitive(true)
            .build()?;
        Ok(Self { regex })
    }

    pub(crate) fn matches(&self, display_name: &str) -> bool {
        let normalized = display_name.split_whitespace().collect::<Vec<_>>().join(" ");
        self.regex.is_match(&normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_in_given_order() {
        let reg = Registry::build([
            Persona::new("c", "Charlie"),
            Persona::new("a", "Alpha"),
        ])
        .unwrap();
        let ids: Vec<&str> = reg.personas().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get("a").unwrap().display_name, "Alpha");
        assert!(reg.get("zzz").is_none());
    }

    #[test]
    fn rejects_blank_display_name() {
        let err = Registry::build([Persona::new("a", "Alpha"), Persona::new("b", "   ")])
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedPersona { index: 1, .. }));
    }

    #[test]
    fn rejects_blank_id() {
        let err = Registry::build([Persona::new("", "Alpha")]).unwrap_err();
        assert!(matches!(err, RegistryError::MalformedPersona { index: 0, .. }));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = Registry::build([Persona::new("a", "Alpha"), Persona::new("a", "Bravo")])
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId { id: "a".to_string() });
    }

    #[test]
    fn rejects_names_equal_ignoring_case_and_spacing() {
        let err = Registry::build([
            Persona::new("a", "Grammar Guru"),
            Persona::new("b", "grammar   GURU"),
        ])
        .unwrap_err();
        match err {
            RegistryError::DuplicateName { first, second, .. } => {
                assert_eq!(first, "a");
                assert_eq!(second, "b");
            }
            other => panic!("expected DuplicateName, got {other:?}"),
        }
    }

    #[test]
    fn rejects_names_equal_under_unicode_case_folding() {
        let err = Registry::build([
            Persona::new("a", "Σοφός"),
            Persona::new("b", "σοφόσ"),
        ])
        .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName { .. }));

        let registry = Registry::build([Persona::new("a", "Σοφός")]).unwrap();
        assert_eq!(crate::mentions::detect_mentions("@σοφόσ hi", &registry).len(), 1);
    }

    #[test]
    fn name_key_tells_distinct_names_apart() {
        let key = NameKey::new("Grammar Guru").unwrap();
        assert!(key.matches("  grammar \t GURU "));
        assert!(!key.matches("Grammar Guruish"));
        assert!(!key.matches("Grammar"));
    }

    #[test]
    fn push_unique_skips_seen_ids() {
        let mut builder = RegistryBuilder::new();
        builder
            .push(Persona::new("a", "Alpha"))
            .push_unique(Persona::new("a", "Alpha"))
            .push_unique(Persona::new("b", "Bravo"));
        let reg = builder.build().unwrap();
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn empty_registry_is_default() {
        let reg = Registry::default();
        assert!(reg.is_empty());
        assert_eq!(reg.personas().count(), 0);
    }

    #[test]
    fn clones_share_entries() {
        let reg = Registry::build([Persona::new("a", "Alpha")]).unwrap();
        let copy = reg.clone();
        assert!(Arc::ptr_eq(&reg.entries, &copy.entries));
    }
}
