//! Persona types and the storage/provider traits behind the registry.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::registry::Registry;

/// Glyph shown for personas that don't carry their own.
pub const DEFAULT_GLYPH: &str = "🤖";

/// A named conversational entity that can be addressed with `@name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Persona {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_glyph: Option<String>,
}

impl Persona {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            avatar_glyph: None,
        }
    }

    pub fn with_glyph(mut self, glyph: &str) -> Self {
        self.avatar_glyph = Some(glyph.to_string());
        self
    }

    /// The avatar glyph, or [`DEFAULT_GLYPH`] when none is set.
    pub fn glyph(&self) -> &str {
        match self.avatar_glyph.as_deref() {
            Some(glyph) if !glyph.trim().is_empty() => glyph,
            _ => DEFAULT_GLYPH,
        }
    }
}

/// A persona as persisted by a [`PersonaStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPersona {
    #[serde(flatten)]
    pub persona: Persona,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Global personas are visible in every room.
    #[serde(default)]
    pub is_global: bool,
    /// Rooms this persona is attached to.
    #[serde(default)]
    pub room_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredPersona {
    pub fn visible_in(&self, room_id: &str) -> bool {
        self.room_ids.iter().any(|r| r == room_id)
    }
}

/// Input for creating a persona.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPersona {
    pub name: String,
    pub description: Option<String>,
    pub avatar_glyph: Option<String>,
    pub system_prompt: Option<String>,
    pub is_global: bool,
    pub room_ids: Vec<String>,
}

/// Which personas a registry should contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryScope {
    /// Personas attached to the room, followed by global personas.
    Room(String),
    /// Global personas only.
    Global,
}

impl RegistryScope {
    pub fn room_id(&self) -> Option<&str> {
        match self {
            RegistryScope::Room(id) => Some(id),
            RegistryScope::Global => None,
        }
    }
}

/// Persistent storage for persona definitions.
#[async_trait]
pub trait PersonaStore: Send + Sync {
    /// All stored personas, in store order.
    async fn list(&self) -> Result<Vec<StoredPersona>>;

    /// Look up a persona by id.
    async fn get(&self, id: &str) -> Result<Option<StoredPersona>>;

    /// Create a persona. Returns the stored record with its assigned id.
    async fn create(&self, persona: NewPersona) -> Result<StoredPersona>;

    /// Delete a persona by id.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Attach an existing persona to a room.
    async fn attach(&self, id: &str, room_id: &str) -> Result<()>;

    /// The name of this store implementation.
    fn name(&self) -> &str;
}

/// Supplies immutable registry snapshots for a chat context.
#[async_trait]
pub trait RegistryProvider: Send + Sync {
    /// Build a validated registry for the given scope.
    async fn registry(&self, scope: &RegistryScope) -> Result<Registry>;
}
