//! JSON-file persona store.
//!
//! Keeps the whole persona list in memory and rewrites the file after every
//! change. A missing file is an empty store.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::presets::demo_personas;
use super::registry::{NameKey, Registry, RegistryBuilder, RegistryError};
use super::traits::{
    NewPersona, Persona, PersonaStore, RegistryProvider, RegistryScope, StoredPersona,
    DEFAULT_GLYPH,
};

pub struct JsonFilePersonaStore {
    path: Option<PathBuf>,
    personas: Mutex<Vec<StoredPersona>>,
    /// Serializes writers; memory is only updated after the file write succeeds.
    write_gate: tokio::sync::Mutex<()>,
}

impl JsonFilePersonaStore {
    /// Open the store at `path`, seeding it with the demo personas when the
    /// file doesn't exist yet and `seed_demo` is set.
    pub async fn open(path: &Path, seed_demo: bool) -> Result<Self> {
        let personas = if path.exists() {
            let contents = fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read persona store {}", path.display()))?;
            if contents.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&contents).with_context(|| {
                    format!("Failed to parse persona store {}", path.display())
                })?
            }
        } else if seed_demo {
            demo_personas()
        } else {
            Vec::new()
        };

        let store = Self {
            path: Some(path.to_path_buf()),
            personas: Mutex::new(personas),
            write_gate: tokio::sync::Mutex::new(()),
        };
        if !path.exists() && seed_demo {
            let seeded = store.personas.lock().clone();
            store.persist(&seeded).await?;
            tracing::info!(path = %path.display(), "Seeded persona store with demo personas");
        }
        Ok(store)
    }

    /// A store that never touches disk.
    pub fn in_memory(personas: Vec<StoredPersona>) -> Self {
        Self {
            path: None,
            personas: Mutex::new(personas),
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn persist(&self, snapshot: &[StoredPersona]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json =
            serde_json::to_string_pretty(snapshot).context("Failed to serialize personas")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    /// Write `next` to disk, then make it the live list. Callers hold the write gate.
    async fn commit(&self, next: Vec<StoredPersona>) -> Result<()> {
        self.persist(&next).await?;
        *self.personas.lock() = next;
        Ok(())
    }
}

#[async_trait]
impl PersonaStore for JsonFilePersonaStore {
    async fn list(&self) -> Result<Vec<StoredPersona>> {
        Ok(self.personas.lock().clone())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredPersona>> {
        Ok(self
            .personas
            .lock()
            .iter()
            .find(|p| p.persona.id == id)
            .cloned())
    }

    async fn create(&self, new: NewPersona) -> Result<StoredPersona> {
        let name = new.name.trim();
        if name.is_empty() {
            bail!("persona name must not be empty");
        }

        let _gate = self.write_gate.lock().await;
        let mut next = self.personas.lock().clone();
        let key = NameKey::new(name).context("persona name cannot be matched")?;
        if let Some(existing) = next.iter().find(|p| key.matches(&p.persona.display_name)) {
            bail!(
                "a persona named '{}' already exists ({})",
                existing.persona.display_name,
                existing.persona.id
            );
        }

        let glyph = new
            .avatar_glyph
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GLYPH.to_string());
        let id = format!("local-{}", uuid::Uuid::new_v4().simple());
        let stored = StoredPersona {
            persona: Persona::new(&id, name).with_glyph(&glyph),
            description: new.description,
            system_prompt: new.system_prompt,
            is_global: new.is_global,
            room_ids: new.room_ids,
            created_at: Utc::now(),
        };
        // Newest first.
        next.insert(0, stored.clone());
        self.commit(next).await?;

        tracing::info!(
            persona = %stored.persona.id,
            name = %stored.persona.display_name,
            "Persona created"
        );
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let mut next = self.personas.lock().clone();
        let before = next.len();
        next.retain(|p| p.persona.id != id);
        if next.len() == before {
            bail!("persona not found: {id}");
        }
        self.commit(next).await?;
        tracing::info!(persona = %id, "Persona deleted");
        Ok(())
    }

    async fn attach(&self, id: &str, room_id: &str) -> Result<()> {
        if room_id.trim().is_empty() {
            bail!("room id must not be empty");
        }
        let _gate = self.write_gate.lock().await;
        let mut next = self.personas.lock().clone();
        let Some(stored) = next.iter_mut().find(|p| p.persona.id == id) else {
            bail!("persona not found: {id}");
        };
        if stored.visible_in(room_id) {
            return Ok(());
        }
        stored.room_ids.push(room_id.to_string());
        self.commit(next).await?;
        tracing::info!(persona = %id, room = %room_id, "Persona attached to room");
        Ok(())
    }

    fn name(&self) -> &str {
        if self.path.is_some() {
            "json-file"
        } else {
            "in-memory"
        }
    }
}

/// Assemble the registry for `scope` from stored personas.
///
/// Room personas come first in store order, then global personas; a global
/// persona also attached to the room appears once, in the room position.
pub fn registry_for_scope(
    personas: &[StoredPersona],
    scope: &RegistryScope,
) -> Result<Registry, RegistryError> {
    let mut builder = RegistryBuilder::new();
    if let Some(room_id) = scope.room_id() {
        for stored in personas.iter().filter(|p| p.visible_in(room_id)) {
            builder.push_unique(stored.persona.clone());
        }
    }
    for stored in personas.iter().filter(|p| p.is_global) {
        builder.push_unique(stored.persona.clone());
    }
    builder.build()
}

#[async_trait]
impl RegistryProvider for JsonFilePersonaStore {
    async fn registry(&self, scope: &RegistryScope) -> Result<Registry> {
        let personas = self.personas.lock().clone();
        let registry = registry_for_scope(&personas, scope)
            .with_context(|| format!("Persona store holds an invalid registry for {scope:?}"))?;
        tracing::debug!(scope = ?scope, personas = registry.len(), "Registry loaded");
        Ok(registry)
    }
}
