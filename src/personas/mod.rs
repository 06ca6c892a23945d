//! Personas: the bots a message can address, and where they come from.

pub mod commands;
pub mod presets;
pub mod registry;
pub mod store;
pub mod traits;

pub use commands::handle_command;
pub use presets::{demo_personas, find_preset, preset_personas};
pub use registry::{Registry, RegistryBuilder, RegistryError};
pub use store::{registry_for_scope, JsonFilePersonaStore};
pub use traits::{
    NewPersona, Persona, PersonaStore, RegistryProvider, RegistryScope, StoredPersona,
    DEFAULT_GLYPH,
};

use anyhow::Result;
use std::path::Path;

/// Open the file-backed persona store.
pub async fn create_persona_store(path: &Path, seed_demo: bool) -> Result<JsonFilePersonaStore> {
    JsonFilePersonaStore::open(path, seed_demo).await
}
