//! `mention-router persona ...` handlers.

use anyhow::{Context, Result};
use std::io::Write;

use super::presets::{find_preset, preset_personas};
use super::store::registry_for_scope;
use super::traits::{NewPersona, PersonaStore, RegistryScope, StoredPersona};
use crate::PersonaCommands;

pub async fn handle_command<W: Write>(
    command: PersonaCommands,
    store: &dyn PersonaStore,
    out: &mut W,
) -> Result<()> {
    match command {
        PersonaCommands::List { room } => list(store, room, out).await,
        PersonaCommands::Add {
            name,
            glyph,
            description,
            prompt,
            global,
            rooms,
        } => {
            let stored = store
                .create(NewPersona {
                    name,
                    description,
                    avatar_glyph: glyph,
                    system_prompt: prompt,
                    is_global: global,
                    room_ids: rooms,
                })
                .await?;
            writeln!(
                out,
                "Created {} {} ({})",
                stored.persona.glyph(),
                stored.persona.display_name,
                stored.persona.id
            )?;
            Ok(())
        }
        PersonaCommands::Remove { id } => {
            store.delete(&id).await?;
            writeln!(out, "Removed {id}")?;
            Ok(())
        }
        PersonaCommands::Attach { id, room } => {
            store.attach(&id, &room).await?;
            writeln!(out, "Attached {id} to {room}")?;
            Ok(())
        }
        PersonaCommands::Presets { install } => match install {
            Some(name) => {
                let preset = find_preset(&name).with_context(|| {
                    format!(
                        "Unknown preset: {name}. \
                         Run `mention-router persona presets` to list them."
                    )
                })?;
                let stored = store.create(preset).await?;
                writeln!(
                    out,
                    "Installed {} {} ({})",
                    stored.persona.glyph(),
                    stored.persona.display_name,
                    stored.persona.id
                )?;
                Ok(())
            }
            None => {
                writeln!(out, "Presets:")?;
                for preset in preset_personas() {
                    writeln!(
                        out,
                        "  {} {:<18} {}",
                        preset.avatar_glyph.as_deref().unwrap_or(""),
                        preset.name,
                        preset.description.as_deref().unwrap_or("")
                    )?;
                }
                Ok(())
            }
        },
    }
}

async fn list<W: Write>(
    store: &dyn PersonaStore,
    room: Option<String>,
    out: &mut W,
) -> Result<()> {
    let personas = store.list().await?;
    match room {
        Some(room) => {
            let registry = registry_for_scope(&personas, &RegistryScope::Room(room.clone()))?;
            if registry.is_empty() {
                writeln!(out, "No personas in {room}.")?;
                return Ok(());
            }
            writeln!(out, "Personas in {room} ({}):", registry.len())?;
            for persona in registry.personas() {
                writeln!(out, "  {} {} ({})", persona.glyph(), persona.display_name, persona.id)?;
            }
        }
        None => {
            if personas.is_empty() {
                writeln!(out, "No personas stored ({}).", store.name())?;
                return Ok(());
            }
            writeln!(out, "Personas ({}):", personas.len())?;
            for stored in &personas {
                writeln!(out, "  {}", describe(stored))?;
            }
        }
    }
    Ok(())
}

fn describe(stored: &StoredPersona) -> String {
    let scope = if stored.is_global {
        "global".to_string()
    } else if stored.room_ids.is_empty() {
        "unattached".to_string()
    } else {
        stored.room_ids.join(", ")
    };
    format!(
        "{} {} ({}) [{scope}]",
        stored.persona.glyph(),
        stored.persona.display_name,
        stored.persona.id
    )
}
