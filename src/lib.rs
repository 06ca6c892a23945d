#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::assigning_clones,
    clippy::bool_to_int_with_if,
    clippy::case_sensitive_file_extension_comparisons,
    clippy::cast_possible_wrap,
    clippy::doc_markdown,
    clippy::field_reassign_with_default,
    clippy::float_cmp,
    clippy::implicit_clone,
    clippy::items_after_statements,
    clippy::map_unwrap_or,
    clippy::manual_let_else,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::needless_pass_by_value,
    clippy::needless_raw_string_hashes,
    clippy::redundant_closure_for_method_calls,
    clippy::return_self_not_must_use,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::struct_field_names,
    clippy::too_many_lines,
    clippy::uninlined_format_args,
    clippy::unnecessary_cast,
    clippy::unnecessary_lazy_evaluations,
    clippy::unnecessary_literal_bound,
    clippy::unnecessary_map_or,
    clippy::unused_self,
    clippy::cast_precision_loss,
    clippy::unnecessary_wraps,
    dead_code
)]

use clap::Subcommand;
use serde::{Deserialize, Serialize};

pub mod config;
pub mod dispatch;
pub mod mentions;
pub mod observability;
pub mod personas;
pub mod producers;
pub mod room;
pub mod transcript;

pub use config::Config;
pub use dispatch::{DispatchOutcome, MentionRouter};
pub use mentions::{detect_mentions, MentionMatch};
pub use personas::{Persona, Registry};

/// Persona management subcommands
#[derive(Subcommand, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PersonaCommands {
    /// List stored personas, or the registry a room would use
    List {
        /// Show only the personas addressable in this room, in registry order
        #[arg(long)]
        room: Option<String>,
    },
    /// Create a persona
    #[command(long_about = "\
Create a persona.

The display name is what users type after '@'. Names must be unique, \
ignoring case and repeated spaces.

Examples:
  mention-router persona add \"Grammar Guru\" --glyph 📝 --room room-1
  mention-router persona add \"Peer Reviewer\" --global")]
    Add {
        /// Display name users mention with '@'
        name: String,
        /// Avatar glyph (defaults to 🤖)
        #[arg(long)]
        glyph: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Instructions handed to the response producer
        #[arg(long)]
        prompt: Option<String>,
        /// Make the persona addressable in every room
        #[arg(long)]
        global: bool,
        /// Attach to a room (repeatable)
        #[arg(long = "room")]
        rooms: Vec<String>,
    },
    /// Delete a persona by id
    Remove {
        id: String,
    },
    /// Attach a persona to a room
    Attach {
        id: String,
        room: String,
    },
    /// List the built-in presets, or install one
    Presets {
        /// Preset name to install
        #[arg(long)]
        install: Option<String>,
    },
}
