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
    clippy::needless_pass_by_value,
    clippy::needless_raw_string_hashes,
    clippy::redundant_closure_for_method_calls,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::struct_field_names,
    clippy::too_many_lines,
    clippy::uninlined_format_args,
    clippy::unused_self,
    clippy::cast_precision_loss,
    clippy::unnecessary_cast,
    clippy::unnecessary_lazy_evaluations,
    clippy::unnecessary_literal_bound,
    clippy::unnecessary_map_or,
    clippy::unnecessary_wraps,
    dead_code
)]

use anyhow::{bail, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use mention_router::config::Config;
use mention_router::dispatch::MentionRouter;
use mention_router::mentions::{complete_mention, detect_mentions, mention_trigger, suggest};
use mention_router::observability::create_observability;
use mention_router::personas::{
    self, JsonFilePersonaStore, PersonaStore, RegistryProvider, RegistryScope,
};
use mention_router::producers::{create_producer, list_producers};
use mention_router::room::{ChatRoom, InboundMessage, GLOBAL_ROOM};
use mention_router::transcript::{create_transcript, ConversationSink, SenderKind};
use mention_router::PersonaCommands;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CompletionShell {
    #[value(name = "bash")]
    Bash,
    #[value(name = "fish")]
    Fish,
    #[value(name = "zsh")]
    Zsh,
    #[value(name = "powershell")]
    PowerShell,
    #[value(name = "elvish")]
    Elvish,
}

/// `mention-router` - address chat personas with @mentions.
#[derive(Parser, Debug)]
#[command(name = "mention-router")]
#[command(author = "theonlyhennygod")]
#[command(version)]
#[command(
    about = "Detect @persona mentions and route them to response producers.",
    long_about = None
)]
struct Cli {
    #[arg(long, global = true)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show which personas a message mentions
    Detect {
        /// Message text
        text: String,

        /// Room whose personas are addressable (global personas only when omitted)
        #[arg(long)]
        room: Option<String>,
    },

    /// Post a message and print each mentioned persona's reply
    #[command(long_about = "\
Post a message to a room.

Every persona mentioned with '@' answers once, in registry order. \
The message and the replies are appended to the room transcript.

Examples:
  mention-router send --room room-5 \"@Grammar Guru and @Conversation Coach hi!\"
  mention-router send --room room-1 --as Alice \"@grammar guru is this right?\"
  mention-router send --room room-2 --metrics \"@Vocabulary Victor synonym for big\"")]
    Send {
        /// Message text
        text: String,

        #[arg(long)]
        room: Option<String>,

        /// Display name of the sender
        #[arg(long = "as", default_value = "You")]
        sender: String,

        /// Print dispatch counters afterwards (observability.backend = "prometheus")
        #[arg(long)]
        metrics: bool,
    },

    /// Suggest completions for a partially typed @mention
    Suggest {
        /// Composer contents, e.g. "thanks @gram"
        input: String,

        #[arg(long)]
        room: Option<String>,
    },

    /// Print a room's transcript
    History {
        #[arg(long, default_value = GLOBAL_ROOM)]
        room: String,

        /// Maximum number of entries, newest last
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Manage personas (list, add, remove, attach, presets)
    #[command(long_about = "\
Manage personas.

Examples:
  mention-router persona list
  mention-router persona list --room room-5
  mention-router persona add \"Essay Critic\" --glyph 🧐 --room room-4
  mention-router persona attach bot-4 room-5
  mention-router persona presets --install \"Peer Reviewer\"")]
    Persona {
        #[command(subcommand)]
        persona_command: PersonaCommands,
    },

    /// Show resolved configuration
    Status,

    /// Generate shell completion script to stdout
    #[command(long_about = "\
Generate shell completion scripts for `mention-router`.

The script is printed to stdout so it can be sourced directly:

Examples:
  source <(mention-router completions bash)
  mention-router completions zsh > ~/.zfunc/_mention-router
  mention-router completions fish > ~/.config/fish/completions/mention-router.fish")]
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

fn room_scope(room: Option<String>) -> RegistryScope {
    match room {
        Some(room) => RegistryScope::Room(room),
        None => RegistryScope::Global,
    }
}

async fn open_store(config: &Config) -> Result<Arc<JsonFilePersonaStore>> {
    let store =
        personas::create_persona_store(&config.persona_store_path(), config.personas.seed_demo)
            .await?;
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(config_dir) = &cli.config_dir {
        if config_dir.trim().is_empty() {
            bail!("--config-dir cannot be empty");
        }
    }

    // Completions must remain stdout-only and should not load config or initialize logging.
    if let Commands::Completions { shell } = &cli.command {
        let mut stdout = std::io::stdout().lock();
        write_shell_completion(*shell, &mut stdout)?;
        return Ok(());
    }

    // Initialize logging - respects RUST_LOG env var, defaults to INFO
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load_or_init(cli.config_dir.as_deref().map(Path::new)).await?;

    match cli.command {
        Commands::Completions { .. } => unreachable!(),

        Commands::Detect { text, room } => {
            let store = open_store(&config).await?;
            let registry = store.registry(&room_scope(room)).await?;
            let matches = detect_mentions(&text, &registry);
            if matches.is_empty() {
                println!("No personas mentioned.");
            }
            for m in &matches {
                println!(
                    "{} {} ({})  {}..{}  {:?}",
                    m.persona.glyph(),
                    m.persona.display_name,
                    m.persona.id,
                    m.span.start,
                    m.span.end,
                    m.raw
                );
            }
            Ok(())
        }

        Commands::Send {
            text,
            room,
            sender,
            metrics,
        } => {
            let store = open_store(&config).await?;
            let observability = create_observability(&config.observability)?;
            let mut router = MentionRouter::new(create_producer(&config.producer)?);
            if let Some(observer) = observability.observer() {
                router = router.with_observer(observer);
            }
            let transcript: Arc<dyn ConversationSink> =
                Arc::from(create_transcript(config.transcript_dir()));
            let chat = ChatRoom::new(store, router, transcript);

            let outcomes = chat
                .post(&InboundMessage {
                    room_id: room,
                    sender_id: "cli".to_string(),
                    sender_name: sender,
                    text,
                })
                .await?;

            if outcomes.is_empty() {
                println!("No personas mentioned.");
            }
            for outcome in &outcomes {
                let marker = if outcome.is_fallback() { " (fallback)" } else { "" };
                println!(
                    "{} {}{marker}: {}",
                    outcome.avatar_glyph, outcome.persona_name, outcome.text
                );
            }

            if metrics {
                match observability.render_metrics()? {
                    Some(text) => print!("\n{text}"),
                    None => eprintln!(
                        "No metrics recorded: set observability.backend = \"prometheus\" (current: {}).",
                        observability.backend()
                    ),
                }
            }
            Ok(())
        }

        Commands::Suggest { input, room } => {
            let store = open_store(&config).await?;
            let registry = store.registry(&room_scope(room)).await?;
            let Some(trigger) = mention_trigger(&input) else {
                println!("No mention being typed.");
                return Ok(());
            };
            let candidates = suggest(&registry, trigger);
            if candidates.is_empty() {
                println!("No personas match @{trigger}.");
            }
            for persona in candidates {
                println!(
                    "{} {:<20} -> {}",
                    persona.glyph(),
                    persona.display_name,
                    complete_mention(&input, &persona.display_name)
                );
            }
            Ok(())
        }

        Commands::History { room, limit } => {
            let transcript = create_transcript(config.transcript_dir());
            let entries = transcript.history(&room, Some(limit)).await?;
            if entries.is_empty() {
                println!("No messages in {room}.");
            }
            for entry in entries {
                let prefix = match entry.sender_kind {
                    SenderKind::User => "",
                    SenderKind::Bot if entry.fallback => "[fallback] ",
                    SenderKind::Bot => "",
                };
                println!(
                    "[{}] {prefix}{}: {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.sender_name,
                    entry.content
                );
            }
            Ok(())
        }

        Commands::Persona { persona_command } => {
            let store = open_store(&config).await?;
            let mut stdout = std::io::stdout().lock();
            personas::handle_command(persona_command, store.as_ref(), &mut stdout).await
        }

        Commands::Status => {
            let store = open_store(&config).await?;
            let stored = store.list().await?;

            println!("💬 Mention Router Status");
            println!();
            println!("Version:     {}", env!("CARGO_PKG_VERSION"));
            println!("Config:      {}", config.config_path.display());
            println!();
            println!("🤖 Producer:       {}", config.producer.kind);
            if let Some(url) = &config.producer.url {
                println!("   URL:            {url}");
                println!("   Timeout:        {}s", config.producer.timeout_secs);
            }
            println!(
                "👥 Personas:       {} ({} stored, {})",
                config.persona_store_path().display(),
                stored.len(),
                store.name()
            );
            match config.transcript_dir() {
                Some(dir) => println!("🧾 Transcript:     {}", dir.display()),
                None => println!("🧾 Transcript:     in-memory"),
            }
            println!("📊 Observability:  {}", config.observability.backend);

            let current = config.producer.kind.trim().to_ascii_lowercase();
            println!();
            println!("Producers:");
            for p in list_producers() {
                let is_active = p.name.eq_ignore_ascii_case(&current)
                    || p.aliases
                        .iter()
                        .any(|alias| alias.eq_ignore_ascii_case(&current));
                let marker = if is_active { " (active)" } else { "" };
                let remote_tag = if p.remote { " [network]" } else { "" };
                println!("  {:<10} {}{}{}", p.name, p.display_name, remote_tag, marker);
            }
            Ok(())
        }
    }
}

fn write_shell_completion<W: Write>(shell: CompletionShell, writer: &mut W) -> Result<()> {
    use clap_complete::generate;
    use clap_complete::shells;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, bin_name.clone(), writer),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, bin_name.clone(), writer),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, bin_name.clone(), writer),
        CompletionShell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, bin_name.clone(), writer);
        }
        CompletionShell::Elvish => generate(shells::Elvish, &mut cmd, bin_name, writer),
    }

    writer.flush()?;
    Ok(())
}
