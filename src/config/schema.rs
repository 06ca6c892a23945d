use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
#[cfg(unix)]
use tokio::fs::File;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

pub const CONFIG_DIR_ENV: &str = "MENTION_ROUTER_CONFIG_DIR";
const CONFIG_FILE_NAME: &str = "config.toml";

const SUPPORTED_PRODUCER_KINDS: &[&str] =
    &["remote", "function", "scripted", "demo", "offline", "none"];
const SUPPORTED_OBSERVABILITY_BACKENDS: &[&str] = &["log", "prometheus", "none"];
const MAX_TIMEOUT_SECS: u64 = 600;

// ── Top-level config ──────────────────────────────────────────────

/// Top-level configuration, loaded from `config.toml`.
///
/// Resolution order: `--config-dir` → `MENTION_ROUTER_CONFIG_DIR` → `~/.mention-router`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from the config dir, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub producer: ProducerConfig,

    #[serde(default)]
    pub personas: PersonasConfig,

    #[serde(default)]
    pub transcript: TranscriptConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ── Producer ──────────────────────────────────────────────────────

/// Where persona replies come from (`[producer]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// "remote" | "scripted" | "offline"
    #[serde(default = "default_producer_kind")]
    pub kind: String,

    /// Function endpoint. Required when kind = "remote".
    #[serde(default)]
    pub url: Option<String>,

    /// Bearer key sent to the function endpoint.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Whole-request timeout for the remote producer.
    #[serde(default = "default_producer_timeout_secs")]
    pub timeout_secs: u64,

    /// Artificial delay before each scripted reply.
    #[serde(default)]
    pub scripted_delay_ms: u64,
}

fn default_producer_kind() -> String {
    "scripted".into()
}

fn default_producer_timeout_secs() -> u64 {
    30
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            kind: default_producer_kind(),
            url: None,
            api_key: None,
            timeout_secs: default_producer_timeout_secs(),
            scripted_delay_ms: 0,
        }
    }
}

// ── Personas ──────────────────────────────────────────────────────

/// Persona store location (`[personas]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonasConfig {
    /// JSON store file. Relative paths resolve under the config dir.
    #[serde(default = "default_persona_store_path")]
    pub store_path: String,

    /// Seed the demo classroom bots when the store file does not exist yet.
    #[serde(default = "default_true")]
    pub seed_demo: bool,
}

fn default_persona_store_path() -> String {
    "personas.json".into()
}

fn default_true() -> bool {
    true
}

impl Default for PersonasConfig {
    fn default() -> Self {
        Self {
            store_path: default_persona_store_path(),
            seed_demo: true,
        }
    }
}

// ── Transcript ────────────────────────────────────────────────────

/// Transcript location (`[transcript]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Directory of per-room JSON files. Unset or empty keeps history in memory.
    #[serde(default = "default_transcript_dir")]
    pub dir: Option<String>,
}

fn default_transcript_dir() -> Option<String> {
    Some("transcripts".into())
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            dir: default_transcript_dir(),
        }
    }
}

// ── Observability ─────────────────────────────────────────────────

/// Observability backend configuration (`[observability]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// "log" | "prometheus" | "none"
    #[serde(default = "default_observability_backend")]
    pub backend: String,
}

fn default_observability_backend() -> String {
    "log".into()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            backend: default_observability_backend(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = default_config_dir().unwrap_or_else(|_| PathBuf::from(".mention-router"));
        Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            producer: ProducerConfig::default(),
            personas: PersonasConfig::default(),
            transcript: TranscriptConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

fn default_config_dir() -> Result<PathBuf> {
    let home = UserDirs::new()
        .map(|u| u.home_dir().to_path_buf())
        .context("Could not find home directory")?;
    Ok(home.join(".mention-router"))
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw.trim()).into_owned())
}

/// Pick the config directory: explicit flag, then env, then `~/.mention-router`.
pub fn resolve_config_dir(cli_override: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = cli_override {
        return Ok(expand_path(&dir.to_string_lossy()));
    }
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(expand_path(&dir));
        }
    }
    default_config_dir()
}

fn config_dir_creation_error(path: &Path) -> String {
    format!(
        "Failed to create config directory: {}. Pass --config-dir or set {CONFIG_DIR_ENV} to a writable path.",
        path.display()
    )
}

impl Config {
    pub async fn load_or_init(cli_override: Option<&Path>) -> Result<Self> {
        let config_dir = resolve_config_dir(cli_override)?;
        Self::load_or_init_in(&config_dir).await
    }

    /// Load `<config_dir>/config.toml`, writing defaults first if it is missing.
    pub async fn load_or_init_in(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        fs::create_dir_all(config_dir)
            .await
            .with_context(|| config_dir_creation_error(config_dir))?;

        let initialized = if config_path.exists() {
            false
        } else {
            let config = Config {
                config_path: config_path.clone(),
                ..Config::default()
            };
            config.save().await?;

            // The file may later hold an API key
            #[cfg(unix)]
            {
                use std::{fs::Permissions, os::unix::fs::PermissionsExt};
                let _ = fs::set_permissions(&config_path, Permissions::from_mode(0o600)).await;
            }
            true
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(meta) = fs::metadata(&config_path).await {
                if meta.permissions().mode() & 0o004 != 0 {
                    tracing::warn!(
                        "Config file {:?} is world-readable (mode {:o}). \
                         Consider restricting with: chmod 600 {:?}",
                        config_path,
                        meta.permissions().mode() & 0o777,
                        config_path,
                    );
                }
            }
        }

        let contents = fs::read_to_string(&config_path)
            .await
            .context("Failed to read config file")?;
        let mut config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        config.config_path = config_path;

        config.apply_env_overrides();
        config.validate()?;
        tracing::info!(
            path = %config.config_path.display(),
            producer = %config.producer.kind,
            initialized,
            "Config loaded"
        );
        Ok(config)
    }

    /// Directory holding config.toml; relative paths resolve against it.
    pub fn config_dir(&self) -> &Path {
        self.config_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Expand `~` and anchor relative paths at the config dir.
    pub fn resolve_path(&self, raw: &str) -> PathBuf {
        let expanded = expand_path(raw);
        if expanded.is_absolute() {
            expanded
        } else {
            self.config_dir().join(expanded)
        }
    }

    pub fn persona_store_path(&self) -> PathBuf {
        self.resolve_path(&self.personas.store_path)
    }

    pub fn transcript_dir(&self) -> Option<PathBuf> {
        self.transcript
            .dir
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(|d| self.resolve_path(d))
    }

    /// Validate configuration values that would cause runtime failures.
    ///
    /// Called after TOML deserialization and env-override application.
    pub fn validate(&self) -> Result<()> {
        // Producer
        let kind = self.producer.kind.trim().to_ascii_lowercase();
        if !SUPPORTED_PRODUCER_KINDS.contains(&kind.as_str()) {
            anyhow::bail!(
                "producer.kind is invalid ({}); expected one of: remote, scripted, offline",
                self.producer.kind
            );
        }
        if matches!(kind.as_str(), "remote" | "function") {
            let url = self.producer.url.as_deref().map(str::trim).unwrap_or("");
            if url.is_empty() {
                anyhow::bail!("producer.url must be set when producer.kind = \"remote\"");
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("producer.url must start with http:// or https:// ({url})");
            }
        }
        if self.producer.timeout_secs == 0 || self.producer.timeout_secs > MAX_TIMEOUT_SECS {
            anyhow::bail!("producer.timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}");
        }

        // Personas
        if self.personas.store_path.trim().is_empty() {
            anyhow::bail!("personas.store_path must not be empty");
        }

        // Observability
        let backend = self.observability.backend.trim().to_ascii_lowercase();
        if !SUPPORTED_OBSERVABILITY_BACKENDS.contains(&backend.as_str()) {
            anyhow::bail!(
                "observability.backend is invalid ({}); expected one of: log, prometheus, none",
                self.observability.backend
            );
        }

        Ok(())
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        if let Ok(kind) = std::env::var("MENTION_ROUTER_PRODUCER") {
            if !kind.is_empty() {
                self.producer.kind = kind;
            }
        }

        if let Ok(url) = std::env::var("MENTION_ROUTER_PRODUCER_URL") {
            if !url.is_empty() {
                self.producer.url = Some(url);
            }
        }

        if let Ok(key) = std::env::var("MENTION_ROUTER_API_KEY") {
            if !key.is_empty() {
                self.producer.api_key = Some(key);
            }
        }

        if let Ok(raw) = std::env::var("MENTION_ROUTER_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.producer.timeout_secs = secs,
                Err(_) => tracing::warn!(
                    value = %raw,
                    "Ignoring MENTION_ROUTER_TIMEOUT_SECS: not a whole number of seconds"
                ),
            }
        }
    }

    pub async fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let parent_dir = self
            .config_path
            .parent()
            .context("Config path must have a parent directory")?;

        fs::create_dir_all(parent_dir)
            .await
            .with_context(|| config_dir_creation_error(parent_dir))?;

        let file_name = self
            .config_path
            .file_name()
            .and_then(|v| v.to_str())
            .unwrap_or(CONFIG_FILE_NAME);
        let temp_path = parent_dir.join(format!(".{file_name}.tmp-{}", uuid::Uuid::new_v4()));

        let mut temp_file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to create temporary config file: {}",
                    temp_path.display()
                )
            })?;
        temp_file
            .write_all(toml_str.as_bytes())
            .await
            .context("Failed to write temporary config contents")?;
        temp_file
            .sync_all()
            .await
            .context("Failed to fsync temporary config file")?;
        drop(temp_file);

        if let Err(e) = fs::rename(&temp_path, &self.config_path).await {
            let _ = fs::remove_file(&temp_path).await;
            anyhow::bail!("Failed to atomically replace config file: {e}");
        }

        sync_directory(parent_dir).await
    }
}

async fn sync_directory(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        let dir = File::open(path)
            .await
            .with_context(|| format!("Failed to open directory for fsync: {}", path.display()))?;
        dir.sync_all()
            .await
            .with_context(|| format!("Failed to fsync directory metadata: {}", path.display()))?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(())
    }
}
