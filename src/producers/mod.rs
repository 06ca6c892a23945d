//! Response producers: where persona replies come from.
//!
//! Each producer implements [`ResponseProducer`] and is registered in
//! [`create_producer`] by its canonical `kind` key from `[producer]` config.

pub mod offline;
pub mod remote;
pub mod scripted;

pub use offline::OfflineProducer;
pub use remote::RemoteFunctionProducer;
pub use scripted::{PersonaScript, ScriptRule, ScriptedProducer};

use std::time::Duration;

use crate::config::ProducerConfig;
use crate::dispatch::ResponseProducer;

const MAX_API_ERROR_CHARS: usize = 200;

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
}

fn token_end(input: &str, from: usize) -> usize {
    let mut end = from;
    for (i, c) in input[from..].char_indices() {
        if is_secret_char(c) {
            end = from + i + c.len_utf8();
        } else {
            break;
        }
    }
    end
}

/// Redact secret-looking tokens (`sk-`, `eyJ` JWTs, `ghp_`, ...) from
/// text a function endpoint echoed back.
pub fn scrub_secret_patterns(input: &str) -> String {
    const PREFIXES: [&str; 6] = ["sk-", "eyJ", "xoxb-", "xoxp-", "ghp_", "github_pat_"];

    let mut scrubbed = input.to_string();

    for prefix in PREFIXES {
        let mut search_from = 0;
        while let Some(rel) = scrubbed[search_from..].find(prefix) {
            let start = search_from + rel;
            let content_start = start + prefix.len();
            let end = token_end(&scrubbed, content_start);

            if end == content_start {
                search_from = content_start;
                continue;
            }

            scrubbed.replace_range(start..end, "[REDACTED]");
            search_from = start + "[REDACTED]".len();
        }
    }

    scrubbed
}

/// Scrub secrets and cap length so error bodies are safe to log.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed;
    }

    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &scrubbed[..end])
}

/// Factory: build the producer named by `config.kind`.
pub fn create_producer(config: &ProducerConfig) -> anyhow::Result<Box<dyn ResponseProducer>> {
    match config.kind.trim().to_ascii_lowercase().as_str() {
        "remote" | "function" => {
            let Some(url) = config.url.as_deref().filter(|u| !u.trim().is_empty()) else {
                anyhow::bail!(
                    "producer.kind = \"remote\" requires producer.url (or MENTION_ROUTER_PRODUCER_URL)"
                );
            };
            Ok(Box::new(RemoteFunctionProducer::new(
                url,
                config.api_key.as_deref(),
                Duration::from_secs(config.timeout_secs),
            )))
        }
        "scripted" | "demo" => Ok(Box::new(
            ScriptedProducer::demo().with_delay(Duration::from_millis(config.scripted_delay_ms)),
        )),
        "offline" | "none" => Ok(Box::new(OfflineProducer)),
        other => anyhow::bail!(
            "Unknown producer: {other}. Expected one of: remote, scripted, offline."
        ),
    }
}

/// Producer metadata for `mention-router status`.
#[derive(Debug, Clone)]
pub struct ProducerInfo {
    /// Canonical `kind` used in config
    pub name: &'static str,
    pub display_name: &'static str,
    /// Alternative names accepted in config
    pub aliases: &'static [&'static str],
    /// Whether the producer needs network access
    pub remote: bool,
}

pub fn list_producers() -> Vec<ProducerInfo> {
    vec![
        ProducerInfo {
            name: "remote",
            display_name: "Remote function (HTTP)",
            aliases: &["function"],
            remote: true,
        },
        ProducerInfo {
            name: "scripted",
            display_name: "Scripted demo replies",
            aliases: &["demo"],
            remote: false,
        },
        ProducerInfo {
            name: "offline",
            display_name: "Offline (fallback only)",
            aliases: &["none"],
            remote: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(kind: &str) -> ProducerConfig {
        ProducerConfig {
            kind: kind.to_string(),
            ..ProducerConfig::default()
        }
    }

    #[test]
    fn factory_scripted_and_offline() {
        assert_eq!(create_producer(&config("scripted")).unwrap().name(), "scripted");
        assert_eq!(create_producer(&config("Demo")).unwrap().name(), "scripted");
        assert_eq!(create_producer(&config("offline")).unwrap().name(), "offline");
    }

    #[test]
    fn factory_remote_requires_url() {
        let err = create_producer(&config("remote")).err().unwrap();
        assert!(err.to_string().contains("requires producer.url"));

        let mut cfg = config("remote");
        cfg.url = Some("http://localhost:9/fn".to_string());
        assert_eq!(create_producer(&cfg).unwrap().name(), "remote");
    }

    #[test]
    fn factory_unknown_kind() {
        let err = create_producer(&config("carrier-pigeon")).err().unwrap();
        assert!(err.to_string().contains("Unknown producer"));
    }

    #[test]
    fn every_listed_producer_is_constructible() {
        for info in list_producers() {
            let mut cfg = config(info.name);
            cfg.url = Some("http://localhost:9/fn".to_string());
            assert_eq!(create_producer(&cfg).unwrap().name(), info.name);
            for alias in info.aliases {
                cfg.kind = (*alias).to_string();
                assert_eq!(create_producer(&cfg).unwrap().name(), info.name);
            }
        }
    }

    #[test]
    fn scrub_redacts_known_prefixes() {
        let out = scrub_secret_patterns("key sk-abc123 and ghp_XYZ, done");
        assert_eq!(out, "key [REDACTED] and [REDACTED], done");
    }

    #[test]
    fn scrub_leaves_bare_prefix() {
        assert_eq!(scrub_secret_patterns("sk- alone"), "sk- alone");
    }

    #[test]
    fn sanitize_truncates_long_bodies() {
        let long = "x".repeat(500);
        let out = sanitize_api_error(&long);
        assert_eq!(out.len(), MAX_API_ERROR_CHARS + 3);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn sanitize_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        let out = sanitize_api_error(&long);
        assert!(out.ends_with("..."));
        assert!(out.is_char_boundary(out.len() - 3));
    }
}
