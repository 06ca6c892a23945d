pub mod schema;

pub use schema::{
    resolve_config_dir, Config, ObservabilityConfig, PersonasConfig, ProducerConfig,
    TranscriptConfig, CONFIG_DIR_ENV,
};
