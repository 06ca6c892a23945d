//! Dispatch observers selected by `[observability] backend`.

pub mod log;
pub mod prometheus;

pub use self::log::LogObserver;
pub use self::prometheus::PrometheusObserver;

use std::sync::Arc;

use crate::config::ObservabilityConfig;
use crate::dispatch::DispatchObserver;

/// The observer handed to the router, plus the metrics registry when one exists.
pub struct Observability {
    backend: &'static str,
    observer: Option<Arc<dyn DispatchObserver>>,
    metrics: Option<Arc<PrometheusObserver>>,
}

impl Observability {
    pub fn backend(&self) -> &'static str {
        self.backend
    }

    pub fn observer(&self) -> Option<Arc<dyn DispatchObserver>> {
        self.observer.clone()
    }

    /// Prometheus text exposition, or `None` when the backend keeps no counters.
    pub fn render_metrics(&self) -> anyhow::Result<Option<String>> {
        self.metrics.as_ref().map(|m| m.encode()).transpose()
    }
}

/// Factory: build observers from config. Unknown backends fall back to "none".
pub fn create_observability(config: &ObservabilityConfig) -> anyhow::Result<Observability> {
    match config.backend.trim().to_ascii_lowercase().as_str() {
        "log" => Ok(Observability {
            backend: "log",
            observer: Some(Arc::new(LogObserver)),
            metrics: None,
        }),
        "prometheus" => {
            let metrics = Arc::new(PrometheusObserver::new()?);
            let observer: Arc<dyn DispatchObserver> = metrics.clone();
            Ok(Observability {
                backend: "prometheus",
                observer: Some(observer),
                metrics: Some(metrics),
            })
        }
        "none" => Ok(Observability {
            backend: "none",
            observer: None,
            metrics: None,
        }),
        other => {
            tracing::warn!(backend = %other, "Unknown observability backend; observers disabled");
            Ok(Observability {
                backend: "none",
                observer: None,
                metrics: None,
            })
        }
    }
}
