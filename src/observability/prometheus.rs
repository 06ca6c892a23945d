//! Dispatch counters in a private Prometheus registry.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::dispatch::{DispatchFailure, DispatchObserver, DispatchOutcome, ResponseSource};

pub struct PrometheusObserver {
    registry: Registry,
    dispatch_total: IntCounterVec,
    failures_total: IntCounterVec,
}

impl PrometheusObserver {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let dispatch_total = IntCounterVec::new(
            Opts::new(
                "mention_router_dispatch_total",
                "Persona replies routed, by reply source",
            ),
            &["persona", "source"],
        )?;
        let failures_total = IntCounterVec::new(
            Opts::new(
                "mention_router_dispatch_failures_total",
                "Producer failures recovered by the fallback reply",
            ),
            &["persona", "kind"],
        )?;

        registry.register(Box::new(dispatch_total.clone()))?;
        registry.register(Box::new(failures_total.clone()))?;

        Ok(Self {
            registry,
            dispatch_total,
            failures_total,
        })
    }

    /// Render all counters in the Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl DispatchObserver for PrometheusObserver {
    fn on_failure(&self, failure: &DispatchFailure) {
        self.failures_total
            .with_label_values(&[failure.persona.id.as_str(), failure.error.kind()])
            .inc();
    }

    fn on_outcome(&self, outcome: &DispatchOutcome) {
        let source = match outcome.source {
            ResponseSource::Producer => "producer",
            ResponseSource::Fallback => "fallback",
        };
        self.dispatch_total
            .with_label_values(&[outcome.persona_id.as_str(), source])
            .inc();
    }
}
