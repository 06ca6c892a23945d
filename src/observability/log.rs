use crate::dispatch::{DispatchFailure, DispatchObserver, DispatchOutcome};

/// Reports dispatches through `tracing`.
pub struct LogObserver;

impl DispatchObserver for LogObserver {
    fn on_failure(&self, failure: &DispatchFailure) {
        tracing::info!(
            persona = %failure.persona.id,
            room = failure.room_id.as_deref().unwrap_or("-"),
            producer = %failure.producer,
            kind = failure.error.kind(),
            error = %failure.error,
            "persona reply fell back"
        );
    }

    fn on_outcome(&self, outcome: &DispatchOutcome) {
        tracing::debug!(
            persona = %outcome.persona_id,
            fallback = outcome.is_fallback(),
            chars = outcome.text.chars().count(),
            "persona replied"
        );
    }
}
