//! Mention router: detect addressed personas, ask the producer for each.

use std::sync::Arc;

use super::fallback::fallback_response;
use super::traits::{
    DispatchContext, DispatchFailure, DispatchObserver, DispatchOutcome, DispatchRequest,
    ProducerError, ResponseProducer, ResponseSource,
};
use crate::mentions::{detect_mentions, MentionMatch};
use crate::personas::Registry;

/// Routes mentions to a response producer, one persona at a time.
///
/// Producer failures never reach the caller: they become fallback replies
/// and are reported to the observer, if one is installed.
pub struct MentionRouter {
    producer: Box<dyn ResponseProducer>,
    observer: Option<Arc<dyn DispatchObserver>>,
}

impl MentionRouter {
    pub fn new(producer: Box<dyn ResponseProducer>) -> Self {
        Self {
            producer,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn producer_name(&self) -> &str {
        self.producer.name()
    }

    pub fn detect(&self, text: &str, registry: &Registry) -> Vec<MentionMatch> {
        detect_mentions(text, registry)
    }

    /// Ask the producer to answer for one matched persona.
    pub async fn dispatch(
        &self,
        mention: &MentionMatch,
        context: &DispatchContext,
    ) -> DispatchOutcome {
        let persona = &mention.persona;
        let request = DispatchRequest {
            persona_id: persona.id.clone(),
            room_id: context.room_id.clone(),
            source_text: context.source_text.clone(),
            requester_display_name: context.requester_display_name.clone(),
        };

        let produced = match self.producer.produce_response(&request).await {
            Ok(text) if text.trim().is_empty() => Err(ProducerError::EmptyResponse),
            other => other,
        };

        let outcome = match produced {
            Ok(text) => {
                tracing::debug!(
                    persona = %persona.id,
                    producer = self.producer.name(),
                    "Persona replied"
                );
                DispatchOutcome {
                    persona_id: persona.id.clone(),
                    persona_name: persona.display_name.clone(),
                    avatar_glyph: persona.glyph().to_string(),
                    text,
                    source: ResponseSource::Producer,
                }
            }
            Err(error) => {
                tracing::warn!(
                    persona = %persona.id,
                    producer = self.producer.name(),
                    kind = error.kind(),
                    "Dispatch failed, using fallback reply: {error}"
                );
                if let Some(observer) = &self.observer {
                    observer.on_failure(&DispatchFailure {
                        persona: persona.clone(),
                        room_id: context.room_id.clone(),
                        producer: self.producer.name().to_string(),
                        error,
                    });
                }
                DispatchOutcome {
                    persona_id: persona.id.clone(),
                    persona_name: persona.display_name.clone(),
                    avatar_glyph: persona.glyph().to_string(),
                    text: fallback_response(persona, &context.requester_display_name),
                    source: ResponseSource::Fallback,
                }
            }
        };

        if let Some(observer) = &self.observer {
            observer.on_outcome(&outcome);
        }
        outcome
    }

    /// Dispatch every match in order, awaiting each before starting the next.
    pub async fn dispatch_all(
        &self,
        mentions: &[MentionMatch],
        context: &DispatchContext,
    ) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::with_capacity(mentions.len());
        for mention in mentions {
            outcomes.push(self.dispatch(mention, context).await);
        }
        outcomes
    }

    /// Detect mentions in `text` and dispatch them in registry order.
    pub async fn route(
        &self,
        text: &str,
        registry: &Registry,
        room_id: Option<&str>,
        requester_display_name: &str,
    ) -> Vec<DispatchOutcome> {
        let mentions = self.detect(text, registry);
        if mentions.is_empty() {
            return Vec::new();
        }
        tracing::info!(
            room = room_id.unwrap_or("-"),
            mentions = mentions.len(),
            "Routing message to personas"
        );
        let context = DispatchContext {
            room_id: room_id.map(ToString::to_string),
            requester_display_name: requester_display_name.to_string(),
            source_text: text.to_string(),
        };
        self.dispatch_all(&mentions, &context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personas::Persona;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Records call order; replies after a per-persona delay.
    struct RecordingProducer {
        delays_ms: HashMap<String, u64>,
        started: Mutex<Vec<String>>,
        finished: Mutex<Vec<String>>,
        requests: Mutex<Vec<DispatchRequest>>,
    }

    impl RecordingProducer {
        fn new(delays: &[(&str, u64)]) -> Self {
            Self {
                delays_ms: delays.iter().map(|(id, ms)| ((*id).to_string(), *ms)).collect(),
                started: Mutex::new(Vec::new()),
                finished: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ResponseProducer for Arc<RecordingProducer> {
        async fn produce_response(
            &self,
            request: &DispatchRequest,
        ) -> Result<String, ProducerError> {
            self.started.lock().push(request.persona_id.clone());
            self.requests.lock().push(request.clone());
            let delay = self.delays_ms.get(&request.persona_id).copied().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.finished.lock().push(request.persona_id.clone());
            Ok(format!("reply from {}", request.persona_id))
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    struct FailingProducer(ProducerError);

    #[async_trait]
    impl ResponseProducer for FailingProducer {
        async fn produce_response(&self, _: &DispatchRequest) -> Result<String, ProducerError> {
            Err(self.0.clone())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct BlankProducer;

    #[async_trait]
    impl ResponseProducer for BlankProducer {
        async fn produce_response(&self, _: &DispatchRequest) -> Result<String, ProducerError> {
            Ok("   ".to_string())
        }

        fn name(&self) -> &str {
            "blank"
        }
    }

    fn registry() -> Registry {
        Registry::build([
            Persona::new("a", "Alpha").with_glyph("🅰️"),
            Persona::new("b", "Bravo"),
            Persona::new("c", "Charlie"),
        ])
        .unwrap()
    }

    fn context(text: &str) -> DispatchContext {
        DispatchContext {
            room_id: Some("room-5".to_string()),
            requester_display_name: "Alice".to_string(),
            source_text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn sequential_dispatch_keeps_registry_order_despite_delays() {
        // Earlier personas are slower; concurrent fan-out would finish c, b, a.
        let producer = Arc::new(RecordingProducer::new(&[("a", 60), ("b", 30), ("c", 1)]));
        let router = MentionRouter::new(Box::new(Arc::clone(&producer)));

        let outcomes = router
            .route("@Charlie @Bravo @Alpha go", &registry(), Some("room-5"), "Alice")
            .await;

        let order: Vec<&str> = outcomes.iter().map(|o| o.persona_id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(*producer.started.lock(), vec!["a", "b", "c"]);
        assert_eq!(*producer.finished.lock(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn each_next_dispatch_starts_after_previous_finishes() {
        let producer = Arc::new(RecordingProducer::new(&[("a", 40), ("c", 0)]));
        let router = MentionRouter::new(Box::new(Arc::clone(&producer)));
        let text = "@Charlie and @Alpha";
        let mentions = router.detect(text, &registry());

        router.dispatch_all(&mentions, &context(text)).await;

        // "c" cannot have started before "a" finished.
        assert_eq!(*producer.finished.lock(), vec!["a", "c"]);
        assert_eq!(*producer.started.lock(), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn request_carries_full_source_text_and_context() {
        let producer = Arc::new(RecordingProducer::new(&[]));
        let router = MentionRouter::new(Box::new(Arc::clone(&producer)));
        let text = "hey @bravo, what does 'ubiquitous' mean?";

        let outcomes = router.route(text, &registry(), Some("room-5"), "Alice").await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].text, "reply from b");
        assert_eq!(outcomes[0].source, ResponseSource::Producer);

        let requests = producer.requests.lock();
        assert_eq!(
            requests[0],
            DispatchRequest {
                persona_id: "b".to_string(),
                room_id: Some("room-5".to_string()),
                source_text: text.to_string(),
                requester_display_name: "Alice".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn failing_producer_yields_fallback_not_error() {
        let router = MentionRouter::new(Box::new(FailingProducer(ProducerError::Unavailable(
            "connection refused".to_string(),
        ))));
        let text = "@Alpha help";
        let mentions = router.detect(text, &registry());

        let first = router.dispatch(&mentions[0], &context(text)).await;
        let second = router.dispatch(&mentions[0], &context(text)).await;

        assert!(first.is_fallback());
        assert!(!first.text.is_empty());
        assert!(first.text.contains("Alpha"));
        assert!(first.text.contains("🅰️"));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn blank_reply_counts_as_failure() {
        let router = MentionRouter::new(Box::new(BlankProducer));
        let outcomes = router.route("@Bravo?", &registry(), None, "Bob").await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_fallback());
        assert!(outcomes[0].text.contains("Bravo"));
    }

    #[tokio::test]
    async fn observer_sees_failure_reason() {
        let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer = move |failure: &DispatchFailure| {
            sink.lock()
                .push((failure.persona.id.clone(), failure.error.kind().to_string()));
        };
        let router = MentionRouter::new(Box::new(FailingProducer(ProducerError::Timeout(
            Duration::from_secs(5),
        ))))
        .with_observer(Arc::new(observer));

        let outcomes = router
            .route("@alpha @charlie", &registry(), Some("room-1"), "Carol")
            .await;

        assert!(outcomes.iter().all(DispatchOutcome::is_fallback));
        assert_eq!(
            *seen.lock(),
            vec![
                ("a".to_string(), "timeout".to_string()),
                ("c".to_string(), "timeout".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn no_mentions_means_no_dispatch() {
        let producer = Arc::new(RecordingProducer::new(&[]));
        let router = MentionRouter::new(Box::new(Arc::clone(&producer)));
        let outcomes = router.route("just chatting", &registry(), None, "Dan").await;
        assert!(outcomes.is_empty());
        assert!(producer.started.lock().is_empty());
    }
}
