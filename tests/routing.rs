//! End-to-end routing: file-backed personas, producers, transcript.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use mention_router::dispatch::{
    DispatchFailure, DispatchRequest, MentionRouter, ProducerError, ResponseProducer,
};
use mention_router::observability::PrometheusObserver;
use mention_router::personas::{
    JsonFilePersonaStore, NewPersona, PersonaStore, RegistryProvider, RegistryScope,
};
use mention_router::producers::ScriptedProducer;
use mention_router::room::{ChatRoom, InboundMessage};
use mention_router::transcript::{ConversationSink, FileTranscript, SenderKind};

/// Replies slowest-first so that any concurrency would reorder the transcript.
struct SlowFirstProducer;

#[async_trait]
impl ResponseProducer for SlowFirstProducer {
    async fn produce_response(&self, request: &DispatchRequest) -> Result<String, ProducerError> {
        let delay = match request.persona_id.as_str() {
            "bot-1" => 60,
            "bot-2" => 30,
            _ => 1,
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(format!("reply from {}", request.persona_id))
    }

    fn name(&self) -> &str {
        "slow-first"
    }
}

struct DownProducer;

#[async_trait]
impl ResponseProducer for DownProducer {
    async fn produce_response(&self, _: &DispatchRequest) -> Result<String, ProducerError> {
        Err(ProducerError::Unavailable("connection refused".into()))
    }

    fn name(&self) -> &str {
        "down"
    }
}

fn message(room: &str, text: &str) -> InboundMessage {
    InboundMessage {
        room_id: Some(room.to_string()),
        sender_id: "user-1".to_string(),
        sender_name: "Alice".to_string(),
        text: text.to_string(),
    }
}

#[tokio::test]
async fn transcript_order_follows_registry_despite_producer_delays() {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(
        JsonFilePersonaStore::open(&tmp.path().join("personas.json"), true)
            .await
            .unwrap(),
    );
    let transcript = Arc::new(FileTranscript::new(tmp.path().join("transcripts")));
    let room = ChatRoom::new(
        store,
        MentionRouter::new(Box::new(SlowFirstProducer)),
        transcript.clone(),
    );

    // Mention order is the reverse of registry order.
    let outcomes = room
        .post(&message(
            "room-5",
            "@Conversation Coach, @Vocabulary Victor and @Grammar Guru: hello!",
        ))
        .await
        .unwrap();
    let ids: Vec<_> = outcomes.iter().map(|o| o.persona_id.as_str()).collect();
    assert_eq!(ids, ["bot-1", "bot-2", "bot-3"]);

    let history = transcript.history("room-5", None).await.unwrap();
    let senders: Vec<_> = history.iter().map(|e| e.sender_id.as_str()).collect();
    assert_eq!(senders, ["user-1", "bot-1", "bot-2", "bot-3"]);
    assert_eq!(history[0].sender_kind, SenderKind::User);
    assert_eq!(history[1].content, "reply from bot-1");
}

#[tokio::test]
async fn failing_producer_reports_and_falls_back() {
    let store = Arc::new(JsonFilePersonaStore::in_memory(
        mention_router::personas::demo_personas(),
    ));
    let failures: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = failures.clone();
    let router = MentionRouter::new(Box::new(DownProducer)).with_observer(Arc::new(
        move |failure: &DispatchFailure| {
            seen.lock()
                .push(format!("{}:{}", failure.persona.id, failure.error.kind()));
        },
    ));
    let transcript = Arc::new(mention_router::transcript::InMemoryTranscript::new());
    let room = ChatRoom::new(store, router, transcript.clone());

    let outcomes = room
        .post(&message("room-2", "@vocabulary victor what does 'ubiquitous' mean?"))
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_fallback());
    assert!(outcomes[0].text.contains("Vocabulary Victor"));
    assert!(outcomes[0].text.contains("Alice"));
    assert_eq!(failures.lock().as_slice(), ["bot-2:unavailable"]);

    let history = transcript.history("room-2", None).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[1].fallback);
}

#[tokio::test]
async fn new_persona_becomes_addressable_after_attach() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("personas.json");
    let store = JsonFilePersonaStore::open(&path, false).await.unwrap();
    let created = store
        .create(NewPersona {
            name: "Essay Critic".to_string(),
            avatar_glyph: Some("🧐".to_string()),
            ..NewPersona::default()
        })
        .await
        .unwrap();

    let scope = RegistryScope::Room("room-7".to_string());
    assert!(store.registry(&scope).await.unwrap().is_empty());

    store.attach(&created.persona.id, "room-7").await.unwrap();
    drop(store);

    // Reopen from disk to prove the attachment was persisted.
    let store = Arc::new(JsonFilePersonaStore::open(&path, false).await.unwrap());
    let observer = Arc::new(PrometheusObserver::new().unwrap());
    let router =
        MentionRouter::new(Box::new(ScriptedProducer::demo())).with_observer(observer.clone());
    let transcript = Arc::new(mention_router::transcript::InMemoryTranscript::new());
    let room = ChatRoom::new(store, router, transcript);

    let outcomes = room
        .post(&message("room-7", "@essay critic please read my intro"))
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].avatar_glyph, "🧐");
    assert!(!outcomes[0].is_fallback());
    assert_eq!(
        outcomes[0].text,
        "Thanks for your message! I'm here to help you learn English."
    );

    let metrics = observer.encode().unwrap();
    assert!(metrics.contains("source=\"producer\"} 1"));
}
