use async_trait::async_trait;

use crate::dispatch::{DispatchRequest, ProducerError, ResponseProducer};

/// A producer that is never reachable; every dispatch falls back.
pub struct OfflineProducer;

#[async_trait]
impl ResponseProducer for OfflineProducer {
    async fn produce_response(&self, _request: &DispatchRequest) -> Result<String, ProducerError> {
        Err(ProducerError::Unavailable(
            "no response producer configured".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    #[test]
    fn always_unavailable() {
        let request = DispatchRequest {
            persona_id: "bot-1".to_string(),
            room_id: None,
            source_text: "@Grammar Guru hi".to_string(),
            requester_display_name: "Alice".to_string(),
        };
        let err = assert_err!(tokio_test::block_on(
            OfflineProducer.produce_response(&request)
        ));
        assert!(matches!(err, ProducerError::Unavailable(_)));
        assert_eq!(OfflineProducer.name(), "offline");
    }
}
