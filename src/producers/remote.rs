//! Remote function producer.
//!
//! POSTs `{room_id, bot_id, user_message, user_pseudonym}` to a hosted
//! function endpoint and reads the reply from the `message` (or `content`)
//! field of the JSON response.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::dispatch::{DispatchRequest, ProducerError, ResponseProducer};

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RemoteFunctionProducer {
    url: String,
    api_key: Option<String>,
    timeout: Duration,
    client: Client,
}

#[derive(Debug, Serialize)]
struct FunctionRequest<'a> {
    room_id: Option<&'a str>,
    bot_id: &'a str,
    user_message: &'a str,
    user_pseudonym: &'a str,
}

#[derive(Debug, Deserialize)]
struct FunctionResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl RemoteFunctionProducer {
    pub fn new(url: &str, api_key: Option<&str>, timeout: Duration) -> Self {
        Self {
            url: url.trim().to_string(),
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(ToString::to_string),
            timeout,
            client: Client::builder()
                .timeout(timeout)
                .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn classify(&self, err: &reqwest::Error) -> ProducerError {
        if err.is_timeout() {
            ProducerError::Timeout(self.timeout)
        } else if err.is_connect() {
            ProducerError::Unavailable(super::sanitize_api_error(&err.to_string()))
        } else {
            ProducerError::Failed(super::sanitize_api_error(&err.to_string()))
        }
    }
}

#[async_trait]
impl ResponseProducer for RemoteFunctionProducer {
    async fn produce_response(&self, request: &DispatchRequest) -> Result<String, ProducerError> {
        let body = FunctionRequest {
            room_id: request.room_id.as_deref(),
            bot_id: &request.persona_id,
            user_message: &request.source_text,
            user_pseudonym: &request.requester_display_name,
        };

        let mut builder = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| self.classify(&e))?;
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read function error body>".to_string());
            return Err(ProducerError::Failed(format!(
                "function returned {status}: {}",
                super::sanitize_api_error(&text)
            )));
        }

        let parsed: FunctionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProducerError::Timeout(self.timeout)
            } else {
                ProducerError::Failed(format!("invalid function response: {e}"))
            }
        })?;

        parsed
            .message
            .or(parsed.content)
            .ok_or(ProducerError::EmptyResponse)
    }

    fn name(&self) -> &str {
        "remote"
    }
}
