use backoff::{future::retry, Error as BackoffError, ExponentialBackoff};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::llm::types::*;
use crate::prompts::PROBE_TEXT;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-pro";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// One request/response cycle with the provider. Transient failures
    /// (connect, timeout, 429, 5xx) are retried with capped backoff before
    /// the error surfaces; retries are sequential, so at most one request
    /// is ever outstanding.
    pub async fn generate(&self, text: &str) -> Result<String, ExchangeError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            BASE_URL, self.model, self.api_key
        );
        let request = GenerateContentRequest::from_text(text);

        let operation = || async {
            let response = self
                .http
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    let err = ExchangeError::Network(e.to_string());
                    if e.is_connect() || e.is_timeout() {
                        BackoffError::transient(err)
                    } else {
                        BackoffError::permanent(err)
                    }
                })?;

            let status = response.status();

            if status.is_success() {
                let parsed: GenerateContentResponse = response
                    .json()
                    .await
                    .map_err(|_| BackoffError::permanent(ExchangeError::MalformedResponse))?;
                extract_text(parsed).map_err(BackoffError::permanent)
            } else {
                let body = response.text().await.unwrap_or_default();
                let err = provider_rejection(&body);
                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    Err(BackoffError::transient(err))
                } else {
                    Err(BackoffError::permanent(err))
                }
            }
        };

        let backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(4),
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, operation).await
    }

    /// Credential probe: a fixed trivial payload through the same exchange
    /// path, answer discarded.
    pub async fn verify(&self) -> Result<(), ExchangeError> {
        self.generate(PROBE_TEXT).await.map(|_| ())
    }
}
