use serde::{Deserialize, Serialize};

pub(crate) const GENERIC_PROVIDER_ERROR: &str = "provider returned an unspecified error";

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("network error: {0}")]
    Network(String),
    #[error("provider rejected the request: {0}")]
    ProviderRejected(String),
    #[error("provider response is missing the expected content")]
    MalformedResponse,
}

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: text.into() }],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    pub parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// First candidate's first text part, per the provider response shape.
pub(crate) fn extract_text(response: GenerateContentResponse) -> Result<String, ExchangeError> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .and_then(|parts| parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or(ExchangeError::MalformedResponse)
}

/// Provider-supplied error message from a failure body, when present.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorResponse>(body).ok()?.error?.message
}

/// Rejection carrying the provider's own message, or the generic fallback.
pub(crate) fn provider_rejection(body: &str) -> ExchangeError {
    ExchangeError::ProviderRejected(
        extract_error_message(body).unwrap_or_else(|| GENERIC_PROVIDER_ERROR.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_wire_shape() {
        let request = GenerateContentRequest::from_text("שלום");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "contents": [{ "parts": [{ "text": "שלום" }] }] })
        );
    }

    #[test]
    fn extract_text_reads_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"X"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "X");
    }

    #[test]
    fn extract_text_without_candidates_is_malformed() {
        let response: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(matches!(
            extract_text(response),
            Err(ExchangeError::MalformedResponse)
        ));
    }

    #[test]
    fn extract_text_with_empty_parts_is_malformed() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[]}}]}"#).unwrap();
        assert!(matches!(
            extract_text(response),
            Err(ExchangeError::MalformedResponse)
        ));
    }

    #[test]
    fn rejection_carries_provider_message() {
        match provider_rejection(r#"{"error":{"message":"bad key"}}"#) {
            ExchangeError::ProviderRejected(message) => assert_eq!(message, "bad key"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn rejection_falls_back_to_generic_message() {
        match provider_rejection("not json") {
            ExchangeError::ProviderRejected(message) => {
                assert_eq!(message, GENERIC_PROVIDER_ERROR)
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(extract_error_message(r#"{"error":{}}"#).is_none());
    }
}
