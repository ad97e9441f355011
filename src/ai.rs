//! Remote AI classification adapter.
//!
//! Wraps an OpenAI-compatible chat-completions endpoint behind a blocking
//! client with a hard per-call timeout. The adapter is deliberately fallible
//! and never retried: any transport, timeout or parse failure is surfaced as
//! an error for the classification chain to treat as "no opinion".

use serde_json::{Value, json};
use std::time::Duration;

/// Upper bound on a single remote classification call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a remote classification attempt. These never abort a run.
#[derive(Debug)]
pub enum AiError {
    /// Transport-level failure: connection, timeout, non-2xx status.
    Request(String),
    /// The response body did not carry a chat completion message.
    MalformedResponse(String),
}

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(reason) => write!(f, "AI request failed: {}", reason),
            Self::MalformedResponse(reason) => {
                write!(f, "AI response was malformed: {}", reason)
            }
        }
    }
}

impl std::error::Error for AiError {}

/// Blocking client for the remote classification endpoint.
pub struct AiClient {
    agent: ureq::Agent,
    api_key: String,
    base_url: String,
    model: String,
}

impl AiClient {
    /// Builds a client, or `None` when no API key is configured. The engine
    /// simply omits the remote strategy in that case.
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Option<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return None;
        }
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Some(Self {
            agent,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// Asks the remote model to pick a category for one item.
    ///
    /// The free-text response is validated by substring-matching the known
    /// category names in their declared order; the first match wins. A
    /// response naming no known category yields `Ok(None)`.
    pub fn suggest_category(
        &self,
        name: &str,
        is_dir: bool,
        categories: &[&str],
    ) -> Result<Option<String>, AiError> {
        let kind = if is_dir { "folder" } else { "file" };
        let prompt = format!(
            "Classify the {} '{}' into exactly one of the following categories: [{}]. \
             Reply with the category name only.",
            kind,
            name,
            categories.join(", ")
        );

        let payload = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .agent
            .post(&format!("{}/chat/completions", self.base_url))
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Content-Type", "application/json")
            .send_json(payload)
            .map_err(|e| AiError::Request(e.to_string()))?;

        let body: Value = response
            .into_json()
            .map_err(|e| AiError::MalformedResponse(e.to_string()))?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                AiError::MalformedResponse("missing choices[0].message.content".to_string())
            })?;

        Ok(Self::match_category(content, categories))
    }

    fn match_category(response: &str, categories: &[&str]) -> Option<String> {
        categories
            .iter()
            .find(|cat| response.contains(*cat))
            .map(|cat| cat.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_api_key_yields_no_client() {
        assert!(AiClient::new("", "https://api.example.com", "model-x").is_none());
        assert!(AiClient::new("   ", "https://api.example.com", "model-x").is_none());
    }

    #[test]
    fn test_configured_client_is_built() {
        assert!(AiClient::new("sk-test", "https://api.example.com/", "model-x").is_some());
    }

    #[test]
    fn test_response_validation_first_declared_category_wins() {
        let categories = vec!["10_images", "14_video", "99_misc"];

        // Exact name in a chatty response still matches.
        let result =
            AiClient::match_category("The best fit would be 14_video.", &categories);
        assert_eq!(result, Some("14_video".to_string()));

        // Two category names present: declared order breaks the tie.
        let result =
            AiClient::match_category("Either 14_video or 10_images works", &categories);
        assert_eq!(result, Some("10_images".to_string()));

        // No known category in the response.
        let result = AiClient::match_category("I cannot classify this item", &categories);
        assert_eq!(result, None);
    }

    #[test]
    fn test_unreachable_endpoint_reports_request_error() {
        // Port 9 (discard) on localhost refuses immediately; no 10s wait.
        let client =
            AiClient::new("sk-test", "http://127.0.0.1:9", "model-x").expect("client");
        let result = client.suggest_category("notes.txt", false, &["08_text"]);
        assert!(matches!(result, Err(AiError::Request(_))));
    }
}
