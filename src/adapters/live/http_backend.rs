//! Live adapter for the prediction proxy's JSON API.

use reqwest::{Client, Response};
use serde_json::{json, Value};

use crate::error::PlaygroundError;
use crate::ports::prediction_backend::{JobEnvelope, RefineResponse};
use crate::ports::{BackendFuture, GenerationRequest, Job, PredictionBackend};

const CREATE_FAILED: &str = "Failed to start prediction.";
const POLL_FAILED: &str = "Failed to poll prediction status.";
const REFINE_FAILED: &str = "Unable to refine prompt right now.";

/// Prediction backend that calls `/api/predictions` and `/api/refine`.
pub struct HttpPredictionBackend {
    client: Client,
    base_url: String,
}

impl HttpPredictionBackend {
    /// Create a backend rooted at `base_url`, e.g. `http://localhost:3000`.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl PredictionBackend for HttpPredictionBackend {
    fn create_job(&self, request: &GenerationRequest) -> BackendFuture<'_, Job> {
        let body = serde_json::to_value(request);
        Box::pin(async move {
            let response = self.client.post(self.endpoint("/api/predictions")).json(&body?).send().await?;
            let envelope: JobEnvelope = read_json(response, CREATE_FAILED).await?;
            Ok(envelope.prediction)
        })
    }

    fn get_job(&self, id: &str) -> BackendFuture<'_, Job> {
        let url = self.endpoint(&format!("/api/predictions/{id}"));
        Box::pin(async move {
            let response = self.client.get(url).send().await?;
            let envelope: JobEnvelope = read_json(response, POLL_FAILED).await?;
            Ok(envelope.prediction)
        })
    }

    fn refine_prompt(&self, prompt: &str) -> BackendFuture<'_, String> {
        let body = json!({ "prompt": prompt });
        Box::pin(async move {
            let response = self.client.post(self.endpoint("/api/refine")).json(&body).send().await?;
            let refined: RefineResponse = read_json(response, REFINE_FAILED).await?;
            Ok(refined.refined_prompt)
        })
    }
}

/// Parse a 2xx body, or turn a non-2xx one into [`PlaygroundError::Api`].
async fn read_json<T: serde::de::DeserializeOwned>(
    response: Response,
    fallback: &str,
) -> Result<T, PlaygroundError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let message = error_message(&text).unwrap_or_else(|| fallback.to_string());
        return Err(PlaygroundError::Api { status: status.as_u16(), message });
    }

    Ok(serde_json::from_str(&text)?)
}

/// Pull `error`, then `details.error`, then a string `details` out of an error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let non_empty = |v: &Value| v.as_str().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
    non_empty(&value["error"])
        .or_else(|| non_empty(&value["details"]["error"]))
        .or_else(|| non_empty(&value["details"]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_wins() {
        let body = r#"{"error": "Prompt is required", "details": {"error": "inner"}}"#;
        assert_eq!(error_message(body).as_deref(), Some("Prompt is required"));
    }

    #[test]
    fn falls_back_to_details() {
        assert_eq!(error_message(r#"{"details": {"error": "quota exceeded"}}"#).as_deref(), Some("quota exceeded"));
        assert_eq!(error_message(r#"{"error": "", "details": "socket hang up"}"#).as_deref(), Some("socket hang up"));
    }

    #[test]
    fn unparseable_body_has_no_message() {
        assert_eq!(error_message("<html>502</html>"), None);
        assert_eq!(error_message("{}"), None);
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let backend = HttpPredictionBackend::new(Client::new(), "http://localhost:3000/");
        assert_eq!(backend.endpoint("/api/refine"), "http://localhost:3000/api/refine");
    }
}
