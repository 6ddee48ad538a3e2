//! Prediction backend port: the proxy that creates and tracks jobs.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PlaygroundError;
use crate::model::ModelKey;

/// Boxed future type returned by the port traits.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PlaygroundError>> + Send + 'a>>;

/// Creates generation jobs, reports their status, and refines prompts.
pub trait PredictionBackend: Send + Sync {
    /// Submit a generation request. The returned job may already be terminal.
    fn create_job(&self, request: &GenerationRequest) -> BackendFuture<'_, Job>;

    /// Fetch the current state of a job by identifier.
    fn get_job(&self, id: &str) -> BackendFuture<'_, Job>;

    /// Ask the text model for an improved prompt.
    fn refine_prompt(&self, prompt: &str) -> BackendFuture<'_, String>;
}

/// Normalized generation request, discriminated by `model_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model_key")]
pub enum GenerationRequest {
    /// Nano Banana text-to-image.
    #[serde(rename = "nano-banana")]
    NanoBanana(NanoBananaRequest),
    /// Background removal.
    #[serde(rename = "remove-bg")]
    RemoveBackground(RemoveBackgroundRequest),
    /// Seedream text-to-image.
    #[serde(rename = "seedream")]
    Seedream(SeedreamRequest),
    /// Instruction-driven image edit.
    #[serde(rename = "revise")]
    Revise(ReviseRequest),
}

/// Fields for a Nano Banana request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NanoBananaRequest {
    /// Text prompt.
    pub prompt: String,
    /// Aspect ratio such as `"4:3"` or `"match_input_image"`.
    pub aspect_ratio: String,
    /// `"1K"`, `"2K"`, or `"4K"`.
    pub resolution: String,
    /// Requested output format.
    pub output_format: String,
    /// Provider safety filter level.
    pub safety_filter_level: String,
    /// Reference images as data URIs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_input: Vec<String>,
}

/// Fields for a background removal request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveBackgroundRequest {
    /// Uploaded image as a data URI. Takes precedence over `image_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Remote image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Enable provider content moderation.
    pub content_moderation: bool,
    /// Keep semi-transparent edge pixels.
    pub preserve_partial_alpha: bool,
}

/// Fields for a Seedream request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedreamRequest {
    /// Text prompt.
    pub prompt: String,
    /// `"1K"`, `"2K"`, `"4K"`, or `"custom"`.
    pub size: String,
    /// Aspect ratio such as `"16:9"` or `"match_input_image"`.
    pub aspect_ratio: String,
    /// Custom width, only sent with `size = "custom"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Custom height, only sent with `size = "custom"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// `"disabled"` or `"auto"`.
    pub sequential_image_generation: String,
    /// Upper bound on generated images.
    pub max_images: u32,
    /// Reference images as data URIs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_input: Vec<String>,
}

/// Fields for an image revision request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviseRequest {
    /// Edit instruction.
    pub prompt: String,
    /// Image to edit, as a data URI or URL.
    pub input_image: String,
    /// Aspect ratio such as `"1:1"` or `"match_input_image"`.
    pub aspect_ratio: String,
    /// Requested output format.
    pub output_format: String,
}

impl GenerationRequest {
    /// The model this request targets.
    #[must_use]
    pub fn model(&self) -> ModelKey {
        match self {
            Self::NanoBanana(_) => ModelKey::NanoBanana,
            Self::RemoveBackground(_) => ModelKey::RemoveBackground,
            Self::Seedream(_) => ModelKey::Seedream,
            Self::Revise(_) => ModelKey::Revise,
        }
    }

    /// The prompt, for models that take one.
    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        match self {
            Self::NanoBanana(r) => Some(&r.prompt),
            Self::Seedream(r) => Some(&r.prompt),
            Self::Revise(r) => Some(&r.prompt),
            Self::RemoveBackground(_) => None,
        }
    }

    /// Trim surrounding whitespace from the prompt in place.
    pub fn trim_prompt(&mut self) {
        let prompt = match self {
            Self::NanoBanana(r) => &mut r.prompt,
            Self::Seedream(r) => &mut r.prompt,
            Self::Revise(r) => &mut r.prompt,
            Self::RemoveBackground(_) => return,
        };
        let trimmed = prompt.trim();
        if trimmed.len() != prompt.len() {
            *prompt = trimmed.to_string();
        }
    }

    /// Whether the request carries an image to operate on.
    #[must_use]
    pub fn has_input_image(&self) -> bool {
        match self {
            Self::NanoBanana(r) => !r.image_input.is_empty(),
            Self::Seedream(r) => !r.image_input.is_empty(),
            Self::RemoveBackground(r) => {
                r.image.as_deref().is_some_and(|s| !s.trim().is_empty())
                    || r.image_url.as_deref().is_some_and(|s| !s.trim().is_empty())
            }
            Self::Revise(r) => !r.input_image.trim().is_empty(),
        }
    }
}

/// Job status as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Queued, not yet running.
    Starting,
    /// Running.
    #[default]
    Processing,
    /// Finished with output.
    Succeeded,
    /// Finished with an error.
    Failed,
    /// Stopped before finishing.
    Canceled,
    /// Any status this client does not know; treated as non-terminal.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Whether no further polling should occur.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

/// A backend-tracked unit of work.
///
/// The typed fields are read out of the record the backend sent, which is
/// kept as-is: serializing a `Job` writes that record back unchanged, so the
/// JSON view and cassettes show exactly what was observed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct Job {
    /// Backend identifier used for polling. Empty when absent.
    pub id: String,
    /// Current status. A missing status is non-terminal.
    pub status: JobStatus,
    /// Provider-specific output, opaque until normalized. `null` when absent.
    pub output: Value,
    /// Backend-supplied error, usually a string.
    pub error: Value,
    /// Creation timestamp.
    pub created_at: Option<String>,
    /// Completion timestamp.
    pub completed_at: Option<String>,
    /// Every other field the backend sent.
    pub extra: Map<String, Value>,
    raw: Value,
}

const JOB_FIELDS: [&str; 6] = ["id", "status", "output", "error", "created_at", "completed_at"];

impl TryFrom<Value> for Job {
    type Error = String;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        let Value::Object(fields) = &raw else {
            return Err(format!("expected a job object, got {raw}"));
        };
        let text = |name: &str| fields.get(name).and_then(Value::as_str).map(str::to_string);
        let field = |name: &str| fields.get(name).cloned().unwrap_or(Value::Null);

        let status = match fields.get("status") {
            Some(value @ Value::String(_)) => {
                serde_json::from_value(value.clone()).map_err(|e| format!("invalid job status: {e}"))?
            }
            _ => JobStatus::default(),
        };
        let extra = fields
            .iter()
            .filter(|(name, _)| !JOB_FIELDS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Self {
            id: text("id").unwrap_or_default(),
            status,
            output: field("output"),
            error: field("error"),
            created_at: text("created_at"),
            completed_at: text("completed_at"),
            extra,
            raw,
        })
    }
}

impl Serialize for Job {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl Job {
    /// The record exactly as the backend sent it.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The error as display text, if the backend supplied a non-empty one.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        match &self.error {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Body shape of `POST /api/predictions` and `GET /api/predictions/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEnvelope {
    /// The job.
    pub prediction: Job,
}

/// Body shape of `POST /api/refine`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineResponse {
    /// The refined prompt; may be empty.
    #[serde(default)]
    pub refined_prompt: String,
    /// Server-side duration.
    #[serde(default)]
    pub elapsed_seconds: Option<f64>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_is_tagged_with_model_key() {
        let request = GenerationRequest::NanoBanana(NanoBananaRequest {
            prompt: "a cat".into(),
            aspect_ratio: "4:3".into(),
            resolution: "2K".into(),
            output_format: "png".into(),
            safety_filter_level: "block_only_high".into(),
            image_input: Vec::new(),
        });
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model_key"], "nano-banana");
        assert_eq!(value["prompt"], "a cat");
        assert!(value.get("image_input").is_none());
    }

    #[test]
    fn remove_background_omits_missing_sources() {
        let request = GenerationRequest::RemoveBackground(RemoveBackgroundRequest {
            image: None,
            image_url: Some("https://x/cat.png".into()),
            content_moderation: false,
            preserve_partial_alpha: true,
        });
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model_key"], "remove-bg");
        assert!(value.get("image").is_none());
        assert!(request.has_input_image());
        assert_eq!(request.prompt(), None);
    }

    #[test]
    fn trim_prompt_in_place() {
        let mut request = GenerationRequest::Revise(ReviseRequest {
            prompt: "  make it blue \n".into(),
            input_image: "https://x/a.png".into(),
            aspect_ratio: "match_input_image".into(),
            output_format: "png".into(),
        });
        request.trim_prompt();
        assert_eq!(request.prompt(), Some("make it blue"));
    }

    #[test]
    fn job_keeps_unknown_fields() {
        let job: Job = serde_json::from_value(json!({
            "id": "abc",
            "status": "processing",
            "output": null,
            "logs": "step 1",
            "urls": {"get": "https://x"}
        }))
        .unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.output.is_null());
        assert_eq!(job.extra["logs"], "step 1");
        let round: Value = serde_json::to_value(&job).unwrap();
        assert_eq!(round["urls"]["get"], "https://x");
    }

    #[test]
    fn missing_or_unknown_status_is_non_terminal() {
        let job: Job = serde_json::from_value(json!({"id": "abc"})).unwrap();
        assert!(!job.status.is_terminal());
        let job: Job = serde_json::from_value(json!({"id": "abc", "status": "queued"})).unwrap();
        assert_eq!(job.status, JobStatus::Unknown);
        assert!(!job.status.is_terminal());
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Canceled.is_terminal());
        assert!(!JobStatus::Starting.is_terminal());
    }

    #[test]
    fn error_message_variants() {
        let job = |value: Value| serde_json::from_value::<Job>(value).unwrap();
        assert_eq!(job(json!({"id": "a"})).error_message(), None);
        assert_eq!(job(json!({"id": "a", "error": "  "})).error_message(), None);
        assert_eq!(
            job(json!({"id": "a", "error": "NSFW content detected"})).error_message().as_deref(),
            Some("NSFW content detected")
        );
        assert_eq!(job(json!({"error": {"code": 42}})).error_message().as_deref(), Some("{\"code\":42}"));
    }

    #[test]
    fn serializes_as_observed() {
        let observed = json!({"status": "queued", "logs": "waiting"});
        let job: Job = serde_json::from_value(observed.clone()).unwrap();
        assert_eq!(job.id, "");
        assert_eq!(job.status, JobStatus::Unknown);
        assert!(job.output.is_null());
        assert_eq!(serde_json::to_value(&job).unwrap(), observed);
        assert_eq!(job.raw(), &observed);
    }

    #[test]
    fn non_object_job_is_rejected() {
        assert!(serde_json::from_value::<Job>(json!("processing")).is_err());
        assert!(serde_json::from_value::<Job>(json!({"status": 3})).is_err());
    }
}
