//! Recording adapter for the `PredictionBackend` port.

use std::sync::{Arc, Mutex};

use serde_json::json;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{BackendFuture, GenerationRequest, Job, PredictionBackend};

/// Port name used in cassettes.
pub const PORT: &str = "prediction_backend";

/// Records backend interactions while delegating to an inner implementation.
pub struct RecordingPredictionBackend {
    inner: Arc<dyn PredictionBackend>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingPredictionBackend {
    /// Creates a new recording backend wrapping the given implementation.
    pub fn new(inner: Arc<dyn PredictionBackend>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl PredictionBackend for RecordingPredictionBackend {
    fn create_job(&self, request: &GenerationRequest) -> BackendFuture<'_, Job> {
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.create_job(&request).await;
            record_result(&self.recorder, PORT, "create_job", &request, &result);
            result
        })
    }

    fn get_job(&self, id: &str) -> BackendFuture<'_, Job> {
        let id = id.to_string();
        Box::pin(async move {
            let result = self.inner.get_job(&id).await;
            record_result(&self.recorder, PORT, "get_job", &json!({ "id": id }), &result);
            result
        })
    }

    fn refine_prompt(&self, prompt: &str) -> BackendFuture<'_, String> {
        let prompt = prompt.to_string();
        Box::pin(async move {
            let result = self.inner.refine_prompt(&prompt).await;
            record_result(&self.recorder, PORT, "refine_prompt", &json!({ "prompt": prompt }), &result);
            result
        })
    }
}
