//! Replaying adapter for the `PredictionBackend` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::adapters::recording::prediction_backend::PORT;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{BackendFuture, GenerationRequest, Job, PredictionBackend};

/// Serves recorded backend results from a cassette.
pub struct ReplayingPredictionBackend {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingPredictionBackend {
    /// Create a replaying backend backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl PredictionBackend for ReplayingPredictionBackend {
    fn create_job(&self, _request: &GenerationRequest) -> BackendFuture<'_, Job> {
        let output = next_output(&self.replayer, PORT, "create_job");
        Box::pin(async move { replay_result(output?) })
    }

    fn get_job(&self, _id: &str) -> BackendFuture<'_, Job> {
        let output = next_output(&self.replayer, PORT, "get_job");
        Box::pin(async move { replay_result(output?) })
    }

    fn refine_prompt(&self, _prompt: &str) -> BackendFuture<'_, String> {
        let output = next_output(&self.replayer, PORT, "refine_prompt");
        Box::pin(async move { replay_result(output?) })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use crate::error::PlaygroundError;
    use crate::ports::prediction_backend::RemoveBackgroundRequest;
    use crate::ports::JobStatus;

    fn backend(interactions: Vec<(&str, serde_json::Value)>) -> ReplayingPredictionBackend {
        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            commit: String::new(),
            interactions: interactions
                .into_iter()
                .enumerate()
                .map(|(seq, (method, output))| Interaction {
                    seq: seq as u64,
                    port: PORT.into(),
                    method: method.into(),
                    input: json!({}),
                    output,
                })
                .collect(),
        };
        ReplayingPredictionBackend::new(Arc::new(Mutex::new(CassetteReplayer::new(&cassette))))
    }

    #[tokio::test]
    async fn serves_jobs_in_order() {
        let backend = backend(vec![
            ("create_job", json!({"Ok": {"id": "p1", "status": "starting"}})),
            ("get_job", json!({"Ok": {"id": "p1", "status": "succeeded", "output": "https://x/y.png"}})),
        ]);
        let request = GenerationRequest::RemoveBackground(RemoveBackgroundRequest {
            image: None,
            image_url: Some("https://x/cat.png".into()),
            content_moderation: false,
            preserve_partial_alpha: true,
        });
        let created = backend.create_job(&request).await.unwrap();
        assert_eq!(created.status, JobStatus::Starting);
        let polled = backend.get_job("p1").await.unwrap();
        assert_eq!(polled.status, JobStatus::Succeeded);
    }

    #[tokio::test]
    async fn exhausted_cassette_is_an_error() {
        let backend = backend(vec![]);
        assert!(matches!(backend.get_job("p1").await, Err(PlaygroundError::Config(_))));
    }
}
