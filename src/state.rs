//! Per-model state records and the registry that owns them.

use crate::aspect::{Aspect, DEFAULT_ASPECT};
use crate::model::ModelKey;
use crate::ports::Job;

/// Where a model's prediction lifecycle currently is.
///
/// Terminal outcomes are reported as events and fold back into `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// No prediction in flight.
    #[default]
    Idle,
    /// The creation call is outstanding.
    Submitting,
    /// Waiting for the job to reach a terminal status.
    Polling,
}

/// How the most recent submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// The job succeeded. An image may still have been missing or undecodable.
    Succeeded,
    /// The backend reported failure, or the transport failed.
    Failed,
    /// The backend reported cancellation.
    Canceled,
    /// Polling was abandoned at the timeout.
    TimedOut,
}

/// An image ready for display together with the aspect it was probed at.
///
/// Keeping both in one value means the URL and aspect always change together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayImage {
    /// Absolute URL or data URI.
    pub url: String,
    /// Reduced aspect of the decoded pixels.
    pub aspect: Aspect,
}

/// Mutable record for one model variant.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelState {
    image: Option<DisplayImage>,
    job: Option<Job>,
    elapsed_seconds: Option<f64>,
    download_extension: String,
    default_download_extension: &'static str,
    phase: Phase,
    last_outcome: Option<Terminal>,
}

impl ModelState {
    /// A fresh, idle state using the model's default download extension.
    #[must_use]
    pub fn new(model: ModelKey) -> Self {
        let default_download_extension = model.default_download_extension();
        Self {
            image: None,
            job: None,
            elapsed_seconds: None,
            download_extension: default_download_extension.to_string(),
            default_download_extension,
            phase: Phase::Idle,
            last_outcome: None,
        }
    }

    /// The displayable image reference, if any.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image.as_ref().map(|image| image.url.as_str())
    }

    /// The image together with its aspect.
    #[must_use]
    pub fn image(&self) -> Option<&DisplayImage> {
        self.image.as_ref()
    }

    /// The preview aspect: the image's when present, otherwise 16:9.
    #[must_use]
    pub fn aspect(&self) -> Aspect {
        self.image.as_ref().map_or(DEFAULT_ASPECT, |image| image.aspect)
    }

    /// The last job observed from the backend.
    #[must_use]
    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    /// Wall-clock duration of the last completed submission.
    #[must_use]
    pub fn elapsed_seconds(&self) -> Option<f64> {
        self.elapsed_seconds
    }

    /// Extension used for downloads, without a leading dot.
    #[must_use]
    pub fn download_extension(&self) -> &str {
        &self.download_extension
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True strictly between submission and terminal resolution.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// How the most recent submission ended, once it has.
    #[must_use]
    pub fn last_outcome(&self) -> Option<Terminal> {
        self.last_outcome
    }

    pub(crate) fn set_outcome(&mut self, outcome: Terminal) {
        self.last_outcome = Some(outcome);
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn set_image(&mut self, image: Option<DisplayImage>) {
        self.image = image;
    }

    pub(crate) fn record_completion(&mut self, job: Job, elapsed_seconds: f64) {
        self.job = Some(job);
        self.elapsed_seconds = Some(elapsed_seconds);
    }

    /// Override the download extension. Blank values keep the current one.
    pub(crate) fn set_download_extension(&mut self, extension: &str) {
        let extension = extension.trim().trim_start_matches('.');
        if !extension.is_empty() {
            self.download_extension = extension.to_string();
        }
    }

    /// Drop image, job, elapsed time, and the last outcome.
    pub(crate) fn clear(&mut self, preserve_download_extension: bool) {
        self.image = None;
        self.last_outcome = None;
        self.job = None;
        self.elapsed_seconds = None;
        if !preserve_download_extension {
            self.download_extension = self.default_download_extension.to_string();
        }
    }
}

/// Owns one [`ModelState`] per model variant.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    states: [ModelState; 4],
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    /// A registry with every model idle.
    #[must_use]
    pub fn new() -> Self {
        Self { states: ModelKey::ALL.map(ModelState::new) }
    }

    /// Read one model's state.
    #[must_use]
    pub fn get(&self, model: ModelKey) -> &ModelState {
        &self.states[model.index()]
    }

    pub(crate) fn get_mut(&mut self, model: ModelKey) -> &mut ModelState {
        &mut self.states[model.index()]
    }

    /// Models with a prediction in flight.
    pub fn loading(&self) -> impl Iterator<Item = ModelKey> + '_ {
        ModelKey::ALL.into_iter().filter(|&model| self.get(model).is_loading())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn job() -> Job {
        serde_json::from_value(json!({"id": "j1", "status": "succeeded"})).unwrap()
    }

    #[test]
    fn new_state_defaults() {
        let state = ModelState::new(ModelKey::Seedream);
        assert_eq!(state.image_url(), None);
        assert_eq!(state.aspect(), DEFAULT_ASPECT);
        assert_eq!(state.download_extension(), "jpg");
        assert!(!state.is_loading());
    }

    #[test]
    fn image_and_aspect_move_together() {
        let mut state = ModelState::new(ModelKey::NanoBanana);
        state.set_image(Some(DisplayImage {
            url: "https://x/a.png".into(),
            aspect: Aspect { width: 4, height: 3 },
        }));
        assert_eq!(state.aspect(), Aspect { width: 4, height: 3 });
        state.set_image(None);
        assert_eq!(state.aspect(), DEFAULT_ASPECT);
    }

    #[test]
    fn clear_preserves_extension_on_request() {
        let mut state = ModelState::new(ModelKey::NanoBanana);
        state.set_download_extension("jpg");
        state.record_completion(job(), 1.5);
        state.clear(true);
        assert!(state.job().is_none());
        assert!(state.elapsed_seconds().is_none());
        assert_eq!(state.download_extension(), "jpg");
        state.clear(false);
        assert_eq!(state.download_extension(), "png");
    }

    #[test]
    fn blank_extension_is_ignored() {
        let mut state = ModelState::new(ModelKey::NanoBanana);
        state.set_download_extension("  ");
        assert_eq!(state.download_extension(), "png");
        state.set_download_extension(".webp");
        assert_eq!(state.download_extension(), "webp");
    }

    #[test]
    fn registry_tracks_models_independently() {
        let mut registry = ModelRegistry::new();
        registry.get_mut(ModelKey::Seedream).set_phase(Phase::Polling);
        assert!(registry.get(ModelKey::Seedream).is_loading());
        assert!(!registry.get(ModelKey::NanoBanana).is_loading());
        assert_eq!(registry.loading().collect::<Vec<_>>(), vec![ModelKey::Seedream]);
    }
}
