//! The application context: owns every model's state and form, the active
//! model pointer, and the event channel runs report on.

use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::context::ServiceContext;
use crate::error::PlaygroundError;
use crate::forms::{FormConfig, FormSet, GatheredPayload};
use crate::lifecycle::{ImageResult, Outcome, PollPolicy, PredictionRun, RunEvent};
use crate::media::ProgressSender;
use crate::model::ModelKey;
use crate::output;
use crate::ports::GenerationRequest;
use crate::preview::{self, PreviewView};
use crate::state::{ModelRegistry, ModelState, Phase, Terminal};

const PROMPT_REQUIRED: &str = "Please provide a prompt before running the model.";
const IMAGE_REQUIRED: &str = "Provide an input image before running the model.";
const REFINE_PROMPT_REQUIRED: &str = "Provide a prompt before refining.";

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Neutral information.
    Info,
    /// Something finished well.
    Success,
    /// Finished, but not entirely as hoped.
    Warning,
    /// Something failed.
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Model the message concerns.
    pub model: ModelKey,
    /// Severity.
    pub level: Level,
    /// Text shown to the user.
    pub message: String,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.model, self.message)
    }
}

/// Owns registry, forms, active model, and the run event channel.
///
/// Runs execute as independent tasks and only report events; every state
/// change happens here, in [`Playground::apply`].
pub struct Playground {
    services: ServiceContext,
    policy: PollPolicy,
    registry: ModelRegistry,
    forms: FormSet,
    active: ModelKey,
    view: PreviewView,
    notifications: VecDeque<Notification>,
    events_tx: UnboundedSender<RunEvent>,
    events_rx: UnboundedReceiver<RunEvent>,
}

impl Playground {
    /// Create a playground with every model idle and `active` visible.
    #[must_use]
    pub fn new(services: ServiceContext, policy: PollPolicy, active: ModelKey) -> Self {
        let registry = ModelRegistry::new();
        let forms = FormSet::default();
        let view = preview::render(active, registry.get(active), forms.get(active).as_form().preview_aspect());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            services,
            policy,
            registry,
            forms,
            active,
            view,
            notifications: VecDeque::new(),
            events_tx,
            events_rx,
        }
    }

    /// The visible model.
    #[must_use]
    pub fn active_model(&self) -> ModelKey {
        self.active
    }

    /// Make `model` visible and re-render from its own state.
    ///
    /// In-flight runs of other models are unaffected.
    pub fn set_active_model(&mut self, model: ModelKey) {
        self.active = model;
        self.rerender();
    }

    /// One model's state.
    #[must_use]
    pub fn state(&self, model: ModelKey) -> &ModelState {
        self.registry.get(model)
    }

    /// One model's form.
    #[must_use]
    pub fn form(&self, model: ModelKey) -> &FormConfig {
        self.forms.get(model)
    }

    /// One model's form, for editing. Call [`Playground::rerender`] after
    /// changing fields that affect the preview aspect.
    pub fn form_mut(&mut self, model: ModelKey) -> &mut FormConfig {
        self.forms.get_mut(model)
    }

    /// The current projection of the active model.
    #[must_use]
    pub fn view(&self) -> &PreviewView {
        &self.view
    }

    /// Re-project the active model's state onto the view.
    pub fn rerender(&mut self) {
        let model = self.active;
        self.view =
            preview::render(model, self.registry.get(model), self.forms.get(model).as_form().preview_aspect());
    }

    /// Take all pending notifications, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    /// Gather, validate, and start a prediction for `model`.
    ///
    /// On success the model is `Submitting` and a run task is in flight.
    /// Validation failures never reach the backend.
    ///
    /// # Errors
    ///
    /// Returns [`PlaygroundError::Busy`] if the model already has a run in
    /// flight, [`PlaygroundError::Validation`] if a required field is
    /// missing, or the error that stopped input files from being read.
    pub async fn submit(&mut self, model: ModelKey, progress: Option<&ProgressSender>) -> Result<(), PlaygroundError> {
        if self.registry.get(model).is_loading() {
            return Err(PlaygroundError::Busy(model));
        }

        let gathered = self.forms.get(model).as_form().gather_payload(progress).await;
        let GatheredPayload { mut request, download_extension } = match gathered {
            Ok(payload) => payload,
            Err(e) => {
                self.notify(model, Level::Error, e.user_message());
                return Err(e);
            }
        };
        request.trim_prompt();

        if let Err(message) = check_required(model, &request) {
            self.notify(model, Level::Error, message);
            return Err(PlaygroundError::Validation(message.to_string()));
        }

        let state = self.registry.get_mut(model);
        state.set_download_extension(&download_extension);
        state.clear(true);
        state.set_phase(Phase::Submitting);
        let download_extension = state.download_extension().to_string();
        self.rerender_if_active(model);

        info!("Submitting {model}");
        PredictionRun {
            backend: self.services.backend.clone(),
            probe: self.services.probe.clone(),
            model,
            request,
            download_extension,
            policy: self.policy,
            events: self.events_tx.clone(),
        }
        .spawn();
        Ok(())
    }

    /// Fold one run event into the owning model's state.
    pub fn apply(&mut self, event: RunEvent) {
        let model = event.model();
        match event {
            RunEvent::Phase { phase, .. } => self.registry.get_mut(model).set_phase(phase),
            RunEvent::Finished { outcome, .. } => self.finish(model, outcome),
            RunEvent::Settled { .. } => self.registry.get_mut(model).set_phase(Phase::Idle),
        }
        self.rerender_if_active(model);
    }

    fn finish(&mut self, model: ModelKey, outcome: Outcome) {
        match outcome {
            Outcome::Succeeded { job, elapsed_seconds, image } => {
                let state = self.registry.get_mut(model);
                state.record_completion(job, elapsed_seconds);
                state.set_outcome(Terminal::Succeeded);
                match image {
                    ImageResult::Ready(image) => {
                        state.set_image(Some(image));
                        self.notify(model, Level::Success, "Prediction complete.");
                    }
                    ImageResult::Missing => {
                        self.notify(model, Level::Warning, "Prediction finished but no image URL returned.");
                    }
                    ImageResult::Undecodable(reason) => {
                        debug!("{model} preview failed to load: {reason}");
                        state.set_image(None);
                        self.notify(model, Level::Error, "Failed to load generated image preview.");
                    }
                }
            }
            Outcome::Failed(err) => {
                let terminal = match err {
                    PlaygroundError::TimedOut { .. } => Terminal::TimedOut,
                    PlaygroundError::JobCanceled(_) => Terminal::Canceled,
                    _ => Terminal::Failed,
                };
                self.registry.get_mut(model).set_outcome(terminal);
                self.notify(model, Level::Error, err.user_message());
            }
        }
    }

    /// Wait for the next run event without applying it.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events_rx.recv().await
    }

    /// Apply events until `model` is idle.
    pub async fn wait_idle(&mut self, model: ModelKey) {
        while self.registry.get(model).is_loading() {
            let Some(event) = self.events_rx.recv().await else {
                break;
            };
            self.apply(event);
        }
    }

    /// Apply events until no model is loading.
    pub async fn wait_all_idle(&mut self) {
        while self.registry.loading().next().is_some() {
            let Some(event) = self.events_rx.recv().await else {
                break;
            };
            self.apply(event);
        }
    }

    /// Clear a model's result and restore its form defaults.
    ///
    /// The download extension survives. A confirmation is queued only for
    /// the active model and only when not `silent`.
    pub fn reset_model(&mut self, model: ModelKey, silent: bool) {
        self.registry.get_mut(model).clear(true);
        self.forms.get_mut(model).as_form_mut().reset();
        self.rerender_if_active(model);
        if !silent && model == self.active {
            self.notify(model, Level::Info, "Inputs reset to defaults.");
        }
    }

    /// Replace the model's prompt with a refined one.
    ///
    /// Returns whether the prompt changed.
    ///
    /// # Errors
    ///
    /// Returns [`PlaygroundError::Validation`] if the prompt is empty or the
    /// model takes none, or the backend's error.
    pub async fn refine_prompt(&mut self, model: ModelKey) -> Result<bool, PlaygroundError> {
        let prompt = self.forms.get(model).as_form().prompt().map(str::trim).unwrap_or_default().to_string();
        if prompt.is_empty() {
            self.notify(model, Level::Error, REFINE_PROMPT_REQUIRED);
            return Err(PlaygroundError::Validation(REFINE_PROMPT_REQUIRED.to_string()));
        }

        let refined = match self.services.backend.refine_prompt(&prompt).await {
            Ok(refined) => refined,
            Err(e) => {
                self.notify(model, Level::Error, e.user_message());
                return Err(e);
            }
        };

        let refined = refined.trim();
        if refined.is_empty() || refined == prompt {
            self.notify(model, Level::Info, "Refine service returned no changes.");
            return Ok(false);
        }
        self.forms.get_mut(model).as_form_mut().set_prompt(refined.to_string());
        self.notify(model, Level::Success, "Prompt refined.");
        Ok(true)
    }

    /// Save the model's current image, converting to its download extension.
    ///
    /// Writes to `destination`, or `generated-image.{ext}` when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`PlaygroundError::NoImage`] if there is nothing to download,
    /// or the error that stopped the bytes from being fetched or written.
    pub async fn download(&self, model: ModelKey, destination: Option<&Path>) -> Result<PathBuf, PlaygroundError> {
        let state = self.registry.get(model);
        let image = state.image().filter(|_| !state.is_loading()).ok_or(PlaygroundError::NoImage(model))?;
        let extension = state.download_extension();
        let path = output::resolve_output_path(destination, extension);

        let (bytes, mime) = output::fetch_image_bytes(&self.services.http, &image.url).await?;
        output::save_image(&bytes, &mime, extension, &path)?;
        Ok(path)
    }

    fn rerender_if_active(&mut self, model: ModelKey) {
        if model == self.active {
            self.rerender();
        }
    }

    fn notify(&mut self, model: ModelKey, level: Level, message: impl Into<String>) {
        self.notifications.push_back(Notification { model, level, message: message.into() });
    }
}

/// The submission guard: prompt for prompt-driven models, an input image
/// for image-driven ones.
fn check_required(model: ModelKey, request: &GenerationRequest) -> Result<(), &'static str> {
    if model.requires_prompt() && request.prompt().map_or(true, str::is_empty) {
        return Err(PROMPT_REQUIRED);
    }
    if model.requires_image() && !request.has_input_image() {
        return Err(IMAGE_REQUIRED);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use reqwest::Client;
    use serde_json::{json, Value};

    use super::*;
    use crate::aspect::{Aspect, DEFAULT_ASPECT};
    use crate::lifecycle::fakes::{failed_job, job, FixedDimensions, ScriptedBackend};
    use crate::media::tests::png_data_uri;
    use crate::ports::ImageDimensions;
    use crate::preview::PreviewBody;

    fn playground(backend: &Arc<ScriptedBackend>, active: ModelKey) -> Playground {
        let dimensions = FixedDimensions(Some(ImageDimensions { width: 1920, height: 1080 }));
        playground_with(backend, dimensions, PollPolicy::default(), active)
    }

    fn playground_with(
        backend: &Arc<ScriptedBackend>,
        dimensions: FixedDimensions,
        policy: PollPolicy,
        active: ModelKey,
    ) -> Playground {
        let services = ServiceContext { backend: backend.clone(), probe: Arc::new(dimensions), http: Client::new() };
        Playground::new(services, policy, active)
    }

    fn seedream_prompt(playground: &mut Playground, prompt: &str) {
        let FormConfig::Seedream(form) = playground.form_mut(ModelKey::Seedream) else {
            panic!("wrong variant");
        };
        form.prompt = prompt.into();
    }

    #[tokio::test(start_paused = true)]
    async fn empty_prompt_never_reaches_backend() {
        let backend = Arc::new(ScriptedBackend::default());
        let mut playground = playground(&backend, ModelKey::Seedream);
        seedream_prompt(&mut playground, "   ");

        let err = playground.submit(ModelKey::Seedream, None).await.unwrap_err();
        assert!(matches!(err, PlaygroundError::Validation(_)));
        assert_eq!(backend.create_count(), 0);
        assert!(!playground.state(ModelKey::Seedream).is_loading());
        assert_eq!(playground.drain_notifications()[0].message, PROMPT_REQUIRED);
    }

    #[tokio::test(start_paused = true)]
    async fn image_models_require_an_image() {
        let backend = Arc::new(ScriptedBackend::default());
        let mut playground = playground(&backend, ModelKey::RemoveBackground);

        let err = playground.submit(ModelKey::RemoveBackground, None).await.unwrap_err();
        assert_eq!(err.to_string(), IMAGE_REQUIRED);
        assert_eq!(backend.create_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn end_to_end_success() {
        let backend = Arc::new(ScriptedBackend::new(
            Ok(job("processing", Value::Null)),
            vec![job("succeeded", json!("https://cdn/x.png"))],
        ));
        let mut playground = playground(&backend, ModelKey::NanoBanana);
        if let FormConfig::NanoBanana(form) = playground.form_mut(ModelKey::NanoBanana) {
            form.prompt = "  test ".into();
            form.output_format = "jpg".into();
        }

        playground.submit(ModelKey::NanoBanana, None).await.unwrap();
        assert!(playground.state(ModelKey::NanoBanana).is_loading());
        assert_eq!(playground.view().body, PreviewBody::Loading);

        playground.wait_idle(ModelKey::NanoBanana).await;

        let state = playground.state(ModelKey::NanoBanana);
        assert_eq!(state.image_url(), Some("https://cdn/x.png"));
        assert!(!state.is_loading());
        assert_eq!(state.download_extension(), "jpg");
        assert_eq!(state.aspect(), DEFAULT_ASPECT);
        assert_eq!(state.last_outcome(), Some(Terminal::Succeeded));
        assert_eq!(backend.requests.lock().unwrap()[0].prompt(), Some("test"));

        let view = playground.view();
        assert_eq!(view.body, PreviewBody::Image { url: "https://cdn/x.png".into() });
        assert_eq!(view.download.as_ref().unwrap().filename, "generated-image.jpg");
        assert_eq!(playground.drain_notifications()[0].message, "Prediction complete.");
    }

    #[tokio::test(start_paused = true)]
    async fn switching_models_leaves_runs_alone() {
        let backend = Arc::new(ScriptedBackend::new(
            Ok(job("processing", Value::Null)),
            vec![job("processing", Value::Null), job("succeeded", json!([{"url": "https://cdn/s.jpg"}]))],
        ));
        let mut playground = playground(&backend, ModelKey::Seedream);
        seedream_prompt(&mut playground, "a lighthouse");
        playground.submit(ModelKey::Seedream, None).await.unwrap();

        playground.set_active_model(ModelKey::NanoBanana);
        assert_eq!(playground.view().model, ModelKey::NanoBanana);
        assert_eq!(playground.view().body, PreviewBody::Empty);
        assert!(playground.state(ModelKey::Seedream).is_loading());
        assert_eq!(playground.state(ModelKey::Seedream).image_url(), None);

        playground.set_active_model(ModelKey::Seedream);
        assert_eq!(playground.view().body, PreviewBody::Loading);

        playground.set_active_model(ModelKey::NanoBanana);
        playground.wait_idle(ModelKey::Seedream).await;
        assert_eq!(playground.view().body, PreviewBody::Empty);
        assert!(!playground.state(ModelKey::NanoBanana).is_loading());

        playground.set_active_model(ModelKey::Seedream);
        assert_eq!(playground.view().body, PreviewBody::Image { url: "https://cdn/s.jpg".into() });
        assert_eq!(playground.view().aspect, Aspect { width: 16, height: 9 });
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_runs_are_independent() {
        let backend = Arc::new(ScriptedBackend::new(Ok(job("processing", Value::Null)), vec![]));
        backend.push_run(Ok(failed_job("quota exceeded")), vec![]);

        let mut playground = playground(&backend, ModelKey::NanoBanana);
        seedream_prompt(&mut playground, "slow one");
        playground.submit(ModelKey::Seedream, None).await.unwrap();
        playground.submit(ModelKey::NanoBanana, None).await.unwrap();

        playground.wait_idle(ModelKey::NanoBanana).await;
        assert_eq!(playground.state(ModelKey::NanoBanana).last_outcome(), Some(Terminal::Failed));
        assert!(playground.state(ModelKey::Seedream).is_loading());

        playground.wait_all_idle().await;
        assert_eq!(playground.state(ModelKey::Seedream).last_outcome(), Some(Terminal::TimedOut));
        let messages: Vec<String> = playground.drain_notifications().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, ["quota exceeded", "Prediction timed out after 5 minutes."]);
    }

    #[tokio::test(start_paused = true)]
    async fn short_timeout_is_reported_in_seconds() {
        let backend = Arc::new(ScriptedBackend::new(Ok(job("processing", Value::Null)), vec![]));
        let policy = PollPolicy { interval: Duration::from_millis(10), timeout: Duration::from_secs(5) };
        let mut playground = playground_with(&backend, FixedDimensions(None), policy, ModelKey::NanoBanana);

        playground.submit(ModelKey::NanoBanana, None).await.unwrap();
        playground.wait_idle(ModelKey::NanoBanana).await;
        assert_eq!(playground.state(ModelKey::NanoBanana).last_outcome(), Some(Terminal::TimedOut));
        assert_eq!(playground.drain_notifications()[0].message, "Prediction timed out after 5 seconds.");
    }

    #[tokio::test(start_paused = true)]
    async fn poll_failure_ends_the_run() {
        let backend = Arc::new(ScriptedBackend::new(Ok(job("processing", Value::Null)), vec![]));
        backend.push_poll(Err(PlaygroundError::Api { status: 500, message: "Failed to poll prediction status.".into() }));
        let mut playground = playground(&backend, ModelKey::NanoBanana);

        playground.submit(ModelKey::NanoBanana, None).await.unwrap();
        playground.wait_idle(ModelKey::NanoBanana).await;

        let state = playground.state(ModelKey::NanoBanana);
        assert!(!state.is_loading());
        assert_eq!(state.last_outcome(), Some(Terminal::Failed));
        assert_eq!(state.image_url(), None);
        assert_eq!(backend.poll_count.load(Ordering::SeqCst), 1);
        let notes = playground.drain_notifications();
        assert_eq!(notes[0].level, Level::Error);
        assert_eq!(notes[0].message, "Failed to poll prediction status.");
        assert_eq!(playground.view().body, PreviewBody::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_image_is_discarded_but_job_kept() {
        let backend = Arc::new(ScriptedBackend::new(Ok(job("succeeded", json!("https://cdn/broken.png"))), vec![]));
        let mut playground = playground_with(&backend, FixedDimensions(None), PollPolicy::default(), ModelKey::Seedream);
        seedream_prompt(&mut playground, "a lighthouse");

        playground.submit(ModelKey::Seedream, None).await.unwrap();
        playground.wait_idle(ModelKey::Seedream).await;

        let state = playground.state(ModelKey::Seedream);
        assert_eq!(state.image_url(), None);
        assert!(state.job().is_some());
        assert!(state.elapsed_seconds().is_some());
        assert!(!state.is_loading());
        let notes = playground.drain_notifications();
        assert_eq!(notes[0].level, Level::Error);
        assert_eq!(notes[0].message, "Failed to load generated image preview.");
        assert_eq!(playground.view().body, PreviewBody::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn busy_model_rejects_second_submit() {
        let backend = Arc::new(ScriptedBackend::new(Ok(job("processing", Value::Null)), vec![]));
        let mut playground = playground(&backend, ModelKey::NanoBanana);
        playground.submit(ModelKey::NanoBanana, None).await.unwrap();
        assert!(matches!(
            playground.submit(ModelKey::NanoBanana, None).await,
            Err(PlaygroundError::Busy(ModelKey::NanoBanana))
        ));
        playground.wait_idle(ModelKey::NanoBanana).await;
        assert_eq!(backend.create_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_regeneration_leaves_empty_preview() {
        let backend = Arc::new(ScriptedBackend::new(Ok(job("succeeded", json!("https://cdn/first.png"))), vec![]));
        backend.push_run(Ok(job("canceled", Value::Null)), vec![]);
        let mut playground = playground(&backend, ModelKey::NanoBanana);

        playground.submit(ModelKey::NanoBanana, None).await.unwrap();
        playground.wait_idle(ModelKey::NanoBanana).await;
        assert!(playground.state(ModelKey::NanoBanana).image_url().is_some());

        playground.submit(ModelKey::NanoBanana, None).await.unwrap();
        playground.wait_idle(ModelKey::NanoBanana).await;
        let state = playground.state(ModelKey::NanoBanana);
        assert_eq!(state.image_url(), None);
        assert!(state.job().is_none());
        assert_eq!(state.last_outcome(), Some(Terminal::Canceled));
        assert_eq!(playground.view().body, PreviewBody::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_image_warns_but_keeps_job() {
        let backend = Arc::new(ScriptedBackend::new(Ok(job("succeeded", json!({"text": "ok"}))), vec![]));
        let mut playground = playground(&backend, ModelKey::NanoBanana);
        playground.submit(ModelKey::NanoBanana, None).await.unwrap();
        playground.wait_idle(ModelKey::NanoBanana).await;

        let state = playground.state(ModelKey::NanoBanana);
        assert!(state.job().is_some());
        assert_eq!(state.image_url(), None);
        let notes = playground.drain_notifications();
        assert_eq!(notes[0].level, Level::Warning);
        assert!(playground.view().json.contains("\"text\": \"ok\""));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_keeps_extension_and_notifies_active_only() {
        let backend = Arc::new(ScriptedBackend::new(Ok(job("succeeded", json!("https://cdn/r.webp"))), vec![]));
        let mut playground = playground(&backend, ModelKey::Revise);
        if let FormConfig::Revise(form) = playground.form_mut(ModelKey::Revise) {
            form.prompt = "make it snow".into();
            form.image_url = "https://x/in.png".into();
            form.output_format = "webp".into();
        }
        playground.submit(ModelKey::Revise, None).await.unwrap();
        playground.wait_idle(ModelKey::Revise).await;
        playground.drain_notifications();

        playground.reset_model(ModelKey::Revise, false);
        let state = playground.state(ModelKey::Revise);
        assert_eq!(state.image_url(), None);
        assert_eq!(state.download_extension(), "webp");
        assert_eq!(playground.form(ModelKey::Revise).as_form().prompt(), Some(""));
        assert_eq!(playground.drain_notifications()[0].message, "Inputs reset to defaults.");

        playground.reset_model(ModelKey::Seedream, false);
        playground.reset_model(ModelKey::Revise, true);
        assert!(playground.drain_notifications().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn refine_replaces_prompt() {
        let backend = Arc::new(ScriptedBackend::default());
        *backend.refined.lock().unwrap() = Some("  a vivid lighthouse at dusk ".into());
        let mut playground = playground(&backend, ModelKey::Seedream);

        assert!(playground.refine_prompt(ModelKey::Seedream).await.is_err());
        assert_eq!(playground.drain_notifications()[0].message, REFINE_PROMPT_REQUIRED);

        seedream_prompt(&mut playground, "a lighthouse");
        assert!(playground.refine_prompt(ModelKey::Seedream).await.unwrap());
        assert_eq!(playground.form(ModelKey::Seedream).as_form().prompt(), Some("a vivid lighthouse at dusk"));
        assert_eq!(playground.drain_notifications()[0].message, "Prompt refined.");

        *backend.refined.lock().unwrap() = Some("a vivid lighthouse at dusk".into());
        assert!(!playground.refine_prompt(ModelKey::Seedream).await.unwrap());
        assert_eq!(playground.drain_notifications()[0].message, "Refine service returned no changes.");
    }

    #[tokio::test]
    async fn download_writes_generated_image() {
        let backend = Arc::new(ScriptedBackend::new(Ok(job("succeeded", json!(png_data_uri(6, 4)))), vec![]));
        let mut playground = playground(&backend, ModelKey::NanoBanana);

        let dir = std::env::temp_dir().join("playground_download_test");
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("out.png");
        assert!(matches!(
            playground.download(ModelKey::NanoBanana, Some(&target)).await,
            Err(PlaygroundError::NoImage(ModelKey::NanoBanana))
        ));

        playground.submit(ModelKey::NanoBanana, None).await.unwrap();
        playground.wait_idle(ModelKey::NanoBanana).await;
        let path = playground.download(ModelKey::NanoBanana, Some(&target)).await.unwrap();
        assert_eq!(path, target);
        assert_eq!(image::guess_format(&std::fs::read(&path).unwrap()).unwrap(), image::ImageFormat::Png);
        assert_eq!(backend.poll_count.load(Ordering::SeqCst), 0);
    }
}
