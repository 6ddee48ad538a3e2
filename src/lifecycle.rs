//! Prediction lifecycle: submit, poll until terminal, resolve the image.
//!
//! Each submission runs as its own task. The task never touches
//! [`ModelState`](crate::state::ModelState); it reports [`RunEvent`]s on a
//! channel and the owner of the registry applies them. A guard sends
//! [`RunEvent::Settled`] on every exit path, including abort and panic, so a
//! model can never stay stuck in a loading phase.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::error::PlaygroundError;
use crate::model::ModelKey;
use crate::normalize;
use crate::ports::{GenerationRequest, ImageProbe, Job, JobStatus, PredictionBackend};
use crate::state::{DisplayImage, Phase};

/// Message used when a job fails without saying why.
pub const GENERIC_FAILURE: &str = "Prediction failed or was canceled.";

/// Polling cadence and give-up threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between consecutive status requests.
    pub interval: Duration,
    /// Wall-clock budget measured from submission.
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self { interval: Duration::from_millis(1500), timeout: Duration::from_secs(300) }
    }
}

/// What became of the image of a succeeded job.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageResult {
    /// Found and decoded.
    Ready(DisplayImage),
    /// The output held nothing that looks like an image.
    Missing,
    /// A reference was found but could not be decoded.
    Undecodable(String),
}

/// How a run ended.
#[derive(Debug)]
pub enum Outcome {
    /// The backend reported success.
    Succeeded {
        /// The terminal job, kept for inspection.
        job: Job,
        /// Seconds since submission, rounded to two decimals.
        elapsed_seconds: f64,
        /// Extraction and probe result.
        image: ImageResult,
    },
    /// Transport failure, backend failure, cancellation, or timeout.
    Failed(PlaygroundError),
}

/// Progress reported by a run to the registry owner.
#[derive(Debug)]
pub enum RunEvent {
    /// The run moved to a new phase.
    Phase {
        /// Model the run belongs to.
        model: ModelKey,
        /// New phase.
        phase: Phase,
    },
    /// The run reached a terminal outcome.
    Finished {
        /// Model the run belongs to.
        model: ModelKey,
        /// The outcome.
        outcome: Outcome,
    },
    /// The run is over. Always the last event of a run.
    Settled {
        /// Model the run belongs to.
        model: ModelKey,
    },
}

impl RunEvent {
    /// The model this event belongs to.
    #[must_use]
    pub fn model(&self) -> ModelKey {
        match self {
            Self::Phase { model, .. } | Self::Finished { model, .. } | Self::Settled { model } => *model,
        }
    }
}

/// Everything one submission needs, moved into its task.
pub struct PredictionRun {
    /// Backend to create and poll the job on.
    pub backend: Arc<dyn PredictionBackend>,
    /// Probe used to decode the resulting image.
    pub probe: Arc<dyn ImageProbe>,
    /// Model being run.
    pub model: ModelKey,
    /// Validated request.
    pub request: GenerationRequest,
    /// Extension used when raw base64 output needs a MIME subtype.
    pub download_extension: String,
    /// Polling cadence.
    pub policy: PollPolicy,
    /// Where events go.
    pub events: UnboundedSender<RunEvent>,
}

struct SettleGuard {
    model: ModelKey,
    events: UnboundedSender<RunEvent>,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        let _ = self.events.send(RunEvent::Settled { model: self.model });
    }
}

impl PredictionRun {
    /// Run on the current tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Drive the job to a terminal outcome and report it.
    pub async fn run(self) {
        let _settle = SettleGuard { model: self.model, events: self.events.clone() };
        let started = Instant::now();

        let outcome = match self.drive(started).await {
            Ok(job) => {
                let elapsed_seconds = round_seconds(started.elapsed());
                info!("{} succeeded in {elapsed_seconds}s", self.model);
                let image = self.resolve_image(&job).await;
                Outcome::Succeeded { job, elapsed_seconds, image }
            }
            Err(e) => {
                warn!("{} failed: {e}", self.model);
                Outcome::Failed(e)
            }
        };

        let _ = self.events.send(RunEvent::Finished { model: self.model, outcome });
    }

    async fn drive(&self, started: Instant) -> Result<Job, PlaygroundError> {
        let deadline = started + self.policy.timeout;
        let timed_out = || PlaygroundError::TimedOut { seconds: self.policy.timeout.as_secs() };

        let mut job = time::timeout_at(deadline, self.backend.create_job(&self.request))
            .await
            .map_err(|_| timed_out())??;
        info!("{} created job {} ({:?})", self.model, job.id, job.status);

        if !job.status.is_terminal() {
            let _ = self.events.send(RunEvent::Phase { model: self.model, phase: Phase::Polling });
        }

        loop {
            match job.status {
                JobStatus::Succeeded => return Ok(job),
                JobStatus::Failed => return Err(PlaygroundError::JobFailed(failure_text(&job))),
                JobStatus::Canceled => return Err(PlaygroundError::JobCanceled(failure_text(&job))),
                JobStatus::Starting | JobStatus::Processing | JobStatus::Unknown => {}
            }

            if started.elapsed() >= self.policy.timeout {
                warn!("{} gave up on job {} after {:?}", self.model, job.id, self.policy.timeout);
                return Err(timed_out());
            }

            time::sleep(self.policy.interval).await;
            job = time::timeout_at(deadline, self.backend.get_job(&job.id))
                .await
                .map_err(|_| timed_out())??;
            debug!("{} job {} is {:?}", self.model, job.id, job.status);
        }
    }

    async fn resolve_image(&self, job: &Job) -> ImageResult {
        let Some(url) = normalize::extract_image_url(job, &self.download_extension) else {
            warn!("{} job {} returned no image", self.model, job.id);
            return ImageResult::Missing;
        };
        match self.probe.probe(&url).await {
            Ok(dimensions) => ImageResult::Ready(DisplayImage { url, aspect: dimensions.aspect() }),
            Err(e) => {
                warn!("{} image could not be decoded: {e}", self.model);
                ImageResult::Undecodable(e.to_string())
            }
        }
    }
}

fn failure_text(job: &Job) -> String {
    job.error_message().unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

fn round_seconds(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}
