//! Service context that bundles all port trait objects.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Client;

use crate::adapters::live::{HttpImageProbe, HttpPredictionBackend};
use crate::adapters::recording::prediction_backend::{RecordingPredictionBackend, PORT};
use crate::adapters::replaying::prediction_backend::ReplayingPredictionBackend;
use crate::cassette::config::{load_cassette, recording_path};
use crate::cassette::recorder::CassetteRecorder;
use crate::config::Config;
use crate::error::PlaygroundError;
use crate::ports::{ImageProbe, PredictionBackend};

/// Bundles all port trait objects into a single context.
#[derive(Clone)]
pub struct ServiceContext {
    /// Prediction backend port.
    pub backend: Arc<dyn PredictionBackend>,
    /// Image probe port.
    pub probe: Arc<dyn ImageProbe>,
    /// Client used for downloads.
    pub http: Client,
}

/// Handle to a recording session that must be finished after use.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Finish the recording and write cassette files to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let mut recorder = self.recorder.lock().unwrap_or_else(PoisonError::into_inner);
        recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))
    }
}

impl ServiceContext {
    /// Create a live context talking to the configured proxy.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn live(config: &Config) -> Result<Self, PlaygroundError> {
        let http = http_client(config)?;
        let backend = HttpPredictionBackend::new(http.clone(), config.backend_url());
        Ok(Self { backend: Arc::new(backend), probe: Arc::new(HttpImageProbe::new(http.clone())), http })
    }

    /// Create a recording context that wraps the live backend with a recorder.
    ///
    /// # Errors
    ///
    /// Returns an error if the live context cannot be built.
    pub fn recording(config: &Config) -> Result<(Self, RecordingSession), PlaygroundError> {
        let live = Self::live(config)?;

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(
            recording_path(&timestamp, PORT),
            format!("{timestamp}-{PORT}"),
            get_commit_hash(),
        )));

        let backend = RecordingPredictionBackend::new(live.backend, Arc::clone(&recorder));
        let ctx = Self { backend: Arc::new(backend), ..live };
        Ok((ctx, RecordingSession { recorder }))
    }

    /// Create a replaying context from a cassette file.
    ///
    /// Images are still probed for real: data URIs decode offline.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be loaded.
    pub fn replaying(path: &Path, config: &Config) -> Result<Self, PlaygroundError> {
        let replayer = load_cassette(path)
            .map_err(|e| PlaygroundError::Config(format!("Failed to load cassette: {e}")))?;
        let http = http_client(config)?;
        Ok(Self {
            backend: Arc::new(ReplayingPredictionBackend::new(Arc::new(Mutex::new(replayer)))),
            probe: Arc::new(HttpImageProbe::new(http.clone())),
            http,
        })
    }
}

fn http_client(config: &Config) -> Result<Client, PlaygroundError> {
    Ok(Client::builder().timeout(config.request_timeout()).build()?)
}

/// Get the current git commit hash, or "unknown" if unavailable.
fn get_commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}
