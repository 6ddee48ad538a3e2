//! Accumulates backend interactions and flushes them to a YAML cassette.

use std::io;
use std::path::PathBuf;

use chrono::Utc;
use serde_json::Value;

use super::format::{Cassette, Interaction};

/// Tape of interactions for one recording session.
///
/// Sequence numbers count from zero in call order and restart after every
/// [`CassetteRecorder::finish`].
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    commit: String,
    tape: Vec<Interaction>,
}

impl CassetteRecorder {
    /// A recorder that writes to `path` when finished.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, commit: impl Into<String>) -> Self {
        Self { path: path.into(), name: name.into(), commit: commit.into(), tape: Vec::new() }
    }

    /// Append one call and its result.
    pub fn record(&mut self, port: &str, method: &str, input: Value, output: Value) {
        let seq = self.tape.len() as u64;
        self.tape.push(Interaction { seq, port: port.to_string(), method: method.to_string(), input, output });
    }

    /// Interactions recorded since the last flush.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tape.len()
    }

    /// Whether nothing has been recorded since the last flush.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tape.is_empty()
    }

    /// Write the tape to disk and empty it. Runs still holding the shared
    /// recorder keep appending to a fresh tape.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be produced or written.
    pub fn finish(&mut self) -> io::Result<PathBuf> {
        let cassette = Cassette {
            name: self.name.clone(),
            recorded_at: Utc::now(),
            commit: self.commit.clone(),
            interactions: std::mem::take(&mut self.tape),
        };
        let yaml = serde_yaml::to_string(&cassette).map_err(io::Error::other)?;
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, yaml)?;
        Ok(self.path.clone())
    }
}
