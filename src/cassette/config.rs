//! Cassette configuration for loading and replaying.

use std::path::{Path, PathBuf};

use super::format::Cassette;
use super::replayer::CassetteReplayer;

/// Environment variable that turns recording on (`1` or `true`).
pub const RECORD_ENV: &str = "PLAYGROUND_REC";

/// Environment variable naming a cassette to replay.
pub const REPLAY_ENV: &str = "PLAYGROUND_REPLAY";

/// Directory new recordings are written under.
pub const CASSETTE_ROOT: &str = ".playground/cassettes";

/// Load a cassette file and create a replayer.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_cassette(path: &Path) -> Result<CassetteReplayer, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
    let cassette: Cassette = serde_yaml::from_str(&content)
        .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;
    Ok(CassetteReplayer::new(&cassette))
}

/// Path for a new recording of `port` made at `timestamp`.
#[must_use]
pub fn recording_path(timestamp: &str, port: &str) -> PathBuf {
    PathBuf::from(CASSETTE_ROOT).join(timestamp).join(format!("{port}.cassette.yaml"))
}

/// Whether a `PLAYGROUND_REC` value enables recording.
#[must_use]
pub fn is_recording_enabled(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true"))
}
