//! On-disk cassette shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A recorded session of port interactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cassette {
    /// Human-readable session name.
    pub name: String,
    /// When the recording finished.
    pub recorded_at: DateTime<Utc>,
    /// Git commit the recording was made at.
    #[serde(default)]
    pub commit: String,
    /// Interactions in call order.
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

/// One call through a port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    /// Position in the recording.
    pub seq: u64,
    /// Port name, e.g. `prediction_backend`.
    pub port: String,
    /// Method name, e.g. `create_job`.
    pub method: String,
    /// Serialized arguments.
    pub input: Value,
    /// `{"Ok": ...}` or `{"Err": ...}`.
    pub output: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hand_written_yaml() {
        let yaml = r#"
name: demo
recorded_at: 2025-01-01T00:00:00Z
interactions:
  - seq: 0
    port: prediction_backend
    method: create_job
    input: {model_key: seedream}
    output:
      Ok: {id: p1, status: processing}
"#;
        let cassette: Cassette = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cassette.commit, "");
        assert_eq!(cassette.interactions.len(), 1);
        assert_eq!(cassette.interactions[0].output["Ok"]["id"], "p1");
    }
}
