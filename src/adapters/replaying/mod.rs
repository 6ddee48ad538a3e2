//! Replaying adapters that serve recorded interactions from cassettes.

pub mod prediction_backend;

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::cassette::replayer::CassetteReplayer;
use crate::error::PlaygroundError;

/// Retrieve the next recorded output for a given port and method.
///
/// An exhausted cassette surfaces as a config error rather than a panic so
/// the run that hit it fails like any other.
pub(crate) fn next_output(
    replayer: &Arc<Mutex<CassetteReplayer>>,
    port: &str,
    method: &str,
) -> Result<Value, PlaygroundError> {
    let mut guard = replayer.lock().unwrap_or_else(PoisonError::into_inner);
    guard
        .next_interaction(port, method)
        .map(|interaction| interaction.output.clone())
        .map_err(PlaygroundError::Config)
}

/// Deserialize a replayed output as `Result<T, PlaygroundError>`.
pub(crate) fn replay_result<T: serde::de::DeserializeOwned>(output: Value) -> Result<T, PlaygroundError> {
    if let Some(err_val) = output.get("Err").or_else(|| output.get("err")) {
        return Err(replayed_error(err_val));
    }
    if let Some(ok_val) = output.get("Ok").or_else(|| output.get("ok")) {
        return Ok(serde_json::from_value(ok_val.clone())?);
    }
    Ok(serde_json::from_value(output)?)
}

fn replayed_error(value: &Value) -> PlaygroundError {
    if let Some(message) = value.as_str() {
        return PlaygroundError::Api { status: 0, message: message.to_string() };
    }
    let status = value["status"].as_u64().and_then(|s| u16::try_from(s).ok()).unwrap_or(0);
    let message = value["message"].as_str().unwrap_or("replayed error").to_string();
    PlaygroundError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ok_values_deserialize() {
        let value: String = replay_result(json!({"Ok": "refined"})).unwrap();
        assert_eq!(value, "refined");
    }

    #[test]
    fn structured_errors_keep_status() {
        let err = replay_result::<String>(json!({"Err": {"status": 422, "message": "bad input"}})).unwrap_err();
        assert!(matches!(err, PlaygroundError::Api { status: 422, ref message } if message == "bad input"));
    }

    #[test]
    fn string_errors_become_api_errors() {
        let err = replay_result::<String>(json!({"Err": "boom"})).unwrap_err();
        assert!(matches!(err, PlaygroundError::Api { status: 0, ref message } if message == "boom"));
    }
}
