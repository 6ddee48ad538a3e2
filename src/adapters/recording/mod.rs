//! Recording adapters that capture interactions to cassettes.

pub mod prediction_backend;

use std::sync::{Arc, Mutex, PoisonError};

use log::warn;
use serde::Serialize;
use serde_json::json;

use crate::cassette::recorder::CassetteRecorder;
use crate::error::PlaygroundError;

/// Record a `Result<T, PlaygroundError>` interaction using the Ok/Err JSON convention.
///
/// Errors keep their HTTP status so a replay can reproduce them.
pub(crate) fn record_result<T, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, PlaygroundError>,
) where
    T: Serialize,
    I: Serialize,
{
    let input_json = match serde_json::to_value(input) {
        Ok(value) => value,
        Err(e) => {
            warn!("Skipping {port}::{method} recording, input not serializable: {e}");
            return;
        }
    };

    let output_json = match result {
        Ok(v) => match serde_json::to_value(v) {
            Ok(inner) => json!({ "Ok": inner }),
            Err(e) => {
                warn!("Skipping {port}::{method} recording, output not serializable: {e}");
                return;
            }
        },
        Err(PlaygroundError::Api { status, message }) => {
            json!({ "Err": { "status": status, "message": message } })
        }
        Err(e) => json!({ "Err": { "status": 0, "message": e.to_string() } }),
    };

    let mut guard = recorder.lock().unwrap_or_else(PoisonError::into_inner);
    guard.record(port, method, input_json, output_json);
}
