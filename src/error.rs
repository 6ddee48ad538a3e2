//! Unified error type for the playground.

use thiserror::Error;

use crate::model::ModelKey;

/// Errors that can occur while preparing, running, or downloading a prediction.
#[derive(Debug, Error)]
pub enum PlaygroundError {
    /// The prediction proxy returned a non-2xx response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A response body could not be parsed.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// A required form field is missing or invalid. Raised before any network call.
    #[error("{0}")]
    Validation(String),

    /// Image bytes could not be decoded, encoded, or converted.
    #[error("Image error: {0}")]
    ImageDecode(String),

    /// The backend reported the job as failed.
    #[error("{0}")]
    JobFailed(String),

    /// The backend reported the job as canceled.
    #[error("{0}")]
    JobCanceled(String),

    /// Polling gave up before the job reached a terminal status.
    #[error("Prediction timed out after {}.", timeout_span(*.seconds))]
    TimedOut {
        /// The timeout that elapsed, in seconds.
        seconds: u64,
    },

    /// The model already has a prediction in flight.
    #[error("{0} is already running a prediction")]
    Busy(ModelKey),

    /// A model key or alias did not match any known model.
    #[error("Unknown model '{0}'. Expected one of: nano-banana, remove-bg, seedream, revise.")]
    UnknownModel(String),

    /// The model has no image to operate on.
    #[error("{0} has no generated image")]
    NoImage(ModelKey),
}

impl PlaygroundError {
    /// Text suitable for a notification. Backend errors show only the
    /// backend's own message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Whole minutes read as minutes, anything else as seconds.
fn timeout_span(seconds: u64) -> String {
    match (seconds / 60, seconds % 60) {
        (1, 0) => "1 minute".to_string(),
        (minutes, 0) if minutes > 0 => format!("{minutes} minutes"),
        _ if seconds == 1 => "1 second".to_string(),
        _ => format!("{seconds} seconds"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_notify_with_backend_text() {
        let err = PlaygroundError::Api { status: 400, message: "Prompt is required".into() };
        assert_eq!(err.user_message(), "Prompt is required");
        assert_eq!(err.to_string(), "API error (400): Prompt is required");
    }

    #[test]
    fn timeout_message_is_in_minutes() {
        let err = PlaygroundError::TimedOut { seconds: 300 };
        assert_eq!(err.to_string(), "Prediction timed out after 5 minutes.");
    }

    #[test]
    fn short_or_uneven_timeouts_use_seconds() {
        assert_eq!(PlaygroundError::TimedOut { seconds: 5 }.to_string(), "Prediction timed out after 5 seconds.");
        assert_eq!(PlaygroundError::TimedOut { seconds: 90 }.to_string(), "Prediction timed out after 90 seconds.");
        assert_eq!(PlaygroundError::TimedOut { seconds: 60 }.to_string(), "Prediction timed out after 1 minute.");
    }

    #[test]
    fn validation_message_is_verbatim() {
        let err = PlaygroundError::Validation("Please provide a prompt.".into());
        assert_eq!(err.to_string(), "Please provide a prompt.");
    }
}
