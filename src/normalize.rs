//! Locates one displayable image reference in an arbitrarily shaped job output.
//!
//! Providers return a bare string, a list of strings or objects, or a single
//! object. The first match wins, scanning depth-first in document order.
//! Nothing here fails: "no image" is `None`.

use serde_json::{Map, Value};

use crate::ports::Job;

/// Object fields that may hold an image reference, in priority order.
const IMAGE_FIELDS: [&str; 4] = ["image", "url", "uri", "path"];

/// Bare strings at or below this length are treated as text, not base64 data.
pub const MIN_BASE64_LEN: usize = 100;

/// Extract an image reference from a job, falling back to a top-level `images` field.
///
/// `extension` is the model's preferred download extension, used as the MIME
/// subtype when raw base64 has to be wrapped in a data URI.
#[must_use]
pub fn extract_image_url(job: &Job, extension: &str) -> Option<String> {
    let output = if job.output.is_null() {
        job.extra.get("images").unwrap_or(&Value::Null)
    } else {
        &job.output
    };
    extract_from_output(output, extension)
}

/// Extract an image reference from a raw `output` value.
#[must_use]
pub fn extract_from_output(output: &Value, extension: &str) -> Option<String> {
    match output {
        Value::String(raw) => classify(raw, extension),
        Value::Array(items) => items.iter().find_map(|item| match item {
            Value::String(raw) => classify(raw, extension),
            Value::Object(fields) => from_fields(fields, extension),
            _ => None,
        }),
        Value::Object(fields) => from_fields(fields, extension),
        _ => None,
    }
}

fn from_fields(fields: &Map<String, Value>, extension: &str) -> Option<String> {
    IMAGE_FIELDS
        .iter()
        .filter_map(|name| fields.get(*name).and_then(Value::as_str))
        .find_map(|raw| classify(raw, extension))
}

/// Classify one candidate string.
///
/// URLs and data URIs pass through verbatim. Long base64-looking strings are
/// wrapped in a data URI with whitespace removed. Anything else is rejected.
#[must_use]
pub fn classify(raw: &str, extension: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if ["http://", "https://", "data:"].iter().any(|prefix| trimmed.starts_with(prefix)) {
        return Some(trimmed.to_string());
    }

    if trimmed.len() > MIN_BASE64_LEN && looks_like_base64(trimmed) {
        let data: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
        return Some(format!("data:image/{};base64,{data}", mime_subtype(extension)));
    }

    None
}

fn looks_like_base64(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=') || c.is_whitespace())
}

fn mime_subtype(extension: &str) -> String {
    let cleaned: String = extension.chars().filter(char::is_ascii_alphanumeric).collect();
    if cleaned.is_empty() {
        "jpeg".to_string()
    } else {
        cleaned
    }
}
