//! Allowed option values and clamping for model form fields.

use crate::model::ModelKey;

/// Aspect ratio value that borrows the first input image's dimensions.
pub const MATCH_INPUT_IMAGE: &str = "match_input_image";

/// Inclusive pixel range for Seedream custom dimensions.
pub const DIMENSION_LIMITS: (u32, u32) = (1024, 4096);

/// Inclusive range for Seedream `max_images`.
pub const MAX_IMAGES_LIMITS: (u32, u32) = (1, 15);

const FIXED_RATIOS: [&str; 10] =
    ["1:1", "2:3", "3:2", "3:4", "4:3", "4:5", "5:4", "9:16", "16:9", "21:9"];

/// Validate an aspect ratio value for the given model.
///
/// # Errors
///
/// Returns an error if the ratio is not offered for the model.
pub fn validate_aspect_ratio(ratio: &str, model: ModelKey) -> Result<(), String> {
    let allows_match = !matches!(model, ModelKey::RemoveBackground);
    if FIXED_RATIOS.contains(&ratio) || (allows_match && ratio == MATCH_INPUT_IMAGE) {
        Ok(())
    } else {
        Err(format!("Unsupported aspect ratio '{ratio}' for {model}. Valid: {FIXED_RATIOS:?}"))
    }
}

/// Validate the Nano Banana resolution.
///
/// # Errors
///
/// Returns an error if the resolution is not recognized.
pub fn validate_resolution(resolution: &str) -> Result<(), String> {
    match resolution {
        "1K" | "2K" | "4K" => Ok(()),
        _ => Err(format!("Unsupported resolution '{resolution}'. Valid: 1K, 2K, 4K")),
    }
}

/// Normalize a Seedream size preset. Unknown values fall back to `2K`.
#[must_use]
pub fn normalize_seedream_size(size: &str) -> &'static str {
    let trimmed = size.trim();
    if trimmed.eq_ignore_ascii_case("custom") {
        return "custom";
    }
    match trimmed.to_ascii_uppercase().as_str() {
        "1K" => "1K",
        "4K" => "4K",
        _ => "2K",
    }
}

/// Validate the output format parameter.
///
/// # Errors
///
/// Returns an error if the format is not recognized.
pub fn validate_output_format(format: &str) -> Result<(), String> {
    match format {
        "png" | "jpg" | "jpeg" | "webp" => Ok(()),
        _ => Err(format!("Unsupported output format '{format}'. Valid: png, jpg, webp")),
    }
}

/// Validate the Nano Banana safety filter level.
///
/// # Errors
///
/// Returns an error if the level is not recognized.
pub fn validate_safety_filter_level(level: &str) -> Result<(), String> {
    match level {
        "block_low_and_above" | "block_medium_and_above" | "block_only_high" => Ok(()),
        _ => Err(format!(
            "Unsupported safety filter level '{level}'. \
             Valid: block_low_and_above, block_medium_and_above, block_only_high"
        )),
    }
}

/// Clamp a Seedream custom dimension into the supported range.
#[must_use]
pub fn clamp_dimension(value: u32) -> u32 {
    value.clamp(DIMENSION_LIMITS.0, DIMENSION_LIMITS.1)
}

/// Clamp Seedream `max_images` into the supported range.
#[must_use]
pub fn clamp_max_images(value: u32) -> u32 {
    value.clamp(MAX_IMAGES_LIMITS.0, MAX_IMAGES_LIMITS.1)
}

/// Get the file extension for an output format.
#[must_use]
pub fn format_extension(format: &str) -> &'static str {
    match format {
        "png" => "png",
        "webp" => "webp",
        // jpeg and any unknown format default to jpg
        _ => "jpg",
    }
}
