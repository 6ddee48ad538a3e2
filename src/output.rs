//! Download naming, fetching image bytes, and saving with format conversion.

use std::path::{Path, PathBuf};

use reqwest::Client;

use crate::error::PlaygroundError;
use crate::media::decode_data_uri;

/// File stem of every download.
pub const DOWNLOAD_STEM: &str = "generated-image";

/// Download file name for an extension, e.g. `generated-image.png`.
#[must_use]
pub fn download_filename(extension: &str) -> String {
    let extension = extension.trim().trim_start_matches('.');
    let extension = if extension.is_empty() { "png" } else { extension };
    format!("{DOWNLOAD_STEM}.{extension}")
}

/// Resolve the output path: the explicit one, or the download name in the
/// current directory.
#[must_use]
pub fn resolve_output_path(explicit: Option<&Path>, extension: &str) -> PathBuf {
    explicit.map_or_else(|| PathBuf::from(download_filename(extension)), Path::to_path_buf)
}

/// Load the bytes behind a displayable reference together with their MIME type.
///
/// Data URIs are decoded locally; anything else is fetched with `client`.
///
/// # Errors
///
/// Returns an error if the data URI is malformed, the request fails, or the
/// server answers with a non-2xx status.
pub async fn fetch_image_bytes(client: &Client, url: &str) -> Result<(Vec<u8>, String), PlaygroundError> {
    if url.starts_with("data:") {
        let (mime, bytes) = decode_data_uri(url)?;
        return Ok((bytes, mime));
    }

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(PlaygroundError::Api {
            status: status.as_u16(),
            message: "Failed to download image.".to_string(),
        });
    }
    let header_mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).trim().to_string());
    let bytes = response.bytes().await?.to_vec();
    let mime = image::guess_format(&bytes)
        .map(|format| format.to_mime_type().to_string())
        .ok()
        .or(header_mime)
        .unwrap_or_else(|| "application/octet-stream".to_string());
    Ok((bytes, mime))
}

/// Save raw image bytes to a file, converting if the bytes are not already
/// in the format `extension` names.
///
/// # Errors
///
/// Returns an error if the file cannot be written or format conversion fails.
pub fn save_image(
    data: &[u8],
    source_mime: &str,
    extension: &str,
    output_path: &Path,
) -> Result<(), PlaygroundError> {
    if mime_matches_extension(source_mime, extension) {
        std::fs::write(output_path, data)?;
        Ok(())
    } else {
        convert_and_save(data, extension, output_path)
    }
}

/// Check if a MIME type matches the requested file extension.
fn mime_matches_extension(mime: &str, extension: &str) -> bool {
    matches!(
        (mime, extension.to_ascii_lowercase().as_str()),
        ("image/jpeg", "jpg" | "jpeg") | ("image/png", "png") | ("image/webp", "webp")
    )
}

/// Convert image bytes to the target format and save.
fn convert_and_save(data: &[u8], extension: &str, output_path: &Path) -> Result<(), PlaygroundError> {
    let img = image::load_from_memory(data)
        .map_err(|e| PlaygroundError::ImageDecode(format!("Failed to decode image: {e}")))?;

    let (img, image_format) = match extension.to_ascii_lowercase().as_str() {
        // JPEG has no alpha channel.
        "jpg" | "jpeg" => (image::DynamicImage::ImageRgb8(img.to_rgb8()), image::ImageFormat::Jpeg),
        "png" => (img, image::ImageFormat::Png),
        "webp" => (img, image::ImageFormat::WebP),
        other => {
            return Err(PlaygroundError::ImageDecode(format!("Unsupported format: {other}")));
        }
    };

    img.save_with_format(output_path, image_format)
        .map_err(|e| PlaygroundError::ImageDecode(format!("Failed to save as {extension}: {e}")))
}
