//! Turning local files into embeddable data URIs, and reading image dimensions.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use log::{debug, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::PlaygroundError;
use crate::ports::ImageDimensions;

/// Files larger than this are recompressed before upload.
pub const COMPRESSION_THRESHOLD_BYTES: usize = 2 * 1024 * 1024;

/// Longest edge, in pixels, of a recompressed upload.
pub const MAX_COMPRESSED_EDGE: u32 = 1920;

/// Progress of a payload gather step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatherProgress {
    /// A large file is being recompressed.
    Compressing {
        /// File name being compressed.
        file: String,
    },
    /// A file has been encoded.
    Processed {
        /// Files finished so far.
        count: usize,
        /// Files in this batch.
        total: usize,
    },
}

/// Channel on which gather progress is reported.
pub type ProgressSender = UnboundedSender<GatherProgress>;

/// Read files and encode each as a `data:` URI, in order.
///
/// Files over [`COMPRESSION_THRESHOLD_BYTES`] are downscaled and re-encoded
/// unless `skip_compression` is set. A failed compression falls back to the
/// original bytes.
///
/// # Errors
///
/// Returns an error if a file cannot be read.
pub async fn files_to_data_uris(
    files: &[PathBuf],
    skip_compression: bool,
    progress: Option<&ProgressSender>,
) -> Result<Vec<String>, PlaygroundError> {
    let total = files.len();
    let mut encoded = Vec::with_capacity(total);

    for (index, path) in files.iter().enumerate() {
        let bytes = tokio::fs::read(path).await?;
        let mut mime = sniff_mime(&bytes, path);
        let mut data = bytes;

        if !skip_compression && data.len() > COMPRESSION_THRESHOLD_BYTES {
            report(progress, GatherProgress::Compressing { file: file_name(path) });
            let original = data.clone();
            match tokio::task::spawn_blocking(move || compress(&original)).await {
                Ok(Ok((compressed, compressed_mime))) => {
                    debug!(
                        "Compressed {} from {} to {}",
                        path.display(),
                        human_file_size(data.len()),
                        human_file_size(compressed.len())
                    );
                    data = compressed;
                    mime = compressed_mime;
                }
                Ok(Err(e)) => warn!("Compression of {} failed, sending original: {e}", path.display()),
                Err(e) => warn!("Compression task for {} failed, sending original: {e}", path.display()),
            }
        }

        let payload = base64::engine::general_purpose::STANDARD.encode(&data);
        encoded.push(format!("data:{mime};base64,{payload}"));
        report(progress, GatherProgress::Processed { count: index + 1, total });
    }

    Ok(encoded)
}

fn report(progress: Option<&ProgressSender>, event: GatherProgress) {
    if let Some(tx) = progress {
        // The receiver going away only means nobody is watching.
        let _ = tx.send(event);
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Downscale to fit [`MAX_COMPRESSED_EDGE`] and re-encode.
///
/// Images with alpha stay PNG; everything else becomes JPEG.
fn compress(bytes: &[u8]) -> Result<(Vec<u8>, &'static str), PlaygroundError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| PlaygroundError::ImageDecode(format!("Failed to decode image: {e}")))?;

    let resized = if decoded.width() > MAX_COMPRESSED_EDGE || decoded.height() > MAX_COMPRESSED_EDGE {
        decoded.resize(MAX_COMPRESSED_EDGE, MAX_COMPRESSED_EDGE, FilterType::Triangle)
    } else {
        decoded
    };

    let (target, format, mime) = if resized.color().has_alpha() {
        (resized, ImageFormat::Png, "image/png")
    } else {
        (DynamicImage::ImageRgb8(resized.to_rgb8()), ImageFormat::Jpeg, "image/jpeg")
    };

    let mut buf = Cursor::new(Vec::new());
    target
        .write_to(&mut buf, format)
        .map_err(|e| PlaygroundError::ImageDecode(format!("Failed to encode image: {e}")))?;
    Ok((buf.into_inner(), mime))
}

/// Best-effort MIME type from content, then from the file extension.
fn sniff_mime(bytes: &[u8], path: &Path) -> &'static str {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type();
    }
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Split a `data:` URI into its MIME type and decoded bytes.
///
/// # Errors
///
/// Returns an error if the URI is not a base64 data URI.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>), PlaygroundError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| PlaygroundError::ImageDecode("Not a data URI".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| PlaygroundError::ImageDecode("Data URI has no payload".into()))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| PlaygroundError::ImageDecode("Data URI is not base64 encoded".into()))?;
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| PlaygroundError::ImageDecode(format!("Failed to decode base64: {e}")))?;
    Ok((mime.to_string(), bytes))
}

/// Read pixel dimensions from encoded image bytes without a full decode.
///
/// # Errors
///
/// Returns an error if the format is unknown or the header is corrupt.
pub fn dimensions_from_bytes(bytes: &[u8]) -> Result<ImageDimensions, PlaygroundError> {
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PlaygroundError::ImageDecode(format!("Failed to read image: {e}")))?
        .into_dimensions()
        .map_err(|e| PlaygroundError::ImageDecode(format!("Failed to decode image: {e}")))?;
    if width == 0 || height == 0 {
        return Err(PlaygroundError::ImageDecode("Image has zero size".into()));
    }
    Ok(ImageDimensions { width, height })
}

/// Read pixel dimensions of a local image file off the async runtime.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub async fn file_dimensions(path: &Path) -> Result<ImageDimensions, PlaygroundError> {
    let bytes = tokio::fs::read(path).await?;
    tokio::task::spawn_blocking(move || dimensions_from_bytes(&bytes))
        .await
        .map_err(|e| PlaygroundError::ImageDecode(format!("Dimension probe failed: {e}")))?
}

/// Format a byte count as `"512 B"`, `"1.5 MB"`, and so on.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn human_file_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if size >= 10.0 || unit == 0 {
        format!("{size:.0} {}", UNITS[unit])
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
