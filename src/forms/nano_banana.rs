//! Nano Banana text-to-image form.

use std::path::PathBuf;

use super::{ratio_or_matched, GatherFuture, GatheredPayload, InputImages, ModelForm};
use crate::aspect::Aspect;
use crate::media::{self, ProgressSender};
use crate::model::ModelKey;
use crate::ports::prediction_backend::NanoBananaRequest;
use crate::ports::GenerationRequest;

const DEFAULT_PROMPT: &str = "How engineers see the San Francisco Bridge";
const DEFAULT_ASPECT_RATIO: &str = "4:3";
const DEFAULT_RESOLUTION: &str = "2K";
const DEFAULT_OUTPUT_FORMAT: &str = "png";
const DEFAULT_SAFETY_FILTER_LEVEL: &str = "block_only_high";

/// Fields for Nano Banana.
#[derive(Debug, Clone, PartialEq)]
pub struct NanoBananaForm {
    /// Text prompt.
    pub prompt: String,
    /// `"1K"`, `"2K"`, or `"4K"`.
    pub resolution: String,
    /// Requested output format; also the download extension.
    pub output_format: String,
    /// Provider safety filter level.
    pub safety_filter_level: String,
    aspect_ratio: String,
    images: InputImages,
}

impl Default for NanoBananaForm {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            resolution: DEFAULT_RESOLUTION.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            safety_filter_level: DEFAULT_SAFETY_FILTER_LEVEL.to_string(),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            images: InputImages::default(),
        }
    }
}

impl NanoBananaForm {
    /// Current aspect ratio selection.
    #[must_use]
    pub fn aspect_ratio(&self) -> &str {
        &self.aspect_ratio
    }

    /// Reference images selected for upload.
    #[must_use]
    pub fn images(&self) -> &InputImages {
        &self.images
    }

    /// Change the aspect ratio, resolving the input image's aspect if needed.
    pub async fn set_aspect_ratio(&mut self, aspect_ratio: impl Into<String>) {
        self.aspect_ratio = aspect_ratio.into();
        self.images.refresh(&self.aspect_ratio).await;
    }

    /// Append reference images.
    pub async fn add_files(&mut self, files: impl IntoIterator<Item = PathBuf>) {
        self.images.add(files);
        self.images.refresh(&self.aspect_ratio).await;
    }

    /// Remove one reference image by position.
    pub async fn remove_file(&mut self, index: usize) -> Option<PathBuf> {
        let removed = self.images.remove(index);
        self.images.refresh(&self.aspect_ratio).await;
        removed
    }
}

impl ModelForm for NanoBananaForm {
    fn model(&self) -> ModelKey {
        ModelKey::NanoBanana
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn gather_payload<'a>(&'a self, progress: Option<&'a ProgressSender>) -> GatherFuture<'a> {
        Box::pin(async move {
            let image_input = media::files_to_data_uris(self.images.files(), false, progress).await?;
            let download_extension = if self.output_format.trim().is_empty() {
                DEFAULT_OUTPUT_FORMAT.to_string()
            } else {
                self.output_format.clone()
            };
            Ok(GatheredPayload {
                request: GenerationRequest::NanoBanana(NanoBananaRequest {
                    prompt: self.prompt.clone(),
                    aspect_ratio: self.aspect_ratio.clone(),
                    resolution: self.resolution.clone(),
                    output_format: self.output_format.clone(),
                    safety_filter_level: self.safety_filter_level.clone(),
                    image_input,
                }),
                download_extension,
            })
        })
    }

    fn preview_aspect(&self) -> Aspect {
        ratio_or_matched(&self.aspect_ratio, &self.images)
    }

    fn prompt(&self) -> Option<&str> {
        Some(&self.prompt)
    }

    fn set_prompt(&mut self, prompt: String) -> bool {
        self.prompt = prompt;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::tests::temp_png;
    use crate::params::MATCH_INPUT_IMAGE;

    #[tokio::test]
    async fn gathers_defaults() {
        let form = NanoBananaForm::default();
        let gathered = form.gather_payload(None).await.unwrap();
        assert_eq!(gathered.download_extension, "png");
        let GenerationRequest::NanoBanana(request) = gathered.request else {
            panic!("wrong variant");
        };
        assert_eq!(request.prompt, DEFAULT_PROMPT);
        assert_eq!(request.aspect_ratio, "4:3");
        assert_eq!(request.resolution, "2K");
        assert!(request.image_input.is_empty());
    }

    #[tokio::test]
    async fn output_format_drives_download_extension() {
        let mut form = NanoBananaForm::default();
        form.output_format = "jpg".into();
        assert_eq!(form.gather_payload(None).await.unwrap().download_extension, "jpg");
    }

    #[tokio::test]
    async fn files_become_image_input() {
        let mut form = NanoBananaForm::default();
        form.add_files([temp_png("nano_input.png", 8, 8)]).await;
        let GenerationRequest::NanoBanana(request) = form.gather_payload(None).await.unwrap().request else {
            panic!("wrong variant");
        };
        assert_eq!(request.image_input.len(), 1);
        assert!(request.image_input[0].starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn preview_aspect_tracks_selection() {
        let mut form = NanoBananaForm::default();
        assert_eq!(form.preview_aspect(), Aspect { width: 4, height: 3 });

        form.add_files([temp_png("nano_match.png", 20, 40)]).await;
        form.set_aspect_ratio(MATCH_INPUT_IMAGE).await;
        assert_eq!(form.preview_aspect(), Aspect { width: 1, height: 2 });

        form.remove_file(0).await;
        assert_eq!(form.preview_aspect(), Aspect { width: 16, height: 9 });
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let mut form = NanoBananaForm::default();
        form.prompt = "something else".into();
        form.add_files([temp_png("nano_reset.png", 2, 2)]).await;
        form.reset();
        assert_eq!(form, NanoBananaForm::default());
    }
}
