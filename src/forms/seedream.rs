//! Seedream form: size presets, custom dimensions, and multi-image output.

use std::path::PathBuf;

use super::{ratio_or_matched, GatherFuture, GatheredPayload, InputImages, ModelForm};
use crate::aspect::Aspect;
use crate::media::{self, ProgressSender};
use crate::model::ModelKey;
use crate::params::{clamp_dimension, clamp_max_images, normalize_seedream_size, MATCH_INPUT_IMAGE};
use crate::ports::prediction_backend::SeedreamRequest;
use crate::ports::GenerationRequest;

/// Fields for Seedream.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedreamForm {
    /// Text prompt.
    pub prompt: String,
    /// `"1K"`, `"2K"`, `"4K"`, or `"custom"`.
    pub size: String,
    /// Custom width, used only with `size = "custom"`.
    pub width: Option<u32>,
    /// Custom height, used only with `size = "custom"`.
    pub height: Option<u32>,
    /// `"disabled"` or `"auto"`.
    pub sequential_image_generation: String,
    /// Upper bound on generated images.
    pub max_images: u32,
    aspect_ratio: String,
    images: InputImages,
}

impl Default for SeedreamForm {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            size: "2K".to_string(),
            width: None,
            height: None,
            sequential_image_generation: "disabled".to_string(),
            max_images: 1,
            aspect_ratio: MATCH_INPUT_IMAGE.to_string(),
            images: InputImages::default(),
        }
    }
}

impl SeedreamForm {
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

    fn is_custom(&self) -> bool {
        normalize_seedream_size(&self.size) == "custom"
    }
}

impl ModelForm for SeedreamForm {
    fn model(&self) -> ModelKey {
        ModelKey::Seedream
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn gather_payload<'a>(&'a self, progress: Option<&'a ProgressSender>) -> GatherFuture<'a> {
        Box::pin(async move {
            let image_input = media::files_to_data_uris(self.images.files(), false, progress).await?;
            let custom = self.is_custom();
            Ok(GatheredPayload {
                request: GenerationRequest::Seedream(SeedreamRequest {
                    prompt: self.prompt.clone(),
                    size: normalize_seedream_size(&self.size).to_string(),
                    aspect_ratio: self.aspect_ratio.clone(),
                    width: self.width.filter(|_| custom).map(clamp_dimension),
                    height: self.height.filter(|_| custom).map(clamp_dimension),
                    sequential_image_generation: self.sequential_image_generation.clone(),
                    max_images: clamp_max_images(self.max_images),
                    image_input,
                }),
                download_extension: ModelKey::Seedream.default_download_extension().to_string(),
            })
        })
    }

    fn preview_aspect(&self) -> Aspect {
        if self.is_custom() {
            if let (Some(width), Some(height)) = (self.width, self.height) {
                return Aspect::from_dimensions(clamp_dimension(width), clamp_dimension(height));
            }
        }
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
