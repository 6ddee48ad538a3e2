//! Revise form: edit an existing image with an instruction.

use std::path::PathBuf;

use super::{ratio_or_matched, GatherFuture, GatheredPayload, InputImages, ModelForm};
use crate::aspect::Aspect;
use crate::media::{self, ProgressSender};
use crate::model::ModelKey;
use crate::params::MATCH_INPUT_IMAGE;
use crate::ports::prediction_backend::ReviseRequest;
use crate::ports::GenerationRequest;

const DEFAULT_OUTPUT_FORMAT: &str = "png";

/// Fields for Revise. The first selected file wins over `image_url`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviseForm {
    /// Edit instruction.
    pub prompt: String,
    /// Remote image to edit when no file is selected.
    pub image_url: String,
    /// Requested output format; also the download extension.
    pub output_format: String,
    aspect_ratio: String,
    images: InputImages,
}

impl Default for ReviseForm {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            image_url: String::new(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            aspect_ratio: MATCH_INPUT_IMAGE.to_string(),
            images: InputImages::default(),
        }
    }
}

impl ReviseForm {
    /// Current aspect ratio selection.
    #[must_use]
    pub fn aspect_ratio(&self) -> &str {
        &self.aspect_ratio
    }

    /// The image selected for editing.
    #[must_use]
    pub fn images(&self) -> &InputImages {
        &self.images
    }

    /// Change the aspect ratio, resolving the input image's aspect if needed.
    pub async fn set_aspect_ratio(&mut self, aspect_ratio: impl Into<String>) {
        self.aspect_ratio = aspect_ratio.into();
        self.images.refresh(&self.aspect_ratio).await;
    }

    /// Replace the selected image. Only one is uploaded.
    pub async fn select_file(&mut self, file: PathBuf) {
        self.images.clear();
        self.images.add([file]);
        self.images.refresh(&self.aspect_ratio).await;
    }

    /// Drop the selected image.
    pub fn clear_file(&mut self) {
        self.images.clear();
    }
}

impl ModelForm for ReviseForm {
    fn model(&self) -> ModelKey {
        ModelKey::Revise
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn gather_payload<'a>(&'a self, progress: Option<&'a ProgressSender>) -> GatherFuture<'a> {
        Box::pin(async move {
            let first = &self.images.files()[..self.images.files().len().min(1)];
            let uploaded = media::files_to_data_uris(first, false, progress).await?;
            let input_image = uploaded
                .into_iter()
                .next()
                .unwrap_or_else(|| self.image_url.trim().to_string());
            let output_format = if self.output_format.trim().is_empty() {
                DEFAULT_OUTPUT_FORMAT.to_string()
            } else {
                self.output_format.clone()
            };
            Ok(GatheredPayload {
                request: GenerationRequest::Revise(ReviseRequest {
                    prompt: self.prompt.clone(),
                    input_image,
                    aspect_ratio: self.aspect_ratio.clone(),
                    output_format: output_format.clone(),
                }),
                download_extension: output_format,
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
