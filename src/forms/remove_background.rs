//! Background removal form.

use std::path::PathBuf;

use super::{GatherFuture, GatheredPayload, ModelForm};
use crate::aspect::{Aspect, DEFAULT_ASPECT};
use crate::media::{self, ProgressSender};
use crate::model::ModelKey;
use crate::ports::prediction_backend::RemoveBackgroundRequest;
use crate::ports::GenerationRequest;

/// Fields for background removal. An uploaded file wins over `image_url`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveBackgroundForm {
    /// Remote image to process when no file is selected.
    pub image_url: String,
    /// Enable provider content moderation.
    pub content_moderation: bool,
    /// Keep semi-transparent edge pixels.
    pub preserve_partial_alpha: bool,
    files: Vec<PathBuf>,
}

impl Default for RemoveBackgroundForm {
    fn default() -> Self {
        Self {
            image_url: String::new(),
            content_moderation: false,
            preserve_partial_alpha: true,
            files: Vec::new(),
        }
    }
}

impl RemoveBackgroundForm {
    /// Selected files. Only the first is uploaded.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Replace the file selection.
    pub fn select_files(&mut self, files: impl IntoIterator<Item = PathBuf>) {
        self.files = files.into_iter().collect();
    }
}

impl ModelForm for RemoveBackgroundForm {
    fn model(&self) -> ModelKey {
        ModelKey::RemoveBackground
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn gather_payload<'a>(&'a self, progress: Option<&'a ProgressSender>) -> GatherFuture<'a> {
        Box::pin(async move {
            // Cutouts need the original pixels, so uploads are never recompressed.
            let encoded = media::files_to_data_uris(&self.files, true, progress).await?;
            let image = encoded.into_iter().next();
            let url = self.image_url.trim();
            let image_url = (image.is_none() && !url.is_empty()).then(|| url.to_string());
            Ok(GatheredPayload {
                request: GenerationRequest::RemoveBackground(RemoveBackgroundRequest {
                    image,
                    image_url,
                    content_moderation: self.content_moderation,
                    preserve_partial_alpha: self.preserve_partial_alpha,
                }),
                download_extension: "png".to_string(),
            })
        })
    }

    fn preview_aspect(&self) -> Aspect {
        DEFAULT_ASPECT
    }
}
