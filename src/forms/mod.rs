//! Per-model input forms.
//!
//! Every variant exposes the same capabilities through [`ModelForm`]:
//! restore defaults, gather a normalized request, and guess the preview
//! aspect before any job exists. [`FormConfig`] holds one of the four
//! variants so callers can reach variant-specific fields by matching.

mod nano_banana;
mod remove_background;
mod revise;
mod seedream;

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use log::debug;

pub use nano_banana::NanoBananaForm;
pub use remove_background::RemoveBackgroundForm;
pub use revise::ReviseForm;
pub use seedream::SeedreamForm;

use crate::aspect::{Aspect, DEFAULT_ASPECT};
use crate::error::PlaygroundError;
use crate::media::{self, ProgressSender};
use crate::model::ModelKey;
use crate::params::MATCH_INPUT_IMAGE;
use crate::ports::GenerationRequest;

/// A request ready to submit plus the extension its image should download as.
#[derive(Debug, Clone, PartialEq)]
pub struct GatheredPayload {
    /// The normalized request.
    pub request: GenerationRequest,
    /// Preferred download extension, without a leading dot.
    pub download_extension: String,
}

/// Boxed future returned by [`ModelForm::gather_payload`].
pub type GatherFuture<'a> =
    Pin<Box<dyn Future<Output = Result<GatheredPayload, PlaygroundError>> + Send + 'a>>;

/// Capabilities shared by every model form.
pub trait ModelForm: Send + Sync {
    /// The model this form configures.
    fn model(&self) -> ModelKey;

    /// Restore default field values and clear selected files.
    fn reset(&mut self);

    /// Collect fields into a request, encoding selected files as data URIs.
    fn gather_payload<'a>(&'a self, progress: Option<&'a ProgressSender>) -> GatherFuture<'a>;

    /// Best-effort guess of the eventual image's aspect from current fields.
    fn preview_aspect(&self) -> Aspect;

    /// The prompt field, for forms that have one.
    fn prompt(&self) -> Option<&str> {
        None
    }

    /// Replace the prompt. Returns `false` for forms without a prompt.
    fn set_prompt(&mut self, _prompt: String) -> bool {
        false
    }
}

/// Files selected for upload, plus the aspect of the first one when the
/// form asks to match the input image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputImages {
    files: Vec<PathBuf>,
    matched_aspect: Option<Aspect>,
}

impl InputImages {
    /// Selected files, in upload order.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Aspect of the first file, when resolved.
    #[must_use]
    pub fn matched_aspect(&self) -> Option<Aspect> {
        self.matched_aspect
    }

    fn add(&mut self, files: impl IntoIterator<Item = PathBuf>) {
        self.files.extend(files);
    }

    fn remove(&mut self, index: usize) -> Option<PathBuf> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    fn clear(&mut self) {
        self.files.clear();
        self.matched_aspect = None;
    }

    /// Re-read the first file's dimensions if `aspect_ratio` asks for them.
    ///
    /// A file that cannot be decoded falls back to the default aspect.
    async fn refresh(&mut self, aspect_ratio: &str) {
        self.matched_aspect = None;
        if aspect_ratio != MATCH_INPUT_IMAGE {
            return;
        }
        let Some(first) = self.files.first() else {
            return;
        };
        self.matched_aspect = Some(match media::file_dimensions(first).await {
            Ok(dimensions) => dimensions.aspect(),
            Err(e) => {
                debug!("Could not read dimensions of {}: {e}", first.display());
                DEFAULT_ASPECT
            }
        });
    }
}

/// Preview aspect for forms with an aspect ratio field and optional input images.
fn ratio_or_matched(aspect_ratio: &str, images: &InputImages) -> Aspect {
    if let Some(ratio) = crate::aspect::parse_ratio(aspect_ratio) {
        return crate::aspect::normalize(Some(ratio));
    }
    if aspect_ratio == MATCH_INPUT_IMAGE {
        if let Some(aspect) = images.matched_aspect() {
            return aspect;
        }
    }
    DEFAULT_ASPECT
}

/// One form of any variant.
#[derive(Debug, Clone, PartialEq)]
pub enum FormConfig {
    /// Nano Banana form.
    NanoBanana(NanoBananaForm),
    /// Background removal form.
    RemoveBackground(RemoveBackgroundForm),
    /// Seedream form.
    Seedream(SeedreamForm),
    /// Revise form.
    Revise(ReviseForm),
}

impl FormConfig {
    /// A form for `model` holding its default values.
    #[must_use]
    pub fn new(model: ModelKey) -> Self {
        match model {
            ModelKey::NanoBanana => Self::NanoBanana(NanoBananaForm::default()),
            ModelKey::RemoveBackground => Self::RemoveBackground(RemoveBackgroundForm::default()),
            ModelKey::Seedream => Self::Seedream(SeedreamForm::default()),
            ModelKey::Revise => Self::Revise(ReviseForm::default()),
        }
    }

    /// Borrow the variant as its shared capability set.
    #[must_use]
    pub fn as_form(&self) -> &dyn ModelForm {
        match self {
            Self::NanoBanana(form) => form,
            Self::RemoveBackground(form) => form,
            Self::Seedream(form) => form,
            Self::Revise(form) => form,
        }
    }

    /// Mutably borrow the variant as its shared capability set.
    pub fn as_form_mut(&mut self) -> &mut dyn ModelForm {
        match self {
            Self::NanoBanana(form) => form,
            Self::RemoveBackground(form) => form,
            Self::Seedream(form) => form,
            Self::Revise(form) => form,
        }
    }
}

/// One form per model.
#[derive(Debug, Clone)]
pub struct FormSet {
    forms: [FormConfig; 4],
}

impl Default for FormSet {
    fn default() -> Self {
        Self { forms: ModelKey::ALL.map(FormConfig::new) }
    }
}

impl FormSet {
    /// The form for `model`.
    #[must_use]
    pub fn get(&self, model: ModelKey) -> &FormConfig {
        &self.forms[model.index()]
    }

    /// The form for `model`, mutably.
    pub fn get_mut(&mut self, model: ModelKey) -> &mut FormConfig {
        &mut self.forms[model.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::tests::temp_png;

    #[test]
    fn form_set_holds_matching_variants() {
        let forms = FormSet::default();
        for model in ModelKey::ALL {
            assert_eq!(forms.get(model).as_form().model(), model);
        }
    }

    #[tokio::test]
    async fn matched_aspect_follows_first_file() {
        let mut images = InputImages::default();
        images.add([temp_png("forms_first.png", 30, 10), temp_png("forms_second.png", 10, 30)]);

        images.refresh(MATCH_INPUT_IMAGE).await;
        assert_eq!(images.matched_aspect(), Some(Aspect { width: 3, height: 1 }));

        images.refresh("1:1").await;
        assert_eq!(images.matched_aspect(), None);
    }

    #[tokio::test]
    async fn undecodable_input_falls_back_to_default() {
        let dir = std::env::temp_dir().join("imagen_playground_forms_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let mut images = InputImages::default();
        images.add([path]);
        images.refresh(MATCH_INPUT_IMAGE).await;
        assert_eq!(images.matched_aspect(), Some(DEFAULT_ASPECT));
    }

    #[test]
    fn remove_out_of_range_is_none() {
        let mut images = InputImages::default();
        images.add([PathBuf::from("a.png")]);
        assert_eq!(images.remove(3), None);
        assert_eq!(images.remove(0), Some(PathBuf::from("a.png")));
        assert!(images.files().is_empty());
    }

    #[test]
    fn ratio_beats_matched_aspect() {
        let images = InputImages { files: Vec::new(), matched_aspect: Some(Aspect { width: 1, height: 3 }) };
        assert_eq!(ratio_or_matched("4:3", &images), Aspect { width: 4, height: 3 });
        assert_eq!(ratio_or_matched(MATCH_INPUT_IMAGE, &images), Aspect { width: 1, height: 3 });
        assert_eq!(ratio_or_matched(MATCH_INPUT_IMAGE, &InputImages::default()), DEFAULT_ASPECT);
    }
}
