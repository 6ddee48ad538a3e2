//! Model variants, key resolution, and per-model defaults.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlaygroundError;

/// Selectable generation/editing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKey {
    /// Text-to-image with optional reference images.
    #[serde(rename = "nano-banana")]
    NanoBanana,
    /// Background removal from a single input image.
    #[serde(rename = "remove-bg")]
    RemoveBackground,
    /// Text-to-image with size presets and multi-image output.
    #[serde(rename = "seedream")]
    Seedream,
    /// Instruction-driven edit of a single input image.
    #[serde(rename = "revise")]
    Revise,
}

/// Short name aliases accepted on the command line.
const ALIASES: &[(&str, ModelKey)] = &[
    ("nano", ModelKey::NanoBanana),
    ("nano-banana-pro", ModelKey::NanoBanana),
    ("rembg", ModelKey::RemoveBackground),
    ("remove-background", ModelKey::RemoveBackground),
    ("seedream-4", ModelKey::Seedream),
    ("edit", ModelKey::Revise),
];

impl ModelKey {
    /// Every model, in tab order.
    pub const ALL: [Self; 4] = [Self::NanoBanana, Self::RemoveBackground, Self::Seedream, Self::Revise];

    /// Discriminator sent to the proxy as `model_key`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NanoBanana => "nano-banana",
            Self::RemoveBackground => "remove-bg",
            Self::Seedream => "seedream",
            Self::Revise => "revise",
        }
    }

    /// Upstream model name shown in the model info header.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::NanoBanana => "google/nano-banana-pro",
            Self::RemoveBackground => "briaai/bria-rmbg-2.0",
            Self::Seedream => "bytedance/seedream-4",
            Self::Revise => "black-forest-labs/flux-kontext-pro",
        }
    }

    /// Download extension used before any request overrides it.
    #[must_use]
    pub fn default_download_extension(self) -> &'static str {
        match self {
            Self::Seedream => "jpg",
            Self::NanoBanana | Self::RemoveBackground | Self::Revise => "png",
        }
    }

    /// Position of the model in [`ModelKey::ALL`].
    pub(crate) fn index(self) -> usize {
        match self {
            Self::NanoBanana => 0,
            Self::RemoveBackground => 1,
            Self::Seedream => 2,
            Self::Revise => 3,
        }
    }

    /// Whether submission is guarded on a non-empty prompt.
    #[must_use]
    pub fn requires_prompt(self) -> bool {
        !matches!(self, Self::RemoveBackground)
    }

    /// Whether submission is guarded on an input image.
    #[must_use]
    pub fn requires_image(self) -> bool {
        matches!(self, Self::RemoveBackground | Self::Revise)
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKey {
    type Err = PlaygroundError;

    /// Resolve a model key or alias, case-insensitively.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let lowered = name.trim().to_ascii_lowercase();
        if let Some(key) = Self::ALL.into_iter().find(|key| key.as_str() == lowered) {
            return Ok(key);
        }
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map(|&(_, key)| key)
            .ok_or(PlaygroundError::UnknownModel(name.to_string()))
    }
}
