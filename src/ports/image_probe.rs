//! Image probe port: decodes a displayable reference far enough to learn its size.

use serde::{Deserialize, Serialize};

use super::prediction_backend::BackendFuture;
use crate::aspect::Aspect;

/// Natural pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageDimensions {
    /// The reduced aspect of these dimensions.
    #[must_use]
    pub fn aspect(self) -> Aspect {
        Aspect::from_dimensions(self.width, self.height)
    }
}

/// Resolves an image URL or data URI to its pixel dimensions.
pub trait ImageProbe: Send + Sync {
    /// Probe the image. Fails when the reference cannot be fetched or decoded.
    fn probe(&self, url: &str) -> BackendFuture<'_, ImageDimensions>;
}
