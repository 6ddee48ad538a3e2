//! Projection of one model's state onto the visible preview region.

use std::fmt;

use crate::aspect::Aspect;
use crate::model::ModelKey;
use crate::output::download_filename;
use crate::state::ModelState;

/// Shown in place of an elapsed time when none is recorded.
pub const NO_ELAPSED: &str = "—";

const MAX_URL_DISPLAY: usize = 72;

/// What fills the preview frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewBody {
    /// A prediction is in flight.
    Loading,
    /// An image is ready.
    Image {
        /// Displayable reference.
        url: String,
    },
    /// Nothing to show yet.
    Empty,
}

/// The download affordance, present only when an image is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Reference to fetch.
    pub url: String,
    /// Suggested file name.
    pub filename: String,
}

/// Everything the preview region displays for the active model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewView {
    /// Model whose state this view projects.
    pub model: ModelKey,
    /// Frame aspect.
    pub aspect: Aspect,
    /// Frame contents.
    pub body: PreviewBody,
    /// Pretty-printed last job, or `{}`.
    pub json: String,
    /// `"{n}s"` or [`NO_ELAPSED`].
    pub elapsed_label: String,
    /// Download affordance.
    pub download: Option<Download>,
}

/// Render `state`. `fallback_aspect` sizes the frame while no image exists,
/// usually the form's own guess.
#[must_use]
pub fn render(model: ModelKey, state: &ModelState, fallback_aspect: Aspect) -> PreviewView {
    let image = state.image().filter(|_| !state.is_loading());

    let body = match (state.is_loading(), image) {
        (true, _) => PreviewBody::Loading,
        (false, Some(image)) => PreviewBody::Image { url: image.url.clone() },
        (false, None) => PreviewBody::Empty,
    };

    let json = state
        .job()
        .and_then(|job| serde_json::to_string_pretty(job).ok())
        .unwrap_or_else(|| "{}".to_string());

    let elapsed_label = state.elapsed_seconds().map_or_else(|| NO_ELAPSED.to_string(), |s| format!("{s}s"));

    let download = image.map(|image| Download {
        url: image.url.clone(),
        filename: download_filename(state.download_extension()),
    });

    PreviewView {
        model,
        aspect: image.map_or(fallback_aspect, |image| image.aspect),
        body,
        json,
        elapsed_label,
        download,
    }
}

impl fmt::Display for PreviewView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}] {} ({})", self.model, self.model.display_name(), self.aspect)?;
        match &self.body {
            PreviewBody::Loading => writeln!(f, "  preview: generating...")?,
            PreviewBody::Image { url } => writeln!(f, "  preview: {}", shorten(url))?,
            PreviewBody::Empty => writeln!(f, "  preview: (empty)")?,
        }
        write!(f, "  elapsed: {}", self.elapsed_label)?;
        if let Some(download) = &self.download {
            write!(f, "\n  download: {}", download.filename)?;
        }
        Ok(())
    }
}

/// Keep long data URIs readable on a terminal.
fn shorten(url: &str) -> String {
    if url.chars().count() <= MAX_URL_DISPLAY {
        return url.to_string();
    }
    let head: String = url.chars().take(MAX_URL_DISPLAY).collect();
    format!("{head}... ({} chars)", url.len())
}
