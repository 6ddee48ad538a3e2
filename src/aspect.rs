//! Aspect ratio parsing and reduction for sizing the preview frame.

use std::fmt;

/// A parsed `W:H` ratio with positive, possibly fractional, components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ratio {
    /// Width component.
    pub width: f64,
    /// Height component.
    pub height: f64,
}

/// A width:height ratio reduced to lowest integer terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Aspect {
    /// Reduced width.
    pub width: u32,
    /// Reduced height.
    pub height: u32,
}

/// Preview aspect used whenever nothing better is known.
pub const DEFAULT_ASPECT: Aspect = Aspect { width: 16, height: 9 };

impl Default for Aspect {
    fn default() -> Self {
        DEFAULT_ASPECT
    }
}

impl Aspect {
    /// Reduce pixel dimensions to an aspect. Zero dimensions give the default.
    #[must_use]
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        normalize(Some(Ratio { width: f64::from(width), height: f64::from(height) }))
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl From<Aspect> for Ratio {
    fn from(aspect: Aspect) -> Self {
        Self { width: f64::from(aspect.width), height: f64::from(aspect.height) }
    }
}

/// Parse a `"W:H"` string. Anything else, including non-positive parts, is `None`.
#[must_use]
pub fn parse_ratio(text: &str) -> Option<Ratio> {
    let (w, h) = text.trim().split_once(':')?;
    let width = positive_number(w)?;
    let height = positive_number(h)?;
    Some(Ratio { width, height })
}

fn positive_number(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Coerce a ratio to lowest integer terms, falling back to 16:9.
#[must_use]
pub fn normalize(ratio: Option<Ratio>) -> Aspect {
    let Some(ratio) = ratio else {
        return DEFAULT_ASPECT;
    };
    let (Some(width), Some(height)) = (rounded(ratio.width), rounded(ratio.height)) else {
        return DEFAULT_ASPECT;
    };
    let divisor = gcd(width, height);
    Aspect { width: width / divisor, height: height / divisor }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rounded(value: f64) -> Option<u32> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    let value = value.round();
    (value >= 1.0 && value <= f64::from(u32::MAX)).then_some(value as u32)
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}
