use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the video rectangle is constrained inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AspectMode {
    /// No forced ratio; the engine keeps the source's own proportions.
    #[default]
    Fit,
    FixedRatio { width: u32, height: u32 },
}

/// Ratios offered in the aspect menu.
pub const PRESETS: [AspectMode; 6] = [
    AspectMode::Fit,
    AspectMode::FixedRatio { width: 16, height: 9 },
    AspectMode::FixedRatio { width: 4, height: 3 },
    AspectMode::FixedRatio { width: 21, height: 9 },
    AspectMode::FixedRatio { width: 16, height: 10 },
    AspectMode::FixedRatio { width: 1, height: 1 },
];

impl AspectMode {
    /// A fixed ratio, or `None` if either side is zero.
    pub fn ratio(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self::FixedRatio { width, height })
    }
}

/// Result of fitting a rectangle into a container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FittedSize {
    /// Fill the container; the caller decides how.
    Unconstrained,
    Sized { width: f32, height: f32 },
}

impl FittedSize {
    pub const ZERO: Self = Self::Sized {
        width: 0.0,
        height: 0.0,
    };

    pub fn is_empty(&self) -> bool {
        match *self {
            Self::Unconstrained => false,
            Self::Sized { width, height } => width <= 0.0 || height <= 0.0,
        }
    }
}

/// Largest rectangle with the mode's ratio that fits inside the container.
///
/// A container that has not been laid out yet (zero, negative or non-finite
/// size) yields [`FittedSize::ZERO`].
pub fn compute_size(container_width: f32, container_height: f32, mode: AspectMode) -> FittedSize {
    let (w, h) = match mode {
        AspectMode::Fit => return FittedSize::Unconstrained,
        AspectMode::FixedRatio { width, height } => (width, height),
    };

    let degenerate = |v: f32| !v.is_finite() || v <= 0.0;
    if degenerate(container_width) || degenerate(container_height) || w == 0 || h == 0 {
        return FittedSize::ZERO;
    }

    let target = w as f32 / h as f32;
    if container_width / container_height > target {
        FittedSize::Sized {
            width: container_height * target,
            height: container_height,
        }
    } else {
        FittedSize::Sized {
            width: container_width,
            height: container_width / target,
        }
    }
}

impl fmt::Display for AspectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fit => f.write_str("fit"),
            Self::FixedRatio { width, height } => write!(f, "{width}:{height}"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid aspect ratio {0:?}, expected \"fit\" or \"W:H\" with non-zero sides")]
pub struct ParseAspectError(String);

impl FromStr for AspectMode {
    type Err = ParseAspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("fit") {
            return Ok(Self::Fit);
        }
        let err = || ParseAspectError(s.to_owned());
        let (w, h) = s.split_once(':').ok_or_else(err)?;
        let w = w.trim().parse().map_err(|_| err())?;
        let h = h.trim().parse().map_err(|_| err())?;
        Self::ratio(w, h).ok_or_else(err)
    }
}

impl TryFrom<String> for AspectMode {
    type Error = ParseAspectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectMode> for String {
    fn from(mode: AspectMode) -> Self {
        mode.to_string()
    }
}
