// THEORY:
// Errors in this crate come in two flavours only. Configuration problems are caught
// once, when a tracker, recognizer or pipeline is built, so a running session never
// discovers a bad threshold mid-stream. Frame problems are caught when a `DepthFrame`
// is constructed from raw bytes. Everything that happens *inside* a frame (an empty
// mask, a contour too small to be a hand) is a normal outcome and is expressed with
// `Option`/`Report::NoCandidate`, never with an error.

use thiserror::Error;

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("finger graph resolution must be positive")]
    InvalidResolution,
    #[error("{name} must lie in [0, 1], got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f64 },
    #[error("{name} must be at least 1")]
    ZeroCapacity { name: &'static str },
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
}

/// Raw frame data that does not describe a valid image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame dimensions must be non-zero (got {width}x{height}x{channels})")]
    ZeroDimension {
        width: u32,
        height: u32,
        channels: usize,
    },
    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Checks that a ratio-like value is finite and inside `[0, 1]`.
pub(crate) fn check_unit(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ThresholdOutOfRange { name, value })
    }
}

pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

pub(crate) fn check_capacity(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::ZeroCapacity { name })
    } else {
        Ok(())
    }
}
