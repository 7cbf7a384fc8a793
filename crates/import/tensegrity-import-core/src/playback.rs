//! Playback rate mapping between the capture rate and the host's fixed output rate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// Factors within this relative distance of 1.0 count as real time.
pub const REALTIME_TOLERANCE: f64 = 0.01;

/// `capture_fps / output_fps`. Both rates must be finite and positive.
pub fn factor(capture_fps: f64, output_fps: f64) -> Result<f64, ImportError> {
    if !capture_fps.is_finite() || capture_fps <= 0.0 {
        return Err(ImportError::malformed_input(format!(
            "capture fps must be positive, got {capture_fps}"
        )));
    }
    if !output_fps.is_finite() || output_fps <= 0.0 {
        return Err(ImportError::malformed_input(format!(
            "output fps must be positive, got {output_fps}"
        )));
    }
    Ok(capture_fps / output_fps)
}

/// How the captured motion plays back on the host timeline.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaybackRate {
    Realtime,
    /// Captured faster than played: motion is stretched `factor` times.
    SlowMotion { factor: f64 },
    /// Captured slower than played: motion is compressed by `factor`.
    FastForward { factor: f64 },
}

impl PlaybackRate {
    pub fn from_factor(factor: f64) -> Self {
        if (factor - 1.0).abs() <= REALTIME_TOLERANCE {
            PlaybackRate::Realtime
        } else if factor > 1.0 {
            PlaybackRate::SlowMotion { factor }
        } else {
            PlaybackRate::FastForward { factor }
        }
    }

    pub fn measure(capture_fps: f64, output_fps: f64) -> Result<Self, ImportError> {
        factor(capture_fps, output_fps).map(Self::from_factor)
    }

    /// The raw ratio; 1.0 for real time.
    pub fn factor(&self) -> f64 {
        match self {
            PlaybackRate::Realtime => 1.0,
            PlaybackRate::SlowMotion { factor } | PlaybackRate::FastForward { factor } => *factor,
        }
    }

    pub fn is_slow_motion(&self) -> bool {
        matches!(self, PlaybackRate::SlowMotion { .. })
    }
}

impl fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackRate::Realtime => f.write_str("no slow-motion"),
            PlaybackRate::SlowMotion { factor } => write!(f, "{factor:.1}x slow-motion"),
            PlaybackRate::FastForward { factor } => write!(f, "{:.1}x speed-up", 1.0 / factor),
        }
    }
}
