//! Import configuration.

use serde::{Deserialize, Serialize};

/// Output frame rate of the host timeline. Fixed for the importer, never read from input.
pub const DEFAULT_OUTPUT_FPS: f64 = 24.0;

/// Capture frame rate assumed when the input omits `"fps"`.
pub const DEFAULT_CAPTURE_FPS: f64 = 24.0;

/// Which frames of the input are imported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameSelection {
    /// Every frame, as an animation when there is more than one.
    #[default]
    All,
    /// One frame (0-based) imported as a static pose. Indices past the end clamp to the last frame.
    Single { index: usize },
}

/// Knobs for one import call.
/// Keep this small; host-owned concerns (prototype assets, collections) stay outside.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Staggered appearance: entities appear and disappear with their visibility window.
    /// Only honored for animations (more than one imported frame).
    pub construction_mode: bool,
    pub frame_selection: FrameSelection,
    /// Emit camera events when frames carry a camera record.
    pub import_camera: bool,
    /// Host timeline rate used for the slow-motion factor.
    pub output_fps: f64,
    /// Invoke the progress callback every N frames; 0 disables it.
    pub progress_interval: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            construction_mode: false,
            frame_selection: FrameSelection::All,
            import_camera: true,
            output_fps: DEFAULT_OUTPUT_FPS,
            progress_interval: 10,
        }
    }
}

impl ImportConfig {
    pub fn construction() -> Self {
        Self {
            construction_mode: true,
            ..Self::default()
        }
    }

    pub fn single_frame(index: usize) -> Self {
        Self {
            frame_selection: FrameSelection::Single { index },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let cfg: ImportConfig = serde_json::from_str(r#"{ "construction_mode": true }"#).unwrap();
        assert!(cfg.construction_mode);
        assert!(cfg.import_camera);
        assert_eq!(cfg.frame_selection, FrameSelection::All);
        assert_eq!(cfg.output_fps, DEFAULT_OUTPUT_FPS);
        assert_eq!(cfg.progress_interval, 10);
    }

    #[test]
    fn single_selection_uses_tagged_shape() {
        let cfg: ImportConfig =
            serde_json::from_str(r#"{ "frame_selection": { "single": { "index": 4 } } }"#)
                .unwrap();
        assert_eq!(cfg.frame_selection, FrameSelection::Single { index: 4 });
    }
}
