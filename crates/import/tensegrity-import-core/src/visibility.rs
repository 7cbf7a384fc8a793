//! Visibility windows: first and last frame each entity appears in.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::data::{EntityKey, Frame};

/// Inclusive, 1-based frame range during which an entity is present.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityWindow {
    pub first_frame: usize,
    pub last_frame: usize,
}

impl VisibilityWindow {
    #[inline]
    pub fn contains(&self, frame: usize) -> bool {
        self.first_frame <= frame && frame <= self.last_frame
    }

    /// Number of frames covered, endpoints included.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.last_frame - self.first_frame + 1
    }
}

/// Windows keyed by entity, in first-appearance order (frame, then kind, then listing).
pub type VisibilityWindows = IndexMap<EntityKey, VisibilityWindow>;

/// Single forward pass over `frames`. Gaps inside a window are not tracked; an entity
/// that skips a frame is still considered present between its first and last appearance.
pub fn compute_windows(frames: &[Frame]) -> VisibilityWindows {
    let mut windows = VisibilityWindows::new();
    for (i, frame) in frames.iter().enumerate() {
        let frame_no = i + 1;
        for record in frame.entities() {
            windows
                .entry(record.key())
                .and_modify(|w| w.last_frame = frame_no)
                .or_insert(VisibilityWindow {
                    first_frame: frame_no,
                    last_frame: frame_no,
                });
        }
    }
    windows
}
