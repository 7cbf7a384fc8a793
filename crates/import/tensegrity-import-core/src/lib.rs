//! Tensegrity Import Core (host-agnostic)
//!
//! Turns tensegrity structure JSON (per-frame 4x4 transforms for joints, pushes and pulls)
//! into an ordered stream of scene events. In construction mode entities appear and
//! disappear with stepped visibility windows. Hosts consume the stream through
//! [`host::SceneHost`].

pub mod config;
pub mod data;
pub mod emitter;
pub mod error;
pub mod events;
pub mod frames;
pub mod host;
pub mod importer;
pub mod matrix;
pub mod playback;
pub mod visibility;

// Re-exports for consumers (host adapters)
pub use config::{FrameSelection, ImportConfig, DEFAULT_OUTPUT_FPS};
pub use data::{
    Animation, CameraRecord, EntityKey, EntityKind, EntityRecord, Frame, PartRole, PushPart,
    Transform, CAMERA_NAME,
};
pub use emitter::{emit, EventEmitter, ImportProgress};
pub use error::ImportError;
pub use events::{ChildPart, EmitMode, ImportEvent, ObjectKind};
pub use frames::{parse_animation_json, parse_frames};
pub use host::{apply_events, HostError, KeyframeScene, SceneHost};
pub use importer::{import_json, EntityCounts, ImportOutcome, ImportReport, Importer};
pub use matrix::{align_hemisphere, decompose, look_at_rotation, MatrixError, Pose};
pub use playback::PlaybackRate;
pub use visibility::{compute_windows, VisibilityWindow, VisibilityWindows};
