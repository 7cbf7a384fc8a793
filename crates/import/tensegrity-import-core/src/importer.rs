//! Import orchestrator: parse → select frames → (windows) → emit → playback rate → report.
//!
//! Any failure aborts the whole import; callers only ever see a complete event stream.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use crate::config::{FrameSelection, ImportConfig};
use crate::data::{Animation, EntityKind, Frame};
use crate::emitter::{EventEmitter, ImportProgress};
use crate::error::ImportError;
use crate::events::{EmitMode, ImportEvent};
use crate::frames::parse_animation_json;
use crate::playback::PlaybackRate;
use crate::visibility::compute_windows;

/// Objects created by one import, by kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub joints: usize,
    pub pushes: usize,
    pub pulls: usize,
    /// Push children (bars and holders).
    pub parts: usize,
    pub cameras: usize,
}

impl EntityCounts {
    pub fn total(&self) -> usize {
        self.joints + self.pushes + self.pulls + self.parts + self.cameras
    }

    fn tally(events: &[ImportEvent]) -> Self {
        let mut counts = Self::default();
        for event in events {
            match event {
                ImportEvent::CreateEntity { kind, children, .. } => {
                    match kind {
                        EntityKind::Joint => counts.joints += 1,
                        EntityKind::Push => counts.pushes += 1,
                        EntityKind::Pull => counts.pulls += 1,
                    }
                    counts.parts += children.len();
                }
                ImportEvent::CreateCamera { .. } => counts.cameras += 1,
                ImportEvent::SetTransform { .. } | ImportEvent::SetVisibility { .. } => {}
            }
        }
        counts
    }
}

/// Summary of a completed import.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub created: EntityCounts,
    /// Frames imported (1 for a single-frame selection).
    pub frame_count: usize,
    /// `SetTransform` + `SetVisibility` + `CreateCamera` events.
    pub keyframe_events: usize,
    pub is_animation: bool,
    pub mode: EmitMode,
    /// Host timeline range, 1-based inclusive.
    pub frame_start: usize,
    pub frame_end: usize,
    pub capture_fps: f64,
    pub playback: PlaybackRate,
}

impl ImportReport {
    pub fn slow_motion_factor(&self) -> f64 {
        self.playback.factor()
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_animation {
            write!(
                f,
                "Imported {} objects with {} frames of animation ({})",
                self.created.total(),
                self.frame_count,
                self.playback
            )
        } else {
            write!(f, "Imported {} objects from a single frame", self.created.total())
        }
    }
}

/// Result of [`Importer::import_str`]: the complete stream plus its summary.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportOutcome {
    pub events: Vec<ImportEvent>,
    pub report: ImportReport,
}

/// One-shot import with no progress reporting.
pub fn import_json(json: &str, config: &ImportConfig) -> Result<ImportOutcome, ImportError> {
    Importer::new(config.clone()).import_str(json)
}

/// Runs the import pipeline for a given configuration.
pub struct Importer<'a> {
    config: ImportConfig,
    progress: Option<&'a mut dyn FnMut(ImportProgress)>,
}

impl<'a> Importer<'a> {
    pub fn new(config: ImportConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Observe coarse progress every `config.progress_interval` frames. Output is unaffected.
    pub fn with_progress(mut self, callback: &'a mut dyn FnMut(ImportProgress)) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Parse `json` and run the full pipeline.
    pub fn import_str(&mut self, json: &str) -> Result<ImportOutcome, ImportError> {
        let span = debug_span!("import");
        let _guard = span.enter();
        let animation = parse_animation_json(json)?;
        debug!(frames = animation.frames.len(), fps = animation.fps, "parsed input");
        self.run(&animation)
    }

    /// Run the pipeline on an already parsed document.
    pub fn import_animation(&mut self, animation: &Animation) -> Result<ImportOutcome, ImportError> {
        let span = debug_span!("import");
        let _guard = span.enter();
        self.run(animation)
    }

    fn run(&mut self, animation: &Animation) -> Result<ImportOutcome, ImportError> {
        if animation.frames.is_empty() {
            return Err(ImportError::EmptyAnimation);
        }

        let frames = select_frames(&animation.frames, self.config.frame_selection);
        let is_animation = frames.len() > 1;
        let mode = if self.config.construction_mode && is_animation {
            EmitMode::Construction
        } else {
            EmitMode::Plain
        };
        if self.config.construction_mode && mode == EmitMode::Plain {
            debug!("construction mode ignored for a single-frame import");
        }
        debug!(?mode, frames = frames.len(), is_animation, "strategy chosen");

        let mut emitter = EventEmitter::new().with_camera(self.config.import_camera);
        if let Some(callback) = self.progress.as_deref_mut() {
            emitter = emitter.with_progress(self.config.progress_interval, callback);
        }
        let events = match mode {
            EmitMode::Construction => {
                let windows = compute_windows(frames);
                debug!(windows = windows.len(), "visibility windows computed");
                emitter.emit(frames, Some(&windows), mode)?
            }
            EmitMode::Plain => emitter.emit(frames, None, mode)?,
        };
        debug!(events = events.len(), "events emitted");

        let playback = PlaybackRate::measure(animation.fps, self.config.output_fps)?;
        debug!(%playback, factor = playback.factor(), "playback rate");

        let report = ImportReport {
            created: EntityCounts::tally(&events),
            frame_count: frames.len(),
            keyframe_events: events.iter().filter(|e| e.is_keyframe()).count(),
            is_animation,
            mode,
            frame_start: 1,
            frame_end: frames.len(),
            capture_fps: animation.fps,
            playback,
        };
        Ok(ImportOutcome { events, report })
    }
}

fn select_frames(frames: &[Frame], selection: FrameSelection) -> &[Frame] {
    match selection {
        FrameSelection::All => frames,
        FrameSelection::Single { index } => {
            let idx = index.min(frames.len() - 1);
            &frames[idx..=idx]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "[1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]";

    fn joint_frames(names_per_frame: &[&[&str]]) -> String {
        let frames: Vec<String> = names_per_frame
            .iter()
            .map(|names| {
                let joints: Vec<String> = names
                    .iter()
                    .map(|n| format!(r#"{{"name":"{n}","matrix":{ID}}}"#))
                    .collect();
                format!(r#"{{"joints":[{}]}}"#, joints.join(","))
            })
            .collect();
        format!(r#"{{"fps":48,"frames":[{}]}}"#, frames.join(","))
    }

    #[test]
    fn empty_frames_fail() {
        let err = import_json(r#"{"frames": []}"#, &ImportConfig::default()).unwrap_err();
        assert_eq!(err, ImportError::EmptyAnimation);
    }

    #[test]
    fn construction_is_forced_off_for_one_frame() {
        let json = joint_frames(&[&["J1"]]);
        let out = import_json(&json, &ImportConfig::construction()).unwrap();
        assert_eq!(out.report.mode, EmitMode::Plain);
        assert!(!out.report.is_animation);
        assert_eq!(out.events.len(), 2);
    }

    #[test]
    fn construction_runs_for_animations() {
        let json = joint_frames(&[&["J1"], &["J1", "J2"]]);
        let out = import_json(&json, &ImportConfig::construction()).unwrap();
        assert_eq!(out.report.mode, EmitMode::Construction);
        assert!(out
            .events
            .iter()
            .any(|e| matches!(e, ImportEvent::SetVisibility { visible: false, .. })));
    }

    #[test]
    fn single_frame_selection_clamps() {
        let json = joint_frames(&[&["J1"], &["J1", "J2"]]);
        let out = import_json(&json, &ImportConfig::single_frame(99)).unwrap();
        assert_eq!(out.report.frame_count, 1);
        assert_eq!(out.report.created.joints, 2);
        assert!(out.events.iter().all(|e| e.frame_index().unwrap_or(1) == 1));
        assert_eq!(out.report.to_string(), "Imported 2 objects from a single frame");
    }

    #[test]
    fn report_counts_and_playback() {
        let json = joint_frames(&[&["J1"], &["J1"], &["J1"]]);
        let out = import_json(&json, &ImportConfig::default()).unwrap();
        let report = &out.report;
        assert_eq!(report.created.joints, 1);
        assert_eq!(report.frame_count, 3);
        assert_eq!(report.keyframe_events, 3);
        assert_eq!((report.frame_start, report.frame_end), (1, 3));
        assert_eq!(report.slow_motion_factor(), 2.0);
        assert_eq!(
            report.to_string(),
            "Imported 1 objects with 3 frames of animation (2.0x slow-motion)"
        );
    }

    #[test]
    fn zero_fps_is_malformed_input() {
        let json = format!(r#"{{"fps":0,"frames":[{{"joints":[{{"name":"J1","matrix":{ID}}}]}}]}}"#);
        let err = import_json(&json, &ImportConfig::default()).unwrap_err();
        assert!(matches!(err, ImportError::MalformedInput { .. }));
    }

    #[test]
    fn progress_does_not_change_output() {
        let json = joint_frames(&[&["J1"], &["J1"], &["J2"], &["J1", "J2"]]);
        let cfg = ImportConfig {
            construction_mode: true,
            progress_interval: 1,
            ..ImportConfig::default()
        };
        let plain = import_json(&json, &cfg).unwrap();
        let mut calls = 0;
        let mut count = |_: ImportProgress| calls += 1;
        let observed = Importer::new(cfg).with_progress(&mut count).import_str(&json).unwrap();
        assert_eq!(plain, observed);
        assert_eq!(calls, 4);
    }
}
