//! Event emitter: parsed frames (plus visibility windows) into an ordered event stream.
//!
//! Ordering within a frame is joints, pushes, pulls, then the camera, each kind in the
//! frame's listing order. Nothing here iterates an unordered collection, so the same
//! input always yields the same stream.

use hashbrown::{HashMap, HashSet};
use tracing::trace;

use crate::data::{CameraRecord, EntityKey, EntityKind, EntityRecord, Frame, CAMERA_NAME};
use crate::error::ImportError;
use crate::events::{ChildPart, EmitMode, ImportEvent, ObjectKind};
use crate::matrix::{align_hemisphere, look_at_rotation, Pose};
use crate::visibility::{VisibilityWindow, VisibilityWindows};

/// Coarse progress notification. Purely observational.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImportProgress {
    /// Frames fully emitted so far.
    pub frames_done: usize,
    pub frame_count: usize,
    pub events_emitted: usize,
}

/// Emit with camera events on and no progress reporting.
pub fn emit(
    frames: &[Frame],
    windows: Option<&VisibilityWindows>,
    mode: EmitMode,
) -> Result<Vec<ImportEvent>, ImportError> {
    EventEmitter::new().emit(frames, windows, mode)
}

/// Configurable emitter. Per-call state lives inside [`EventEmitter::emit`], so one
/// emitter can be reused across imports.
pub struct EventEmitter<'a> {
    import_camera: bool,
    progress_interval: usize,
    progress: Option<&'a mut dyn FnMut(ImportProgress)>,
}

impl Default for EventEmitter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> EventEmitter<'a> {
    pub fn new() -> Self {
        Self {
            import_camera: true,
            progress_interval: 0,
            progress: None,
        }
    }

    pub fn with_camera(mut self, import_camera: bool) -> Self {
        self.import_camera = import_camera;
        self
    }

    /// Call `callback` after every `interval` frames and once at the end. `interval == 0` disables it.
    pub fn with_progress(
        mut self,
        interval: usize,
        callback: &'a mut dyn FnMut(ImportProgress),
    ) -> Self {
        self.progress_interval = interval;
        self.progress = Some(callback);
        self
    }

    pub fn emit(
        &mut self,
        frames: &[Frame],
        windows: Option<&VisibilityWindows>,
        mode: EmitMode,
    ) -> Result<Vec<ImportEvent>, ImportError> {
        let mut run = EmitRun::default();
        match mode {
            EmitMode::Plain => self.emit_plain(&mut run, frames)?,
            EmitMode::Construction => {
                let windows = windows.ok_or_else(|| ImportError::PreconditionViolated {
                    reason: "construction mode requires precomputed visibility windows".into(),
                })?;
                self.emit_construction(&mut run, frames, windows)?;
            }
        }
        Ok(run.events)
    }

    fn emit_plain(&mut self, run: &mut EmitRun, frames: &[Frame]) -> Result<(), ImportError> {
        let mut created: HashSet<EntityKey> = HashSet::new();
        for (i, frame) in frames.iter().enumerate() {
            let frame_no = i + 1;
            let poses = decompose_frame(frame, frame_no)?;

            for (record, pose) in frame.entities().zip(&poses) {
                if created.insert(record.key()) {
                    run.create_entity(record, pose, frame_no)?;
                }
            }
            for (record, pose) in frame.entities().zip(&poses) {
                run.set_transform(record.kind.into(), &record.name, frame_no, pose);
            }

            self.emit_camera(run, frame, frame_no);
            self.report(run, frame_no, frames.len());
        }
        Ok(())
    }

    fn emit_construction(
        &mut self,
        run: &mut EmitRun,
        frames: &[Frame],
        windows: &VisibilityWindows,
    ) -> Result<(), ImportError> {
        let total = frames.len();

        for (key, window) in windows {
            let record = frames
                .get(window.first_frame.wrapping_sub(1))
                .and_then(|f| f.records(key.kind).iter().find(|r| r.name == key.name))
                .ok_or_else(|| ImportError::PreconditionViolated {
                    reason: format!(
                        "window for {key} starts at frame {} where the entity is absent",
                        window.first_frame
                    ),
                })?;
            let pose = decompose_record(record, window.first_frame)?;
            let children = run.create_entity(record, &pose, window.first_frame)?;
            run.visibility_bracket(key, &children, window, total);
        }

        // Windows opening at each frame, and the keys whose window covers the current
        // frame. Only active entities can need a gap key, so a frame costs what it emits.
        let mut opening: Vec<Vec<&EntityKey>> = vec![Vec::new(); total];
        for (key, window) in windows {
            opening[window.first_frame - 1].push(key);
        }
        let mut active: Vec<&EntityKey> = Vec::new();
        // Last keyed frame and emitted pose per entity, replayed on frames where an entity
        // inside its window is missing from the listing.
        let mut held: HashMap<&EntityKey, (usize, Pose)> = HashMap::new();

        for (i, frame) in frames.iter().enumerate() {
            let frame_no = i + 1;
            active.retain(|key| windows[*key].last_frame >= frame_no);
            active.extend(opening[i].iter().copied());

            for kind in EntityKind::ALL {
                for record in frame.records(kind) {
                    let (key, window) = windows.get_key_value(&record.key()).ok_or_else(|| {
                        ImportError::PreconditionViolated {
                            reason: format!("no visibility window for {}", record.key()),
                        }
                    })?;
                    if !window.contains(frame_no) {
                        continue;
                    }
                    let pose = decompose_record(record, frame_no)?;
                    let emitted = run.set_transform(kind.into(), &record.name, frame_no, &pose);
                    held.insert(key, (frame_no, emitted));
                }

                for key in active.iter().filter(|key| key.kind == kind) {
                    let Some(&(keyed_at, pose)) = held.get(*key) else {
                        continue;
                    };
                    if keyed_at == frame_no {
                        continue;
                    }
                    trace!(entity = %key, frame = frame_no, "holding pose across gap");
                    run.set_transform(kind.into(), &key.name, frame_no, &pose);
                }
            }

            self.emit_camera(run, frame, frame_no);
            self.report(run, frame_no, total);
        }
        Ok(())
    }

    fn emit_camera(&self, run: &mut EmitRun, frame: &Frame, frame_no: usize) {
        if !self.import_camera {
            return;
        }
        if let Some(camera) = &frame.camera {
            run.camera(camera, frame_no);
        }
    }

    fn report(&mut self, run: &EmitRun, frames_done: usize, frame_count: usize) {
        if self.progress_interval == 0 {
            return;
        }
        if frames_done % self.progress_interval != 0 && frames_done != frame_count {
            return;
        }
        if let Some(callback) = self.progress.as_deref_mut() {
            callback(ImportProgress {
                frames_done,
                frame_count,
                events_emitted: run.events.len(),
            });
        }
    }
}

/// Mutable state for one emission pass.
#[derive(Default)]
struct EmitRun {
    events: Vec<ImportEvent>,
    rotations: HashMap<(ObjectKind, String), [f64; 4]>,
    camera_created: bool,
}

impl EmitRun {
    fn create_entity(
        &mut self,
        record: &EntityRecord,
        pose: &Pose,
        frame_no: usize,
    ) -> Result<Vec<ChildPart>, ImportError> {
        let mut children = Vec::with_capacity(record.parts.len());
        for part in &record.parts {
            let name = part.role.child_name(&record.name);
            let world = part
                .transform
                .decompose()
                .map_err(|e| ImportError::malformed_transform(&name, frame_no, e.to_string()))?;
            children.push(ChildPart {
                name,
                role: part.role,
                offset: world.relative_to(pose),
            });
        }
        self.events.push(ImportEvent::CreateEntity {
            name: record.name.clone(),
            kind: record.kind,
            initial_transform: *pose,
            children: children.clone(),
        });
        Ok(children)
    }

    /// Push a transform key with hemisphere continuity; returns the pose as emitted.
    fn set_transform(&mut self, kind: ObjectKind, name: &str, frame_no: usize, pose: &Pose) -> Pose {
        let rotation = self.continuous(kind, name, pose.rotation);
        self.events.push(ImportEvent::SetTransform {
            kind,
            name: name.to_string(),
            frame_index: frame_no,
            position: pose.position,
            rotation,
            scale: pose.scale,
        });
        Pose { rotation, ..*pose }
    }

    fn continuous(&mut self, kind: ObjectKind, name: &str, q: [f64; 4]) -> [f64; 4] {
        let slot = self
            .rotations
            .entry((kind, name.to_string()))
            .or_insert(q);
        let aligned = align_hemisphere(Some(*slot), q);
        *slot = aligned;
        aligned
    }

    fn visibility_bracket(
        &mut self,
        key: &EntityKey,
        children: &[ChildPart],
        window: &VisibilityWindow,
        total: usize,
    ) {
        if window.first_frame > 1 {
            self.set_visible(key, children, 1, false);
        }
        self.set_visible(key, children, window.first_frame, true);
        if window.last_frame < total {
            self.set_visible(key, children, window.last_frame + 1, false);
        }
    }

    fn set_visible(&mut self, key: &EntityKey, children: &[ChildPart], frame_no: usize, visible: bool) {
        self.events.push(ImportEvent::SetVisibility {
            kind: key.kind.into(),
            name: key.name.clone(),
            frame_index: frame_no,
            visible,
        });
        for child in children {
            self.events.push(ImportEvent::SetVisibility {
                kind: child.role.into(),
                name: child.name.clone(),
                frame_index: frame_no,
                visible,
            });
        }
    }

    fn camera(&mut self, camera: &CameraRecord, frame_no: usize) {
        let orientation = look_at_rotation(camera.position, camera.target);
        if self.camera_created {
            let pose = Pose {
                position: camera.position,
                rotation: orientation,
                scale: [1.0; 3],
            };
            self.set_transform(ObjectKind::Camera, CAMERA_NAME, frame_no, &pose);
        } else {
            self.camera_created = true;
            let orientation = self.continuous(ObjectKind::Camera, CAMERA_NAME, orientation);
            self.events.push(ImportEvent::CreateCamera {
                name: CAMERA_NAME.to_string(),
                frame_index: frame_no,
                position: camera.position,
                orientation,
            });
        }
    }
}

/// Decompose an entity's matrix, checking its push parts on the same frame.
fn decompose_record(record: &EntityRecord, frame_no: usize) -> Result<Pose, ImportError> {
    for part in &record.parts {
        part.transform.decompose().map_err(|e| {
            ImportError::malformed_transform(
                part.role.child_name(&record.name),
                frame_no,
                e.to_string(),
            )
        })?;
    }
    record
        .transform
        .decompose()
        .map_err(|e| ImportError::malformed_transform(&record.name, frame_no, e.to_string()))
}

fn decompose_frame(frame: &Frame, frame_no: usize) -> Result<Vec<Pose>, ImportError> {
    frame
        .entities()
        .map(|record| decompose_record(record, frame_no))
        .collect()
}
