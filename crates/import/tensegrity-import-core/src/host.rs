//! Host collaborator interface and an in-memory keyframe scene.
//!
//! Hosts (a 3D editor, a game engine, a test) implement [`SceneHost`]; [`apply_events`]
//! walks a complete event stream and turns it into object creation and keyframes.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::events::{ImportEvent, ObjectKind};
use crate::matrix::{align_hemisphere, Pose};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum HostError {
    #[error("object {kind:?} '{name}' already exists")]
    DuplicateObject { kind: ObjectKind, name: String },
    #[error("event targets unknown object {kind:?} '{name}'")]
    UnknownObject { kind: ObjectKind, name: String },
    #[error("host backend error: {reason}")]
    Backend { reason: String },
}

/// Side-effecting capabilities a host scene exposes to the importer.
pub trait SceneHost {
    type Handle: Clone;

    /// Create an object of `kind`, placed at `initial` without keying it.
    fn create(
        &mut self,
        kind: ObjectKind,
        name: &str,
        initial: &Pose,
    ) -> Result<Self::Handle, HostError>;

    /// Parent `child` under `parent` at a fixed local `offset`.
    fn attach_child(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
        offset: &Pose,
    ) -> Result<(), HostError>;

    /// Key position, rotation and scale at `frame`.
    fn set_transform(
        &mut self,
        handle: &Self::Handle,
        pose: &Pose,
        frame: usize,
    ) -> Result<(), HostError>;

    /// Key visibility at `frame`. Must use constant (step) interpolation.
    fn set_visible(
        &mut self,
        handle: &Self::Handle,
        visible: bool,
        frame: usize,
    ) -> Result<(), HostError>;
}

/// Apply a complete event stream to `host`, in order.
pub fn apply_events<H: SceneHost>(host: &mut H, events: &[ImportEvent]) -> Result<(), HostError> {
    let mut handles: HashMap<(ObjectKind, String), H::Handle> = HashMap::new();

    fn lookup<'m, T>(
        handles: &'m HashMap<(ObjectKind, String), T>,
        kind: ObjectKind,
        name: &str,
    ) -> Result<&'m T, HostError> {
        handles
            .get(&(kind, name.to_string()))
            .ok_or_else(|| HostError::UnknownObject {
                kind,
                name: name.to_string(),
            })
    }

    fn register<H: SceneHost>(
        host: &mut H,
        handles: &mut HashMap<(ObjectKind, String), H::Handle>,
        kind: ObjectKind,
        name: &str,
        initial: &Pose,
    ) -> Result<H::Handle, HostError> {
        let key = (kind, name.to_string());
        if handles.contains_key(&key) {
            return Err(HostError::DuplicateObject {
                kind,
                name: name.to_string(),
            });
        }
        let handle = host.create(kind, name, initial)?;
        handles.insert(key, handle.clone());
        Ok(handle)
    }

    for event in events {
        match event {
            ImportEvent::CreateEntity {
                name,
                kind,
                initial_transform,
                children,
            } => {
                let parent = register(host, &mut handles, (*kind).into(), name, initial_transform)?;
                for child in children {
                    let world = initial_transform.compose(&child.offset);
                    let handle =
                        register(host, &mut handles, child.role.into(), &child.name, &world)?;
                    host.attach_child(&parent, &handle, &child.offset)?;
                }
            }
            ImportEvent::SetTransform {
                kind,
                name,
                frame_index,
                position,
                rotation,
                scale,
            } => {
                let handle = lookup(&handles, *kind, name)?;
                let pose = Pose {
                    position: *position,
                    rotation: *rotation,
                    scale: *scale,
                };
                host.set_transform(handle, &pose, *frame_index)?;
            }
            ImportEvent::SetVisibility {
                kind,
                name,
                frame_index,
                visible,
            } => {
                let handle = lookup(&handles, *kind, name)?;
                host.set_visible(handle, *visible, *frame_index)?;
            }
            ImportEvent::CreateCamera {
                name,
                frame_index,
                position,
                orientation,
            } => {
                let pose = Pose {
                    position: *position,
                    rotation: *orientation,
                    scale: [1.0; 3],
                };
                let handle = register(host, &mut handles, ObjectKind::Camera, name, &pose)?;
                host.set_transform(&handle, &pose, *frame_index)?;
            }
        }
    }
    Ok(())
}

// ----- In-memory host -----

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    Linear,
    /// Hold the left key until the next one.
    Constant,
}

/// Keys sorted by frame; at most one key per frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Channel<T> {
    pub interpolation: Interpolation,
    pub keys: Vec<(usize, T)>,
}

impl<T: Clone> Channel<T> {
    pub fn new(interpolation: Interpolation) -> Self {
        Self {
            interpolation,
            keys: Vec::new(),
        }
    }

    /// Insert or replace the key at `frame`.
    pub fn insert(&mut self, frame: usize, value: T) {
        match self.keys.binary_search_by_key(&frame, |(f, _)| *f) {
            Ok(i) => self.keys[i].1 = value,
            Err(i) => self.keys.insert(i, (frame, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Surrounding keys of `frame` and the blend factor between them. Frames outside the
    /// keyed range clamp to the nearest key.
    fn bracket(&self, frame: f64) -> Option<(&T, &T, f64)> {
        let first = self.keys.first()?;
        let last = self.keys.last()?;
        if frame <= first.0 as f64 {
            return Some((&first.1, &first.1, 0.0));
        }
        if frame >= last.0 as f64 {
            return Some((&last.1, &last.1, 0.0));
        }
        let right = self.keys.partition_point(|(f, _)| (*f as f64) <= frame);
        let (f0, v0) = &self.keys[right - 1];
        let (f1, v1) = &self.keys[right];
        let t = (frame - *f0 as f64) / (*f1 - *f0) as f64;
        Some((v0, v1, t))
    }

    /// Hold-left sample.
    pub fn sample_step(&self, frame: f64) -> Option<T> {
        self.bracket(frame).map(|(left, _, _)| left.clone())
    }
}

/// Index of an object inside a [`KeyframeScene`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl ObjectId {
    fn from_index(index: usize) -> Result<Self, HostError> {
        u32::try_from(index)
            .map(ObjectId)
            .map_err(|_| HostError::Backend {
                reason: format!("object index {index} exceeds the u32 handle space"),
            })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub name: String,
    /// Pose given at creation, used when no transform key exists.
    pub rest_pose: Pose,
    pub parent: Option<(ObjectId, Pose)>,
    pub transform: Channel<Pose>,
    pub visibility: Channel<bool>,
}

/// A host that only records what it is told. Useful for tests and offline baking.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KeyframeScene {
    objects: Vec<SceneObject>,
}

impl KeyframeScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id.0 as usize)
    }

    pub fn find(&self, kind: ObjectKind, name: &str) -> Option<&SceneObject> {
        self.objects
            .iter()
            .find(|o| o.kind == kind && o.name == name)
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut SceneObject, HostError> {
        self.objects
            .get_mut(id.0 as usize)
            .ok_or_else(|| HostError::Backend {
                reason: format!("stale handle {}", id.0),
            })
    }

    /// Stepped visibility. Unkeyed objects are visible; before the first key the first
    /// key's value holds.
    pub fn is_visible_at(&self, id: ObjectId, frame: usize) -> bool {
        self.object(id)
            .and_then(|o| o.visibility.sample_step(frame as f64))
            .unwrap_or(true)
    }

    /// Local pose at a (possibly fractional) frame: position and scale lerp, rotation nlerp.
    pub fn pose_at(&self, id: ObjectId, frame: f64) -> Option<Pose> {
        let object = self.object(id)?;
        if object.transform.interpolation == Interpolation::Constant {
            return object.transform.sample_step(frame).or(Some(object.rest_pose));
        }
        let Some((a, b, t)) = object.transform.bracket(frame) else {
            return Some(object.rest_pose);
        };
        Some(lerp_pose(a, b, t))
    }

    /// World pose, composing parent chains (children follow their parent's keys).
    pub fn world_pose_at(&self, id: ObjectId, frame: f64) -> Option<Pose> {
        let object = self.object(id)?;
        match object.parent {
            Some((parent, offset)) => {
                let parent_pose = self.world_pose_at(parent, frame)?;
                Some(parent_pose.compose(&offset))
            }
            None => self.pose_at(id, frame),
        }
    }
}

impl SceneHost for KeyframeScene {
    type Handle = ObjectId;

    fn create(&mut self, kind: ObjectKind, name: &str, initial: &Pose) -> Result<ObjectId, HostError> {
        let id = ObjectId::from_index(self.objects.len())?;
        self.objects.push(SceneObject {
            id,
            kind,
            name: name.to_string(),
            rest_pose: *initial,
            parent: None,
            transform: Channel::new(Interpolation::Linear),
            visibility: Channel::new(Interpolation::Constant),
        });
        Ok(id)
    }

    fn attach_child(&mut self, parent: &ObjectId, child: &ObjectId, offset: &Pose) -> Result<(), HostError> {
        self.object_mut(*parent)?;
        self.object_mut(*child)?.parent = Some((*parent, *offset));
        Ok(())
    }

    fn set_transform(&mut self, handle: &ObjectId, pose: &Pose, frame: usize) -> Result<(), HostError> {
        self.object_mut(*handle)?.transform.insert(frame, *pose);
        Ok(())
    }

    fn set_visible(&mut self, handle: &ObjectId, visible: bool, frame: usize) -> Result<(), HostError> {
        self.object_mut(*handle)?.visibility.insert(frame, visible);
        Ok(())
    }
}

fn lerp3(a: [f64; 3], b: [f64; 3], t: f64) -> [f64; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Normalized lerp on the short arc.
fn nlerp_quat(a: [f64; 4], b: [f64; 4], t: f64) -> [f64; 4] {
    let b = align_hemisphere(Some(a), b);
    let q = [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ];
    let len = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if len > 0.0 {
        [q[0] / len, q[1] / len, q[2] / len, q[3] / len]
    } else {
        a
    }
}

fn lerp_pose(a: &Pose, b: &Pose, t: f64) -> Pose {
    Pose {
        position: lerp3(a.position, b.position, t),
        rotation: nlerp_quat(a.rotation, b.rotation, t),
        scale: lerp3(a.scale, b.scale, t),
    }
}
