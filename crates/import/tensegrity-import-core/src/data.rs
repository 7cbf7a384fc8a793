//! Parsed frame model. Immutable once produced by the frame parser.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::matrix::{decompose, MatrixError, Pose};

/// Name given to the camera object in the event stream.
pub const CAMERA_NAME: &str = "TensegrityCamera";

/// Structural entity kinds, in the order events are emitted within a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Joint,
    Push,
    Pull,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Joint, EntityKind::Push, EntityKind::Pull];

    /// JSON location of this kind's array inside a frame object.
    pub fn json_path(self) -> &'static str {
        match self {
            EntityKind::Joint => "joints",
            EntityKind::Push => "intervals.push",
            EntityKind::Pull => "intervals.pull",
        }
    }
}

/// Stable identity of a logical entity across frames.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub name: String,
}

impl EntityKey {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} '{}'", self.kind, self.name)
    }
}

/// A 4×4 affine world matrix, column-major.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform(pub [f64; 16]);

impl Transform {
    pub const IDENTITY: Transform = Transform([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        let mut m = Self::IDENTITY.0;
        m[12] = x;
        m[13] = y;
        m[14] = z;
        Transform(m)
    }

    #[inline]
    pub fn decompose(&self) -> Result<Pose, MatrixError> {
        decompose(&self.0)
    }
}

/// Child parts a push member owns.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartRole {
    Bar,
    Holder,
}

impl PartRole {
    pub const ALL: [PartRole; 2] = [PartRole::Bar, PartRole::Holder];

    pub fn json_key(self) -> &'static str {
        match self {
            PartRole::Bar => "bar",
            PartRole::Holder => "holder",
        }
    }

    /// Object name of this part under the push named `parent`.
    pub fn child_name(self, parent: &str) -> String {
        match self {
            PartRole::Bar => format!("{parent}_Bar"),
            PartRole::Holder => format!("{parent}_Holder"),
        }
    }
}

/// World-space placement of one push child in the frame it was recorded.
#[derive(Clone, Debug, PartialEq)]
pub struct PushPart {
    pub role: PartRole,
    pub transform: Transform,
}

/// One named structural entity inside a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityRecord {
    pub name: String,
    pub kind: EntityKind,
    pub transform: Transform,
    /// Only push records carry parts; ordered bar first, then holder.
    pub parts: Vec<PushPart>,
}

impl EntityRecord {
    pub fn new(kind: EntityKind, name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            kind,
            transform,
            parts: Vec::new(),
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.kind, self.name.clone())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub position: [f64; 3],
    pub target: [f64; 3],
}

/// One snapshot of the structure. Index in the frame list defines time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub joints: Vec<EntityRecord>,
    pub pushes: Vec<EntityRecord>,
    pub pulls: Vec<EntityRecord>,
    pub camera: Option<CameraRecord>,
}

impl Frame {
    pub fn records(&self, kind: EntityKind) -> &[EntityRecord] {
        match kind {
            EntityKind::Joint => &self.joints,
            EntityKind::Push => &self.pushes,
            EntityKind::Pull => &self.pulls,
        }
    }

    pub(crate) fn records_mut(&mut self, kind: EntityKind) -> &mut Vec<EntityRecord> {
        match kind {
            EntityKind::Joint => &mut self.joints,
            EntityKind::Push => &mut self.pushes,
            EntityKind::Pull => &mut self.pulls,
        }
    }

    /// All entity records in emission order: joints, pushes, pulls, each in listing order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityRecord> {
        self.joints
            .iter()
            .chain(self.pushes.iter())
            .chain(self.pulls.iter())
    }

    pub fn entity_count(&self) -> usize {
        self.joints.len() + self.pushes.len() + self.pulls.len()
    }
}

/// A fully parsed input document.
#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    /// Capture frame rate declared by the input.
    pub fps: f64,
    pub frames: Vec<Frame>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities_iterate_in_kind_order() {
        let frame = Frame {
            joints: vec![EntityRecord::new(EntityKind::Joint, "J1", Transform::IDENTITY)],
            pushes: vec![EntityRecord::new(EntityKind::Push, "P1", Transform::IDENTITY)],
            pulls: vec![
                EntityRecord::new(EntityKind::Pull, "L2", Transform::IDENTITY),
                EntityRecord::new(EntityKind::Pull, "L1", Transform::IDENTITY),
            ],
            camera: None,
        };
        let names: Vec<&str> = frame.entities().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["J1", "P1", "L2", "L1"]);
        assert_eq!(frame.entity_count(), 4);
    }

    #[test]
    fn part_names_follow_parent() {
        assert_eq!(PartRole::Bar.child_name("P7"), "P7_Bar");
        assert_eq!(PartRole::Holder.child_name("P7"), "P7_Holder");
    }

    #[test]
    fn translation_lands_in_last_column() {
        let pose = Transform::from_translation(1.0, 2.0, 3.0).decompose().unwrap();
        assert_eq!(pose.position, [1.0, 2.0, 3.0]);
    }
}
