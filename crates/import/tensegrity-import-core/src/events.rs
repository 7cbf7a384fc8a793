//! Event stream handed to a host scene.
//!
//! Events only describe intent; hosts map them onto concrete objects and keyframes
//! (see [`crate::host::apply_events`]).

use serde::{Deserialize, Serialize};

use crate::data::{EntityKind, PartRole};
use crate::matrix::Pose;

/// Every object kind a host may be asked to create or animate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    Joint,
    Push,
    Pull,
    Bar,
    Holder,
    Camera,
}

impl From<EntityKind> for ObjectKind {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Joint => ObjectKind::Joint,
            EntityKind::Push => ObjectKind::Push,
            EntityKind::Pull => ObjectKind::Pull,
        }
    }
}

impl From<PartRole> for ObjectKind {
    fn from(role: PartRole) -> Self {
        match role {
            PartRole::Bar => ObjectKind::Bar,
            PartRole::Holder => ObjectKind::Holder,
        }
    }
}

/// Which emission algorithm runs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmitMode {
    /// Everything exists for the whole animation.
    #[default]
    Plain,
    /// Entities are bracketed by visibility windows.
    Construction,
}

/// A push child created together with its parent, placed at a fixed local offset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChildPart {
    pub name: String,
    pub role: PartRole,
    /// Pose relative to the parent push.
    pub offset: Pose,
}

/// One instruction for the host. Frame indices are 1-based.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ImportEvent {
    CreateEntity {
        name: String,
        kind: EntityKind,
        initial_transform: Pose,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<ChildPart>,
    },
    SetTransform {
        kind: ObjectKind,
        name: String,
        frame_index: usize,
        position: [f64; 3],
        /// quat (x,y,z,w), hemisphere-aligned with the previous key of the same object
        rotation: [f64; 4],
        scale: [f64; 3],
    },
    /// Step-only; hosts must key it with constant interpolation.
    SetVisibility {
        kind: ObjectKind,
        name: String,
        frame_index: usize,
        visible: bool,
    },
    CreateCamera {
        name: String,
        frame_index: usize,
        position: [f64; 3],
        orientation: [f64; 4],
    },
}

impl ImportEvent {
    pub fn name(&self) -> &str {
        match self {
            ImportEvent::CreateEntity { name, .. }
            | ImportEvent::SetTransform { name, .. }
            | ImportEvent::SetVisibility { name, .. }
            | ImportEvent::CreateCamera { name, .. } => name,
        }
    }

    pub fn frame_index(&self) -> Option<usize> {
        match self {
            ImportEvent::CreateEntity { .. } => None,
            ImportEvent::SetTransform { frame_index, .. }
            | ImportEvent::SetVisibility { frame_index, .. }
            | ImportEvent::CreateCamera { frame_index, .. } => Some(*frame_index),
        }
    }

    /// Events that translate into at least one keyframe on the host.
    #[inline]
    pub fn is_keyframe(&self) -> bool {
        !matches!(self, ImportEvent::CreateEntity { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_cover_every_variant() {
        let create = ImportEvent::CreateEntity {
            name: "J1".into(),
            kind: EntityKind::Joint,
            initial_transform: Pose::identity(),
            children: Vec::new(),
        };
        let vis = ImportEvent::SetVisibility {
            kind: ObjectKind::Joint,
            name: "J1".into(),
            frame_index: 3,
            visible: false,
        };
        assert_eq!(create.name(), "J1");
        assert_eq!(create.frame_index(), None);
        assert!(!create.is_keyframe());
        assert_eq!(vis.frame_index(), Some(3));
        assert!(vis.is_keyframe());
    }

    #[test]
    fn childless_creates_omit_children_in_json() {
        let create = ImportEvent::CreateEntity {
            name: "L1".into(),
            kind: EntityKind::Pull,
            initial_transform: Pose::identity(),
            children: Vec::new(),
        };
        let json = serde_json::to_value(&create).unwrap();
        assert!(json["CreateEntity"].get("children").is_none());
        let back: ImportEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, create);
    }
}
