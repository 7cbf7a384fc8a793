//! Matrix decomposition and orientation helpers.
//!
//! Matrices arrive as 16 column-major floats: element `i` sits at row `i % 4`, column `i / 4`.
//! Quaternions are stored as `[x, y, z, w]` throughout the crate.

use nalgebra::{Matrix3, Rotation3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Basis columns shorter than this are treated as collapsed.
pub const MIN_SCALE: f64 = 1e-9;

/// Largest deviation of `Bᵀ·B` from identity accepted for the scale-free basis `B`.
pub const ORTHOGONALITY_TOLERANCE: f64 = 1e-4;

/// Look directions shorter than this leave the camera unrotated.
const MIN_DIRECTION: f64 = 1e-9;

/// Below this `|forward × up|` the fixed up axis is swapped for world Y.
const PARALLEL_EPSILON: f64 = 1e-9;

pub const IDENTITY_QUAT: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    #[error("matrix contains non-finite elements")]
    NonFinite,
    #[error("bottom row is not (0, 0, 0, 1)")]
    NotAffine,
    #[error("scale along axis {axis} is {length:e}, expected > 1e-9")]
    DegenerateScale { axis: usize, length: f64 },
    #[error("basis is not orthogonal after removing scale (deviation {deviation:e})")]
    NotOrthogonal { deviation: f64 },
    #[error("basis is a reflection (negative determinant)")]
    Reflection,
}

/// Translation, rotation and per-axis scale of one affine transform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f64; 3],
    /// Unit quaternion (x, y, z, w)
    pub rotation: [f64; 4],
    pub scale: [f64; 3],
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    pub fn identity() -> Self {
        Self {
            position: [0.0; 3],
            rotation: IDENTITY_QUAT,
            scale: [1.0; 3],
        }
    }

    pub fn unit_quaternion(&self) -> UnitQuaternion<f64> {
        let [x, y, z, w] = self.rotation;
        UnitQuaternion::new_normalize(nalgebra::Quaternion::new(w, x, y, z))
    }

    /// Recompose as translate · rotate · scale, column-major.
    pub fn to_matrix(&self) -> [f64; 16] {
        let rot = self.unit_quaternion().to_rotation_matrix();
        let mut out = [0.0; 16];
        for col in 0..3 {
            for row in 0..3 {
                out[col * 4 + row] = rot[(row, col)] * self.scale[col];
            }
        }
        out[12] = self.position[0];
        out[13] = self.position[1];
        out[14] = self.position[2];
        out[15] = 1.0;
        out
    }

    /// Express `self` in the local space of `parent` (position, rotation and scale separately).
    pub fn relative_to(&self, parent: &Pose) -> Pose {
        let inv = parent.unit_quaternion().inverse();
        let delta = Vector3::from(self.position) - Vector3::from(parent.position);
        let local = inv * delta;
        let rotation = inv * self.unit_quaternion();
        Pose {
            position: [
                local.x / parent.scale[0],
                local.y / parent.scale[1],
                local.z / parent.scale[2],
            ],
            rotation: quat_to_array(&rotation),
            scale: [
                self.scale[0] / parent.scale[0],
                self.scale[1] / parent.scale[1],
                self.scale[2] / parent.scale[2],
            ],
        }
    }

    /// Place a local `offset` under `self`. Inverse of [`Pose::relative_to`].
    pub fn compose(&self, offset: &Pose) -> Pose {
        let rot = self.unit_quaternion();
        let scaled = Vector3::new(
            offset.position[0] * self.scale[0],
            offset.position[1] * self.scale[1],
            offset.position[2] * self.scale[2],
        );
        let world = Vector3::from(self.position) + rot * scaled;
        Pose {
            position: [world.x, world.y, world.z],
            rotation: quat_to_array(&(rot * offset.unit_quaternion())),
            scale: [
                self.scale[0] * offset.scale[0],
                self.scale[1] * offset.scale[1],
                self.scale[2] * offset.scale[2],
            ],
        }
    }
}

#[inline]
fn quat_to_array(q: &UnitQuaternion<f64>) -> [f64; 4] {
    [q.i, q.j, q.k, q.w]
}

#[inline]
fn dot4(a: [f64; 4], b: [f64; 4]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

/// Split a column-major affine matrix into position, rotation and scale.
///
/// The quaternion sign is whatever the conversion yields; use [`align_hemisphere`] before
/// keyframing consecutive rotations.
pub fn decompose(m: &[f64; 16]) -> Result<Pose, MatrixError> {
    if m.iter().any(|v| !v.is_finite()) {
        return Err(MatrixError::NonFinite);
    }
    if m[3].abs() > ORTHOGONALITY_TOLERANCE
        || m[7].abs() > ORTHOGONALITY_TOLERANCE
        || m[11].abs() > ORTHOGONALITY_TOLERANCE
        || (m[15] - 1.0).abs() > ORTHOGONALITY_TOLERANCE
    {
        return Err(MatrixError::NotAffine);
    }

    let mut basis = Matrix3::<f64>::zeros();
    let mut scale = [0.0; 3];
    for axis in 0..3 {
        let column = Vector3::new(m[axis * 4], m[axis * 4 + 1], m[axis * 4 + 2]);
        let length = column.norm();
        if length <= MIN_SCALE {
            return Err(MatrixError::DegenerateScale { axis, length });
        }
        scale[axis] = length;
        basis.set_column(axis, &(column / length));
    }

    let deviation = (basis.transpose() * basis - Matrix3::identity()).amax();
    if deviation > ORTHOGONALITY_TOLERANCE {
        return Err(MatrixError::NotOrthogonal { deviation });
    }
    if basis.determinant() < 0.0 {
        return Err(MatrixError::Reflection);
    }

    let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis));
    let rotation = UnitQuaternion::new_normalize(rotation.into_inner());
    Ok(Pose {
        position: [m[12], m[13], m[14]],
        rotation: quat_to_array(&rotation),
        scale,
    })
}

/// Flip `q` onto the hemisphere of `previous` so interpolation takes the short arc.
#[inline]
pub fn align_hemisphere(previous: Option<[f64; 4]>, q: [f64; 4]) -> [f64; 4] {
    match previous {
        Some(prev) if dot4(prev, q) < 0.0 => [-q[0], -q[1], -q[2], -q[3]],
        _ => q,
    }
}

/// Camera orientation looking from `position` toward `target`.
///
/// Local -Z tracks the look direction and local +Y leans toward world +Z. When the look
/// direction is parallel to world Z the up hint falls back to world Y.
pub fn look_at_rotation(position: [f64; 3], target: [f64; 3]) -> [f64; 4] {
    let dir = Vector3::from(target) - Vector3::from(position);
    if dir.norm() <= MIN_DIRECTION {
        return IDENTITY_QUAT;
    }
    let forward = Unit::new_normalize(dir);
    let mut up = Vector3::z();
    if forward.cross(&up).norm() <= PARALLEL_EPSILON {
        up = Vector3::y();
    }
    let rotation = UnitQuaternion::face_towards(&(-forward.into_inner()), &up);
    quat_to_array(&rotation)
}
