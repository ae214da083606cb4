//! Local transform and parent-chain composition.
//!
//! A [`Transform`] is always expressed in its parent's space. Scene-space
//! values are derived by folding transforms from the root down with
//! [`Transform::then`], using the same rules as a classic scene node:
//!
//! ```text
//! position = parent.position + parent.rotation * (parent.scale * local.position)
//! rotation = parent.rotation * local.rotation
//! scale    = parent.scale * local.scale
//! ```

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position, rotation and per-axis scale relative to a parent frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// Offset from the parent origin.
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Per-axis scale factor.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Compose a child transform onto this one.
    ///
    /// `self` is the parent's scene-space transform and `local` the child's
    /// parent-relative transform; the result is the child in scene space.
    #[must_use]
    pub fn then(&self, local: &Transform) -> Transform {
        Transform {
            position: self.transform_point(local.position),
            rotation: self.rotation * local.rotation,
            scale: self.scale * local.scale,
        }
    }

    /// Map a point from this transform's local space into its parent space.
    #[must_use]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * (self.scale * point)
    }

    /// Inverse of [`Transform::transform_point`].
    ///
    /// Zero scale axes collapse, so the result on those axes is not finite.
    #[must_use]
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        (self.rotation.inverse() * (point - self.position)) / self.scale
    }

    /// Express a scene-space rotation relative to this frame.
    #[must_use]
    pub fn inverse_rotation(&self, rotation: Quat) -> Quat {
        self.rotation.inverse() * rotation
    }

    /// Express a scene-space scale relative to this frame.
    #[must_use]
    pub fn inverse_scale(&self, scale: Vec3) -> Vec3 {
        scale / self.scale
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Shortest-arc rotation taking the `from` axis onto the `to` axis.
///
/// Returns `None` when either vector has zero length.
#[must_use]
pub fn rotation_between(from: Vec3, to: Vec3) -> Option<Quat> {
    let from = from.try_normalize()?;
    let to = to.try_normalize()?;
    Some(Quat::from_rotation_arc(from, to))
}
