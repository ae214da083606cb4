//! # scene_math
//!
//! Math types for the scene graph. Re-exports the [`glam`] vector and
//! quaternion types and defines [`Transform`], the position/rotation/scale
//! triple every node stores relative to its parent.

pub mod transform;

pub use glam::{Quat, Vec3};

pub use transform::{Transform, rotation_between};
