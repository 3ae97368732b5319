//! Density shapes and the edit actions that write them into a volume.

mod sphere;
pub use sphere::*;

mod cuboid;
pub use cuboid::*;

mod aabb;
pub use aabb::*;

mod action;
pub use action::*;

use glam::Vec3;

/// A density shape in volume-local voxel coordinates.
pub trait Tool {
    fn value(&self, pos: Vec3) -> f32 {
        self.value_unclamped(pos).clamp(0.0,1.0)
    }

    fn value_unclamped(&self, pos: Vec3) -> f32;

    /// Region outside of which `value` is always 0.
    fn aabb(&self) -> AABB;
}
