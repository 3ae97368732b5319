use glam::UVec3;

use crate::{
    raycast::VoxelHit,
    volume::VoxelVolume,
};

/// Action represents operations to perform on a VoxelVolume, either with a
/// Tool or at a raycast hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action
{
    /// Subtract material from the volume
    Remove,
    /// Add material to the volume
    Place,
}

impl Action
{
    /// Blends a tool density `val` into an existing voxel.
    pub fn apply_value(&self, point: &mut f32, val: f32)
    {
        match self {
            Action::Place => {
                *point = point.max(val);
            },
            Action::Remove => {
                *point = point.min(1.0 - val);
            },
        }
    }

    /// Changes density by `amount` at a raycast hit and returns the voxel
    /// written. The stored value is clamped to `[0, 1]`.
    ///
    /// Removing always erodes the hit voxel. Placing fills the hit voxel
    /// until it is fully dense, then grows into the surface voxel in front
    /// of it.
    pub fn apply(&self, volume: &mut VoxelVolume, hit: &VoxelHit, amount: f32) -> UVec3
    {
        let (target, value) = match self {
            Action::Remove => (hit.coord, hit.value - amount),
            Action::Place if hit.value < 1.0 => (hit.coord, hit.value + amount),
            Action::Place => (hit.surface, hit.surface_value + amount),
        };

        volume.set(target, value.clamp(0.0, 1.0));
        target
    }
}

#[cfg(test)]
fn hit_at(volume: &VoxelVolume, coord: UVec3, surface: UVec3) -> VoxelHit {
    VoxelHit {
        coord,
        value: volume.get(coord),
        surface,
        surface_value: volume.get(surface),
    }
}

#[test]
fn remove_clamps_at_zero() {
    use glam::{ Vec3, uvec3 };

    let mut volume = VoxelVolume::new(UVec3::splat(4), Vec3::ONE);
    let (coord, surface) = (uvec3(2, 2, 2), uvec3(2, 2, 1));
    volume.set(coord, 0.3);

    for _ in 0..5 {
        let hit = hit_at(&volume, coord, surface);
        assert_eq!(Action::Remove.apply(&mut volume, &hit, 0.25), coord);
        let value = volume.get(coord);
        assert!((0.0..=1.0).contains(&value));
    }
    assert_eq!(volume.get(coord), 0.0);
}

#[test]
fn place_fills_hit_then_grows_surface() {
    use glam::{ Vec3, uvec3 };

    let mut volume = VoxelVolume::new(UVec3::splat(4), Vec3::ONE);
    let (coord, surface) = (uvec3(2, 2, 2), uvec3(2, 2, 1));
    volume.set(coord, 0.6);

    let hit = hit_at(&volume, coord, surface);
    assert_eq!(Action::Place.apply(&mut volume, &hit, 0.7), coord);
    assert_eq!(volume.get(coord), 1.0);

    for _ in 0..4 {
        let hit = hit_at(&volume, coord, surface);
        assert_eq!(Action::Place.apply(&mut volume, &hit, 0.4), surface);
        assert_eq!(volume.get(coord), 1.0);
    }
    assert_eq!(volume.get(surface), 1.0);
}

#[test]
fn apply_value_blends() {
    let mut value = 0.4;
    Action::Place.apply_value(&mut value, 0.7);
    assert_eq!(value, 0.7);
    Action::Place.apply_value(&mut value, 0.2);
    assert_eq!(value, 0.7);
    Action::Remove.apply_value(&mut value, 0.5);
    assert_eq!(value, 0.5);
    Action::Remove.apply_value(&mut value, 1.0);
    assert_eq!(value, 0.0);
}
