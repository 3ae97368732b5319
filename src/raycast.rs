//! Grid traversal against a [`VoxelVolume`].
//!
//! Voxel `(i, j, k)` is the unit box `[i, i+1) x [j, j+1) x [k, k+1)` in
//! volume-local coordinates. Rays step through these boxes one boundary at
//! a time (Amanatides & Woo) until they find a solid voxel, leave the
//! volume or run out of distance.

use glam::{ IVec3, UVec3, Vec3 };

use crate::volume::VoxelVolume;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
        }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// First solid voxel along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelHit {
    /// The solid voxel.
    pub coord: UVec3,
    pub value: f32,
    /// The last non-solid voxel passed before `coord`; where additive edits
    /// go. Equal to `coord` when the ray's first voxel inside the volume is
    /// already solid.
    pub surface: UVec3,
    pub surface_value: f32,
}

/// Finds the first voxel with density `>= iso_level` along `ray`.
///
/// `max_distance` is measured in units of `ray.direction`'s length, so a
/// normalized direction gives a plain distance. Rays starting outside the
/// volume are clipped to it first. Returns `None` when nothing solid is
/// found before leaving the volume or passing `max_distance`.
pub fn raycast(volume: &VoxelVolume, ray: Ray, max_distance: f32, iso_level: f32) -> Option<VoxelHit> {
    let dir = ray.direction;
    if !volume.is_initialized() || !dir.is_finite() || dir == Vec3::ZERO || !(max_distance >= 0.0) {
        return None;
    }

    let (t_enter, t_exit) = volume.bounds().ray_intersection(ray.origin, dir)?;
    let t_start = t_enter.max(0.0);
    let t_end = t_exit.min(max_distance);
    if t_start > t_end {
        return None;
    }

    // Entry points on the far faces floor to one past the last voxel
    let last = volume.dimensions().as_ivec3() - 1;
    let mut cell = ray.at(t_start).floor().as_ivec3().clamp(IVec3::ZERO, last);

    let mut step = [0i32; 3];
    let mut t_max = [f32::INFINITY; 3];
    let mut t_delta = [f32::INFINITY; 3];
    for axis in 0..3 {
        let d = dir[axis];
        if d > 0.0 {
            step[axis] = 1;
            t_max[axis] = ((cell[axis] + 1) as f32 - ray.origin[axis]) / d;
            t_delta[axis] = 1.0 / d;
        }
        else if d < 0.0 {
            step[axis] = -1;
            t_max[axis] = (cell[axis] as f32 - ray.origin[axis]) / d;
            t_delta[axis] = -1.0 / d;
        }
    }

    let mut previous: Option<(UVec3, f32)> = None;
    loop {
        let coord = cell.as_uvec3();
        let value = volume.get(coord);
        if value >= iso_level {
            let (surface, surface_value) = previous.unwrap_or((coord, value));
            return Some(VoxelHit {
                coord,
                value,
                surface,
                surface_value,
            });
        }
        previous = Some((coord, value));

        let mut axis = 0;
        for candidate in 1..3 {
            if t_max[candidate] < t_max[axis] {
                axis = candidate;
            }
        }

        if t_max[axis] > t_end {
            return None;
        }
        cell[axis] += step[axis];
        t_max[axis] += t_delta[axis];

        if !volume.contains(cell) {
            return None;
        }
    }
}

#[cfg(test)]
use glam::{ uvec3, vec3 };

#[cfg(test)]
fn volume_with(voxels: &[UVec3]) -> VoxelVolume {
    let mut volume = VoxelVolume::new(UVec3::splat(8), Vec3::ONE);
    for voxel in voxels {
        volume.set(*voxel, 1.0);
    }
    volume
}

#[test]
fn hits_single_voxel_from_outside() {
    let volume = volume_with(&[uvec3(4, 4, 4)]);
    let ray = Ray::new(vec3(4.5, 4.5, -2.0), Vec3::Z);

    let hit = raycast(&volume, ray, 100.0, 0.5).unwrap();
    assert_eq!(hit.coord, uvec3(4, 4, 4));
    assert_eq!(hit.value, 1.0);
    assert_eq!(hit.surface, uvec3(4, 4, 3));
    assert_eq!(hit.surface_value, 0.0);
}

#[test]
fn hits_from_inside_along_negative_axis() {
    let volume = volume_with(&[uvec3(1, 6, 2)]);
    let ray = Ray::new(vec3(6.5, 6.5, 2.5), -Vec3::X);

    let hit = raycast(&volume, ray, 100.0, 0.5).unwrap();
    assert_eq!(hit.coord, uvec3(1, 6, 2));
    assert_eq!(hit.surface, uvec3(2, 6, 2));
}

#[test]
fn diagonal_ray_surface_is_face_neighbour() {
    let volume = volume_with(&[uvec3(5, 5, 5)]);
    let ray = Ray::new(vec3(0.3, 0.6, 0.45), vec3(1.0, 1.0, 1.0).normalize());

    let hit = raycast(&volume, ray, 100.0, 0.5).unwrap();
    assert_eq!(hit.coord, uvec3(5, 5, 5));
    let offset = hit.coord.as_ivec3() - hit.surface.as_ivec3();
    assert_eq!(offset.abs().to_array().iter().sum::<i32>(), 1);
}

#[test]
fn first_cell_solid_is_self_referential() {
    let volume = volume_with(&[uvec3(0, 3, 3)]);
    let ray = Ray::new(vec3(-5.0, 3.5, 3.5), Vec3::X);

    let hit = raycast(&volume, ray, 100.0, 0.5).unwrap();
    assert_eq!(hit.coord, uvec3(0, 3, 3));
    assert_eq!(hit.surface, hit.coord);
    assert_eq!(hit.surface_value, hit.value);
}

#[test]
fn misses() {
    let volume = volume_with(&[uvec3(4, 4, 4)]);

    // Pointing away
    assert!(raycast(&volume, Ray::new(vec3(4.5, 4.5, -2.0), -Vec3::Z), 100.0, 0.5).is_none());
    // Passing beside the volume
    assert!(raycast(&volume, Ray::new(vec3(-1.0, 4.5, 4.5), Vec3::Y), 100.0, 0.5).is_none());
    // Passing through without touching the voxel
    assert!(raycast(&volume, Ray::new(vec3(2.5, 4.5, -2.0), Vec3::Z), 100.0, 0.5).is_none());
    // Too short
    assert!(raycast(&volume, Ray::new(vec3(4.5, 4.5, -2.0), Vec3::Z), 5.0, 0.5).is_none());
    // Degenerate
    assert!(raycast(&volume, Ray::new(vec3(4.5, 4.5, -2.0), Vec3::ZERO), 100.0, 0.5).is_none());
    assert!(raycast(&VoxelVolume::default(), Ray::new(Vec3::ZERO, Vec3::X), 100.0, 0.5).is_none());
}

#[test]
fn distance_budget_reaches_voxel_boundary() {
    let volume = volume_with(&[uvec3(4, 4, 4)]);
    let ray = Ray::new(vec3(4.5, 4.5, -2.0), Vec3::Z);

    // The voxel starts at z = 4, six units away
    assert!(raycast(&volume, ray, 6.0, 0.5).is_some());
    assert!(raycast(&volume, ray, 5.9, 0.5).is_none());
}

#[test]
fn entry_on_far_face() {
    let volume = volume_with(&[uvec3(7, 2, 2)]);
    let ray = Ray::new(vec3(12.0, 2.5, 2.5), -Vec3::X);

    let hit = raycast(&volume, ray, 100.0, 0.5).unwrap();
    assert_eq!(hit.coord, uvec3(7, 2, 2));
    assert_eq!(hit.surface, hit.coord);
}
