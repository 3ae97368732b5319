use glam::Vec3;

use crate::tool::{ Tool, AABB };

/// Solid box: density 1 inside (boundary included), 0 outside.
#[derive(Clone, Copy, Debug)]
pub struct Cuboid {
    pub aabb: AABB,
}

impl Cuboid {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self {
            aabb: AABB::new(start, end),
        }
    }

    pub fn centered(center: Vec3, extents: Vec3) -> Self {
        Self {
            aabb: AABB::from_extents(center, extents),
        }
    }
}

impl Tool for Cuboid {
    fn value_unclamped(&self, pos: Vec3) -> f32 {
        if self.aabb.contains(pos) { 1.0 } else { 0.0 }
    }

    fn aabb(&self) -> AABB {
        self.aabb
    }
}

#[test]
fn cuboid_carves_box() {
    use glam::{ UVec3, uvec3 };
    use crate::{ tool::Action, volume::VoxelVolume };

    let mut volume = VoxelVolume::filled(UVec3::splat(6), Vec3::ONE, 1.0);
    let cuboid = Cuboid::centered(Vec3::splat(2.5), Vec3::splat(3.0));
    assert_eq!(cuboid.aabb, AABB::new(Vec3::ONE, Vec3::splat(4.0)));

    volume.apply_tool(&cuboid, Action::Remove);
    assert_eq!(volume.get(uvec3(1, 1, 1)), 0.0);
    assert_eq!(volume.get(uvec3(4, 4, 4)), 0.0);
    assert_eq!(volume.get(uvec3(0, 2, 2)), 1.0);
    assert_eq!(volume.get(uvec3(5, 2, 2)), 1.0);

    let carved = volume.densities().iter().filter(|&&v| v == 0.0).count();
    assert_eq!(carved, 4 * 4 * 4);
}
