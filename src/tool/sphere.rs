use glam::Vec3;

use crate::tool::{ Tool, AABB };

/// Ball with density 1 at the center falling off linearly to 0 at `radius`.
#[derive(Clone, Copy, Debug)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius,
        }
    }
}

impl Tool for Sphere {
    fn value_unclamped(&self, pos: Vec3) -> f32 {
        1.0 - (pos - self.center).length() / self.radius
    }

    fn aabb(&self) -> AABB {
        AABB::from_radius(self.center, self.radius)
    }
}

#[test]
fn sphere_falloff() {
    let sphere = Sphere::new(Vec3::splat(10.0), 4.0);
    assert_eq!(sphere.value(Vec3::splat(10.0)), 1.0);
    assert_eq!(sphere.value(Vec3::new(12.0, 10.0, 10.0)), 0.5);
    assert_eq!(sphere.value(Vec3::new(20.0, 10.0, 10.0)), 0.0);
    assert!(sphere.value_unclamped(Vec3::new(20.0, 10.0, 10.0)) < 0.0);
}
