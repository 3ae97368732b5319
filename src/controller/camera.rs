use glam::{ EulerRot, Quat, Vec3 };

/// Position and orientation the spectator drives.
///
/// Euler angles are in degrees: `x` pitch, `y` yaw, `z` roll.
pub trait Camera {
    fn location(&self) -> Vec3;
    fn set_location(&mut self, location: Vec3);
    fn euler(&self) -> Vec3;
    fn set_euler(&mut self, euler: Vec3);
    fn forward(&self) -> Vec3;
    fn right(&self) -> Vec3;
}

/// Free-flying camera looking down `-Z` at zero rotation, `+Y` up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlyCamera {
    pub location: Vec3,
    pub euler: Vec3,
}

impl FlyCamera {
    pub fn new(location: Vec3) -> Self {
        Self {
            location,
            euler: Vec3::ZERO,
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.euler.y.to_radians(),
            self.euler.x.to_radians(),
            self.euler.z.to_radians(),
        )
    }
}

impl Camera for FlyCamera {
    fn location(&self) -> Vec3 {
        self.location
    }

    fn set_location(&mut self, location: Vec3) {
        self.location = location;
    }

    fn euler(&self) -> Vec3 {
        self.euler
    }

    fn set_euler(&mut self, euler: Vec3) {
        self.euler = euler;
    }

    fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }

    fn right(&self) -> Vec3 {
        self.rotation() * Vec3::X
    }
}

#[test]
fn fly_camera_axes() {
    let mut camera = FlyCamera::new(Vec3::ZERO);
    assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-6);
    assert!((camera.right() - Vec3::X).length() < 1e-6);

    // Positive pitch looks up
    camera.set_euler(Vec3::new(90.0, 0.0, 0.0));
    assert!((camera.forward() - Vec3::Y).length() < 1e-6);

    // Positive yaw turns left
    camera.set_euler(Vec3::new(0.0, 90.0, 0.0));
    assert!((camera.forward() - Vec3::NEG_X).length() < 1e-6);
    assert!((camera.right() - Vec3::NEG_Z).length() < 1e-6);
}
