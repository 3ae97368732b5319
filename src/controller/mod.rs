//! Per-frame first-person editing: fly around, look at a voxel, dig or grow.

mod input;
pub use input::*;

mod camera;
pub use camera::*;

use glam::{ Mat4, UVec3, Vec3, vec3 };

use crate::{
    config::MarchConfig,
    mesh::{ IndexedMesh, MeshIndexer, NormalMode },
    raycast::{ Ray, VoxelHit },
    scene::{ MeshRenderer, VoxelScene },
    tool::Action,
};

const MAX_PITCH: f32 = 89.0;

/// Drives a [`Camera`] from [`Input`] and edits the voxel under the
/// crosshair.
#[derive(Debug, Clone)]
pub struct Spectator {
    config: MarchConfig,
    looking_at: Option<VoxelHit>,
    highlight_mesh: IndexedMesh,
}

impl Default for Spectator {
    fn default() -> Self {
        Self::new(MarchConfig::default())
    }
}

impl Spectator {
    pub fn new(config: MarchConfig) -> Self {
        Self {
            config,
            looking_at: None,
            highlight_mesh: voxel_cube(),
        }
    }

    pub fn config(&self) -> &MarchConfig {
        &self.config
    }

    /// The voxel hit by the last [`update`](Self::update), if any.
    pub fn looking_at(&self) -> Option<&VoxelHit> {
        self.looking_at.as_ref()
    }

    /// Runs one frame: movement, mouse look, target query, edits.
    ///
    /// Edits go through [`VoxelScene::volume_mut`], so the scene remeshes on
    /// its next [`VoxelScene::update`].
    pub fn update<I, C>(&mut self, dt: f32, input: &mut I, camera: &mut C, scene: &mut VoxelScene)
    where
        I: Input + ?Sized,
        C: Camera + ?Sized,
    {
        self.update_movement(dt, input, camera);
        self.update_look(input, camera);

        let ray = Ray::new(camera.location(), camera.forward());
        self.looking_at = scene.raycast(ray, self.config.ray_distance);

        if let Some(hit) = self.looking_at {
            let amount = self.config.interaction_rate * dt;
            let volume = scene.volume_mut();

            if input.is_button_down(Button::Primary) {
                Action::Remove.apply(volume, &hit, amount);
            }
            if input.is_button_down(Button::Secondary) {
                Action::Place.apply(volume, &hit, amount);
            }
        }
    }

    fn update_movement<I, C>(&self, dt: f32, input: &I, camera: &mut C)
    where
        I: Input + ?Sized,
        C: Camera + ?Sized,
    {
        let speed = self.config.move_speed * dt;
        let mut offset = Vec3::ZERO;

        if input.is_key_down(Key::Forward) {
            offset += camera.forward();
        }
        if input.is_key_down(Key::Back) {
            offset -= camera.forward();
        }
        if input.is_key_down(Key::Right) {
            offset += camera.right();
        }
        if input.is_key_down(Key::Left) {
            offset -= camera.right();
        }
        if input.is_key_down(Key::Up) {
            offset += Vec3::Y;
        }
        if input.is_key_down(Key::Down) {
            offset -= Vec3::Y;
        }

        if offset != Vec3::ZERO {
            camera.set_location(camera.location() + offset * speed);
        }
    }

    fn update_look<I, C>(&self, input: &mut I, camera: &mut C)
    where
        I: Input + ?Sized,
        C: Camera + ?Sized,
    {
        if input.is_button_pressed(Button::Middle) {
            let grabbed = input.is_grabbed();
            input.set_grabbed(!grabbed);
        }

        if !input.is_grabbed() {
            return;
        }

        let turn = self.config.look_sensitivity;
        let velocity = input.pointer_velocity();
        let mut rotation = camera.euler() + vec3(-velocity.y * turn, -velocity.x * turn, 0.0);
        rotation.x = rotation.x.clamp(-MAX_PITCH, MAX_PITCH);
        rotation.y = rotation.y.rem_euclid(360.0);
        camera.set_euler(rotation);
    }

    /// Hit voxel and placement voxel, for drawing a selection marker.
    pub fn highlight(&self) -> Option<[UVec3; 2]> {
        self.looking_at.map(|hit| [hit.coord, hit.surface])
    }

    /// Draws a unit box over the hit and placement voxels.
    pub fn draw<R: MeshRenderer + ?Sized>(&self, renderer: &mut R, scene: &VoxelScene) {
        let Some(cells) = self.highlight() else {
            return;
        };

        renderer.bind();
        renderer.prepare_mesh(&self.highlight_mesh);
        for cell in cells {
            renderer.render_instance(scene.transform() * Mat4::from_translation(cell.as_vec3()));
        }
        renderer.unbind();
    }
}

/// Unit box covering one voxel, outward-facing.
fn voxel_cube() -> IndexedMesh {
    let corners = [
        vec3(0.0, 0.0, 0.0),
        vec3(1.0, 0.0, 0.0),
        vec3(0.0, 0.0, 1.0),
        vec3(1.0, 0.0, 1.0),
        vec3(0.0, 1.0, 0.0),
        vec3(1.0, 1.0, 0.0),
        vec3(0.0, 1.0, 1.0),
        vec3(1.0, 1.0, 1.0),
    ];
    let triangles: [usize; 36] = [
        0,1,2, 2,1,3,
        4,6,5, 5,6,7,

        2,3,6, 6,3,7,
        3,1,7, 1,5,7,

        1,0,4, 1,4,5,
        0,2,4, 2,6,4,
    ];

    let mut indexer = MeshIndexer::new();
    for index in triangles {
        indexer.push(corners[index]);
    }
    indexer.finish(NormalMode::Normalized)
}

#[cfg(test)]
use glam::{ Vec2, uvec3 };

#[cfg(test)]
use crate::{ marching_cubes::MeshBuilder, volume::VoxelVolume };

#[cfg(test)]
fn test_scene() -> VoxelScene {
    // Solid floor at y = 0..=1 in a 16^3 volume
    let mut volume = VoxelVolume::new(UVec3::splat(16), Vec3::ONE);
    for x in 0..16 {
        for z in 0..16 {
            volume.set(uvec3(x, 0, z), 1.0);
            volume.set(uvec3(x, 1, z), 1.0);
        }
    }
    VoxelScene::new(volume, MeshBuilder::new(0.15))
}

#[cfg(test)]
fn looking_down(location: Vec3) -> FlyCamera {
    FlyCamera {
        location,
        euler: vec3(-MAX_PITCH, 0.0, 0.0),
    }
}

#[test]
fn moves_along_camera_axes() {
    let spectator = Spectator::new(MarchConfig { move_speed: 2.0, ..Default::default() });
    let mut camera = FlyCamera::new(Vec3::ZERO);
    let mut input = InputState::new();
    input.keys.insert(Key::Forward);
    input.keys.insert(Key::Up);

    spectator.update_movement(0.5, &input, &mut camera);
    assert!((camera.location - vec3(0.0, 1.0, -1.0)).length() < 1e-6);
}

#[test]
fn look_requires_grab_and_clamps_pitch() {
    let spectator = Spectator::default();
    let mut camera = FlyCamera::new(Vec3::ZERO);
    let mut input = InputState::new();
    input.pointer_velocity = Vec2::new(10.0, -10000.0);

    spectator.update_look(&mut input, &mut camera);
    assert_eq!(camera.euler, Vec3::ZERO);

    input.press(Button::Middle);
    spectator.update_look(&mut input, &mut camera);
    assert!(input.grabbed);
    assert_eq!(camera.euler.x, MAX_PITCH);
    assert!((0.0..360.0).contains(&camera.euler.y));
    assert!((camera.euler.y - (360.0 - 10.0 * spectator.config().look_sensitivity)).abs() < 1e-3);

    // Pressing again releases
    input.end_frame();
    input.release(Button::Middle);
    input.press(Button::Middle);
    spectator.update_look(&mut input, &mut camera);
    assert!(!input.grabbed);
}

#[test]
fn digs_and_builds_where_it_looks() {
    let mut scene = test_scene();
    let mut spectator = Spectator::new(MarchConfig { interaction_rate: 1.0, ..Default::default() });
    let mut camera = looking_down(vec3(8.5, 10.0, 8.5));
    let mut input = InputState::new();

    spectator.update(0.0, &mut input, &mut camera, &mut scene);
    let hit = *spectator.looking_at().unwrap();
    assert_eq!(hit.coord.y, 1);
    assert_eq!(hit.surface.y, 2);
    assert!(!scene.update());

    // Growing a solid voxel goes into the empty cell above it
    input.press(Button::Secondary);
    spectator.update(0.25, &mut input, &mut camera, &mut scene);
    assert_eq!(scene.volume().get(hit.surface), 0.25);
    assert!(scene.update());

    // The grown voxel is past the iso-level, so digging takes it first
    input.release(Button::Secondary);
    input.press(Button::Primary);
    spectator.update(0.5, &mut input, &mut camera, &mut scene);
    assert_eq!(spectator.looking_at().unwrap().coord, hit.surface);
    assert_eq!(scene.volume().get(hit.surface), 0.0);
    assert_eq!(scene.volume().get(hit.coord), 1.0);

    spectator.update(0.5, &mut input, &mut camera, &mut scene);
    assert_eq!(spectator.looking_at().unwrap().coord, hit.coord);
    assert_eq!(scene.volume().get(hit.coord), 0.5);
}

#[test]
fn draws_highlight_boxes() {
    use crate::scene::RecordingRenderer;

    let mut scene = test_scene();
    let mut spectator = Spectator::default();
    let mut renderer = RecordingRenderer::default();

    spectator.draw(&mut renderer, &scene);
    assert!(renderer.calls.is_empty());

    let mut camera = looking_down(vec3(8.5, 10.0, 8.5));
    spectator.update(0.0, &mut InputState::new(), &mut camera, &mut scene);
    spectator.draw(&mut renderer, &scene);
    assert_eq!(renderer.calls, vec!["bind", "prepare 12", "render", "render", "unbind"]);

    let [coord, surface] = spectator.highlight().unwrap();
    assert_eq!(renderer.transforms[0], Mat4::from_translation(coord.as_vec3()));
    assert_eq!(renderer.transforms[1], Mat4::from_translation(surface.as_vec3()));
}

#[test]
fn voxel_cube_faces_outward() {
    let cube = voxel_cube();
    assert_eq!(cube.vertex_count(), 8);
    assert_eq!(cube.triangle_count(), 12);

    let center = Vec3::splat(0.5);
    for [a, b, c] in cube.faces() {
        let (a, b, c) = (cube.vertices[a as usize], cube.vertices[b as usize], cube.vertices[c as usize]);
        let normal = (b - a).cross(c - a);
        assert!(normal.dot((a + b + c) / 3.0 - center) > 0.0);
    }
}
