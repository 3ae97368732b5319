use glam::Mat4;

use crate::{
    config::MarchConfig,
    marching_cubes::MeshBuilder,
    mesh::IndexedMesh,
    raycast::{ raycast, Ray, VoxelHit },
    volume::VoxelVolume,
};

/// Draws meshes through whatever graphics backend the host uses.
pub trait MeshRenderer {
    fn bind(&mut self);
    fn prepare_mesh(&mut self, mesh: &IndexedMesh);
    fn render_instance(&mut self, transform: Mat4);
    fn unbind(&mut self);
}

/// A volume and the mesh extracted from it.
///
/// The mesh is rebuilt from [`update`](Self::update) only when the volume
/// has been modified since the last build, so calling `update` every frame
/// costs nothing while the volume sits idle.
#[derive(Debug, Clone)]
pub struct VoxelScene {
    volume: VoxelVolume,
    mesh: IndexedMesh,
    builder: MeshBuilder,
}

impl VoxelScene {
    /// Takes ownership of `volume` and meshes it immediately.
    pub fn new(volume: VoxelVolume, builder: MeshBuilder) -> Self {
        let mut scene = Self {
            volume,
            mesh: IndexedMesh::default(),
            builder,
        };
        scene.rebuild_mesh();
        scene
    }

    pub fn from_config(volume: VoxelVolume, config: &MarchConfig) -> Self {
        Self::new(volume, MeshBuilder::from_config(config))
    }

    pub fn volume(&self) -> &VoxelVolume {
        &self.volume
    }

    /// Edits made through this reference are picked up by the next
    /// [`update`](Self::update).
    pub fn volume_mut(&mut self) -> &mut VoxelVolume {
        &mut self.volume
    }

    pub fn mesh(&self) -> &IndexedMesh {
        &self.mesh
    }

    pub fn builder(&self) -> &MeshBuilder {
        &self.builder
    }

    pub fn iso_level(&self) -> f32 {
        self.builder.iso_level
    }

    /// Rebuilds regardless of the dirty flag, and clears it.
    pub fn rebuild_mesh(&mut self) {
        self.volume.take_dirty();
        self.mesh = self.builder.build(&self.volume);
    }

    /// Rebuilds the mesh if the volume changed. Returns whether it did.
    pub fn update(&mut self) -> bool {
        if !self.volume.take_dirty() {
            return false;
        }

        self.mesh = self.builder.build(&self.volume);
        log::debug!("Remeshed volume: {} triangles", self.mesh.triangle_count());
        true
    }

    /// Object transform of the mesh: the volume's scale.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale(self.volume.scale())
    }

    /// Casts a ray given in render space.
    ///
    /// `max_distance` stays in render-space units when `ray.direction` is
    /// normalized.
    pub fn raycast(&self, ray: Ray, max_distance: f32) -> Option<VoxelHit> {
        let local = Ray::new(
            self.volume.world_to_local(ray.origin),
            self.volume.world_to_local(ray.direction),
        );
        raycast(&self.volume, local, max_distance, self.iso_level())
    }

    pub fn draw<R: MeshRenderer + ?Sized>(&self, renderer: &mut R) {
        if self.mesh.is_empty() {
            return;
        }

        renderer.bind();
        renderer.prepare_mesh(&self.mesh);
        renderer.render_instance(self.transform());
        renderer.unbind();
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingRenderer {
    pub calls: Vec<String>,
    pub transforms: Vec<Mat4>,
}

#[cfg(test)]
impl MeshRenderer for RecordingRenderer {
    fn bind(&mut self) {
        self.calls.push("bind".into());
    }

    fn prepare_mesh(&mut self, mesh: &IndexedMesh) {
        self.calls.push(format!("prepare {}", mesh.triangle_count()));
    }

    fn render_instance(&mut self, transform: Mat4) {
        self.calls.push("render".into());
        self.transforms.push(transform);
    }

    fn unbind(&mut self) {
        self.calls.push("unbind".into());
    }
}

#[cfg(test)]
use glam::{ UVec3, Vec3, uvec3, vec3 };

#[test]
fn remeshes_once_per_change() {
    let volume = VoxelVolume::new(UVec3::splat(4), Vec3::ONE);
    let mut scene = VoxelScene::new(volume, MeshBuilder::new(0.5));
    assert!(scene.mesh().is_empty());
    assert!(!scene.update());

    scene.volume_mut().set(UVec3::ONE, 1.0);
    assert!(scene.update());
    assert_eq!(scene.mesh().triangle_count(), 8);
    assert!(!scene.update());

    scene.volume_mut().set(UVec3::ONE, 0.0);
    scene.volume_mut().set(uvec3(2, 2, 2), 0.0);
    assert!(scene.update());
    assert!(scene.mesh().is_empty());
}

#[test]
fn draw_submits_scaled_instance() {
    let mut volume = VoxelVolume::new(UVec3::splat(4), vec3(2.0, 1.0, 0.5));
    volume.set(UVec3::ONE, 1.0);
    let scene = VoxelScene::new(volume, MeshBuilder::new(0.5));

    let mut renderer = RecordingRenderer::default();
    scene.draw(&mut renderer);
    assert_eq!(renderer.calls, vec!["bind", "prepare 8", "render", "unbind"]);
    assert_eq!(renderer.transforms[0], Mat4::from_scale(vec3(2.0, 1.0, 0.5)));
}

#[test]
fn empty_scene_draws_nothing() {
    let scene = VoxelScene::new(VoxelVolume::default(), MeshBuilder::default());
    let mut renderer = RecordingRenderer::default();
    scene.draw(&mut renderer);
    assert!(renderer.calls.is_empty());
}

#[test]
fn raycast_respects_scale() {
    let mut volume = VoxelVolume::new(UVec3::splat(8), Vec3::splat(2.0));
    volume.set(uvec3(4, 4, 4), 1.0);
    let scene = VoxelScene::new(volume, MeshBuilder::new(0.5));

    // Voxel (4,4,4) spans [8,10) in render space
    let ray = Ray::new(vec3(9.0, 9.0, -4.0), Vec3::Z);
    assert!(scene.raycast(ray, 11.9).is_none());

    let hit = scene.raycast(ray, 12.0).unwrap();
    assert_eq!(hit.coord, uvec3(4, 4, 4));
    assert_eq!(hit.surface, uvec3(4, 4, 3));
}
