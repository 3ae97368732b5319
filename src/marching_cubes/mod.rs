//! Marching cubes over a [`VoxelVolume`].
//!
//! Every cell of 8 neighbouring voxels is classified by which corners are
//! solid (density `>=` the iso-level), and the case tables give the edges to
//! place vertices on and how to connect them. Vertices sit at the midpoint
//! of their edge; densities only decide which edges are used.

use arrayvec::ArrayVec;
use bitvec::prelude::*;
use glam::{ UVec3, Vec3, uvec3 };

use crate::{
    config::MarchConfig,
    mesh::{ IndexedMesh, MeshIndexer, NormalMode },
    volume::VoxelVolume,
};

mod tables;
pub use tables::*;

/// Builds the case index for a cell. Bit `i` is set when corner `i`
/// (see [`CORNER_OFFSETS`]) is at or above `iso_level`.
pub fn case_index(values: &[f32; 8], iso_level: f32) -> u8 {
    let mut case = 0u8;
    let bits = case.view_bits_mut::<Lsb0>();
    for (corner, value) in values.iter().enumerate() {
        bits.set(corner, *value >= iso_level);
    }
    case
}

/// Edges the surface crosses for `case`.
pub fn case_edges(case: u8) -> impl Iterator<Item = usize> {
    let mask: &'static u16 = &EDGE_TABLE[case as usize];
    mask.view_bits::<Lsb0>()[..12].iter_ones()
}

/// The triangle edge sequence for `case`, without the sentinel.
pub fn triangle_edges(case: u8) -> ArrayVec<u8, 15> {
    TRI_TABLE[case as usize].iter()
        .take_while(|&&edge| edge != SENTINEL)
        .map(|&edge| edge as u8)
        .collect()
}

/// Midpoint of `edge` of the cell whose lowest corner is `cell`.
///
/// Computed on the half-step lattice so that every cell sharing the edge
/// gets the exact same `Vec3`.
#[inline]
pub fn edge_position(cell: UVec3, edge: usize) -> Vec3 {
    (cell * 2 + EDGE_OFFSETS[edge]).as_vec3() * 0.5
}

/// Extracts the iso-surface of a volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBuilder {
    pub iso_level: f32,
    pub normals: NormalMode,
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::from_config(&MarchConfig::default())
    }
}

impl MeshBuilder {
    pub fn new(iso_level: f32) -> Self {
        Self {
            iso_level,
            normals: NormalMode::default(),
        }
    }

    pub fn from_config(config: &MarchConfig) -> Self {
        Self {
            iso_level: config.iso_level,
            normals: config.normals,
        }
    }

    pub fn with_normals(mut self, normals: NormalMode) -> Self {
        self.normals = normals;
        self
    }

    /// Meshes the whole volume. Volumes smaller than 2 voxels along any
    /// axis have no cells and produce an empty mesh.
    pub fn build(&self, volume: &VoxelVolume) -> IndexedMesh {
        let dims = volume.dimensions();
        if dims.cmplt(UVec3::splat(2)).any() {
            return IndexedMesh::default();
        }

        let mut indexer = MeshIndexer::new();
        let mut edges = [Vec3::ZERO; 12];

        for x in 0..dims.x - 1 {
            for y in 0..dims.y - 1 {
                for z in 0..dims.z - 1 {
                    let cell = uvec3(x, y, z);
                    let values = CORNER_OFFSETS.map(|offset| volume.get(cell + offset));

                    let case = case_index(&values, self.iso_level);
                    // Entirely outside or inside the surface
                    if case == 0 || case == 255 {
                        continue;
                    }

                    for edge in case_edges(case) {
                        edges[edge] = edge_position(cell, edge);
                    }
                    for edge in triangle_edges(case) {
                        indexer.push(edges[edge as usize]);
                    }
                }
            }
        }

        let mesh = indexer.finish(self.normals);
        log::debug!(
            "Built mesh for {}x{}x{} volume: {} vertices, {} triangles",
            dims.x, dims.y, dims.z,
            mesh.vertex_count(),
            mesh.triangle_count(),
        );
        mesh
    }
}

#[cfg(test)]
fn single_voxel_volume(size: u32, voxel: UVec3) -> VoxelVolume {
    let mut volume = VoxelVolume::new(UVec3::splat(size), Vec3::ONE);
    volume.set(voxel, 1.0);
    volume
}

#[test]
fn case_index_bit_order() {
    let mut values = [0.0; 8];
    assert_eq!(case_index(&values, 0.5), 0);

    // (1,0,1) is corner 2
    values[2] = 1.0;
    assert_eq!(case_index(&values, 0.5), 4);

    // Ties count as solid
    values[7] = 0.5;
    assert_eq!(case_index(&values, 0.5), 4 | 128);

    assert_eq!(case_index(&[1.0; 8], 0.5), 255);
}

#[test]
fn case_table_accessors() {
    assert_eq!(case_edges(1).collect::<Vec<_>>(), vec![0, 3, 8]);
    assert_eq!(triangle_edges(1).as_slice(), &[0, 8, 3]);
    assert!(triangle_edges(0).is_empty());
    assert!(triangle_edges(255).is_empty());
    assert_eq!(case_edges(255).count(), 0);
}

#[test]
fn empty_and_full_volumes_have_no_geometry() {
    let builder = MeshBuilder::new(0.5);

    let empty = VoxelVolume::new(UVec3::splat(6), Vec3::ONE);
    let mesh = builder.build(&empty);
    assert_eq!(mesh.vertex_count(), 0);
    assert_eq!(mesh.triangle_count(), 0);

    let full = VoxelVolume::filled(UVec3::splat(6), Vec3::ONE, 1.0);
    let mesh = builder.build(&full);
    assert_eq!(mesh.vertex_count(), 0);
    assert_eq!(mesh.triangle_count(), 0);
}

#[test]
fn degenerate_volumes_have_no_geometry() {
    let builder = MeshBuilder::new(0.5);
    assert!(builder.build(&VoxelVolume::default()).is_empty());
    assert!(builder.build(&VoxelVolume::filled(uvec3(1, 4, 4), Vec3::ONE, 1.0)).is_empty());
}

#[test]
fn single_corner_matches_case_one() {
    let volume = single_voxel_volume(3, UVec3::ZERO);
    let mesh = MeshBuilder::new(0.5).build(&volume);

    assert_eq!(
        mesh.vertices,
        vec![
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::new(0.0, 0.0, 0.5),
        ]
    );
    assert_eq!(mesh.triangles, vec![0, 1, 2]);

    // Faces away from the solid corner
    let expected = Vec3::ONE.normalize();
    assert!(mesh.normals.iter().all(|n| (*n - expected).length() < 1e-6));
}

#[test]
fn accumulated_normals_keep_weights() {
    let volume = single_voxel_volume(2, UVec3::ZERO);
    let mesh = MeshBuilder::new(0.5)
        .with_normals(NormalMode::Accumulated)
        .build(&volume);

    // Equilateral face with cross product (0.25, 0.25, 0.25), 60 degrees at each corner
    let expected = Vec3::splat(0.25 * std::f32::consts::FRAC_PI_3);
    assert!(mesh.normals.iter().all(|n| (*n - expected).length() < 1e-5));
}

#[test]
fn shared_edges_share_vertices() {
    let center = UVec3::ONE;
    let volume = single_voxel_volume(3, center);
    let mesh = MeshBuilder::new(0.5).build(&volume);

    // One triangle from each of the 8 cells around the voxel, all meeting at
    // the 6 edge midpoints: an octahedron
    assert_eq!(mesh.triangle_count(), 8);
    assert_eq!(mesh.vertex_count(), 6);

    let center = center.as_vec3();
    for (v, n) in mesh.vertices.iter().zip(mesh.normals.iter()) {
        let outward = (*v - center).normalize();
        assert!((*n - outward).length() < 1e-5, "normal {n} at {v}");
    }
}

#[test]
fn build_is_deterministic() {
    use crate::tool::Sphere;

    let mut volume = VoxelVolume::new(UVec3::splat(12), Vec3::ONE);
    volume.fill_with(&Sphere::new(Vec3::splat(5.5), 4.0));

    let builder = MeshBuilder::new(0.15);
    let first = builder.build(&volume);
    let second = builder.build(&volume);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}
