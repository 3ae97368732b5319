//! Property-based tests on meshes extracted from random volumes.

use ahash::AHashSet;
use proptest::prelude::*;
use voxel_march::{
    glam::{ UVec3, Vec3, uvec3 },
    IndexedMesh, MeshBuilder, NormalMode, VertexKey, VoxelVolume,
};

fn volume_strategy() -> impl Strategy<Value = VoxelVolume> {
    (2u32..6, 2u32..6, 2u32..6).prop_flat_map(|(x, y, z)| {
        let count = (x * y * z) as usize;
        prop::collection::vec(0.0f32..=1.0, count).prop_map(move |densities| {
            let mut volume = VoxelVolume::new(uvec3(x, y, z), Vec3::ONE);
            for (i, density) in densities.into_iter().enumerate() {
                let i = i as u32;
                volume.set(uvec3(i % x, (i / x) % y, i / (x * y)), density);
            }
            volume
        })
    })
}

fn check_indices(mesh: &IndexedMesh) -> Result<(), TestCaseError> {
    prop_assert_eq!(mesh.triangles.len() % 3, 0);
    prop_assert_eq!(mesh.normals.len(), mesh.vertices.len());
    for &index in mesh.triangles.iter() {
        prop_assert!((index as usize) < mesh.vertex_count());
    }
    for [a, b, c] in mesh.faces() {
        prop_assert!(a != b && b != c && a != c, "degenerate face {:?}", [a, b, c]);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn indices_are_valid(volume in volume_strategy(), iso in 0.05f32..0.95) {
        let mesh = MeshBuilder::new(iso).build(&volume);
        check_indices(&mesh)?;
    }

    #[test]
    fn vertices_are_unique(volume in volume_strategy(), iso in 0.05f32..0.95) {
        let mesh = MeshBuilder::new(iso).build(&volume);
        let unique: AHashSet<VertexKey> = mesh.vertices.iter().map(|&v| VertexKey::from(v)).collect();
        prop_assert_eq!(unique.len(), mesh.vertex_count());
    }

    #[test]
    fn vertices_are_edge_midpoints(volume in volume_strategy(), iso in 0.05f32..0.95) {
        let mesh = MeshBuilder::new(iso).build(&volume);
        let max = (volume.dimensions() - UVec3::ONE).as_vec3();

        for v in mesh.vertices.iter() {
            prop_assert!(v.cmpge(Vec3::ZERO).all() && v.cmple(max).all(), "{} outside {}", v, max);
            let doubled = *v * 2.0;
            prop_assert_eq!(doubled, doubled.round());
            let halves = (doubled % 2.0).to_array().iter().filter(|&&c| c == 1.0).count();
            prop_assert_eq!(halves, 1, "{} is not on a single edge", v);
        }
    }

    #[test]
    fn normals_are_unit_or_zero(volume in volume_strategy(), iso in 0.05f32..0.95) {
        let mesh = MeshBuilder::new(iso).build(&volume);
        for n in mesh.normals.iter() {
            prop_assert!(n.is_finite());
            let length = n.length();
            prop_assert!(length == 0.0 || (length - 1.0).abs() < 1e-4, "normal {} has length {}", n, length);
        }
    }

    #[test]
    fn accumulated_normals_point_the_same_way(volume in volume_strategy(), iso in 0.05f32..0.95) {
        let normalized = MeshBuilder::new(iso).build(&volume);
        let accumulated = MeshBuilder::new(iso).with_normals(NormalMode::Accumulated).build(&volume);

        prop_assert_eq!(&normalized.vertices, &accumulated.vertices);
        prop_assert_eq!(&normalized.triangles, &accumulated.triangles);
        for (n, a) in normalized.normals.iter().zip(accumulated.normals.iter()) {
            prop_assert!((*n - a.normalize_or_zero()).length() < 1e-4);
        }
    }

    #[test]
    fn build_is_deterministic(volume in volume_strategy(), iso in 0.05f32..0.95) {
        let builder = MeshBuilder::new(iso);
        prop_assert_eq!(builder.build(&volume), builder.build(&volume));
    }

    #[test]
    fn uniform_volumes_are_empty(
        dims in (2u32..8, 2u32..8, 2u32..8),
        fill in 0.0f32..=1.0,
        iso in 0.05f32..0.95,
    ) {
        let volume = VoxelVolume::filled(uvec3(dims.0, dims.1, dims.2), Vec3::ONE, fill);
        let mesh = MeshBuilder::new(iso).build(&volume);
        prop_assert!(mesh.is_empty());
        prop_assert_eq!(mesh.vertex_count(), 0);
    }
}

#[test]
fn isolated_voxel_is_closed() {
    let mut volume = VoxelVolume::new(UVec3::splat(5), Vec3::ONE);
    volume.set(UVec3::splat(2), 1.0);
    let mesh = MeshBuilder::new(0.5).build(&volume);

    // Every edge of a closed surface is shared by exactly two faces, once in
    // each direction
    let mut directed = AHashSet::new();
    for [a, b, c] in mesh.faces() {
        for edge in [(a, b), (b, c), (c, a)] {
            assert!(directed.insert(edge), "edge {edge:?} repeated");
        }
    }
    for &(a, b) in directed.iter() {
        assert!(directed.contains(&(b, a)), "edge ({a}, {b}) has no twin");
    }
}
