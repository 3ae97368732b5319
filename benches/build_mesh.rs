//! Criterion benchmarks for meshing and ray queries.

use criterion::{ black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput };
use voxel_march::{
    glam::{ UVec3, Vec3, vec3 },
    tool::Sphere,
    MeshBuilder, NormalMode, Ray, VoxelScene, VoxelVolume,
};

fn sphere_volume(size: u32) -> VoxelVolume {
    let mut volume = VoxelVolume::new(UVec3::splat(size), Vec3::ONE);
    let center = Vec3::splat((size - 1) as f32 * 0.5);
    volume.fill_with(&Sphere::new(center, size as f32 * 0.4));
    volume
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_mesh");

    for size in [16u32, 32, 64] {
        let volume = sphere_volume(size);
        group.throughput(Throughput::Elements((size as u64).pow(3)));

        group.bench_with_input(BenchmarkId::new("normalized", size), &volume, |b, volume| {
            let builder = MeshBuilder::new(0.15);
            b.iter(|| black_box(builder.build(black_box(volume))))
        });

        group.bench_with_input(BenchmarkId::new("accumulated", size), &volume, |b, volume| {
            let builder = MeshBuilder::new(0.15).with_normals(NormalMode::Accumulated);
            b.iter(|| black_box(builder.build(black_box(volume))))
        });
    }

    group.finish();
}

fn bench_raycast(c: &mut Criterion) {
    let scene = VoxelScene::new(sphere_volume(64), MeshBuilder::new(0.15));

    c.bench_function("raycast_hit", |b| {
        let ray = Ray::new(vec3(31.5, 31.5, -10.0), Vec3::Z);
        b.iter(|| black_box(scene.raycast(black_box(ray), 1000.0)))
    });

    c.bench_function("raycast_miss_diagonal", |b| {
        let ray = Ray::new(vec3(-1.0, 0.5, -1.0), vec3(1.0, 0.0, 1.0).normalize());
        b.iter(|| black_box(scene.raycast(black_box(ray), 1000.0)))
    });
}

criterion_group!(benches, bench_build, bench_raycast);
criterion_main!(benches);
