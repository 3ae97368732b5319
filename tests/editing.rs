//! End-to-end: load a volume, mesh it, fly to it and edit it.

use std::io::Write;

use voxel_march::{
    controller::{ Button, FlyCamera, InputState, Key, Spectator },
    glam::{ UVec3, Vec3, uvec3, vec3 },
    tool::{ Action, Sphere, Tool },
    MarchConfig, MeshBuilder, VolumeError, VoxelScene, VoxelVolume,
};

fn pvm_file(header: &str, samples: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(header.as_bytes()).unwrap();
    file.write_all(samples).unwrap();
    file.flush().unwrap();
    file
}

fn sphere_scene(config: &MarchConfig) -> VoxelScene {
    let mut volume = VoxelVolume::new(UVec3::splat(16), Vec3::ONE);
    volume.fill_with(&Sphere::new(Vec3::splat(7.5), 5.0));
    VoxelScene::from_config(volume, config)
}

#[test]
fn loads_pvm_and_meshes_it() {
    // 4x4x4 with a 2x2x2 solid block in the middle
    let mut samples = vec![0u8; 64];
    for z in 1..3 {
        for y in 1..3 {
            for x in 1..3 {
                samples[x + 4 * (y + 4 * z)] = 255;
            }
        }
    }
    let file = pvm_file("PVM2\n4 4 4\n1.0 1.0 2.0\n1\n", &samples);

    let volume = VoxelVolume::from_file(file.path()).unwrap();
    assert_eq!(volume.dimensions(), UVec3::splat(4));
    assert_eq!(volume.scale(), vec3(1.0, 1.0, 2.0));
    assert_eq!(volume.get(uvec3(1, 2, 1)), 1.0);
    assert_eq!(volume.get(uvec3(0, 2, 1)), 0.0);

    let scene = VoxelScene::new(volume, MeshBuilder::new(0.5));
    assert!(!scene.mesh().is_empty());
    assert_eq!(scene.transform().transform_point3(Vec3::ONE), vec3(1.0, 1.0, 2.0));
}

#[test]
fn failed_load_clears_volume() {
    let mut volume = VoxelVolume::filled(UVec3::splat(4), Vec3::ONE, 1.0);
    let file = pvm_file("PVM\n4 4 4\n1\n", &[0u8; 10]);

    let err = volume.load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, VolumeError::Truncated { expected: 64, got: 10 }));
    assert!(!volume.is_initialized());
    assert_eq!(volume.dimensions(), UVec3::ZERO);

    let missing = file.path().with_extension("missing");
    assert!(matches!(volume.load_from_file(&missing), Err(VolumeError::Io(_))));
}

#[test]
fn config_file_drives_scene_and_spectator() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "iso_level": 0.5, "normals": "accumulated", "move_speed": 4.0 }}"#).unwrap();
    file.flush().unwrap();

    let config = MarchConfig::load(file.path()).unwrap();
    let scene = sphere_scene(&config);
    assert_eq!(scene.iso_level(), 0.5);

    let spectator = Spectator::new(config);
    assert_eq!(spectator.config().move_speed, 4.0);
    assert_eq!(spectator.config().ray_distance, MarchConfig::default().ray_distance);
}

#[test]
fn spectator_digs_into_sphere() {
    let config = MarchConfig {
        interaction_rate: 2.0,
        ..Default::default()
    };
    let mut scene = sphere_scene(&config);
    let mesh_before = scene.mesh().clone();

    let mut spectator = Spectator::new(config);
    // Outside the volume on -Z, looking down +Z at the sphere's center
    let mut camera = FlyCamera {
        location: vec3(7.5, 7.5, -10.0),
        euler: vec3(0.0, 180.0, 0.0),
    };
    let mut input = InputState::new();

    spectator.update(0.0, &mut input, &mut camera, &mut scene);
    let first = *spectator.looking_at().expect("sphere should be in view");
    assert_eq!((first.coord.x, first.coord.y), (7, 7));
    assert!(first.value >= config.iso_level);
    assert!(first.surface_value < config.iso_level);
    assert!(!scene.update());

    // Six frames of digging clear the first four voxels of the tunnel
    input.press(Button::Primary);
    for _ in 0..6 {
        spectator.update(0.25, &mut input, &mut camera, &mut scene);
        input.end_frame();
        assert!(scene.volume().densities().iter().all(|d| (0.0..=1.0).contains(d)));
    }
    assert!(scene.update());
    assert_eq!(scene.volume().get(first.coord), 0.0);

    let deeper = spectator.looking_at().expect("still inside the sphere");
    assert_eq!(deeper.coord, uvec3(7, 7, 7));
    assert_eq!(scene.volume().get(deeper.coord), 0.0);
    assert!(scene.volume().get(uvec3(7, 7, 8)) > 0.5);
    assert_ne!(scene.mesh(), &mesh_before);
}

#[test]
fn spectator_flies_then_builds() {
    let mut scene = VoxelScene::new(VoxelVolume::new(UVec3::splat(8), Vec3::ONE), MeshBuilder::new(0.5));
    scene.volume_mut().set(uvec3(4, 0, 4), 1.0);
    scene.update();

    let mut spectator = Spectator::new(MarchConfig {
        move_speed: 2.0,
        interaction_rate: 1.0,
        ..Default::default()
    });
    let mut camera = FlyCamera {
        location: vec3(4.5, 10.0, 4.5),
        euler: vec3(-89.0, 0.0, 0.0),
    };
    let mut input = InputState::new();

    // Descend for two seconds
    input.keys.insert(Key::Down);
    spectator.update(2.0, &mut input, &mut camera, &mut scene);
    input.keys.clear();
    assert!((camera.location.y - 6.0).abs() < 1e-5);

    input.press(Button::Secondary);
    for _ in 0..4 {
        spectator.update(0.5, &mut input, &mut camera, &mut scene);
        input.end_frame();
    }

    // Each cell takes one frame to turn solid and one more to fill up
    assert_eq!(scene.volume().get(uvec3(4, 1, 4)), 1.0);
    assert_eq!(scene.volume().get(uvec3(4, 2, 4)), 1.0);
    assert_eq!(scene.volume().get(uvec3(4, 3, 4)), 0.0);
    assert!(scene.update());
}

#[test]
fn tools_blend_into_volume() {
    let mut volume = VoxelVolume::new(UVec3::splat(8), Vec3::ONE);
    let sphere = Sphere::new(Vec3::splat(4.0), 2.0);

    volume.apply_tool(&sphere, Action::Place);
    assert_eq!(volume.get(UVec3::splat(4)), 1.0);
    assert_eq!(volume.get(UVec3::ZERO), 0.0);
    assert!(volume.take_dirty());

    volume.apply_tool(&Sphere::new(Vec3::splat(4.0), 1.0), Action::Remove);
    assert_eq!(volume.get(UVec3::splat(4)), 0.0);
    // Outside the small sphere, so untouched
    assert_eq!(volume.get(uvec3(4, 4, 5)), sphere.value(vec3(4.0, 4.0, 5.0)));
    assert_eq!(volume.get(uvec3(4, 4, 5)), 0.5);
}
