#![warn(unused_extern_crates)]
//! Editable voxel volumes meshed with marching cubes.

pub use glam;

mod error;
pub use error::*;

mod config;
pub use config::*;

mod mesh;
pub use mesh::*;

pub mod marching_cubes;
pub use marching_cubes::MeshBuilder;

pub mod volume;
pub use volume::{ VoxelVolume, VolumeData, VolumeLoader, PvmLoader, parse_pvm };

pub mod raycast;
pub use raycast::{ raycast, Ray, VoxelHit };

pub mod tool;

pub mod controller;

mod scene;
pub use scene::*;
