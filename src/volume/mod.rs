//! Dense voxel density grid.

use std::path::Path;

use glam::{ IVec3, UVec3, Vec3, uvec3 };

use crate::{
    error::{ Result, VolumeError },
    tool::{ Action, IntersectType, Tool, AABB },
};

mod pvm;
pub use pvm::*;

/// Raw contents produced by a [`VolumeLoader`].
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeData {
    pub dimensions: UVec3,
    pub scale: Vec3,
    /// Densities with x varying fastest, then y, then z.
    pub densities: Vec<f32>,
}

impl VolumeData {
    fn validate(self) -> Result<Self> {
        let UVec3 { x, y, z } = self.dimensions;
        match cell_count(self.dimensions) {
            Some(count) if count > 0 => {
                if self.densities.len() != count {
                    return Err(VolumeError::Truncated {
                        expected: count,
                        got: self.densities.len(),
                    });
                }
                Ok(self)
            },
            _ => Err(VolumeError::InvalidDimensions { x, y, z }),
        }
    }
}

/// Reads a volume from some external format.
pub trait VolumeLoader {
    fn load(&self, path: &Path) -> Result<VolumeData>;
}

fn cell_count(dimensions: UVec3) -> Option<usize> {
    (dimensions.x as usize)
        .checked_mul(dimensions.y as usize)?
        .checked_mul(dimensions.z as usize)
}

/// A dense `width * height * depth` grid of densities.
///
/// Densities are conventionally in `[0, 1]` but [`set`](Self::set) stores
/// whatever it is given. Any mutation marks the volume dirty; a consumer
/// that caches derived data (a mesh) polls [`take_dirty`](Self::take_dirty).
///
/// A volume with any zero dimension is *uninitialized*: it holds no
/// voxels, meshes to nothing and every ray misses it.
#[derive(Debug, Clone)]
pub struct VoxelVolume {
    dimensions: UVec3,
    scale: Vec3,
    densities: Vec<f32>,
    dirty: bool,
}

impl Default for VoxelVolume {
    fn default() -> Self {
        Self {
            dimensions: UVec3::ZERO,
            scale: Vec3::ONE,
            densities: Vec::new(),
            dirty: false,
        }
    }
}

impl VoxelVolume {
    pub fn new(dimensions: UVec3, scale: Vec3) -> Self {
        Self::filled(dimensions, scale, 0.0)
    }

    pub fn filled(dimensions: UVec3, scale: Vec3, fill: f32) -> Self {
        let mut volume = Self::default();
        volume.init_filled(dimensions, scale, fill);
        volume
    }

    pub fn from_data(data: VolumeData) -> Result<Self> {
        let data = data.validate()?;
        Ok(Self {
            dimensions: data.dimensions,
            scale: data.scale,
            densities: data.densities,
            dirty: true,
        })
    }

    /// Reads a PVM file. See [`PvmLoader`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut volume = Self::default();
        volume.load_from_file(path)?;
        Ok(volume)
    }

    /// Reallocates the grid, discarding previous contents. All voxels are 0.
    pub fn init(&mut self, dimensions: UVec3, scale: Vec3) {
        self.init_filled(dimensions, scale, 0.0);
    }

    pub fn init_filled(&mut self, dimensions: UVec3, scale: Vec3, fill: f32) {
        let count = cell_count(dimensions)
            .unwrap_or_else(|| panic!("volume dimensions {dimensions} overflow usize"));

        self.dimensions = dimensions;
        self.scale = scale;
        self.densities.clear();
        self.densities.resize(count, fill);
        self.dirty = true;
    }

    /// Returns the volume to the uninitialized state.
    pub fn clear(&mut self) {
        self.dimensions = UVec3::ZERO;
        self.densities = Vec::new();
        self.dirty = true;
    }

    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.load_with(&PvmLoader, path.as_ref())
    }

    /// Replaces the contents with whatever `loader` reads from `path`.
    ///
    /// On failure the volume is cleared rather than left half-written.
    pub fn load_with<L: VolumeLoader + ?Sized>(&mut self, loader: &L, path: &Path) -> Result<()> {
        match loader.load(path).and_then(VolumeData::validate) {
            Ok(data) => {
                log::info!(
                    "Loaded volume {}: {}x{}x{}, scale {}",
                    path.display(),
                    data.dimensions.x, data.dimensions.y, data.dimensions.z,
                    data.scale,
                );
                self.dimensions = data.dimensions;
                self.scale = data.scale;
                self.densities = data.densities;
                self.dirty = true;
                Ok(())
            },
            Err(err) => {
                log::warn!("Failed to load volume {}: {}", path.display(), err);
                self.clear();
                Err(err)
            },
        }
    }

    #[inline]
    pub fn dimensions(&self) -> UVec3 {
        self.dimensions
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.dimensions.x
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.dimensions.y
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.dimensions.z
    }

    #[inline]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    pub fn is_initialized(&self) -> bool {
        !self.densities.is_empty()
    }

    pub fn densities(&self) -> &[f32] {
        &self.densities
    }

    /// Box covering every voxel, `[0, dimensions]` in local coordinates.
    pub fn bounds(&self) -> AABB {
        AABB::new(Vec3::ZERO, self.dimensions.as_vec3())
    }

    pub fn contains(&self, pos: IVec3) -> bool {
        pos.cmpge(IVec3::ZERO).all() && pos.as_uvec3().cmplt(self.dimensions).all()
    }

    #[inline]
    fn index(&self, pos: UVec3) -> usize {
        assert!(
            pos.cmplt(self.dimensions).all(),
            "voxel {pos} out of bounds for volume of size {}", self.dimensions
        );
        let UVec3 { x, y, z } = pos;
        let (width, height) = (self.dimensions.x as usize, self.dimensions.y as usize);
        x as usize + width * (y as usize + height * z as usize)
    }

    /// # Panics
    /// If `pos` is outside the volume.
    #[inline]
    pub fn get(&self, pos: UVec3) -> f32 {
        self.densities[self.index(pos)]
    }

    pub fn try_get(&self, pos: UVec3) -> Option<f32> {
        if pos.cmplt(self.dimensions).all() {
            Some(self.get(pos))
        }
        else {
            None
        }
    }

    /// Stores `value` verbatim.
    ///
    /// # Panics
    /// If `pos` is outside the volume.
    #[inline]
    pub fn set(&mut self, pos: UVec3, value: f32) {
        let index = self.index(pos);
        self.densities[index] = value;
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether the volume changed since the last call, and resets
    /// the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Converts a point from render space into voxel coordinates.
    pub fn world_to_local(&self, point: Vec3) -> Vec3 {
        point / self.scale
    }

    /// Overwrites every voxel with the tool's density.
    pub fn fill_with<T: Tool + ?Sized>(&mut self, tool: &T) {
        for z in 0..self.depth() {
            for y in 0..self.height() {
                for x in 0..self.width() {
                    let pos = uvec3(x, y, z);
                    self.set(pos, tool.value(pos.as_vec3()));
                }
            }
        }
    }

    /// Blends the tool into the voxels it overlaps. See [`Action::apply_value`].
    pub fn apply_tool<T: Tool + ?Sized>(&mut self, tool: &T, action: Action) {
        if !self.is_initialized() {
            return;
        }

        let voxel_box = AABB::new(Vec3::ZERO, (self.dimensions - 1).as_vec3());
        let region = match voxel_box.intersect(tool.aabb()) {
            IntersectType::DoesNotIntersect => return,
            IntersectType::Intersects(region) => region,
            IntersectType::Contains => tool.aabb(),
        };

        let start = region.start.ceil().as_uvec3();
        let end = region.end.floor().as_uvec3();
        for z in start.z..=end.z {
            for y in start.y..=end.y {
                for x in start.x..=end.x {
                    let pos = uvec3(x, y, z);
                    let index = self.index(pos);
                    action.apply_value(&mut self.densities[index], tool.value(pos.as_vec3()));
                }
            }
        }
        self.dirty = true;
    }
}

#[test]
fn init_fills_and_replaces() {
    let mut volume = VoxelVolume::new(uvec3(4, 3, 2), Vec3::ONE);
    assert!(volume.is_initialized());
    assert_eq!(volume.densities().len(), 24);
    assert!(volume.densities().iter().all(|&v| v == 0.0));

    volume.set(uvec3(3, 2, 1), 0.75);
    assert_eq!(volume.get(uvec3(3, 2, 1)), 0.75);

    volume.init_filled(uvec3(2, 2, 2), Vec3::splat(2.0), 0.5);
    assert_eq!(volume.dimensions(), uvec3(2, 2, 2));
    assert_eq!(volume.scale(), Vec3::splat(2.0));
    assert!(volume.densities().iter().all(|&v| v == 0.5));
}

#[test]
fn set_stores_verbatim() {
    let mut volume = VoxelVolume::new(UVec3::splat(2), Vec3::ONE);
    volume.set(uvec3(1, 0, 1), 3.5);
    volume.set(uvec3(0, 1, 0), -2.0);
    assert_eq!(volume.get(uvec3(1, 0, 1)), 3.5);
    assert_eq!(volume.get(uvec3(0, 1, 0)), -2.0);
}

#[test]
fn layout_is_x_fastest() {
    let mut volume = VoxelVolume::new(uvec3(3, 2, 2), Vec3::ONE);
    volume.set(uvec3(1, 0, 0), 1.0);
    volume.set(uvec3(0, 1, 0), 2.0);
    volume.set(uvec3(0, 0, 1), 3.0);
    assert_eq!(volume.densities()[1], 1.0);
    assert_eq!(volume.densities()[3], 2.0);
    assert_eq!(volume.densities()[6], 3.0);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn get_out_of_bounds_panics() {
    let volume = VoxelVolume::new(UVec3::splat(4), Vec3::ONE);
    volume.get(uvec3(0, 4, 0));
}

#[test]
#[should_panic(expected = "out of bounds")]
fn set_out_of_bounds_panics() {
    let mut volume = VoxelVolume::new(UVec3::splat(4), Vec3::ONE);
    volume.set(uvec3(4, 0, 0), 1.0);
}

#[test]
fn try_get_and_contains() {
    let volume = VoxelVolume::new(uvec3(2, 3, 4), Vec3::ONE);
    assert_eq!(volume.try_get(uvec3(1, 2, 3)), Some(0.0));
    assert_eq!(volume.try_get(uvec3(2, 0, 0)), None);

    assert!(volume.contains(IVec3::new(1, 2, 3)));
    assert!(!volume.contains(IVec3::new(-1, 0, 0)));
    assert!(!volume.contains(IVec3::new(0, 3, 0)));
}

#[test]
fn dirty_flag() {
    let mut volume = VoxelVolume::new(UVec3::splat(2), Vec3::ONE);
    assert!(volume.take_dirty());
    assert!(!volume.take_dirty());

    volume.set(UVec3::ZERO, 1.0);
    assert!(volume.is_dirty());
    assert!(volume.take_dirty());
    assert!(!volume.is_dirty());
}

#[test]
fn default_is_uninitialized() {
    let volume = VoxelVolume::default();
    assert!(!volume.is_initialized());
    assert_eq!(volume.dimensions(), UVec3::ZERO);
    assert_eq!(volume.try_get(UVec3::ZERO), None);
}

#[test]
fn failed_load_clears_volume() {
    struct Broken;
    impl VolumeLoader for Broken {
        fn load(&self, _path: &Path) -> Result<VolumeData> {
            Err(VolumeError::format("broken"))
        }
    }

    let mut volume = VoxelVolume::filled(UVec3::splat(3), Vec3::ONE, 1.0);
    assert!(volume.load_with(&Broken, Path::new("broken.pvm")).is_err());
    assert!(!volume.is_initialized());
    assert_eq!(volume.dimensions(), UVec3::ZERO);
}

#[test]
fn mismatched_data_is_rejected() {
    struct Short;
    impl VolumeLoader for Short {
        fn load(&self, _path: &Path) -> Result<VolumeData> {
            Ok(VolumeData {
                dimensions: UVec3::splat(2),
                scale: Vec3::ONE,
                densities: vec![0.0; 7],
            })
        }
    }

    let mut volume = VoxelVolume::new(UVec3::splat(2), Vec3::ONE);
    let err = volume.load_with(&Short, Path::new("short.pvm")).unwrap_err();
    assert!(matches!(err, VolumeError::Truncated { expected: 8, got: 7 }));
    assert!(!volume.is_initialized());

    let err = VoxelVolume::from_data(VolumeData {
        dimensions: uvec3(0, 2, 2),
        scale: Vec3::ONE,
        densities: Vec::new(),
    }).unwrap_err();
    assert!(matches!(err, VolumeError::InvalidDimensions { x: 0, .. }));
}

#[test]
fn apply_tool_blends() {
    use crate::tool::Sphere;

    let mut volume = VoxelVolume::new(UVec3::splat(16), Vec3::ONE);
    let sphere = Sphere::new(Vec3::splat(8.0), 4.0);

    volume.apply_tool(&sphere, Action::Place);
    assert_eq!(volume.get(UVec3::splat(8)), 1.0);
    assert_eq!(volume.get(uvec3(10, 8, 8)), 0.5);
    assert_eq!(volume.get(uvec3(0, 0, 0)), 0.0);

    let small = Sphere::new(Vec3::splat(8.0), 2.0);
    volume.apply_tool(&small, Action::Remove);
    assert_eq!(volume.get(UVec3::splat(8)), 0.0);
    // Outside the small sphere the place result is untouched
    assert_eq!(volume.get(uvec3(11, 8, 8)), 0.25);
}

#[test]
fn apply_tool_clips_to_bounds() {
    use crate::tool::Sphere;

    let mut volume = VoxelVolume::new(UVec3::splat(4), Vec3::ONE);
    volume.apply_tool(&Sphere::new(Vec3::ZERO, 2.0), Action::Place);
    assert_eq!(volume.get(UVec3::ZERO), 1.0);

    volume.take_dirty();
    volume.apply_tool(&Sphere::new(Vec3::splat(-10.0), 2.0), Action::Place);
    assert!(!volume.is_dirty());
}

#[test]
fn fill_with_sphere() {
    use crate::tool::Sphere;

    let mut volume = VoxelVolume::new(UVec3::splat(9), Vec3::ONE);
    volume.fill_with(&Sphere::new(Vec3::splat(4.0), 4.0));
    assert_eq!(volume.get(UVec3::splat(4)), 1.0);
    assert_eq!(volume.get(uvec3(0, 4, 4)), 0.0);
}
