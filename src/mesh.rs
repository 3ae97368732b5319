use std::{
    io::{ self, BufWriter, Write },
    path::Path,
};

use ahash::AHashMap;
use glam::Vec3;
use ordered_float::OrderedFloat;
use serde::{ Deserialize, Serialize };

/// Exact-position hash key. No epsilon: two positions are the same vertex
/// only if all three components are bit-for-bit equal (`-0.0 == 0.0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexKey([OrderedFloat<f32>; 3]);

impl From<Vec3> for VertexKey {
    fn from(pos: Vec3) -> Self {
        Self(pos.to_array().map(OrderedFloat))
    }
}

/// What [`IndexedMesh::normals`] contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalMode {
    /// Unit-length vertex normals.
    #[default]
    Normalized,
    /// The raw angle-weighted sums of face cross products. Length grows with
    /// the area around the vertex; consumers must normalize.
    Accumulated,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedMesh {
    pub vertices: Vec<Vec3>,
    /// Parallel to `vertices`.
    pub normals: Vec<Vec3>,
    /// Counter-clockwise (seen from the empty side) index triples.
    pub triangles: Vec<u32>,
}

impl IndexedMesh {
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn faces(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.triangles.chunks_exact(3).map(|tri| [tri[0], tri[1], tri[2]])
    }

    /// Wavefront OBJ with `v`, `vn` and `f v//vn` records.
    pub fn write_obj<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for v in self.vertices.iter() {
            writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
        }
        for n in self.normals.iter() {
            writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
        }
        for [a, b, c] in self.faces() {
            let (a, b, c) = (a + 1, b + 1, c + 1);
            writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
        }
        Ok(())
    }

    pub fn write_obj_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut writer = BufWriter::new(std::fs::File::create(path)?);
        self.write_obj(&mut writer)?;
        writer.flush()
    }
}

/// Accumulates triangle corners into an [`IndexedMesh`], reusing the index
/// of any vertex already emitted at the same position.
#[derive(Debug, Default)]
pub struct MeshIndexer {
    lookup: AHashMap<VertexKey, u32>,
    vertices: Vec<Vec3>,
    triangles: Vec<u32>,
}

impl MeshIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one triangle corner and returns its vertex index.
    pub fn push(&mut self, pos: Vec3) -> u32 {
        let vertices = &mut self.vertices;
        let index = *self.lookup.entry(VertexKey::from(pos)).or_insert_with(|| {
            vertices.push(pos);
            (vertices.len() - 1) as u32
        });
        self.triangles.push(index);
        index
    }

    pub fn finish(self, mode: NormalMode) -> IndexedMesh {
        let mut normals = angle_weighted_normals(&self.vertices, &self.triangles);
        if mode == NormalMode::Normalized {
            normals.iter_mut().for_each(|n| *n = n.normalize_or_zero());
        }

        IndexedMesh {
            vertices: self.vertices,
            normals,
            triangles: self.triangles,
        }
    }
}

/// Per-vertex sum of each adjacent face's cross product `(b-a)×(c-a)`,
/// weighted by the face's interior angle at that vertex.
///
/// Faces with a zero cross product are skipped.
pub fn angle_weighted_normals(vertices: &[Vec3], triangles: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; vertices.len()];

    for tri in triangles.chunks_exact(3) {
        let (ai, bi, ci) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let (a, b, c) = (vertices[ai], vertices[bi], vertices[ci]);

        let crossed = (b - a).cross(c - a);
        if crossed == Vec3::ZERO {
            continue;
        }

        normals[ai] += crossed * (b - a).angle_between(c - a);
        normals[bi] += crossed * (a - b).angle_between(c - b);
        normals[ci] += crossed * (a - c).angle_between(b - c);
    }

    normals
}

#[test]
fn indexer_reuses_positions() {
    let mut indexer = MeshIndexer::new();
    let quad = [
        Vec3::ZERO, Vec3::X, Vec3::Y,
        Vec3::Y, Vec3::X, Vec3::new(1.0, 1.0, 0.0),
    ];
    let indices: Vec<u32> = quad.into_iter().map(|pos| indexer.push(pos)).collect();
    assert_eq!(indices, vec![0, 1, 2, 2, 1, 3]);

    let mesh = indexer.finish(NormalMode::Normalized);
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.triangle_count(), 2);
    assert!(mesh.normals.iter().all(|n| (*n - Vec3::Z).length() < 1e-6));
}

#[test]
fn negative_zero_is_same_vertex() {
    assert_eq!(VertexKey::from(Vec3::new(-0.0, 1.0, 2.0)), VertexKey::from(Vec3::new(0.0, 1.0, 2.0)));
    assert_ne!(VertexKey::from(Vec3::new(0.5, 1.0, 2.0)), VertexKey::from(Vec3::new(0.5000001, 1.0, 2.0)));
}

#[test]
fn accumulated_normals_are_angle_weighted() {
    // Right triangle: 90 degrees at the origin, 45 at the others
    let vertices = [Vec3::ZERO, Vec3::X, Vec3::Y];
    let normals = angle_weighted_normals(&vertices, &[0, 1, 2]);
    let quarter = std::f32::consts::FRAC_PI_4;
    assert!((normals[0] - Vec3::Z * 2.0 * quarter).length() < 1e-5);
    assert!((normals[1] - Vec3::Z * quarter).length() < 1e-5);
    assert!((normals[2] - Vec3::Z * quarter).length() < 1e-5);
}

#[test]
fn degenerate_faces_are_skipped() {
    let vertices = [Vec3::ZERO, Vec3::X, Vec3::X * 2.0];
    let normals = angle_weighted_normals(&vertices, &[0, 1, 2]);
    assert!(normals.iter().all(|n| *n == Vec3::ZERO));
}

#[test]
fn obj_output() {
    let mut indexer = MeshIndexer::new();
    for pos in [Vec3::ZERO, Vec3::X, Vec3::Y] {
        indexer.push(pos);
    }
    let mesh = indexer.finish(NormalMode::Normalized);

    let mut out = Vec::new();
    mesh.write_obj(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 3);
    assert_eq!(text.lines().filter(|l| l.starts_with("vn ")).count(), 3);
    assert!(text.contains("f 1//1 2//2 3//3"));
}

#[test]
fn obj_file_output() {
    let mut indexer = MeshIndexer::new();
    for pos in [Vec3::ZERO, Vec3::X, Vec3::Y] {
        indexer.push(pos);
    }
    let mesh = indexer.finish(NormalMode::Normalized);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("triangle.obj");
    mesh.write_obj_to_file(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("v 0 0 0\n"));
    assert!(text.contains("vn 0 0 1\n"));
}
