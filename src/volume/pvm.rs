//! Uncompressed PVM volumes.
//!
//! ```text
//! PVM3\n                  magic: PVM, PVM2 or PVM3
//! 256 256 128\n           width height depth
//! 1.0 1.0 2.0\n           voxel scale (PVM2 and PVM3 only)
//! 1\n                     bytes per sample: 1, or 2 for big-endian u16
//! <raw samples>           x fastest, then y, then z
//! ```
//!
//! PVM3 files may carry description strings after the samples; they are
//! ignored. Files wrapped in the DDS compression layer are rejected.

use std::path::Path;

use glam::{ UVec3, Vec3, uvec3, vec3 };

use crate::{
    error::{ Result, VolumeError },
    volume::{ VolumeData, VolumeLoader },
};

const DDS_MAGIC: &[&[u8]] = &[b"DDS v3d\n", b"DDS v3e\n"];

/// Reads `.pvm` files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct PvmLoader;

impl VolumeLoader for PvmLoader {
    fn load(&self, path: &Path) -> Result<VolumeData> {
        let bytes = std::fs::read(path)?;
        parse_pvm(&bytes)
    }
}

struct Lines<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lines<'a> {
    fn next_line(&mut self) -> Result<&'a str> {
        let rest = &self.bytes[self.pos..];
        let end = rest.iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| VolumeError::format("unterminated header line"))?;
        self.pos += end + 1;
        std::str::from_utf8(&rest[..end])
            .map(str::trim)
            .map_err(|_| VolumeError::format("header is not ASCII"))
    }

    fn next_fields<const N: usize, T: std::str::FromStr>(&mut self, what: &str) -> Result<[T; N]> {
        let line = self.next_line()?;
        let fields: Vec<T> = line.split_whitespace()
            .map(|field| field.parse::<T>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| VolumeError::format(format!("malformed {what} line: {line:?}")))?;

        fields.try_into()
            .map_err(|_| VolumeError::format(format!("expected {N} values in {what} line: {line:?}")))
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }
}

/// Decodes an in-memory PVM file, normalizing samples to `[0, 1]`.
pub fn parse_pvm(bytes: &[u8]) -> Result<VolumeData> {
    if DDS_MAGIC.iter().any(|magic| bytes.starts_with(magic)) {
        return Err(VolumeError::Unsupported {
            format: "DDS-compressed PVM".to_string(),
        });
    }

    let mut lines = Lines { bytes, pos: 0 };
    let version = match lines.next_line()? {
        "PVM" => 1,
        "PVM2" => 2,
        "PVM3" => 3,
        other => return Err(VolumeError::format(format!("unknown magic {other:?}"))),
    };

    let [x, y, z] = lines.next_fields::<3, u32>("dimensions")?;
    let dimensions = uvec3(x, y, z);
    let scale = if version > 1 {
        let [sx, sy, sz] = lines.next_fields::<3, f32>("scale")?;
        vec3(sx, sy, sz)
    }
    else {
        Vec3::ONE
    };
    let [components] = lines.next_fields::<1, usize>("components")?;

    let count = cell_count(dimensions)?;
    let expected = count.checked_mul(components)
        .ok_or(VolumeError::InvalidDimensions { x, y, z })?;
    let samples = lines.rest();
    if samples.len() < expected {
        return Err(VolumeError::Truncated {
            expected,
            got: samples.len(),
        });
    }
    let samples = &samples[..expected];

    let densities = match components {
        1 => samples.iter()
            .map(|&b| b as f32 / u8::MAX as f32)
            .collect(),
        2 => samples.chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]) as f32 / u16::MAX as f32)
            .collect(),
        n => return Err(VolumeError::Unsupported {
            format: format!("PVM with {n} components per voxel"),
        }),
    };

    Ok(VolumeData {
        dimensions,
        scale,
        densities,
    })
}

fn cell_count(dimensions: UVec3) -> Result<usize> {
    let UVec3 { x, y, z } = dimensions;
    match super::cell_count(dimensions) {
        Some(count) if count > 0 => Ok(count),
        _ => Err(VolumeError::InvalidDimensions { x, y, z }),
    }
}

#[cfg(test)]
fn pvm_bytes(header: &str, samples: &[u8]) -> Vec<u8> {
    let mut bytes = header.as_bytes().to_vec();
    bytes.extend_from_slice(samples);
    bytes
}

#[test]
fn parse_8bit_pvm2() {
    let samples: Vec<u8> = (0..8).map(|i| if i == 0 { 255 } else { 0 }).collect();
    let data = parse_pvm(&pvm_bytes("PVM2\n2 2 2\n1.0 2.0 0.5\n1\n", &samples)).unwrap();

    assert_eq!(data.dimensions, UVec3::splat(2));
    assert_eq!(data.scale, vec3(1.0, 2.0, 0.5));
    assert_eq!(data.densities[0], 1.0);
    assert!(data.densities[1..].iter().all(|&v| v == 0.0));
}

#[test]
fn parse_16bit_pvm3_with_trailer() {
    let mut samples = vec![0u8; 2 * 2];
    samples[0] = 0xff;
    samples[1] = 0xff;
    samples[2] = 0x80;
    let mut bytes = pvm_bytes("PVM3\n2 1 1\n1 1 1\n2\n", &samples);
    bytes.extend_from_slice(b"lobster\0courtesy\0");

    let data = parse_pvm(&bytes).unwrap();
    assert_eq!(data.densities.len(), 2);
    assert_eq!(data.densities[0], 1.0);
    assert!((data.densities[1] - 32768.0 / 65535.0).abs() < 1e-6);
}

#[test]
fn parse_pvm1_has_unit_scale() {
    let data = parse_pvm(&pvm_bytes("PVM\n1 1 1\n1\n", &[51])).unwrap();
    assert_eq!(data.scale, Vec3::ONE);
    assert!((data.densities[0] - 0.2).abs() < 1e-6);
}

#[test]
fn parse_rejects_bad_input() {
    assert!(matches!(
        parse_pvm(b"DDS v3d\nwhatever"),
        Err(VolumeError::Unsupported { .. })
    ));
    assert!(matches!(
        parse_pvm(b"RAW\n1 1 1\n1\n\0"),
        Err(VolumeError::InvalidFormat { .. })
    ));
    assert!(matches!(
        parse_pvm(b"PVM\n2 2\n1\n\0\0\0\0"),
        Err(VolumeError::InvalidFormat { .. })
    ));
    assert!(matches!(
        parse_pvm(b"PVM\n2 2 2\n1\n\0\0\0"),
        Err(VolumeError::Truncated { expected: 8, got: 3 })
    ));
    assert!(matches!(
        parse_pvm(b"PVM\n0 2 2\n1\n"),
        Err(VolumeError::InvalidDimensions { x: 0, y: 2, z: 2 })
    ));
    assert!(matches!(
        parse_pvm(b"PVM\n1 1 1\n3\n\0\0\0"),
        Err(VolumeError::Unsupported { .. })
    ));
    assert!(matches!(
        parse_pvm(b"PVM2"),
        Err(VolumeError::InvalidFormat { .. })
    ));
}
