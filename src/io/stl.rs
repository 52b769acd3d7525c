//! STL (stereolithography) format support.
//!
//! Both binary and ASCII STL are read through `stl_io`, which also merges the
//! per-triangle vertices into a shared vertex list.

use std::io::Cursor;

use nalgebra::Point3;

use super::Format;
use crate::error::{Error, Result};
use crate::mesh::Mesh;

/// Parse STL bytes.
///
/// Automatically detects binary vs ASCII format.
pub fn parse(bytes: &[u8]) -> Result<Mesh> {
    let mut reader = Cursor::new(bytes);
    let stl = stl_io::read_stl(&mut reader).map_err(|e| Error::parse(Format::Stl, e.to_string()))?;

    let positions: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();

    let mut indices: Vec<u32> = Vec::with_capacity(stl.faces.len() * 3);
    let mut skipped = 0usize;
    for tri in &stl.faces {
        let [i0, i1, i2] = tri.vertices;
        // Skip degenerate triangles
        if i0 == i1 || i1 == i2 || i0 == i2 {
            skipped += 1;
            continue;
        }
        indices.extend([i0 as u32, i1 as u32, i2 as u32]);
    }

    if skipped > 0 {
        log::warn!("skipped {} degenerate STL triangles", skipped);
    }

    Mesh::indexed(positions, indices)
}
