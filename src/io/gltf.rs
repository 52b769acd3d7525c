//! glTF format support.
//!
//! Loads `.glb` files and `.gltf` files whose buffers are embedded (data
//! URIs), since only the file bytes are available. All triangle primitives of
//! all meshes are merged into one [`Mesh`]; `TEXCOORD_0` is kept when every
//! merged primitive has it.
//!
//! Note: Saving to glTF is not supported.

use nalgebra::{Point2, Point3};

use super::Format;
use crate::error::{Error, Result};
use crate::mesh::Mesh;

/// Parse glTF or GLB bytes.
pub fn parse(bytes: &[u8]) -> Result<Mesh> {
    let (document, buffers, _images) =
        ::gltf::import_slice(bytes).map_err(|e| Error::parse(Format::Gltf, e.to_string()))?;

    let mut positions: Vec<Point3<f64>> = Vec::new();
    let mut uvs: Vec<Point2<f64>> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut all_textured = true;
    let mut name: Option<String> = None;

    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let Some(read_positions) = reader.read_positions() else {
                continue;
            };

            let offset = vertex_count(positions.len())?;
            positions.extend(
                read_positions.map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64)),
            );
            let count = vertex_count(positions.len())? - offset;

            match reader.read_tex_coords(0) {
                Some(coords) if all_textured => {
                    uvs.extend(coords.into_f32().map(|t| Point2::new(t[0] as f64, t[1] as f64)));
                }
                _ => all_textured = false,
            }

            let local: Vec<u32> = match reader.read_indices() {
                Some(read) => read.into_u32().collect(),
                None => (0..count).collect(),
            };

            // Indices are checked against this primitive's own vertices, so
            // adding the offset stays inside the merged vertex list.
            if let Some(&bad) = local.iter().find(|&&i| i >= count) {
                return Err(Error::parse(
                    Format::Gltf,
                    format!(
                        "primitive {} of mesh {} uses index {} but has {} vertices",
                        primitive.index(),
                        mesh.index(),
                        bad,
                        count
                    ),
                ));
            }

            for [a, b, c] in triangles(primitive.mode(), &local) {
                indices.extend([a + offset, b + offset, c + offset]);
            }

            if name.is_none() {
                name = mesh.name().map(str::to_string);
            }
        }
    }

    let mut result = Mesh::indexed(positions, indices)?;
    if all_textured && !uvs.is_empty() {
        result = result.with_uvs(uvs)?;
    }
    Ok(match name {
        Some(name) => result.with_name(name),
        None => result,
    })
}

fn vertex_count(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::parse(Format::Gltf, "too many vertices"))
}

/// Convert a primitive's indices to triangles based on its mode.
fn triangles(mode: ::gltf::mesh::Mode, local: &[u32]) -> Vec<[u32; 3]> {
    match mode {
        ::gltf::mesh::Mode::Triangles => local
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect(),
        ::gltf::mesh::Mode::TriangleStrip => (0..local.len().saturating_sub(2))
            .map(|i| {
                // Odd triangles flip to keep a consistent winding
                if i % 2 == 0 {
                    [local[i], local[i + 1], local[i + 2]]
                } else {
                    [local[i], local[i + 2], local[i + 1]]
                }
            })
            .collect(),
        ::gltf::mesh::Mode::TriangleFan => (1..local.len().saturating_sub(1))
            .map(|i| [local[0], local[i], local[i + 1]])
            .collect(),
        mode => {
            log::debug!("skipping non-triangle primitive ({:?})", mode);
            Vec::new()
        }
    }
}
