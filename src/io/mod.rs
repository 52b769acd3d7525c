//! Mesh file I/O.
//!
//! This module turns file contents into a [`Mesh`] and writes meshes back out.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Wavefront OBJ | `.obj` | ✓ | ✓ | Keeps texture coordinates |
//! | glTF | `.gltf`, `.glb` | ✓ | ✗ | Embedded buffers only |
//! | FBX | `.fbx` | ✓ | ✗ | Binary 7.4+, mesh geometry and first UV layer |
//! | STL | `.stl` | ✓ | ✗ | Binary and ASCII |
//!
//! # Usage
//!
//! Loaders work on bytes, so a file picked by the user, a download, or a test
//! fixture all go through the same path:
//!
//! ```no_run
//! use uvlab::io::{load_bytes, Format};
//!
//! let bytes = std::fs::read("model.stl").unwrap();
//! let mesh = load_bytes(&bytes, Format::Stl).unwrap();
//! println!("{} triangles", mesh.num_triangles());
//! ```
//!
//! Or straight from disk with format detection:
//!
//! ```no_run
//! let mesh = uvlab::io::load("model.obj").unwrap();
//! uvlab::io::obj::save(&mesh, "model_uv.obj").unwrap();
//! ```

pub mod fbx;
pub mod gltf;
pub mod obj;
pub mod stl;

use std::path::Path;

use crate::error::{Error, Result};
use crate::mesh::Mesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
    /// glTF JSON format.
    Gltf,
    /// glTF binary format.
    Glb,
    /// Autodesk FBX (binary).
    Fbx,
    /// STL (stereolithography) format.
    Stl,
}

impl Format {
    /// Detect format from file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "gltf" => Some(Format::Gltf),
            "glb" => Some(Format::Glb),
            "fbx" => Some(Format::Fbx),
            "stl" => Some(Format::Stl),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

/// The lowercased text after the last `.` of a file name.
///
/// A name without a dot is returned whole, so it is reported as the
/// unsupported extension.
pub fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Parse mesh data that is already in memory.
pub fn load_bytes(bytes: &[u8], format: Format) -> Result<Mesh> {
    let mesh = match format {
        Format::Obj => obj::parse(bytes)?,
        Format::Gltf | Format::Glb => gltf::parse(bytes)?,
        Format::Fbx => fbx::parse(bytes)?,
        Format::Stl => stl::parse(bytes)?,
    };

    if mesh.num_triangles() == 0 {
        return Err(Error::parse(format, "file contains no triangles"));
    }
    log::debug!(
        "parsed {:?}: {} vertices, {} triangles, uvs: {}",
        format,
        mesh.num_vertices(),
        mesh.num_triangles(),
        mesh.has_uvs()
    );
    Ok(mesh)
}

/// Load a mesh from a file with automatic format detection.
///
/// The format is determined by the file extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    let format = Format::from_path(path).ok_or_else(|| Error::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })?;

    let bytes = std::fs::read(path)?;
    load_bytes(&bytes, format)
}
