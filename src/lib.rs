//! # uvlab
//!
//! Load a triangle mesh, generate UV coordinates for it, look at the UV
//! layout, and export the result as OBJ.
//!
//! ## Features
//!
//! - **Loading from bytes**: OBJ, glTF/GLB, FBX, and STL, picked by file extension
//! - **Pluggable unwrappers**: anything implementing [`unwrap::Unwrapper`],
//!   loaded in the background through [`unwrap::UnwrapperLoader`]
//! - **UV layout rendering**: triangle outlines on any [`render::Canvas`],
//!   with a software canvas that writes PNG
//! - **Export**: OBJ with `vt` texture coordinates
//! - **Preview**: scene state for the `uvlab-view` window
//!
//! ## Quick Start
//!
//! ```no_run
//! use uvlab::prelude::*;
//!
//! let mut session = SessionConfig::default()
//!     .with_uv_size(1024)
//!     .build(NullView::new(), ConsoleNotifier)
//!     .unwrap();
//! session.wait_for_unwrapper();
//!
//! session.load_path("model.glb").unwrap();
//! session.generate_uv().unwrap();
//! session.save_uv_layout().unwrap();
//! let exported = session.export().unwrap();
//! println!("wrote {}", exported.display());
//! ```
//!
//! ## Using the Pieces Directly
//!
//! ```
//! use uvlab::prelude::*;
//! use nalgebra::Point3;
//!
//! let mesh = Mesh::indexed(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(1.0, 1.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ],
//!     vec![0, 1, 2, 0, 2, 3],
//! )
//! .unwrap();
//!
//! let flat = mesh.to_non_indexed();
//! let corners: Vec<u32> = (0..flat.num_vertices() as u32).collect();
//! let result = ChartAtlas::default().generate(flat.positions(), &corners).unwrap();
//! let unwrapped = flat.apply_unwrap(&result).unwrap();
//! assert!(unwrapped.has_uvs());
//!
//! let mut canvas = RasterCanvas::new(128, 128).unwrap();
//! draw_uv_layout(&mut canvas, result.uvs(), result.indices(), &UvStyle::default());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod io;
pub mod mesh;
pub mod render;
pub mod session;
pub mod unwrap;
pub mod viewer;

/// Prelude module for convenient imports.
///
/// ```
/// use uvlab::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::io::Format;
    pub use crate::mesh::Mesh;
    pub use crate::render::{draw_uv_layout, uv_to_pixel, Canvas, RasterCanvas, UvStyle};
    pub use crate::session::{ConsoleNotifier, Notice, Notifier, Session, SessionConfig};
    pub use crate::unwrap::{
        AtlasOptions, ChartAtlas, CylindricalProjection, Readiness, UnwrapMethod, Unwrapper,
        UnwrapperLoader, UvResult,
    };
    pub use crate::viewer::{NullView, SceneView};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
