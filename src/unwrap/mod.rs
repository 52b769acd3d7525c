//! UV unwrapping.
//!
//! An [`Unwrapper`] takes triangle soup (positions plus a flat index list) and
//! returns a [`UvResult`]: one UV per output vertex, a re-indexed triangle
//! list, and a cross-reference back to the input vertices. The session treats
//! unwrappers as black boxes; anything implementing the trait can be plugged
//! in through an [`UnwrapperLoader`].
//!
//! # Available Backends
//!
//! - [`ChartAtlas`]: groups triangles into planar charts and packs them into
//!   the unit square. Splits vertices along chart borders.
//! - [`CylindricalProjection`]: wraps the mesh around the vertical axis. Keeps
//!   the input vertices as-is.
//!
//! # Example
//!
//! ```
//! use uvlab::unwrap::{ChartAtlas, Unwrapper};
//! use nalgebra::Point3;
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let result = ChartAtlas::default().generate(&positions, &[0, 1, 2]).unwrap();
//! assert_eq!(result.num_triangles(), 1);
//! ```

mod atlas;
mod cylindrical;
mod loader;
mod result;

use std::str::FromStr;

use nalgebra::Point3;

use crate::error::{Error, Result};

pub use atlas::{AtlasOptions, ChartAtlas};
pub use cylindrical::CylindricalProjection;
pub use loader::{Readiness, UnwrapperLoader};
pub use result::UvResult;

/// A UV unwrapping backend.
///
/// `indices` is read in consecutive triples; a trailing partial triple is
/// ignored. Every index must be a valid offset into `positions`.
pub trait Unwrapper: Send {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Compute UVs for the given triangles.
    fn generate(&self, positions: &[Point3<f64>], indices: &[u32]) -> Result<UvResult>;
}

impl<U: Unwrapper + ?Sized> Unwrapper for Box<U> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn generate(&self, positions: &[Point3<f64>], indices: &[u32]) -> Result<UvResult> {
        (**self).generate(positions, indices)
    }
}

/// Built-in unwrapping methods, selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnwrapMethod {
    /// Planar chart atlas.
    #[default]
    Atlas,
    /// Cylindrical projection around the Y axis.
    Cylindrical,
}

impl UnwrapMethod {
    /// Instantiate the backend for this method.
    pub fn build(self, options: AtlasOptions) -> Result<Box<dyn Unwrapper>> {
        match self {
            UnwrapMethod::Atlas => Ok(Box::new(ChartAtlas::new(options)?)),
            UnwrapMethod::Cylindrical => Ok(Box::new(CylindricalProjection)),
        }
    }
}

impl FromStr for UnwrapMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "atlas" => Ok(UnwrapMethod::Atlas),
            "cylindrical" => Ok(UnwrapMethod::Cylindrical),
            other => Err(Error::invalid_param(
                "method",
                other,
                "expected 'atlas' or 'cylindrical'",
            )),
        }
    }
}

/// Group `indices` into complete triangles, checking every index.
pub(crate) fn triangles(positions: &[Point3<f64>], indices: &[u32]) -> Result<Vec<[usize; 3]>> {
    if indices.len() % 3 != 0 {
        log::debug!(
            "ignoring {} trailing indices that do not form a triangle",
            indices.len() % 3
        );
    }

    indices
        .chunks_exact(3)
        .enumerate()
        .map(|(t, chunk)| {
            let mut tri = [0usize; 3];
            for (slot, &index) in tri.iter_mut().zip(chunk) {
                if index as usize >= positions.len() {
                    return Err(Error::InvalidVertexIndex {
                        triangle: t,
                        index: index as usize,
                    });
                }
                *slot = index as usize;
            }
            Ok(tri)
        })
        .collect()
}
