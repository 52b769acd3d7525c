//! Unwrap output storage.
//!
//! This module provides the [`UvResult`] type returned by every
//! [`Unwrapper`](super::Unwrapper).

use nalgebra::Point2;

use crate::error::{Error, Result};

/// UV coordinates and triangles produced by one unwrap.
///
/// An unwrapper may split input vertices along chart seams, so the output has
/// its own vertex numbering: `uvs[i]` is the texture coordinate of output
/// vertex `i`, and `xref[i]` is the input vertex it was derived from.
/// `indices` is read in consecutive triples, one per triangle, in input
/// triangle order.
///
/// UV coordinates are typically in the range [0, 1] but may extend outside it
/// depending on the unwrapper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UvResult {
    uvs: Vec<Point2<f64>>,
    indices: Vec<u32>,
    xref: Vec<u32>,
}

impl UvResult {
    /// Create a result from its parts.
    pub fn new(uvs: Vec<Point2<f64>>, indices: Vec<u32>, xref: Vec<u32>) -> Self {
        Self { uvs, indices, xref }
    }

    /// UV coordinates of the output vertices.
    #[inline]
    pub fn uvs(&self) -> &[Point2<f64>] {
        &self.uvs
    }

    /// Flat triangle index list into [`uvs`](Self::uvs).
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Input vertex for each output vertex.
    #[inline]
    pub fn xref(&self) -> &[u32] {
        &self.xref
    }

    /// Number of output vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.uvs.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.uvs.is_empty()
    }

    /// Number of complete triangles.
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check the structural invariants of the result.
    pub fn validate(&self) -> Result<()> {
        if self.xref.len() != self.uvs.len() {
            return Err(Error::AttributeCount {
                attribute: "xref",
                expected: self.uvs.len(),
                found: self.xref.len(),
            });
        }
        if self.indices.len() % 3 != 0 {
            return Err(Error::invalid_param(
                "indices.len()",
                self.indices.len(),
                "must be a multiple of three",
            ));
        }
        for (pos, &index) in self.indices.iter().enumerate() {
            if index as usize >= self.uvs.len() {
                return Err(Error::InvalidVertexIndex {
                    triangle: pos / 3,
                    index: index as usize,
                });
            }
        }
        Ok(())
    }

    /// Compute the bounding box of the UV coordinates.
    ///
    /// Returns `None` if the result is empty.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let first = *self.uvs.first()?;
        let mut min = first;
        let mut max = first;

        for uv in &self.uvs {
            min.x = min.x.min(uv.x);
            min.y = min.y.min(uv.y);
            max.x = max.x.max(uv.x);
            max.y = max.y.max(uv.y);
        }

        Some((min, max))
    }

    /// Total triangle area in UV space.
    ///
    /// Triangles referencing a missing UV contribute nothing.
    pub fn total_area(&self) -> f64 {
        self.indices
            .chunks_exact(3)
            .filter_map(|t| {
                let p0 = self.uvs.get(t[0] as usize)?;
                let p1 = self.uvs.get(t[1] as usize)?;
                let p2 = self.uvs.get(t[2] as usize)?;
                Some(0.5 * ((p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y)).abs())
            })
            .sum()
    }
}
