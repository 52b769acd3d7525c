//! Cylindrical projection.

use std::f64::consts::PI;

use nalgebra::{Point2, Point3};

use super::{triangles, Unwrapper, UvResult};
use crate::error::{Error, Result};

/// Wraps the mesh around a vertical cylinder through its bounding box center.
///
/// `u` is the angle around the Y axis mapped to [0, 1], `v` is the height
/// mapped to [0, 1]. Vertices are not split, so triangles that straddle the
/// seam at the back of the mesh stretch across the whole layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct CylindricalProjection;

impl Unwrapper for CylindricalProjection {
    fn name(&self) -> &str {
        "cylindrical"
    }

    fn generate(&self, positions: &[Point3<f64>], indices: &[u32]) -> Result<UvResult> {
        let tris = triangles(positions, indices)?;
        if tris.is_empty() {
            return Err(Error::EmptyMesh);
        }

        let mut min = positions[tris[0][0]];
        let mut max = min;
        for p in positions {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        let center = nalgebra::center(&min, &max);
        let height = max.y - min.y;

        let uvs = positions
            .iter()
            .map(|p| {
                let angle = (p.x - center.x).atan2(p.z - center.z);
                let u = angle / (2.0 * PI) + 0.5;
                let v = if height > 1e-12 {
                    (p.y - min.y) / height
                } else {
                    0.5
                };
                Point2::new(u, v)
            })
            .collect();

        let indices = tris
            .iter()
            .flat_map(|t| t.map(|v| v as u32))
            .collect();
        let xref = (0..positions.len() as u32).collect();

        Ok(UvResult::new(uvs, indices, xref))
    }
}
