//! In-memory triangle mesh.
//!
//! A [`Mesh`] is the single piece of geometry a session works on: vertex
//! positions, an optional flat triangle index list, and optional per-vertex UV
//! coordinates.
//!
//! A mesh without indices is *non-indexed*: consecutive position triples form
//! triangles. Loaders produce whichever form the file format naturally has,
//! and [`Mesh::to_non_indexed`] converts between them.
//!
//! ```
//! use uvlab::mesh::Mesh;
//! use nalgebra::Point3;
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mesh = Mesh::indexed(positions, vec![0, 1, 2, 0, 2, 3]).unwrap();
//! assert_eq!(mesh.num_triangles(), 2);
//!
//! let flat = mesh.to_non_indexed();
//! assert_eq!(flat.num_vertices(), 6);
//! assert!(!flat.is_indexed());
//! ```

use nalgebra::{Point2, Point3, Vector3};

use crate::error::{Error, Result};
use crate::unwrap::UvResult;

/// A triangle mesh with optional indices and UVs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    name: Option<String>,
    positions: Vec<Point3<f64>>,
    indices: Option<Vec<u32>>,
    uvs: Option<Vec<Point2<f64>>>,
}

impl Mesh {
    /// Create a non-indexed mesh: every three positions form one triangle.
    ///
    /// Trailing positions that do not complete a triangle are kept but never
    /// form a face.
    pub fn new(positions: Vec<Point3<f64>>) -> Self {
        Self {
            name: None,
            positions,
            indices: None,
            uvs: None,
        }
    }

    /// Create an indexed mesh.
    ///
    /// Fails if the index count is not a multiple of three or if any index is
    /// out of range.
    pub fn indexed(positions: Vec<Point3<f64>>, indices: Vec<u32>) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(Error::invalid_param(
                "indices.len()",
                indices.len(),
                "must be a multiple of three",
            ));
        }
        if let Some((pos, &index)) = indices
            .iter()
            .enumerate()
            .find(|(_, i)| **i as usize >= positions.len())
        {
            return Err(Error::InvalidVertexIndex {
                triangle: pos / 3,
                index: index as usize,
            });
        }

        Ok(Self {
            name: None,
            positions,
            indices: Some(indices),
            uvs: None,
        })
    }

    /// Attach per-vertex UV coordinates.
    ///
    /// There must be exactly one UV per position.
    pub fn with_uvs(mut self, uvs: Vec<Point2<f64>>) -> Result<Self> {
        if uvs.len() != self.positions.len() {
            return Err(Error::AttributeCount {
                attribute: "uv",
                expected: self.positions.len(),
                found: uvs.len(),
            });
        }
        self.uvs = Some(uvs);
        Ok(self)
    }

    /// Set the object name written on export.
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Object name, if the source file had one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Vertex positions.
    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Triangle indices, or `None` for a non-indexed mesh.
    #[inline]
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    /// Per-vertex UV coordinates, if any.
    #[inline]
    pub fn uvs(&self) -> Option<&[Point2<f64>]> {
        self.uvs.as_deref()
    }

    /// Whether the mesh carries an index list.
    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Whether the mesh carries UV coordinates.
    #[inline]
    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    /// Number of vertex positions.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Number of complete triangles.
    pub fn num_triangles(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    /// Iterate over triangles as vertex index triples.
    pub fn triangles(&self) -> Box<dyn Iterator<Item = [usize; 3]> + '_> {
        match &self.indices {
            Some(indices) => Box::new(
                indices
                    .chunks_exact(3)
                    .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize]),
            ),
            None => Box::new((0..self.positions.len() / 3).map(|t| [3 * t, 3 * t + 1, 3 * t + 2])),
        }
    }

    /// Expand into one vertex per triangle corner.
    ///
    /// UVs and the name are carried along. A mesh that is already non-indexed
    /// is returned as a copy with any incomplete trailing triangle dropped.
    pub fn to_non_indexed(&self) -> Mesh {
        let n = self.num_triangles() * 3;
        let mut positions = Vec::with_capacity(n);
        let mut uvs = self.uvs.as_ref().map(|_| Vec::with_capacity(n));

        for tri in self.triangles() {
            for v in tri {
                positions.push(self.positions[v]);
                if let (Some(out), Some(src)) = (uvs.as_mut(), self.uvs.as_ref()) {
                    out.push(src[v]);
                }
            }
        }

        Mesh {
            name: self.name.clone(),
            positions,
            indices: None,
            uvs,
        }
    }

    /// Build the mesh described by an unwrap result.
    ///
    /// Output vertex `i` takes its position from input vertex `result.xref[i]`,
    /// so vertices split along seams get duplicated positions. The returned
    /// mesh is indexed by `result.indices` and carries `result.uvs`.
    pub fn apply_unwrap(&self, result: &UvResult) -> Result<Mesh> {
        result.validate()?;

        let positions = result
            .xref()
            .iter()
            .enumerate()
            .map(|(i, &src)| {
                self.positions
                    .get(src as usize)
                    .copied()
                    .ok_or_else(|| {
                        Error::Unwrap(format!("output vertex {i} maps to missing vertex {src}"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut mesh = Mesh::indexed(positions, result.indices().to_vec())?
            .with_uvs(result.uvs().to_vec())?;
        mesh.name = self.name.clone();
        Ok(mesh)
    }

    /// Unit normal of a triangle. Degenerate triangles yield the zero vector.
    pub fn triangle_normal(&self, tri: [usize; 3]) -> Vector3<f64> {
        let [p0, p1, p2] = tri.map(|v| self.positions[v]);
        let n = (p1 - p0).cross(&(p2 - p0));
        let len = n.norm();
        if len > 1e-20 {
            n / len
        } else {
            Vector3::zeros()
        }
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        self.triangles()
            .map(|[a, b, c]| {
                let p0 = self.positions[a];
                0.5 * (self.positions[b] - p0).cross(&(self.positions[c] - p0)).norm()
            })
            .sum()
    }

    /// Axis-aligned bounding box. Returns `None` for a mesh without vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.positions.first()?;
        let bounds = self
            .positions
            .iter()
            .fold((first, first), |(mut min, mut max), p| {
                for i in 0..3 {
                    min[i] = min[i].min(p[i]);
                    max[i] = max[i].max(p[i]);
                }
                (min, max)
            });
        Some(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        Mesh::indexed(positions, vec![0, 1, 2, 0, 2, 3]).unwrap()
    }

    #[test]
    fn test_indexed_rejects_bad_indices() {
        let positions = vec![Point3::origin(); 3];
        assert!(matches!(
            Mesh::indexed(positions.clone(), vec![0, 1, 3]),
            Err(Error::InvalidVertexIndex { triangle: 0, index: 3 })
        ));
        assert!(matches!(
            Mesh::indexed(positions, vec![0, 1]),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_with_uvs_checks_count() {
        let err = quad().with_uvs(vec![Point2::origin(); 3]).unwrap_err();
        assert!(matches!(
            err,
            Error::AttributeCount { expected: 4, found: 3, .. }
        ));
    }

    #[test]
    fn test_to_non_indexed() {
        let uvs = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let mesh = quad().with_uvs(uvs).unwrap().with_name("quad");
        let flat = mesh.to_non_indexed();

        assert_eq!(flat.num_vertices(), 6);
        assert_eq!(flat.num_triangles(), 2);
        assert_eq!(flat.name(), Some("quad"));
        assert_eq!(flat.positions()[3], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(flat.positions()[5], Point3::new(0.0, 1.0, 0.0));
        assert_eq!(flat.uvs().unwrap()[4], Point2::new(1.0, 1.0));
    }

    #[test]
    fn test_non_indexed_ignores_partial_triangle() {
        let mesh = Mesh::new(vec![Point3::origin(); 7]);
        assert_eq!(mesh.num_triangles(), 2);
        assert_eq!(mesh.triangles().count(), 2);
        assert_eq!(mesh.to_non_indexed().num_vertices(), 6);
    }

    #[test]
    fn test_apply_unwrap_splits_vertices() {
        let mesh = quad();
        let result = UvResult::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(0.5, 0.0),
                Point2::new(0.5, 0.5),
                Point2::new(0.6, 0.0),
                Point2::new(1.0, 0.5),
            ],
            vec![0, 1, 2, 3, 4, 2],
            vec![0, 1, 2, 0, 3],
        );
        let unwrapped = mesh.apply_unwrap(&result).unwrap();

        assert_eq!(unwrapped.num_vertices(), 5);
        assert_eq!(unwrapped.positions()[3], mesh.positions()[0]);
        assert_eq!(unwrapped.positions()[4], mesh.positions()[3]);
        assert_eq!(unwrapped.uvs().unwrap().len(), 5);
        assert_eq!(unwrapped.indices().unwrap(), &[0, 1, 2, 3, 4, 2]);
    }

    #[test]
    fn test_apply_unwrap_rejects_bad_xref() {
        let result = UvResult::new(vec![Point2::origin(); 3], vec![0, 1, 2], vec![0, 1, 9]);
        assert!(quad().apply_unwrap(&result).is_err());
    }

    #[test]
    fn test_area_and_bounds() {
        let mesh = quad();
        assert!((mesh.surface_area() - 1.0).abs() < 1e-12);
        let (min, max) = mesh.bounding_box().unwrap();
        assert_eq!(min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 0.0));
        assert!(Mesh::default().bounding_box().is_none());

        let n = mesh.triangle_normal([0, 1, 2]);
        assert!((n.z - 1.0).abs() < 1e-12);
    }
}
