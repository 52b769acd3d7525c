//! Planar chart atlas.
//!
//! Triangles are welded by position, grouped by the axis their normal points
//! along most, and flooded across shared edges into charts. Each chart is
//! projected onto its axis plane and the charts are shelf-packed into the unit
//! square with a uniform scale, so relative texel density is preserved.
//!
//! Vertices on the border between two charts appear once per chart in the
//! output; [`UvResult::xref`] maps each copy back to its input vertex.

use std::collections::HashMap;

use nalgebra::{Point2, Point3, Vector3};
use rayon::prelude::*;

use super::{triangles, Unwrapper, UvResult};
use crate::error::{Error, Result};

/// Options for [`ChartAtlas`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasOptions {
    /// Gap between charts, as a fraction of the atlas side (default: 0.01).
    pub padding: f64,

    /// Positions closer than this are treated as the same vertex when
    /// building charts (default: 1e-6). Zero welds exact matches only.
    pub weld_epsilon: f64,

    /// Whether to project charts in parallel (default: true).
    pub parallel: bool,
}

impl Default for AtlasOptions {
    fn default() -> Self {
        Self {
            padding: 0.01,
            weld_epsilon: 1e-6,
            parallel: true,
        }
    }
}

impl AtlasOptions {
    /// Set the chart padding.
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    /// Set the welding tolerance.
    pub fn with_weld_epsilon(mut self, weld_epsilon: f64) -> Self {
        self.weld_epsilon = weld_epsilon;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..0.25).contains(&self.padding) {
            return Err(Error::invalid_param(
                "padding",
                self.padding,
                "must be in [0, 0.25)",
            ));
        }
        if !self.weld_epsilon.is_finite() || self.weld_epsilon < 0.0 {
            return Err(Error::invalid_param(
                "weld_epsilon",
                self.weld_epsilon,
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Chart-based unwrapper.
#[derive(Debug, Clone, Default)]
pub struct ChartAtlas {
    options: AtlasOptions,
}

impl ChartAtlas {
    /// Create an atlas unwrapper with validated options.
    pub fn new(options: AtlasOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// The options in use.
    pub fn options(&self) -> &AtlasOptions {
        &self.options
    }
}

impl Unwrapper for ChartAtlas {
    fn name(&self) -> &str {
        "atlas"
    }

    fn generate(&self, positions: &[Point3<f64>], indices: &[u32]) -> Result<UvResult> {
        let tris = triangles(positions, indices)?;
        if tris.is_empty() {
            return Err(Error::EmptyMesh);
        }

        let welded = weld(positions, self.options.weld_epsilon);
        let axes: Vec<Axis> = tris
            .iter()
            .map(|&[a, b, c]| {
                let n = (positions[b] - positions[a]).cross(&(positions[c] - positions[a]));
                Axis::dominant(&n)
            })
            .collect();

        let groups = build_charts(&tris, &welded, &axes);

        let project = |members: &Vec<usize>| {
            Chart::project(members, &tris, &welded, axes[members[0]], positions)
        };
        let charts: Vec<Chart> = if self.options.parallel {
            groups.par_iter().map(project).collect()
        } else {
            groups.iter().map(project).collect()
        };

        let (offsets, scale) = pack(&charts, self.options.padding);

        let mut uvs = Vec::new();
        let mut xref = Vec::new();
        let mut out_tris = vec![[0u32; 3]; tris.len()];

        for (chart, offset) in charts.iter().zip(&offsets) {
            let base = uvs.len() as u32;
            for (&source, coord) in chart.sources.iter().zip(&chart.coords) {
                uvs.push(Point2::new(
                    (offset.x + coord.x) * scale,
                    (offset.y + coord.y) * scale,
                ));
                xref.push(source);
            }
            for (&t, local) in chart.triangles.iter().zip(&chart.local) {
                out_tris[t] = local.map(|v| base + v);
            }
        }

        log::debug!(
            "atlas: {} triangles -> {} charts, {} vertices",
            tris.len(),
            charts.len(),
            uvs.len()
        );

        let indices = out_tris.into_iter().flatten().collect();
        Ok(UvResult::new(uvs, indices, xref))
    }
}

/// Projection plane of a chart, named by the outward normal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl Axis {
    fn dominant(n: &Vector3<f64>) -> Axis {
        let (ax, ay, az) = (n.x.abs(), n.y.abs(), n.z.abs());
        if ax >= ay && ax >= az && ax > 0.0 {
            if n.x >= 0.0 {
                Axis::PosX
            } else {
                Axis::NegX
            }
        } else if ay >= az && ay > 0.0 {
            if n.y >= 0.0 {
                Axis::PosY
            } else {
                Axis::NegY
            }
        } else if n.z < 0.0 {
            Axis::NegZ
        } else {
            Axis::PosZ
        }
    }

    /// Project onto the plane so that front-facing triangles stay
    /// counter-clockwise in UV space.
    fn project(self, p: &Point3<f64>) -> Point2<f64> {
        match self {
            Axis::PosX => Point2::new(-p.z, p.y),
            Axis::NegX => Point2::new(p.z, p.y),
            Axis::PosY => Point2::new(p.x, -p.z),
            Axis::NegY => Point2::new(p.x, p.z),
            Axis::PosZ => Point2::new(p.x, p.y),
            Axis::NegZ => Point2::new(-p.x, p.y),
        }
    }
}

/// Map every input vertex to the first input vertex at the same position.
fn weld(positions: &[Point3<f64>], epsilon: f64) -> Vec<u32> {
    let mut seen: HashMap<[i64; 3], u32> = HashMap::with_capacity(positions.len());

    positions
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let key = if epsilon > 0.0 {
                [
                    (p.x / epsilon).round() as i64,
                    (p.y / epsilon).round() as i64,
                    (p.z / epsilon).round() as i64,
                ]
            } else {
                [p.x.to_bits() as i64, p.y.to_bits() as i64, p.z.to_bits() as i64]
            };
            *seen.entry(key).or_insert(i as u32)
        })
        .collect()
}

/// Flood triangles with the same axis across shared edges.
///
/// Returns the member triangles of each chart, ordered by first member.
fn build_charts(tris: &[[usize; 3]], welded: &[u32], axes: &[Axis]) -> Vec<Vec<usize>> {
    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let mut parent: Vec<usize> = (0..tris.len()).collect();
    let mut edges: HashMap<(u32, u32), usize> = HashMap::new();

    for (t, tri) in tris.iter().enumerate() {
        for k in 0..3 {
            let a = welded[tri[k]];
            let b = welded[tri[(k + 1) % 3]];
            if a == b {
                continue;
            }
            let key = (a.min(b), a.max(b));
            match edges.get(&key) {
                Some(&other) if axes[other] == axes[t] => {
                    let (ra, rb) = (find(&mut parent, t), find(&mut parent, other));
                    if ra != rb {
                        parent[ra.max(rb)] = ra.min(rb);
                    }
                }
                Some(_) => {}
                None => {
                    edges.insert(key, t);
                }
            }
        }
    }

    let mut chart_of_root: HashMap<usize, usize> = HashMap::new();
    let mut charts: Vec<Vec<usize>> = Vec::new();
    for t in 0..tris.len() {
        let root = find(&mut parent, t);
        let chart = *chart_of_root.entry(root).or_insert_with(|| {
            charts.push(Vec::new());
            charts.len() - 1
        });
        charts[chart].push(t);
    }
    charts
}

/// One projected chart in its own local frame (minimum corner at the origin).
struct Chart {
    /// Global triangle ids, parallel to `local`.
    triangles: Vec<usize>,
    /// Triangles in chart-local vertex numbering.
    local: Vec<[u32; 3]>,
    /// Input vertex for each chart vertex.
    sources: Vec<u32>,
    /// Projected coordinates for each chart vertex.
    coords: Vec<Point2<f64>>,
    width: f64,
    height: f64,
}

impl Chart {
    fn project(
        members: &[usize],
        tris: &[[usize; 3]],
        welded: &[u32],
        axis: Axis,
        positions: &[Point3<f64>],
    ) -> Chart {
        let mut local_of: HashMap<u32, u32> = HashMap::new();
        let mut sources = Vec::new();
        let mut coords = Vec::new();
        let mut local = Vec::with_capacity(members.len());

        for &t in members {
            let tri = tris[t].map(|v| {
                *local_of.entry(welded[v]).or_insert_with(|| {
                    sources.push(v as u32);
                    coords.push(axis.project(&positions[v]));
                    (coords.len() - 1) as u32
                })
            });
            local.push(tri);
        }

        let mut min = Point2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for c in &coords {
            min.x = min.x.min(c.x);
            min.y = min.y.min(c.y);
            max.x = max.x.max(c.x);
            max.y = max.y.max(c.y);
        }
        for c in &mut coords {
            c.x -= min.x;
            c.y -= min.y;
        }

        Chart {
            triangles: members.to_vec(),
            local,
            sources,
            coords,
            width: max.x - min.x,
            height: max.y - min.y,
        }
    }
}

/// Shelf-pack charts, tallest first.
///
/// Returns the offset of each chart (in chart units) and the uniform scale
/// that maps the packed layout into [0, 1].
fn pack(charts: &[Chart], padding: f64) -> (Vec<Point2<f64>>, f64) {
    let content: f64 = charts.iter().map(|c| c.width * c.height).sum();
    let largest = charts
        .iter()
        .map(|c| c.width.max(c.height))
        .fold(0.0_f64, f64::max);
    let pad = padding * content.sqrt().max(largest);

    let padded_area: f64 = charts
        .iter()
        .map(|c| (c.width + pad) * (c.height + pad))
        .sum();
    let widest = charts.iter().map(|c| c.width).fold(0.0_f64, f64::max);
    let shelf_width = padded_area.sqrt().max(widest + 2.0 * pad);

    let mut order: Vec<usize> = (0..charts.len()).collect();
    order.sort_by(|&a, &b| charts[b].height.total_cmp(&charts[a].height));

    let mut offsets = vec![Point2::origin(); charts.len()];
    let (mut x, mut y, mut shelf_height) = (pad, pad, 0.0_f64);
    let mut extent_x = 0.0_f64;

    for i in order {
        let chart = &charts[i];
        if x > pad && x + chart.width + pad > shelf_width {
            y += shelf_height + pad;
            x = pad;
            shelf_height = 0.0;
        }
        offsets[i] = Point2::new(x, y);
        x += chart.width + pad;
        extent_x = extent_x.max(x);
        shelf_height = shelf_height.max(chart.height);
    }
    let extent_y = y + shelf_height + pad;

    let side = extent_x.max(extent_y);
    let scale = if side > 1e-12 { 1.0 / side } else { 1.0 };
    (offsets, scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit cube as triangle soup, 12 triangles with outward normals.
    fn cube_soup() -> Vec<Point3<f64>> {
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let faces: [[usize; 3]; 12] = [
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [3, 7, 6],
            [3, 6, 2],
            [0, 4, 7],
            [0, 7, 3],
            [1, 2, 6],
            [1, 6, 5],
        ];
        faces.iter().flat_map(|f| f.map(|v| corners[v])).collect()
    }

    fn identity(n: usize) -> Vec<u32> {
        (0..n as u32).collect()
    }

    #[test]
    fn test_coplanar_quad_is_one_chart() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let result = ChartAtlas::default()
            .generate(&positions, &[0, 1, 2, 0, 2, 3])
            .unwrap();

        assert!(result.validate().is_ok());
        assert_eq!(result.len(), 4);
        assert_eq!(result.xref(), &[0, 1, 2, 3]);
        // The long side spans the atlas minus padding.
        let (min, max) = result.bounding_box().unwrap();
        assert!(min.x > 0.0 && max.x < 1.0);
        assert!((max.x - min.x) > 2.0 * (max.y - min.y) - 1e-9);
    }

    #[test]
    fn test_cube_soup_welds_into_six_charts() {
        let positions = cube_soup();
        let result = ChartAtlas::default()
            .generate(&positions, &identity(positions.len()))
            .unwrap();

        assert!(result.validate().is_ok());
        assert_eq!(result.num_triangles(), 12);
        // Four corners per face.
        assert_eq!(result.len(), 24);

        for uv in result.uvs() {
            assert!((0.0..=1.0).contains(&uv.x), "u out of range: {}", uv.x);
            assert!((0.0..=1.0).contains(&uv.y), "v out of range: {}", uv.y);
        }

        // Six unit squares of equal scale.
        let area = result.total_area();
        let per_face = area / 6.0;
        let tri_areas: Vec<f64> = result
            .indices()
            .chunks_exact(3)
            .map(|t| {
                let [p0, p1, p2] = [t[0], t[1], t[2]].map(|i| result.uvs()[i as usize]);
                0.5 * ((p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y))
            })
            .collect();
        for a in tri_areas {
            // Counter-clockwise and half a face each.
            assert!(a > 0.0);
            assert!((a - per_face / 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_xref_points_at_matching_positions() {
        let positions = cube_soup();
        let indices = identity(positions.len());
        let result = ChartAtlas::default().generate(&positions, &indices).unwrap();

        for (t, tri) in result.indices().chunks_exact(3).enumerate() {
            for (k, &out) in tri.iter().enumerate() {
                let source = result.xref()[out as usize] as usize;
                assert_eq!(positions[source], positions[3 * t + k]);
            }
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let positions = cube_soup();
        let indices = identity(positions.len());
        let par = ChartAtlas::default().generate(&positions, &indices).unwrap();
        let seq = ChartAtlas::new(AtlasOptions::default().with_parallel(false))
            .unwrap()
            .generate(&positions, &indices)
            .unwrap();
        assert_eq!(par, seq);
    }

    #[test]
    fn test_empty_and_invalid_input() {
        let positions = vec![Point3::origin(); 3];
        assert!(matches!(
            ChartAtlas::default().generate(&positions, &[0, 1]),
            Err(Error::EmptyMesh)
        ));
        assert!(matches!(
            ChartAtlas::default().generate(&positions, &[0, 1, 7]),
            Err(Error::InvalidVertexIndex { .. })
        ));
    }

    #[test]
    fn test_options_validation() {
        assert!(ChartAtlas::new(AtlasOptions::default().with_padding(0.5)).is_err());
        assert!(ChartAtlas::new(AtlasOptions::default().with_weld_epsilon(-1.0)).is_err());
        assert!(ChartAtlas::new(AtlasOptions::default().with_padding(0.0)).is_ok());
    }

    #[test]
    fn test_dominant_axis() {
        assert_eq!(Axis::dominant(&Vector3::new(0.0, 0.0, -2.0)), Axis::NegZ);
        assert_eq!(Axis::dominant(&Vector3::new(0.9, 0.1, 0.1)), Axis::PosX);
        assert_eq!(Axis::dominant(&Vector3::new(0.1, -0.9, 0.1)), Axis::NegY);
        assert_eq!(Axis::dominant(&Vector3::zeros()), Axis::PosZ);
    }
}
