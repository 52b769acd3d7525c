//! Scene state for the 3D preview.
//!
//! Everything here is independent of a window or GPU: the camera, the
//! turntable spin, fitting a mesh into view, and flat-shaded vertex data. The
//! `uvlab-view` binary puts it on screen with wgpu; tests and the CLI use
//! [`NullView`].
//!
//! # Scene
//!
//! - Camera at `(0, 0, 3)` looking at the origin, 45° vertical field of view.
//! - Directional light from [`LIGHT_POSITION`].
//! - The mesh is recentered and scaled into the unit sphere, then spun about Y.

pub mod camera;
mod turntable;

use bytemuck::{Pod, Zeroable};
use nalgebra::Point3;

use crate::mesh::Mesh;

pub use camera::{Mat4, SceneCamera};
pub use turntable::{Turntable, SPIN_PER_FRAME};

/// Where the directional light comes from.
pub const LIGHT_POSITION: [f32; 3] = [2.0, 2.0, 2.0];

/// Something that displays the current mesh.
pub trait SceneView {
    /// Replace the displayed mesh.
    fn show(&mut self, mesh: &Mesh);
}

/// A view that displays nothing and counts what it was given.
#[derive(Debug, Default, Clone)]
pub struct NullView {
    shown: usize,
    triangles: usize,
}

impl NullView {
    /// Create a new null view.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many meshes have been shown.
    pub fn shown(&self) -> usize {
        self.shown
    }

    /// Triangle count of the last mesh shown.
    pub fn triangles(&self) -> usize {
        self.triangles
    }
}

impl SceneView for NullView {
    fn show(&mut self, mesh: &Mesh) {
        self.shown += 1;
        self.triangles = mesh.num_triangles();
    }
}

/// Direction towards the light, normalized.
pub fn light_direction() -> [f32; 3] {
    camera::normalize(LIGHT_POSITION)
}

/// Recentering and scaling that puts a mesh inside the unit sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    /// Bounding box center of the mesh.
    pub center: Point3<f64>,
    /// Uniform scale applied after recentering.
    pub scale: f64,
}

impl Fit {
    /// Compute the fit for a mesh. Empty or single-point meshes get scale 1.
    pub fn of(mesh: &Mesh) -> Self {
        let Some((min, max)) = mesh.bounding_box() else {
            return Self {
                center: Point3::origin(),
                scale: 1.0,
            };
        };

        let center = nalgebra::center(&min, &max);
        let radius = mesh
            .positions()
            .iter()
            .map(|p| (p - center).norm())
            .fold(0.0, f64::max);
        let scale = if radius > 1e-12 { 1.0 / radius } else { 1.0 };
        Self { center, scale }
    }

    /// The fit as a model matrix.
    pub fn matrix(&self) -> Mat4 {
        let s = self.scale as f32;
        let c = self.center.map(|v| v as f32);
        [
            [s, 0.0, 0.0, 0.0],
            [0.0, s, 0.0, 0.0],
            [0.0, 0.0, s, 0.0],
            [-c.x * s, -c.y * s, -c.z * s, 1.0],
        ]
    }
}

/// One corner of a flat-shaded triangle, laid out for a vertex buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadedVertex {
    /// Position in model space.
    pub position: [f32; 3],
    /// Face normal of the triangle this corner belongs to.
    pub normal: [f32; 3],
}

impl ShadedVertex {
    /// Three vertices per triangle, each carrying its face normal.
    pub fn from_mesh(mesh: &Mesh) -> Vec<ShadedVertex> {
        mesh.triangles()
            .flat_map(|tri| {
                let n = mesh.triangle_normal(tri);
                let normal = [n.x as f32, n.y as f32, n.z as f32];
                tri.map(|v| {
                    let p = mesh.positions()[v];
                    ShadedVertex {
                        position: [p.x as f32, p.y as f32, p.z as f32],
                        normal,
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::camera::transform_point;

    fn offset_triangle() -> Mesh {
        Mesh::indexed(
            vec![
                Point3::new(10.0, 10.0, 10.0),
                Point3::new(14.0, 10.0, 10.0),
                Point3::new(10.0, 14.0, 10.0),
            ],
            vec![0, 1, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_null_view_counts() {
        let mut view = NullView::new();
        view.show(&offset_triangle());
        view.show(&offset_triangle());
        assert_eq!(view.shown(), 2);
        assert_eq!(view.triangles(), 1);
    }

    #[test]
    fn test_fit_lands_in_unit_sphere() {
        let mesh = offset_triangle();
        let fit = Fit::of(&mesh);
        assert_eq!(fit.center, Point3::new(12.0, 12.0, 10.0));

        let m = fit.matrix();
        let mut farthest: f32 = 0.0;
        for p in mesh.positions() {
            let q = transform_point(m, [p.x as f32, p.y as f32, p.z as f32]);
            farthest = farthest.max((q[0] * q[0] + q[1] * q[1] + q[2] * q[2]).sqrt());
        }
        assert!((farthest - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_fit_of_empty_mesh() {
        let fit = Fit::of(&Mesh::default());
        assert_eq!(fit.scale, 1.0);
    }

    #[test]
    fn test_shaded_vertices() {
        let vertices = ShadedVertex::from_mesh(&offset_triangle());
        assert_eq!(vertices.len(), 3);
        assert!(vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
        assert_eq!(vertices[1].position, [14.0, 10.0, 10.0]);
    }

    #[test]
    fn test_light_direction_is_unit() {
        let d = light_direction();
        let len = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-6);
        assert!(d.iter().all(|&c| c > 0.0));
    }
}
