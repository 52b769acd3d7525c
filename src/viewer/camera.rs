//! Fixed scene camera and the small matrix helpers the viewer needs.
//!
//! Matrices are column-major `[[f32; 4]; 4]`, ready to upload as uniforms.
//! Projection maps depth to `[0, 1]` as wgpu expects.

use std::f32::consts::PI;

/// A 4x4 column-major matrix.
pub type Mat4 = [[f32; 4]; 4];

/// Perspective camera looking at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneCamera {
    /// Camera position.
    pub eye: [f32; 3],
    /// Point the camera looks at.
    pub target: [f32; 3],
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width over height.
    pub aspect: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self {
            eye: [0.0, 0.0, 3.0],
            target: [0.0, 0.0, 0.0],
            fov_y: PI / 4.0, // 45 degrees
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl SceneCamera {
    /// World to camera transform.
    pub fn view_matrix(&self) -> Mat4 {
        look_at(self.eye, self.target, [0.0, 1.0, 0.0])
    }

    /// Camera to clip transform.
    pub fn projection_matrix(&self) -> Mat4 {
        perspective(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        mat4_mul(self.projection_matrix(), self.view_matrix())
    }
}

/// The identity matrix.
pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Create a look-at view matrix.
pub fn look_at(eye: [f32; 3], target: [f32; 3], up: [f32; 3]) -> Mat4 {
    let f = normalize(sub(target, eye));
    let s = normalize(cross(f, up));
    let u = cross(s, f);

    [
        [s[0], u[0], -f[0], 0.0],
        [s[1], u[1], -f[1], 0.0],
        [s[2], u[2], -f[2], 0.0],
        [-dot(s, eye), -dot(u, eye), dot(f, eye), 1.0],
    ]
}

/// Create a right-handed perspective projection with depth in `[0, 1]`.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y / 2.0).tan();
    let nf = 1.0 / (near - far);

    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, far * nf, -1.0],
        [0.0, 0.0, far * near * nf, 0.0],
    ]
}

/// Rotation about the Y axis.
pub fn rotation_y(angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    [
        [c, 0.0, -s, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [s, 0.0, c, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Multiply two 4x4 matrices.
pub fn mat4_mul(a: Mat4, b: Mat4) -> Mat4 {
    let mut result = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }
    result
}

/// Apply a matrix to a point, with perspective divide.
pub fn transform_point(m: Mat4, p: [f32; 3]) -> [f32; 3] {
    let mut out = [0.0; 4];
    for (row, value) in out.iter_mut().enumerate() {
        *value = m[0][row] * p[0] + m[1][row] * p[1] + m[2][row] * p[2] + m[3][row];
    }
    [out[0] / out[3], out[1] / out[3], out[2] / out[3]]
}

// Vector operations
fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Unit vector in the direction of `v`.
pub fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = dot(v, v).sqrt();
    if len > 1e-10 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        (0..3).all(|i| (a[i] - b[i]).abs() < 1e-5)
    }

    #[test]
    fn test_view_moves_eye_to_origin() {
        let camera = SceneCamera::default();
        let p = transform_point(camera.view_matrix(), camera.eye);
        assert!(close(p, [0.0, 0.0, 0.0]));

        // The target sits straight ahead, down -Z.
        let t = transform_point(camera.view_matrix(), camera.target);
        assert!(close(t, [0.0, 0.0, -3.0]));
    }

    #[test]
    fn test_projection_depth_range() {
        let camera = SceneCamera::default();
        let proj = camera.projection_matrix();

        let near = transform_point(proj, [0.0, 0.0, -camera.near]);
        let far = transform_point(proj, [0.0, 0.0, -camera.far]);
        assert!(near[2].abs() < 1e-5);
        assert!((far[2] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_origin_projects_to_center() {
        let vp = SceneCamera::default().view_projection_matrix();
        let p = transform_point(vp, [0.0, 0.0, 0.0]);
        assert!(p[0].abs() < 1e-6 && p[1].abs() < 1e-6);
        assert!(p[2] > 0.0 && p[2] < 1.0);
    }

    #[test]
    fn test_rotation_y() {
        let quarter = rotation_y(PI / 2.0);
        assert!(close(transform_point(quarter, [1.0, 0.0, 0.0]), [0.0, 0.0, -1.0]));
        assert_eq!(mat4_mul(rotation_y(0.0), IDENTITY), IDENTITY);
    }
}
