//! Constant spin about the vertical axis.

use super::camera::{mat4_mul, rotation_y, Mat4};

/// Radians added per rendered frame.
pub const SPIN_PER_FRAME: f32 = 0.01;

/// Rotates the model a fixed step about Y every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Turntable {
    angle: f32,
    step: f32,
}

impl Default for Turntable {
    fn default() -> Self {
        Self {
            angle: 0.0,
            step: SPIN_PER_FRAME,
        }
    }
}

impl Turntable {
    /// Turntable with a custom step per frame.
    pub fn with_step(step: f32) -> Self {
        Self { angle: 0.0, step }
    }

    /// Current rotation in radians, wrapped to one turn.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Advance by one frame.
    pub fn advance(&mut self) {
        self.angle = (self.angle + self.step) % std::f32::consts::TAU;
    }

    /// Model matrix: the fit transform followed by the current rotation.
    pub fn model_matrix(&self, fit: Mat4) -> Mat4 {
        mat4_mul(rotation_y(self.angle), fit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::camera::{transform_point, IDENTITY};

    #[test]
    fn test_advance() {
        let mut turntable = Turntable::default();
        for _ in 0..100 {
            turntable.advance();
        }
        assert!((turntable.angle() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_angle_wraps() {
        let mut turntable = Turntable::with_step(4.0);
        turntable.advance();
        turntable.advance();
        assert!(turntable.angle() < std::f32::consts::TAU);
    }

    #[test]
    fn test_model_matrix_keeps_axis_points() {
        let mut turntable = Turntable::default();
        turntable.advance();
        let m = turntable.model_matrix(IDENTITY);
        let p = transform_point(m, [0.0, 2.0, 0.0]);
        assert!((p[1] - 2.0).abs() < 1e-6 && p[0].abs() < 1e-6 && p[2].abs() < 1e-6);
    }
}
