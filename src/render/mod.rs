//! UV layout rendering.
//!
//! Draws the triangles of a UV map as outlines on a 2D [`Canvas`]. UV space
//! has its origin at the bottom-left; the canvas has it at the top-left, so
//! `v` is flipped:
//!
//! ```text
//! (u, v)  ->  (u * W, (1 - v) * H)
//! ```
//!
//! UVs outside `[0, 1]` land outside the canvas and are not clamped.
//!
//! # Example
//!
//! ```
//! use nalgebra::Point2;
//! use uvlab::render::{draw_uv_layout, RasterCanvas, UvStyle};
//!
//! let uvs = vec![
//!     Point2::new(0.1, 0.1),
//!     Point2::new(0.9, 0.1),
//!     Point2::new(0.5, 0.9),
//! ];
//! let mut canvas = RasterCanvas::new(256, 256).unwrap();
//! let drawn = draw_uv_layout(&mut canvas, &uvs, &[0, 1, 2], &UvStyle::default());
//! assert_eq!(drawn, 1);
//! ```

mod raster;

use image::Rgba;
use nalgebra::Point2;

pub use raster::RasterCanvas;

/// Stroke settings for UV outlines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvStyle {
    /// Line color.
    pub color: Rgba<u8>,
    /// Line width in pixels.
    pub width: f64,
}

impl Default for UvStyle {
    fn default() -> Self {
        Self {
            color: Rgba([0, 255, 0, 255]), // #00ff00
            width: 0.5,
        }
    }
}

impl UvStyle {
    /// Set the line color.
    pub fn with_color(mut self, color: Rgba<u8>) -> Self {
        self.color = color;
        self
    }

    /// Set the line width.
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }
}

/// A 2D drawing surface with a path-based API.
///
/// A path is started with [`begin_path`](Canvas::begin_path), built from
/// `move_to` / `line_to` / `close_path`, and drawn by
/// [`stroke`](Canvas::stroke). Coordinates are in pixels.
pub trait Canvas {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    /// Erase the whole surface.
    fn clear(&mut self);

    /// Discard the current path and start a new one.
    fn begin_path(&mut self);

    /// Start a new subpath at a point.
    fn move_to(&mut self, x: f64, y: f64);

    /// Add a straight segment from the current point.
    fn line_to(&mut self, x: f64, y: f64);

    /// Connect the current point back to the start of the subpath.
    fn close_path(&mut self);

    /// Draw the outline of the current path.
    fn stroke(&mut self, style: &UvStyle);
}

/// Map a UV coordinate to a pixel position on a `width` x `height` canvas.
pub fn uv_to_pixel(u: f64, v: f64, width: u32, height: u32) -> (f64, f64) {
    (u * width as f64, (1.0 - v) * height as f64)
}

/// Clear `canvas` and outline every triangle of a UV layout.
///
/// `indices` is read in consecutive triples; trailing indices that do not
/// complete a triangle are ignored. Triangles referencing a UV that does not
/// exist are skipped. Returns the number of triangles stroked.
pub fn draw_uv_layout<C: Canvas + ?Sized>(
    canvas: &mut C,
    uvs: &[Point2<f64>],
    indices: &[u32],
    style: &UvStyle,
) -> usize {
    let (width, height) = canvas.size();
    canvas.clear();

    let mut drawn = 0;
    let mut skipped = 0;
    for tri in indices.chunks_exact(3) {
        let corners = [
            uvs.get(tri[0] as usize),
            uvs.get(tri[1] as usize),
            uvs.get(tri[2] as usize),
        ];
        let [Some(a), Some(b), Some(c)] = corners else {
            skipped += 1;
            continue;
        };

        let [a, b, c] = [a, b, c].map(|p| uv_to_pixel(p.x, p.y, width, height));
        canvas.begin_path();
        canvas.move_to(a.0, a.1);
        canvas.line_to(b.0, b.1);
        canvas.line_to(c.0, c.1);
        canvas.close_path();
        canvas.stroke(style);
        drawn += 1;
    }

    if skipped > 0 {
        log::warn!(
            "skipped {} UV triangles with indices past {} coordinates",
            skipped,
            uvs.len()
        );
    }
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear,
        Begin,
        Move(f64, f64),
        Line(f64, f64),
        Close,
        Stroke,
    }

    /// Canvas that records every call.
    struct RecordingCanvas {
        size: (u32, u32),
        ops: Vec<Op>,
    }

    impl RecordingCanvas {
        fn new(width: u32, height: u32) -> Self {
            Self {
                size: (width, height),
                ops: Vec::new(),
            }
        }

        fn strokes(&self) -> usize {
            self.ops.iter().filter(|op| **op == Op::Stroke).count()
        }
    }

    impl Canvas for RecordingCanvas {
        fn size(&self) -> (u32, u32) {
            self.size
        }
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }
        fn begin_path(&mut self) {
            self.ops.push(Op::Begin);
        }
        fn move_to(&mut self, x: f64, y: f64) {
            self.ops.push(Op::Move(x, y));
        }
        fn line_to(&mut self, x: f64, y: f64) {
            self.ops.push(Op::Line(x, y));
        }
        fn close_path(&mut self) {
            self.ops.push(Op::Close);
        }
        fn stroke(&mut self, _style: &UvStyle) {
            self.ops.push(Op::Stroke);
        }
    }

    fn grid_uvs(n: usize) -> Vec<Point2<f64>> {
        (0..n)
            .map(|i| Point2::new(i as f64 / n as f64, (i % 7) as f64 / 7.0))
            .collect()
    }

    #[test]
    fn test_uv_to_pixel() {
        assert_eq!(uv_to_pixel(0.5, 0.5, 400, 400), (200.0, 200.0));
        assert_eq!(uv_to_pixel(0.0, 1.0, 400, 400), (0.0, 0.0));
        assert_eq!(uv_to_pixel(1.0, 0.0, 400, 400), (400.0, 400.0));
        assert_eq!(uv_to_pixel(0.25, 0.0, 800, 200), (200.0, 200.0));
    }

    #[test]
    fn test_one_stroke_per_triangle() {
        let uvs = grid_uvs(30);
        for triangles in [0usize, 1, 4, 10] {
            let indices: Vec<u32> = (0..triangles as u32 * 3).collect();
            let mut canvas = RecordingCanvas::new(64, 64);

            let drawn = draw_uv_layout(&mut canvas, &uvs, &indices, &UvStyle::default());

            assert_eq!(drawn, triangles);
            assert_eq!(canvas.strokes(), triangles);
        }
    }

    #[test]
    fn test_trailing_indices_are_ignored() {
        let uvs = grid_uvs(9);
        for extra in 1..=2u32 {
            let indices: Vec<u32> = (0..6 + extra).collect();
            let mut canvas = RecordingCanvas::new(64, 64);

            draw_uv_layout(&mut canvas, &uvs, &indices, &UvStyle::default());

            assert_eq!(canvas.strokes(), 2);
            let moves = canvas.ops.iter().filter(|op| matches!(op, Op::Move(..))).count();
            let lines = canvas.ops.iter().filter(|op| matches!(op, Op::Line(..))).count();
            assert_eq!((moves, lines), (2, 4));
        }
    }

    #[test]
    fn test_path_sequence() {
        let uvs = vec![
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 0.5),
        ];
        let mut canvas = RecordingCanvas::new(400, 400);
        draw_uv_layout(&mut canvas, &uvs, &[0, 1, 2], &UvStyle::default());

        assert_eq!(
            canvas.ops,
            vec![
                Op::Clear,
                Op::Begin,
                Op::Move(0.0, 0.0),
                Op::Line(400.0, 400.0),
                Op::Line(200.0, 200.0),
                Op::Close,
                Op::Stroke,
            ]
        );
    }

    #[test]
    fn test_out_of_range_uvs_are_not_clamped() {
        let uvs = vec![
            Point2::new(-1.0, 2.0),
            Point2::new(2.0, -1.0),
            Point2::new(0.5, 0.5),
        ];
        let mut canvas = RecordingCanvas::new(100, 100);
        draw_uv_layout(&mut canvas, &uvs, &[0, 1, 2], &UvStyle::default());

        assert!(canvas.ops.contains(&Op::Move(-100.0, -100.0)));
        assert!(canvas.ops.contains(&Op::Line(200.0, 200.0)));
    }

    #[test]
    fn test_missing_uv_skips_triangle() {
        let uvs = grid_uvs(3);
        let mut canvas = RecordingCanvas::new(32, 32);

        let indices = [0, 1, 2, 0, 1, 9];
        let drawn = draw_uv_layout(&mut canvas, &uvs, &indices, &UvStyle::default());

        assert_eq!(drawn, 1);
        assert_eq!(canvas.strokes(), 1);
    }

    #[test]
    fn test_canvas_is_cleared_even_when_empty() {
        let mut canvas = RecordingCanvas::new(32, 32);
        draw_uv_layout(&mut canvas, &[], &[], &UvStyle::default());
        assert_eq!(canvas.ops, vec![Op::Clear]);
    }

    #[test]
    fn test_style_builders() {
        let style = UvStyle::default()
            .with_color(Rgba([255, 0, 0, 255]))
            .with_width(2.0);
        assert_eq!(style.color, Rgba([255, 0, 0, 255]));
        assert_eq!(style.width, 2.0);
        assert_eq!(UvStyle::default().color, Rgba([0, 255, 0, 255]));
    }
}
