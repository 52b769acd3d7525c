//! Software [`Canvas`] backed by a tiny-skia pixmap.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Stroke, Transform};

use super::{Canvas, UvStyle};
use crate::error::{Error, Result};

/// An in-memory RGBA canvas.
///
/// Paths are stroked with antialiasing at their real width, so the default
/// half-pixel UV outline covers about half of each pixel it crosses. The
/// background after [`clear`](Canvas::clear) is fully transparent.
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    pixmap: Pixmap,
    path: PathBuilder,
    has_point: bool,
}

impl RasterCanvas {
    /// Create a transparent canvas.
    ///
    /// Fails for a zero side or a size tiny-skia cannot allocate.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            Error::invalid_param(
                "canvas size",
                format!("{}x{}", width, height),
                "must be non-zero and fit in memory",
            )
        })?;

        Ok(Self {
            pixmap,
            path: PathBuilder::new(),
            has_point: false,
        })
    }

    /// Color of one pixel, with alpha not premultiplied.
    ///
    /// Returns transparent black outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        match self.pixmap.pixel(x, y) {
            Some(p) => {
                let c = p.demultiply();
                Rgba([c.red(), c.green(), c.blue(), c.alpha()])
            }
            None => Rgba([0, 0, 0, 0]),
        }
    }

    /// Copy the pixels into an [`RgbaImage`].
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.pixmap.width(), self.pixmap.height(), |x, y| {
            self.pixel(x, y)
        })
    }

    /// Write the canvas as a PNG file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.to_image()
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| Error::SaveError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }
}

impl Canvas for RasterCanvas {
    fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    fn begin_path(&mut self) {
        self.path = PathBuilder::new();
        self.has_point = false;
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.path.move_to(x as f32, y as f32);
        self.has_point = true;
    }

    fn line_to(&mut self, x: f64, y: f64) {
        // A line with no current point starts the subpath instead.
        if self.has_point {
            self.path.line_to(x as f32, y as f32);
        } else {
            self.move_to(x, y);
        }
    }

    fn close_path(&mut self) {
        if self.has_point {
            self.path.close();
        }
    }

    fn stroke(&mut self, style: &UvStyle) {
        // Non-finite coordinates leave no path to draw.
        let Some(path) = self.path.clone().finish() else {
            return;
        };

        let [r, g, b, a] = style.color.0;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;

        let stroke = Stroke {
            width: style.width as f32,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}
