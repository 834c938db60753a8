//! Drawing surfaces: the live egui painter and a headless RGBA raster.
//!
//! Notes about visual parity:
//! - The painter path is vector-ish and honours stroke width.
//! - The raster path is CPU rasterized with imageproc; lines are one pixel wide, so
//!   expect thinner edges than the live preview.

use crate::render::Surface;
use egui::{Color32, Painter, Pos2, Rect, Stroke};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, Canvas};

// ============================================================================
// egui painter
// ============================================================================

/// Draws into an egui painter, offset to the allocated rect
pub struct PainterSurface<'a> {
    painter: &'a Painter,
    rect: Rect,
}

impl<'a> PainterSurface<'a> {
    pub fn new(painter: &'a Painter, rect: Rect) -> Self {
        Self { painter, rect }
    }

    fn to_screen(&self, p: Pos2) -> Pos2 {
        self.rect.min + p.to_vec2()
    }
}

impl Surface for PainterSurface<'_> {
    fn clear(&mut self, color: Color32) {
        self.painter.rect_filled(self.rect, 0.0, color);
    }

    fn line(&mut self, from: Pos2, to: Pos2, width: f32, color: Color32) {
        if color.a() == 0 {
            return;
        }
        self.painter
            .line_segment([self.to_screen(from), self.to_screen(to)], Stroke::new(width, color));
    }

    fn fill_circle(&mut self, center: Pos2, radius: f32, color: Color32) {
        if color.a() == 0 {
            return;
        }
        self.painter.circle_filled(self.to_screen(center), radius, color);
    }
}

// ============================================================================
// CPU raster
// ============================================================================

/// RGBA8 image that composites every drawn pixel source-over its destination.
/// An opaque destination stays exactly opaque.
struct SourceOver(RgbaImage);

impl Canvas for SourceOver {
    type Pixel = Rgba<u8>;

    fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    fn get_pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.0.get_pixel(x, y)
    }

    fn draw_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        let dst = self.0.get_pixel_mut(x, y);
        *dst = source_over(color, *dst);
    }
}

/// Straight-alpha source-over
fn source_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mix = |s: u8, d: u8| {
        let c = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

/// Simple CPU raster target, alpha-blended over an RGBA8 image
pub struct RasterSurface {
    canvas: SourceOver,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: SourceOver(RgbaImage::new(width, height)),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas.0
    }

    pub fn into_image(self) -> RgbaImage {
        self.canvas.0
    }
}

/// Straight-alpha RGBA8, which is what image's blending expects
fn to_rgba(color: Color32) -> Rgba<u8> {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Rgba([r, g, b, a])
}

impl Surface for RasterSurface {
    fn clear(&mut self, color: Color32) {
        let fill = to_rgba(color);
        for px in self.canvas.0.pixels_mut() {
            *px = fill;
        }
    }

    fn line(&mut self, from: Pos2, to: Pos2, _width: f32, color: Color32) {
        if color.a() == 0 {
            return;
        }
        draw_line_segment_mut(&mut self.canvas, (from.x, from.y), (to.x, to.y), to_rgba(color));
    }

    fn fill_circle(&mut self, center: Pos2, radius: f32, color: Color32) {
        if color.a() == 0 {
            return;
        }
        let r = radius.round().max(1.0) as i32;
        draw_filled_circle_mut(
            &mut self.canvas,
            (center.x.round() as i32, center.y.round() as i32),
            r,
            to_rgba(color),
        );
    }
}
