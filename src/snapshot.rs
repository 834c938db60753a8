//! Headless PNG snapshot of a node field.
//!
//! Renders the field's current state through the CPU raster surface without advancing
//! the simulation, so a snapshot never disturbs the live animation.

use crate::lifecycle::NodeField;
use crate::render::FrameStats;
use crate::surface::RasterSurface;
use anyhow::{bail, Context, Result};
use image::RgbaImage;
use std::path::Path;

/// Rasterize the field at its current viewport size
pub fn render_image(field: &NodeField) -> Result<(RgbaImage, FrameStats)> {
    let bounds = field.bounds();
    let width = bounds.x.round() as u32;
    let height = bounds.y.round() as u32;
    if width == 0 || height == 0 {
        bail!("cannot snapshot an empty {}x{} field", bounds.x, bounds.y);
    }
    let mut surface = RasterSurface::new(width, height);
    let stats = field.draw(&mut surface);
    Ok((surface.into_image(), stats))
}

/// Rasterize the field and write it to `path` as PNG
pub fn render_png(field: &NodeField, path: impl AsRef<Path>) -> Result<FrameStats> {
    let path = path.as_ref();
    let (image, stats) = render_image(field)?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("writing snapshot to {}", path.display()))?;
    log::info!(
        "snapshot saved to {} ({} nodes, {} edges)",
        path.display(),
        stats.nodes,
        stats.edges
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use egui::Vec2;

    fn field(width: f32, height: f32) -> NodeField {
        let config = FieldConfig {
            seed: Some(3),
            ..FieldConfig::default()
        };
        NodeField::new(Vec2::new(width, height), config)
    }

    #[test]
    fn image_matches_viewport_and_leaves_state_alone() {
        let field = field(640.0, 360.0);
        let before = field.store().particles().to_vec();
        let (image, stats) = render_image(&field).unwrap();
        assert_eq!(image.dimensions(), (640, 360));
        assert_eq!(stats.nodes, field.store().len());
        assert_eq!(field.store().particles(), &before[..]);
        assert_eq!(field.frames_drawn(), 0);
    }

    #[test]
    fn snapshot_of_opaque_field_is_fully_opaque() {
        let field = field(800.0, 600.0);
        let (image, stats) = render_image(&field).unwrap();
        assert!(stats.edges > 0);
        assert!(image.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn empty_viewport_is_an_error() {
        let field = field(0.0, 0.0);
        assert!(render_image(&field).is_err());
    }

    #[test]
    fn png_lands_on_disk() {
        let field = field(200.0, 120.0);
        let path = std::env::temp_dir().join(format!("node-field-snap-{}.png", std::process::id()));
        render_png(&field, &path).unwrap();
        let decoded = image::open(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!((decoded.width(), decoded.height()), (200, 120));
    }
}
