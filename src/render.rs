//! Frame renderer for the node field
//!
//! Draws, in order: the background, the proximity edges found through the spatial grid,
//! and the node glyphs. Both passes are de-emphasised inside a centred ellipse so text
//! placed over the field stays legible.

use crate::config::{EllipseFade, FieldConfig};
use crate::grid::SpatialGrid;
use crate::particles::Particle;
use egui::{Color32, Pos2, Vec2};

/// Minimal 2D drawing target. Coordinates are field-local pixels.
pub trait Surface {
    fn clear(&mut self, color: Color32);
    fn line(&mut self, from: Pos2, to: Pos2, width: f32, color: Color32);
    fn fill_circle(&mut self, center: Pos2, radius: f32, color: Color32);
}

/// What a frame drew
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub nodes: usize,
    pub edges: usize,
}

/// Centre de-emphasis factor at `pos` for a field of size `bounds`.
/// Inside the ellipse: `max(floor, d^exponent * strength + (1 - strength))` with `d` the
/// normalised elliptical distance; 1.0 outside.
pub fn ellipse_fade(pos: Vec2, bounds: Vec2, ellipse: &EllipseFade) -> f32 {
    let center = bounds * 0.5;
    let dx = (pos.x - center.x) / ellipse.radius_x;
    let dy = (pos.y - center.y) / ellipse.radius_y;
    let dist = (dx * dx + dy * dy).sqrt();
    if dist < 1.0 {
        let fade = dist.powf(ellipse.exponent) * ellipse.strength + (1.0 - ellipse.strength);
        fade.max(ellipse.floor)
    } else {
        1.0
    }
}

/// Edge opacity before centre de-emphasis: quadratic in the pair's mean birth fade,
/// linear in distance.
pub fn edge_alpha(fade_a: f32, fade_b: f32, dist: f32, max_dist: f32) -> f32 {
    let fade = (fade_a + fade_b) * 0.5;
    fade * fade * (1.0 - dist / max_dist)
}

fn with_alpha(rgb: [u8; 3], alpha: f32) -> Color32 {
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(rgb[0], rgb[1], rgb[2], a)
}

pub struct Renderer<'a> {
    config: &'a FieldConfig,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a FieldConfig) -> Self {
        Self { config }
    }

    /// Draw one frame of `particles` using `grid` for the edge pass
    pub fn draw<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        particles: &[Particle],
        grid: &SpatialGrid,
        bounds: Vec2,
    ) -> FrameStats {
        let config = self.config;
        let palette = config.palette;
        surface.clear(Color32::from_rgb(
            palette.background[0],
            palette.background[1],
            palette.background[2],
        ));

        // Per-node centre fade, reused by both passes
        let fades: Vec<f32> = particles
            .iter()
            .map(|p| ellipse_fade(p.pos, bounds, &config.ellipse))
            .collect();

        let links = &config.connections;
        let mut edges = 0;
        grid.for_each_pair_within(particles, links.max_distance, |i, j, dist| {
            let a = &particles[i];
            let b = &particles[j];
            let avg_fade = (fades[i] + fades[j]) * 0.5;
            let alpha = edge_alpha(a.fade, b.fade, dist, links.max_distance) * avg_fade;
            let width = links.min_width + avg_fade * links.width_range;
            surface.line(a.pos.to_pos2(), b.pos.to_pos2(), width, with_alpha(palette.accent, alpha));
            edges += 1;
        });

        let style = &config.nodes;
        for (p, fade) in particles.iter().zip(&fades) {
            let radius = style.min_radius + fade * style.radius_range;
            surface.fill_circle(p.pos.to_pos2(), radius, with_alpha(palette.accent, p.fade * fade));
        }

        let stats = FrameStats {
            nodes: particles.len(),
            edges,
        };
        log::trace!("frame drew {} nodes, {} edges", stats.nodes, stats.edges);
        stats
    }
}
