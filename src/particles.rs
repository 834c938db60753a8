//! Particle store for the node field
//! Owns the live particle collection and every structural change to it.

use crate::config::{DensityConfig, FieldConfig};
use egui::{Rect, Vec2};
use rand::Rng;
use std::f32::consts::TAU;

/// Individual particle data
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub heading: f32, // Radians, random walk that feeds acceleration
    pub fade: f32,    // Birth fade 0.0 (invisible) to 1.0 (fully visible)
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            heading: 0.0,
            fade: 1.0,
        }
    }
}

impl Particle {
    /// Particle at `pos` drifting along a random heading
    pub fn spawn_at(pos: Vec2, base_speed: f32, fade: f32, rng: &mut impl Rng) -> Self {
        let heading = rng.gen::<f32>() * TAU;
        Self {
            pos,
            vel: Vec2::new(heading.cos(), heading.sin()) * base_speed,
            heading,
            fade,
        }
    }
}

/// Uniform point in `[min, max)` per axis. Zero-sized spans collapse onto `min`.
pub fn random_point_in(rect: Rect, rng: &mut impl Rng) -> Vec2 {
    let size = rect.size().max(Vec2::ZERO);
    Vec2::new(
        rect.min.x + rng.gen::<f32>() * size.x,
        rect.min.y + rng.gen::<f32>() * size.y,
    )
}

/// Target population for a viewport: square-root area scaling against the reference
/// viewport, clamped to `[min_nodes, max_nodes]`.
pub fn target_count(width: f32, height: f32, density: &DensityConfig) -> usize {
    let area = (width.max(0.0) as f64) * (height.max(0.0) as f64);
    let reference = density.reference_width as f64 * density.reference_height as f64;
    let scaled = if reference > 0.0 {
        (density.max_nodes as f64 * (area / reference).sqrt()).floor()
    } else {
        0.0
    };
    let scaled = if scaled.is_finite() { scaled as usize } else { density.max_nodes };
    scaled.clamp(density.min_nodes, density.max_nodes.max(density.min_nodes))
}

/// The live particle collection
#[derive(Clone, Debug, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial population: `count` particles scattered over the whole viewport, already
    /// fully visible so the first paint is not an empty canvas.
    pub fn initialize(count: usize, bounds: Vec2, config: &FieldConfig, rng: &mut impl Rng) -> Self {
        let area = Rect::from_min_size(egui::Pos2::ZERO, bounds);
        let particles = (0..count)
            .map(|_| Particle::spawn_at(random_point_in(area, rng), config.motion.base_speed, 1.0, rng))
            .collect();
        Self { particles }
    }

    pub fn from_particles(particles: Vec<Particle>) -> Self {
        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable view for per-tick updates. A slice cannot change the population.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Append a newborn (invisible) particle at `pos`
    pub fn spawn(&mut self, pos: Vec2, config: &FieldConfig, rng: &mut impl Rng) {
        self.particles
            .push(Particle::spawn_at(pos, config.motion.base_speed, 0.0, rng));
    }

    /// Grow to `count` with newborn particles scattered over the viewport.
    /// Returns how many were added.
    pub fn grow_to(&mut self, count: usize, bounds: Vec2, config: &FieldConfig, rng: &mut impl Rng) -> usize {
        let missing = count.saturating_sub(self.particles.len());
        let area = Rect::from_min_size(egui::Pos2::ZERO, bounds);
        self.particles.reserve(missing);
        for _ in 0..missing {
            let pos = random_point_in(area, rng);
            self.spawn(pos, config, rng);
        }
        missing
    }

    /// Keep only the first `count` particles. Returns how many were dropped.
    pub fn shrink_to(&mut self, count: usize) -> usize {
        let dropped = self.particles.len().saturating_sub(count);
        self.particles.truncate(count);
        dropped
    }

    /// Grow or shrink to exactly `count`
    pub fn resize_to(&mut self, count: usize, bounds: Vec2, config: &FieldConfig, rng: &mut impl Rng) {
        if count > self.particles.len() {
            self.grow_to(count, bounds, config, rng);
        } else {
            self.shrink_to(count);
        }
    }

    /// Remove the given indices in one pass. Indices are deduplicated and removed from the
    /// highest down so earlier indices stay valid; out-of-range indices are ignored.
    /// Returns how many particles were removed.
    pub fn remove_indices(&mut self, mut indices: Vec<usize>) -> usize {
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        let mut removed = 0;
        for idx in indices {
            if idx < self.particles.len() {
                self.particles.remove(idx);
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn density() -> DensityConfig {
        DensityConfig::default()
    }

    #[test]
    fn reference_viewport_gets_reference_count() {
        assert_eq!(target_count(1920.0, 1080.0, &density()), 180);
    }

    #[test]
    fn count_is_clamped_both_ways() {
        assert_eq!(target_count(320.0, 240.0, &density()), 40);
        assert_eq!(target_count(400.0, 300.0, &density()), 43);
        assert_eq!(target_count(0.0, 0.0, &density()), 40);
        assert_eq!(target_count(7680.0, 4320.0, &density()), 180);
    }

    #[test]
    fn count_grows_with_area() {
        let mut last = 0;
        for step in 1..=40 {
            let w = step as f32 * 60.0;
            let count = target_count(w, w * 0.5625, &density());
            assert!(count >= last, "{count} < {last} at width {w}");
            assert!((40..=180).contains(&count));
            last = count;
        }
    }

    #[test]
    fn initial_population_is_visible_and_in_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = FieldConfig::default();
        let store = ParticleStore::initialize(120, Vec2::new(800.0, 600.0), &config, &mut rng);
        assert_eq!(store.len(), 120);
        for p in store.particles() {
            assert_eq!(p.fade, 1.0);
            assert!((0.0..800.0).contains(&p.pos.x));
            assert!((0.0..600.0).contains(&p.pos.y));
            assert!((p.vel.length() - config.motion.base_speed).abs() < 1e-6);
        }
    }

    #[test]
    fn growth_adds_newborns_and_shrink_truncates() {
        let mut rng = StdRng::seed_from_u64(2);
        let config = FieldConfig::default();
        let bounds = Vec2::new(500.0, 500.0);
        let mut store = ParticleStore::initialize(10, bounds, &config, &mut rng);
        let first = store.particles()[..4].to_vec();

        assert_eq!(store.grow_to(15, bounds, &config, &mut rng), 5);
        assert!(store.particles()[10..].iter().all(|p| p.fade == 0.0));
        assert!(store.particles()[..10].iter().all(|p| p.fade == 1.0));

        assert_eq!(store.shrink_to(4), 11);
        assert_eq!(store.particles(), &first[..]);
        assert_eq!(store.grow_to(2, bounds, &config, &mut rng), 0);
        assert_eq!(store.shrink_to(9), 0);
    }

    #[test]
    fn zero_bounds_do_not_panic() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = FieldConfig::default();
        let store = ParticleStore::initialize(5, Vec2::ZERO, &config, &mut rng);
        assert!(store.particles().iter().all(|p| p.pos == Vec2::ZERO));
    }

    #[test]
    fn removal_goes_from_highest_index() {
        let particles = (0..6)
            .map(|i| Particle {
                pos: Vec2::new(i as f32, 0.0),
                ..Particle::default()
            })
            .collect();
        let mut store = ParticleStore::from_particles(particles);
        let removed = store.remove_indices(vec![1, 4, 1, 9, 2]);
        assert_eq!(removed, 3);
        let xs: Vec<f32> = store.particles().iter().map(|p| p.pos.x).collect();
        assert_eq!(xs, vec![0.0, 3.0, 5.0]);
    }
}
