//! Density governor: a slow corrective pass that tops up sparse grid cells and thins
//! crowded ones, keeping the field roughly even as nodes drift or the viewport changes.
//!
//! It trends the distribution back toward `[min_per_cell, max_per_cell]`; between passes
//! a cell may legally sit outside those bounds.

use crate::config::FieldConfig;
use crate::grid::SpatialGrid;
use crate::particles::{random_point_in, ParticleStore};
use egui::Vec2;
use rand::Rng;
use std::time::Duration;

/// Outcome of one governor pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rebalance {
    pub inserted: usize,
    pub removed: usize,
}

/// Run one pass over `store`. The grid is rebuilt from the current positions first.
pub fn rebalance(
    store: &mut ParticleStore,
    bounds: Vec2,
    config: &FieldConfig,
    rng: &mut impl Rng,
) -> Rebalance {
    let density = &config.density;
    let grid = SpatialGrid::build(store.particles(), bounds, density.cell_size);

    let mut inserted = 0;
    let mut to_remove = Vec::new();

    for (_, col, row, members) in grid.iter_cells() {
        let count = members.len();
        if count < density.min_per_cell {
            let area = grid.cell_rect(col, row, bounds);
            for _ in count..density.min_per_cell {
                let pos = random_point_in(area, rng);
                // Appends only: the indices held by the grid stay valid
                store.spawn(pos, config, rng);
                inserted += 1;
            }
        } else if count > density.max_per_cell {
            // Excess comes out of this cell, earliest members first
            to_remove.extend_from_slice(&members[..count - density.max_per_cell]);
        }
    }

    let removed = store.remove_indices(to_remove);
    let outcome = Rebalance { inserted, removed };
    if inserted > 0 || removed > 0 {
        log::debug!(
            "density pass: +{} -{} -> {} nodes",
            inserted,
            removed,
            store.len()
        );
    }
    outcome
}

/// Fixed-period timer driven by elapsed frame time
#[derive(Clone, Copy, Debug)]
pub struct Interval {
    period: Duration,
    elapsed: Duration,
}

impl Interval {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            elapsed: Duration::ZERO,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Accumulate `dt`; true when at least one period has completed. A long stall fires
    /// once rather than replaying every missed period.
    pub fn tick(&mut self, dt: Duration) -> bool {
        if self.period.is_zero() {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed >= self.period {
            self.elapsed = Duration::from_nanos(
                (self.elapsed.as_nanos() % self.period.as_nanos()) as u64,
            );
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::Particle;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fill_cell(particles: &mut Vec<Particle>, col: usize, row: usize, n: usize) {
        for k in 0..n {
            particles.push(Particle {
                pos: Vec2::new(
                    col as f32 * 200.0 + 10.0 + k as f32 * 9.0,
                    row as f32 * 200.0 + 10.0 + k as f32 * 9.0,
                ),
                ..Particle::default()
            });
        }
    }

    fn per_cell(store: &ParticleStore, bounds: Vec2) -> Vec<usize> {
        let grid = SpatialGrid::build(store.particles(), bounds, 200.0);
        grid.iter_cells().map(|(_, _, _, m)| m.len()).collect()
    }

    #[test]
    fn balanced_field_is_left_alone() {
        let mut rng = StdRng::seed_from_u64(1);
        let bounds = Vec2::new(600.0, 400.0);
        let mut particles = Vec::new();
        for (cell, n) in [2, 5, 8, 3, 4, 7].into_iter().enumerate() {
            fill_cell(&mut particles, cell % 3, cell / 3, n);
        }
        let mut store = ParticleStore::from_particles(particles.clone());

        let outcome = rebalance(&mut store, bounds, &FieldConfig::default(), &mut rng);

        assert_eq!(outcome, Rebalance::default());
        assert_eq!(store.particles(), &particles[..]);
    }

    #[test]
    fn empty_and_crowded_cells_converge_to_bounds() {
        let mut rng = StdRng::seed_from_u64(2);
        let bounds = Vec2::new(600.0, 400.0);
        let mut particles = Vec::new();
        fill_cell(&mut particles, 1, 0, 4);
        fill_cell(&mut particles, 2, 0, 20);
        fill_cell(&mut particles, 0, 1, 4);
        fill_cell(&mut particles, 1, 1, 4);
        fill_cell(&mut particles, 2, 1, 4);
        let mut store = ParticleStore::from_particles(particles);

        let outcome = rebalance(&mut store, bounds, &FieldConfig::default(), &mut rng);

        assert_eq!(outcome, Rebalance { inserted: 2, removed: 12 });
        assert_eq!(per_cell(&store, bounds), vec![2, 4, 8, 4, 4, 4]);
    }

    #[test]
    fn top_ups_are_newborn_and_inside_their_cell() {
        let mut rng = StdRng::seed_from_u64(3);
        let bounds = Vec2::new(450.0, 200.0);
        let mut store = ParticleStore::from_particles(Vec::new());

        let outcome = rebalance(&mut store, bounds, &FieldConfig::default(), &mut rng);

        assert_eq!(outcome.inserted, 6);
        assert!(store.particles().iter().all(|p| p.fade == 0.0));
        // The clipped last column spans [400, 450)
        let last: Vec<_> = store.particles()[4..].iter().map(|p| p.pos.x).collect();
        assert!(last.iter().all(|x| (400.0..450.0).contains(x)), "{last:?}");
        assert_eq!(per_cell(&store, bounds), vec![2, 2, 2]);
    }

    #[test]
    fn crowded_cell_loses_its_earliest_members() {
        let mut rng = StdRng::seed_from_u64(4);
        let bounds = Vec2::new(200.0, 200.0);
        let mut particles = Vec::new();
        fill_cell(&mut particles, 0, 0, 10);
        let survivors = particles[2..].to_vec();
        let mut store = ParticleStore::from_particles(particles);

        rebalance(&mut store, bounds, &FieldConfig::default(), &mut rng);

        assert_eq!(store.particles(), &survivors[..]);
    }

    #[test]
    fn interval_fires_once_per_period() {
        let mut timer = Interval::new(Duration::from_millis(3000));
        assert!(!timer.tick(Duration::from_millis(1000)));
        assert!(!timer.tick(Duration::from_millis(1999)));
        assert!(timer.tick(Duration::from_millis(1)));
        assert!(!timer.tick(Duration::from_millis(2500)));
        assert!(timer.tick(Duration::from_millis(600)));
        // Stall: one fire, remainder carried
        assert!(timer.tick(Duration::from_millis(10_000)));
        assert!(!timer.tick(Duration::from_millis(1000)));
    }

    #[test]
    fn zero_period_never_fires() {
        let mut timer = Interval::new(Duration::ZERO);
        assert!(!timer.tick(Duration::from_secs(60)));
    }
}
