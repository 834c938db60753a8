//! Uniform spatial grid over particle positions.
//!
//! The grid is rebuilt from scratch whenever it is needed and never patched, so a
//! particle removal can never leave stale indices behind.

use crate::particles::Particle;
use egui::{Pos2, Rect, Vec2};

/// Cells visited from each cell: itself, right, and the three cells below.
/// Every unordered pair of adjacent cells is reached exactly once.
const FORWARD_NEIGHBOURS: [(isize, isize); 5] = [(0, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];

pub struct SpatialGrid {
    cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
}

impl SpatialGrid {
    /// Index `particles` into square cells of `cell_size` covering `bounds`.
    /// Degenerate bounds collapse to a single cell.
    pub fn build(particles: &[Particle], bounds: Vec2, cell_size: f32) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 1.0 };
        let cols = cells_along(bounds.x, cell_size);
        let rows = cells_along(bounds.y, cell_size);

        let mut grid = Self {
            cell_size,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
        };
        for (i, p) in particles.iter().enumerate() {
            let key = grid.cell_of(p.pos);
            grid.cells[key].push(i);
        }
        grid
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Flat cell index (`row * cols + col`) holding `pos`. Coordinates past either edge
    /// clamp into the border cells.
    pub fn cell_of(&self, pos: Vec2) -> usize {
        let col = axis_cell(pos.x, self.cell_size, self.cols);
        let row = axis_cell(pos.y, self.cell_size, self.rows);
        row * self.cols + col
    }

    /// Particle indices in cell `key`, in particle order
    pub fn cell(&self, key: usize) -> &[usize] {
        self.cells.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `(key, col, row, members)` for every cell, row-major
    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, usize, &[usize])> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(key, members)| (key, key % self.cols, key / self.cols, members.as_slice()))
    }

    /// Area covered by cell `(col, row)`, clipped to `bounds`
    pub fn cell_rect(&self, col: usize, row: usize, bounds: Vec2) -> Rect {
        let min = Pos2::new(col as f32 * self.cell_size, row as f32 * self.cell_size);
        let max = Pos2::new(
            ((col + 1) as f32 * self.cell_size).min(bounds.x.max(min.x)),
            ((row + 1) as f32 * self.cell_size).min(bounds.y.max(min.y)),
        );
        Rect::from_min_max(min, max)
    }

    /// Call `visit(i, j, dist)` once for every unordered particle pair closer than
    /// `max_dist`. Only correct while `max_dist <= cell_size`.
    pub fn for_each_pair_within<F>(&self, particles: &[Particle], max_dist: f32, mut visit: F)
    where
        F: FnMut(usize, usize, f32),
    {
        debug_assert!(max_dist <= self.cell_size);
        let max_dist_sq = max_dist * max_dist;

        for (key, col, row, members) in self.iter_cells() {
            if members.is_empty() {
                continue;
            }
            for (dc, dr) in FORWARD_NEIGHBOURS {
                let ncol = col as isize + dc;
                let nrow = row as isize + dr;
                if ncol < 0 || ncol >= self.cols as isize || nrow >= self.rows as isize {
                    continue;
                }
                let nkey = nrow as usize * self.cols + ncol as usize;
                let others = &self.cells[nkey];
                let same_cell = nkey == key;

                for (a, &i) in members.iter().enumerate() {
                    let start = if same_cell { a + 1 } else { 0 };
                    for &j in &others[start..] {
                        if i == j {
                            continue;
                        }
                        let dist_sq = (particles[i].pos - particles[j].pos).length_sq();
                        if dist_sq < max_dist_sq {
                            visit(i, j, dist_sq.sqrt());
                        }
                    }
                }
            }
        }
    }

    /// Grid-accelerated pair list, normalised to `(low, high)` index order
    pub fn pairs_within(&self, particles: &[Particle], max_dist: f32) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        self.for_each_pair_within(particles, max_dist, |i, j, _| pairs.push((i.min(j), i.max(j))));
        pairs
    }
}

/// All-pairs reference scan, `(low, high)` index order
pub fn brute_force_pairs(particles: &[Particle], max_dist: f32) -> Vec<(usize, usize)> {
    let max_dist_sq = max_dist * max_dist;
    let mut pairs = Vec::new();
    for i in 0..particles.len() {
        for j in (i + 1)..particles.len() {
            if (particles[i].pos - particles[j].pos).length_sq() < max_dist_sq {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

fn cells_along(extent: f32, cell_size: f32) -> usize {
    let n = (extent / cell_size).ceil();
    if n.is_finite() && n >= 1.0 {
        n as usize
    } else {
        1
    }
}

fn axis_cell(coord: f32, cell_size: f32, count: usize) -> usize {
    let c = (coord / cell_size).floor();
    if c.is_nan() || c < 0.0 {
        0
    } else {
        (c as usize).min(count - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn at(x: f32, y: f32) -> Particle {
        Particle {
            pos: Vec2::new(x, y),
            ..Particle::default()
        }
    }

    #[test]
    fn dimensions_round_up() {
        let grid = SpatialGrid::build(&[], Vec2::new(1920.0, 1080.0), 200.0);
        assert_eq!((grid.cols(), grid.rows()), (10, 6));
        assert_eq!(grid.cell_count(), 60);
    }

    #[test]
    fn zero_bounds_make_one_cell() {
        let particles = [at(0.0, 0.0), at(5.0, 5.0)];
        let grid = SpatialGrid::build(&particles, Vec2::ZERO, 200.0);
        assert_eq!(grid.cell_count(), 1);
        assert_eq!(grid.cell(0), &[0, 1]);
    }

    #[test]
    fn edge_and_overshoot_positions_clamp_into_border_cells() {
        let bounds = Vec2::new(400.0, 400.0);
        let particles = [at(400.0, 400.0), at(-3.0, 10.0), at(410.0, -1.0), at(199.9, 200.0)];
        let grid = SpatialGrid::build(&particles, bounds, 200.0);
        assert_eq!(grid.cell_of(particles[0].pos), 3);
        assert_eq!(grid.cell_of(particles[1].pos), 0);
        assert_eq!(grid.cell_of(particles[2].pos), 1);
        assert_eq!(grid.cell_of(particles[3].pos), 2);
        assert_eq!(grid.cell(3), &[0]);
    }

    #[test]
    fn members_keep_particle_order() {
        let particles = [at(10.0, 10.0), at(300.0, 10.0), at(20.0, 20.0), at(30.0, 30.0)];
        let grid = SpatialGrid::build(&particles, Vec2::new(400.0, 200.0), 200.0);
        assert_eq!(grid.cell(0), &[0, 2, 3]);
        assert_eq!(grid.cell(1), &[1]);
    }

    #[test]
    fn last_cell_rect_is_clipped() {
        let grid = SpatialGrid::build(&[], Vec2::new(450.0, 300.0), 200.0);
        let rect = grid.cell_rect(2, 1, Vec2::new(450.0, 300.0));
        assert_eq!(rect.min, Pos2::new(400.0, 200.0));
        assert_eq!(rect.max, Pos2::new(450.0, 300.0));
    }

    #[test]
    fn pairs_across_every_neighbour_direction() {
        // One pair straddles each boundary kind, including down-left.
        let particles = [
            at(190.0, 100.0), at(210.0, 100.0), // right
            at(100.0, 190.0), at(100.0, 210.0), // down
            at(390.0, 390.0), at(410.0, 410.0), // down-right
            at(410.0, 190.0), at(390.0, 210.0), // down-left
        ];
        let grid = SpatialGrid::build(&particles, Vec2::new(600.0, 600.0), 200.0);
        let mut pairs = grid.pairs_within(&particles, 50.0);
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(0, 1), (2, 3), (4, 5), (6, 7)]);
    }

    #[test]
    fn grid_scan_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        let bounds = Vec2::new(1920.0, 1080.0);
        let particles: Vec<Particle> = (0..400)
            .map(|_| at(rng.gen_range(0.0..bounds.x), rng.gen_range(0.0..bounds.y)))
            .collect();
        let grid = SpatialGrid::build(&particles, bounds, 200.0);

        let mut fast = grid.pairs_within(&particles, 150.0);
        let mut slow = brute_force_pairs(&particles, 150.0);
        fast.sort_unstable();
        slow.sort_unstable();
        let before = fast.len();
        fast.dedup();
        assert_eq!(before, fast.len(), "a pair was visited twice");
        assert_eq!(fast, slow);
    }
}
