//! Pressure projection: removes the divergent part of the velocity field.
//!
//! 1. divergence of the velocity on interior cells,
//! 2. Jacobi relaxation of the pressure Poisson equation (ping-pong buffers,
//!    every read comes from the previous iteration),
//! 3. subtraction of the pressure gradient.

use crate::config::WallMode;
use crate::grid::{Channel, Direction, Grid, GridShape};

/// Scalar fields reused across ticks. Zeroed at the start of every pass so
/// nothing leaks from one tick to the next.
#[derive(Debug, Clone, Default)]
pub struct ProjectionScratch {
    pub divergence: Vec<f32>,
    pub pressure: Vec<f32>,
    pressure_prev: Vec<f32>,
}

impl ProjectionScratch {
    pub fn new(len: usize) -> Self {
        Self {
            divergence: vec![0.0; len],
            pressure: vec![0.0; len],
            pressure_prev: vec![0.0; len],
        }
    }

    pub fn reset(&mut self, len: usize) {
        for buffer in [&mut self.divergence, &mut self.pressure, &mut self.pressure_prev] {
            buffer.clear();
            buffer.resize(len, 0.0);
        }
    }
}

/// `-0.5 * h * ((vx_right - vx_left) + (vy_down - vy_up))` on interior cells, zero elsewhere.
pub fn compute_divergence(grid: &Grid, divergence: &mut [f32]) {
    let shape = grid.shape();
    let h = 1.0 / shape.width() as f32;
    let cells = grid.cells();
    divergence.fill(0.0);
    for i in shape.interior() {
        let dvx = shape.access_clamped(Direction::Right, i, cells, Channel::VelocityX)
            - shape.access_clamped(Direction::Left, i, cells, Channel::VelocityX);
        let dvy = shape.access_clamped(Direction::Down, i, cells, Channel::VelocityY)
            - shape.access_clamped(Direction::Up, i, cells, Channel::VelocityY);
        divergence[i] = -0.5 * h * (dvx + dvy);
    }
}

/// Fill `divergence` for the current velocity field and return its largest
/// absolute value.
pub fn peak_divergence(grid: &Grid, divergence: &mut [f32]) -> f32 {
    compute_divergence(grid, divergence);
    divergence.iter().fold(0.0f32, |m, d| m.max(d.abs()))
}

fn solve_pressure(shape: GridShape, scratch: &mut ProjectionScratch, iterations: u32, walls: WallMode) {
    scratch.pressure.fill(0.0);
    scratch.pressure_prev.fill(0.0);
    for _ in 0..iterations {
        std::mem::swap(&mut scratch.pressure, &mut scratch.pressure_prev);
        let prev = scratch.pressure_prev.as_slice();
        for i in shape.interior() {
            let sum = shape.access_clamped(Direction::Left, i, prev, Channel::Scalar)
                + shape.access_clamped(Direction::Right, i, prev, Channel::Scalar)
                + shape.access_clamped(Direction::Up, i, prev, Channel::Scalar)
                + shape.access_clamped(Direction::Down, i, prev, Channel::Scalar);
            scratch.pressure[i] = (sum + scratch.divergence[i]) / 4.0;
        }
        if walls == WallMode::Reflecting {
            mirror_scalar(shape, &mut scratch.pressure);
        }
    }
}

fn subtract_gradient(grid: &mut Grid, pressure: &[f32]) {
    let shape = grid.shape();
    let n = shape.width() as f32;
    let cells = grid.cells_mut();
    for i in shape.interior() {
        let grad = shape.central_difference(i, pressure, Channel::Scalar);
        cells[i].velocity -= 0.5 * n * grad;
    }
}

/// Copy each boundary value from its nearest interior cell.
fn mirror_scalar(shape: GridShape, field: &mut [f32]) {
    let (w, h) = (shape.width(), shape.height());
    for x in 1..w - 1 {
        field[shape.idx(x, 0)] = field[shape.idx(x, 1)];
        field[shape.idx(x, h - 1)] = field[shape.idx(x, h - 2)];
    }
    for y in 1..h - 1 {
        field[shape.idx(0, y)] = field[shape.idx(1, y)];
        field[shape.idx(w - 1, y)] = field[shape.idx(w - 2, y)];
    }
    fill_corners(shape, field);
}

/// Each corner with the two ring cells it averages.
fn corner_stencils(shape: GridShape) -> [(usize, usize, usize); 4] {
    let (w, h) = (shape.width(), shape.height());
    [
        (shape.idx(0, 0), shape.idx(1, 0), shape.idx(0, 1)),
        (shape.idx(w - 1, 0), shape.idx(w - 2, 0), shape.idx(w - 1, 1)),
        (shape.idx(0, h - 1), shape.idx(1, h - 1), shape.idx(0, h - 2)),
        (shape.idx(w - 1, h - 1), shape.idx(w - 2, h - 1), shape.idx(w - 1, h - 2)),
    ]
}

fn fill_corners(shape: GridShape, field: &mut [f32]) {
    for (corner, a, b) in corner_stencils(shape) {
        field[corner] = 0.5 * (field[a] + field[b]);
    }
}

/// Solid walls: the velocity component normal to a wall is the negated
/// interior value, the tangential one is copied.
pub fn apply_walls(grid: &mut Grid) {
    let shape = grid.shape();
    let (w, h) = (shape.width(), shape.height());
    let cells = grid.cells_mut();
    for x in 1..w - 1 {
        let inner_top = cells[shape.idx(x, 1)].velocity;
        let inner_bottom = cells[shape.idx(x, h - 2)].velocity;
        cells[shape.idx(x, 0)].velocity = glam::Vec2::new(inner_top.x, -inner_top.y);
        cells[shape.idx(x, h - 1)].velocity = glam::Vec2::new(inner_bottom.x, -inner_bottom.y);
    }
    for y in 1..h - 1 {
        let inner_left = cells[shape.idx(1, y)].velocity;
        let inner_right = cells[shape.idx(w - 2, y)].velocity;
        cells[shape.idx(0, y)].velocity = glam::Vec2::new(-inner_left.x, inner_left.y);
        cells[shape.idx(w - 1, y)].velocity = glam::Vec2::new(-inner_right.x, inner_right.y);
    }
    for (corner, a, b) in corner_stencils(shape) {
        cells[corner].velocity = 0.5 * (cells[a].velocity + cells[b].velocity);
    }
}

/// Project the velocity field toward zero divergence. Density is untouched.
pub fn project(grid: &mut Grid, scratch: &mut ProjectionScratch, iterations: u32, walls: WallMode) {
    let shape = grid.shape();
    scratch.reset(shape.len());
    if walls == WallMode::Reflecting {
        apply_walls(grid);
    }
    compute_divergence(grid, &mut scratch.divergence);
    solve_pressure(shape, scratch, iterations, walls);
    subtract_gradient(grid, &scratch.pressure);
    if walls == WallMode::Reflecting {
        apply_walls(grid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn field(size: usize, f: impl Fn(usize, usize) -> Vec2) -> Grid {
        let mut grid = Grid::new(size, size);
        for y in 0..size {
            for x in 0..size {
                grid.cell_mut(x, y).velocity = f(x, y);
            }
        }
        grid
    }

    #[test]
    fn divergence_free_field_is_unchanged() {
        // Uniform flow plus a shear: both have zero discrete divergence.
        let mut grid = field(12, |_, y| Vec2::new(1.0 + 0.1 * y as f32, -0.5));
        let before = grid.clone();
        let mut scratch = ProjectionScratch::default();
        project(&mut grid, &mut scratch, 20, WallMode::Open);
        assert!(scratch.pressure.iter().all(|p| p.abs() < 1e-7));
        for (a, b) in before.cells().iter().zip(grid.cells()) {
            assert!((a.velocity - b.velocity).length() < 1e-6);
        }
    }

    fn divergence_energy(grid: &Grid) -> f32 {
        let mut divergence = vec![0.0; grid.shape().len()];
        compute_divergence(grid, &mut divergence);
        divergence.iter().map(|d| d * d).sum()
    }

    #[test]
    fn projection_reduces_divergence() {
        // Smooth source in the middle, negligible at the walls.
        let mut grid = gaussian_source(32);
        let before = divergence_energy(&grid);
        let mut scratch = ProjectionScratch::default();
        for _ in 0..3 {
            project(&mut grid, &mut scratch, 100, WallMode::Open);
        }
        let after = divergence_energy(&grid);
        assert!(after < before * 0.5, "divergence {before} -> {after}");
    }

    fn gaussian_source(size: usize) -> Grid {
        let c = (size as f32 - 1.0) * 0.5;
        field(size, |x, y| {
            let d = Vec2::new(x as f32 - c, y as f32 - c);
            d * (-d.length_squared() / 16.0).exp()
        })
    }

    #[test]
    fn reflecting_projection_seals_the_walls() {
        let size = 32;
        let mut grid = gaussian_source(size);
        let shape = grid.shape();
        let mut divergence = vec![0.0; shape.len()];
        let peak_before = peak_divergence(&grid, &mut divergence);
        let energy_before = divergence_energy(&grid);

        let mut scratch = ProjectionScratch::default();
        for _ in 0..3 {
            project(&mut grid, &mut scratch, 100, WallMode::Reflecting);
        }

        let energy_after = divergence_energy(&grid);
        assert!(energy_after < energy_before * 0.5, "divergence {energy_before} -> {energy_after}");
        assert!(peak_divergence(&grid, &mut divergence) < peak_before);

        // Pressure has zero gradient across the ring and averaged corners.
        let p = &scratch.pressure;
        for k in 1..size - 1 {
            assert_eq!(p[shape.idx(0, k)], p[shape.idx(1, k)]);
            assert_eq!(p[shape.idx(size - 1, k)], p[shape.idx(size - 2, k)]);
            assert_eq!(p[shape.idx(k, 0)], p[shape.idx(k, 1)]);
            assert_eq!(p[shape.idx(k, size - 1)], p[shape.idx(k, size - 2)]);
        }
        let corner = 0.5 * (p[shape.idx(1, 0)] + p[shape.idx(0, 1)]);
        assert_eq!(p[shape.idx(0, 0)], corner);

        // Normal flow across each wall averages to zero with its inner neighbor.
        for k in 1..size - 1 {
            assert_eq!(grid.cell(0, k).velocity.x + grid.cell(1, k).velocity.x, 0.0);
            assert_eq!(grid.cell(size - 1, k).velocity.x + grid.cell(size - 2, k).velocity.x, 0.0);
            assert_eq!(grid.cell(k, 0).velocity.y + grid.cell(k, 1).velocity.y, 0.0);
            assert_eq!(grid.cell(k, size - 1).velocity.y + grid.cell(k, size - 2).velocity.y, 0.0);
        }
    }

    #[test]
    fn projection_leaves_density_alone() {
        let mut grid = field(8, |x, _| Vec2::new(x as f32, 0.0));
        grid.cell_mut(3, 3).density = 9.0;
        let mut scratch = ProjectionScratch::default();
        project(&mut grid, &mut scratch, 20, WallMode::Reflecting);
        assert_eq!(grid.cell(3, 3).density, 9.0);
    }

    #[test]
    fn reflecting_walls_cancel_normal_flow() {
        let mut grid = field(8, |_, _| Vec2::new(2.0, 3.0));
        apply_walls(&mut grid);
        // Normal components mirror the interior, so the wall average is zero.
        assert_eq!(grid.cell(0, 4).velocity.x, -2.0);
        assert_eq!(grid.cell(7, 4).velocity.x, -2.0);
        assert_eq!(grid.cell(4, 0).velocity.y, -3.0);
        assert_eq!(grid.cell(4, 7).velocity.y, -3.0);
        assert_eq!(grid.cell(0, 4).velocity.y, 3.0);
    }

    #[test]
    fn open_walls_keep_boundary_ring() {
        let mut grid = field(8, |x, y| Vec2::new((x * y) as f32, x as f32));
        let ring: Vec<Vec2> = (0..8).map(|x| grid.cell(x, 0).velocity).collect();
        let mut scratch = ProjectionScratch::default();
        project(&mut grid, &mut scratch, 20, WallMode::Open);
        for x in 0..8 {
            assert_eq!(grid.cell(x, 0).velocity, ring[x]);
        }
    }

    #[test]
    fn scratch_is_cleared_between_passes() {
        let mut scratch = ProjectionScratch::new(4);
        scratch.pressure.fill(5.0);
        scratch.reset(9);
        assert_eq!(scratch.pressure.len(), 9);
        assert!(scratch.pressure.iter().all(|&p| p == 0.0));
    }
}
