//! Transport of density and velocity along the flow.
//!
//! Velocity is always moved by a semi-Lagrangian backtrace. Density uses the
//! configured [`AdvectionScheme`]: `Scatter` splats each cell forward and keeps
//! the total exact, `Gather` resamples at the backtrace.

use glam::Vec2;

use crate::config::AdvectionScheme;
use crate::grid::{Cell, Grid, GridShape};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvectionParams {
    pub scheme: AdvectionScheme,
    /// Multiplier (<= 1) applied to advected velocity.
    pub energy_loss: f32,
}

/// Integer corner and fractional offsets of the bilinear stencil around `pos`.
/// `pos` must already lie inside `[0, width-1] x [0, height-1]`.
fn stencil(shape: GridShape, pos: Vec2) -> (usize, usize, f32, f32) {
    let x0 = (pos.x.floor() as usize).min(shape.width() - 2);
    let y0 = (pos.y.floor() as usize).min(shape.height() - 2);
    (x0, y0, pos.x - x0 as f32, pos.y - y0 as f32)
}

fn weights(rel_x: f32, rel_y: f32) -> [f32; 4] {
    [
        (1.0 - rel_x) * (1.0 - rel_y),
        rel_x * (1.0 - rel_y),
        (1.0 - rel_x) * rel_y,
        rel_x * rel_y,
    ]
}

fn corners(shape: GridShape, x0: usize, y0: usize) -> [usize; 4] {
    let i = shape.idx(x0, y0);
    let w = shape.width();
    [i, i + 1, i + w, i + w + 1]
}

/// Bilinear sample of `cells` at `pos` (clamped into the grid).
pub fn sample(shape: GridShape, cells: &[Cell], pos: Vec2) -> Cell {
    let max = Vec2::new((shape.width() - 1) as f32, (shape.height() - 1) as f32);
    let (x0, y0, rel_x, rel_y) = stencil(shape, pos.clamp(Vec2::ZERO, max));
    let mut out = Cell::default();
    for (i, w) in corners(shape, x0, y0).into_iter().zip(weights(rel_x, rel_y)) {
        out.density += cells[i].density * w;
        out.velocity += cells[i].velocity * w;
    }
    out
}

/// True when the bilinear stencil at `pos` stays at least one cell inside every edge.
fn backtrace_in_bounds(shape: GridShape, pos: Vec2) -> bool {
    let max_x = (shape.width() - 2) as f32;
    let max_y = (shape.height() - 2) as f32;
    pos.x >= 1.0 && pos.y >= 1.0 && pos.x <= max_x && pos.y <= max_y
}

/// Advect the grid by `dt`. `source` is scratch space and is overwritten.
pub fn advect(grid: &mut Grid, source: &mut Vec<Cell>, dt: f32, params: &AdvectionParams) {
    source.clear();
    source.extend_from_slice(grid.cells());
    let shape = grid.shape();
    let cells = grid.cells_mut();

    for (index, out) in cells.iter_mut().enumerate() {
        let (x, y) = shape.coords(index);
        let here = source[index];
        let from = Vec2::new(x as f32, y as f32) - here.velocity * dt;
        if backtrace_in_bounds(shape, from) {
            let sampled = sample(shape, source, from);
            out.velocity = sampled.velocity * params.energy_loss;
            if params.scheme == AdvectionScheme::Gather {
                out.density = sampled.density;
            }
        } else {
            // Too close to an edge for a full stencil: the cell keeps its value.
            out.velocity = here.velocity * params.energy_loss;
        }
    }

    if params.scheme == AdvectionScheme::Scatter {
        scatter_density(shape, source, cells, dt);
    }
}

/// Splat every cell's density at its forward position. Weights sum to one and
/// targets are clamped into the grid, so no density is created or lost.
fn scatter_density(shape: GridShape, source: &[Cell], cells: &mut [Cell], dt: f32) {
    let max = Vec2::new((shape.width() - 1) as f32, (shape.height() - 1) as f32);
    for cell in cells.iter_mut() {
        cell.density = 0.0;
    }
    for (index, cell) in source.iter().enumerate() {
        if cell.density == 0.0 {
            continue;
        }
        let (x, y) = shape.coords(index);
        let to = (Vec2::new(x as f32, y as f32) + cell.velocity * dt).clamp(Vec2::ZERO, max);
        let to = if to.is_finite() { to } else { Vec2::new(x as f32, y as f32) };
        let (x0, y0, rel_x, rel_y) = stencil(shape, to);
        for (i, w) in corners(shape, x0, y0).into_iter().zip(weights(rel_x, rel_y)) {
            cells[i].density += cell.density * w;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(scheme: AdvectionScheme) -> AdvectionParams {
        AdvectionParams {
            scheme,
            energy_loss: 1.0,
        }
    }

    fn blob(size: usize, velocity: Vec2) -> Grid {
        let mut grid = Grid::new(size, size);
        for y in 0..size {
            for x in 0..size {
                let cell = grid.cell_mut(x, y);
                cell.density = (x * 3 + y) as f32 * 0.25;
                cell.velocity = velocity;
            }
        }
        grid
    }

    #[test]
    fn bilinear_weights_sum_to_one() {
        let w = weights(0.3, 0.8);
        assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        let grid = blob(5, Vec2::ZERO);
        let s = sample(grid.shape(), grid.cells(), Vec2::new(1.5, 2.0));
        let expected = 0.5 * grid.cell(1, 2).density + 0.5 * grid.cell(2, 2).density;
        assert!((s.density - expected).abs() < 1e-6);
    }

    #[test]
    fn zero_velocity_is_identity() {
        for scheme in [AdvectionScheme::Gather, AdvectionScheme::Scatter] {
            let mut grid = blob(8, Vec2::ZERO);
            let before: Vec<f32> = grid.cells().iter().map(|c| c.density).collect();
            let mut scratch = Vec::new();
            advect(&mut grid, &mut scratch, 0.1, &params(scheme));
            for (a, b) in before.iter().zip(grid.cells()) {
                assert!((a - b.density).abs() < 1e-6, "{scheme:?}: {a} != {}", b.density);
            }
        }
    }

    #[test]
    fn scatter_conserves_total_density() {
        let mut grid = blob(12, Vec2::ZERO);
        for (i, cell) in grid.cells_mut().iter_mut().enumerate() {
            cell.velocity = Vec2::new((i % 7) as f32 - 3.0, (i % 5) as f32 - 2.0) * 4.0;
        }
        let before = grid.total_density();
        let mut scratch = Vec::new();
        advect(&mut grid, &mut scratch, 0.37, &params(AdvectionScheme::Scatter));
        assert!((grid.total_density() - before).abs() / before < 1e-4);
    }

    #[test]
    fn gather_moves_density_downstream() {
        let mut grid = Grid::new(10, 10);
        for cell in grid.cells_mut() {
            cell.velocity = Vec2::new(1.0, 0.0);
        }
        grid.cell_mut(4, 5).density = 1.0;
        let mut scratch = Vec::new();
        advect(&mut grid, &mut scratch, 1.0, &params(AdvectionScheme::Gather));
        assert!((grid.cell(5, 5).density - 1.0).abs() < 1e-6);
        assert!(grid.cell(4, 5).density.abs() < 1e-6);
    }

    #[test]
    fn gather_skips_cells_whose_backtrace_leaves_the_stencil() {
        let mut grid = Grid::new(10, 5);
        for cell in grid.cells_mut() {
            cell.density = 1.0;
            cell.velocity = Vec2::new(-3.0, 0.0);
        }
        grid.cell_mut(8, 2).density = 7.0;
        let mut scratch = Vec::new();
        let damped = AdvectionParams {
            scheme: AdvectionScheme::Gather,
            energy_loss: 0.9,
        };
        advect(&mut grid, &mut scratch, 1.0, &damped);

        let row: Vec<f32> = (0..10).map(|x| grid.cell(x, 2).density).collect();
        assert_eq!(row, [1.0, 1.0, 1.0, 1.0, 1.0, 7.0, 1.0, 1.0, 7.0, 1.0]);
        // x = 8 backtraces to 11, past the last full stencil: value kept, flow damped.
        for x in [0, 6, 7, 8, 9] {
            let v = grid.cell(x, 2).velocity;
            assert!((v - Vec2::new(-2.7, 0.0)).length() < 1e-6, "x={x}: {v}");
        }
    }

    #[test]
    fn scatter_splits_fractional_moves() {
        let mut grid = Grid::new(10, 10);
        grid.cell_mut(4, 5).density = 1.0;
        grid.cell_mut(4, 5).velocity = Vec2::new(0.5, 0.0);
        let mut scratch = Vec::new();
        advect(&mut grid, &mut scratch, 1.0, &params(AdvectionScheme::Scatter));
        assert!((grid.cell(4, 5).density - 0.5).abs() < 1e-6);
        assert!((grid.cell(5, 5).density - 0.5).abs() < 1e-6);
    }

    #[test]
    fn energy_loss_damps_velocity() {
        let mut grid = blob(6, Vec2::new(2.0, 0.0));
        let mut scratch = Vec::new();
        let damped = AdvectionParams {
            scheme: AdvectionScheme::Gather,
            energy_loss: 0.5,
        };
        advect(&mut grid, &mut scratch, 0.1, &damped);
        for cell in grid.cells() {
            assert!((cell.velocity.x - 1.0).abs() < 1e-6);
        }
    }
}
