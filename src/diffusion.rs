//! Implicit viscosity by Gauss-Seidel relaxation.
//!
//! Each pass solves `x - a * L(x) = x0` one cell at a time, reading neighbors
//! that were already updated in the same pass. Edge cells only count the
//! neighbors that exist, which is a zero-flux wall: at convergence total
//! density is unchanged.

use crate::grid::{Cell, Channel, Direction, Field, Grid, GridShape};

/// One relaxation update for a single cell and channel.
///
/// `neighbor_sum` holds the `neighbor_count` real neighbors only.
pub fn relax(old: f32, neighbor_sum: f32, neighbor_count: u32, a: f32) -> f32 {
    (old + a * neighbor_sum) / (1.0 + neighbor_count as f32 * a)
}

/// Sum and count of the in-bounds neighbors of `index`.
fn neighbor_sum<F: Field + ?Sized>(shape: GridShape, index: usize, field: &F, channel: Channel) -> (f32, u32) {
    Direction::NEIGHBORS
        .iter()
        .filter_map(|&dir| shape.neighbor(dir, index))
        .fold((0.0, 0), |(sum, count), n| (sum + field.read(n, channel), count + 1))
}

/// Diffuse density and both velocity components with rate `viscosity * dt`.
///
/// `initial` is scratch space for the pre-step values and is overwritten.
pub fn diffuse(grid: &mut Grid, initial: &mut Vec<Cell>, viscosity: f32, dt: f32, iterations: u32) {
    let a = viscosity * dt;
    if a <= 0.0 || iterations == 0 {
        return;
    }

    initial.clear();
    initial.extend_from_slice(grid.cells());
    let shape = grid.shape();
    let cells = grid.cells_mut();

    for _ in 0..iterations {
        for index in 0..shape.len() {
            for channel in Channel::CELL {
                let (sum, count) = neighbor_sum(shape, index, &*cells, channel);
                let old = initial[index].channel(channel);
                *cells[index].channel_mut(channel) = relax(old, sum, count, a);
            }
        }
    }
}
