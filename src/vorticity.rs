//! Vorticity confinement: puts back small-scale swirl that diffusion and
//! advection smear out.

use glam::Vec2;

use crate::grid::{Channel, Direction, Grid};

/// `0.5 * ((vy_right - vy_left) - (vx_down - vx_up))` for every cell, Neumann at the edges.
pub fn compute_curl(grid: &Grid, curl: &mut Vec<f32>) {
    let shape = grid.shape();
    let cells = grid.cells();
    curl.clear();
    curl.extend((0..shape.len()).map(|i| {
        let dvy = shape.access_clamped(Direction::Right, i, cells, Channel::VelocityY)
            - shape.access_clamped(Direction::Left, i, cells, Channel::VelocityY);
        let dvx = shape.access_clamped(Direction::Down, i, cells, Channel::VelocityX)
            - shape.access_clamped(Direction::Up, i, cells, Channel::VelocityX);
        0.5 * (dvy - dvx)
    }));
}

/// Push interior velocity along `strength * (N x w)` for one step of `dt`,
/// where `N` points toward increasing |curl|.
pub fn confine(grid: &mut Grid, curl: &mut Vec<f32>, magnitude: &mut Vec<f32>, strength: f32, dt: f32) {
    if strength <= 0.0 || dt <= 0.0 {
        return;
    }
    compute_curl(grid, curl);
    magnitude.clear();
    magnitude.extend(curl.iter().map(|w| w.abs()));

    let shape = grid.shape();
    let cells = grid.cells_mut();
    for i in shape.interior() {
        let gradient = 0.5 * shape.central_difference(i, magnitude.as_slice(), Channel::Scalar);
        let length = gradient.length();
        if length < 1e-6 {
            continue;
        }
        let n = gradient / length;
        let w = curl[i];
        cells[i].velocity += Vec2::new(n.y * w, -n.x * w) * strength * dt;
    }
}
