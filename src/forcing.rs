use glam::Vec2;

use crate::grid::Grid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForcingParams {
    /// Half the side of the injection square, in cells.
    pub radius: usize,
    pub density_amount: f32,
    pub velocity_scale: f32,
    /// Pointer positions closer than this to any edge are ignored.
    pub margin: f32,
}

/// Pointer history carried between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    previous: Option<Vec2>,
}

impl PointerState {
    pub fn at(position: Vec2) -> Self {
        Self {
            previous: Some(position),
        }
    }

    pub fn previous(&self) -> Option<Vec2> {
        self.previous
    }

    pub fn clear(&mut self) {
        self.previous = None;
    }
}

/// Inject pointer motion and density into the square around `position`.
///
/// Returns `true` when cells were touched. The stored previous position is
/// always advanced to `position`.
pub fn apply(grid: &mut Grid, pointer: &mut PointerState, position: Vec2, params: &ForcingParams) -> bool {
    let previous = pointer.previous.unwrap_or(position);
    pointer.previous = Some(position);

    if !position.is_finite() || !inside_margin(grid, position, params.margin) {
        return false;
    }

    let impulse = (position - previous) * params.velocity_scale;
    let max_x = grid.width() - 1;
    let max_y = grid.height() - 1;
    let cx = (position.x.round().max(0.0) as usize).min(max_x);
    let cy = (position.y.round().max(0.0) as usize).min(max_y);
    let x_range = cx.saturating_sub(params.radius)..=(cx + params.radius).min(max_x);
    let y_range = cy.saturating_sub(params.radius)..=(cy + params.radius).min(max_y);

    for y in y_range {
        for x in x_range.clone() {
            let cell = grid.cell_mut(x, y);
            cell.velocity += impulse;
            cell.density += params.density_amount;
        }
    }
    true
}

fn inside_margin(grid: &Grid, position: Vec2, margin: f32) -> bool {
    let max_x = (grid.width() - 1) as f32 - margin;
    let max_y = (grid.height() - 1) as f32 - margin;
    position.x >= margin && position.y >= margin && position.x <= max_x && position.y <= max_y
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(radius: usize, margin: f32) -> ForcingParams {
        ForcingParams {
            radius,
            density_amount: 3.0,
            velocity_scale: 2.0,
            margin,
        }
    }

    #[test]
    fn injects_square_around_pointer() {
        let mut grid = Grid::new(10, 10);
        let mut pointer = PointerState::at(Vec2::new(4.0, 5.0));
        assert!(apply(&mut grid, &mut pointer, Vec2::new(5.0, 5.0), &params(1, 0.0)));

        for y in 0..10 {
            for x in 0..10 {
                let cell = grid.cell(x, y);
                if (4..=6).contains(&x) && (4..=6).contains(&y) {
                    assert_eq!(cell.density, 3.0);
                    assert_eq!(cell.velocity, Vec2::new(2.0, 0.0));
                } else {
                    assert_eq!(cell.density, 0.0);
                    assert_eq!(cell.velocity, Vec2::ZERO);
                }
            }
        }
        assert_eq!(pointer.previous(), Some(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn square_is_clamped_to_grid() {
        let mut grid = Grid::new(6, 6);
        let mut pointer = PointerState::default();
        apply(&mut grid, &mut pointer, Vec2::new(0.0, 0.0), &params(2, 0.0));
        assert!((grid.total_density() - 9.0 * 3.0).abs() < 1e-5);
    }

    #[test]
    fn first_sample_has_no_velocity_delta() {
        let mut grid = Grid::new(8, 8);
        let mut pointer = PointerState::default();
        apply(&mut grid, &mut pointer, Vec2::new(4.0, 4.0), &params(0, 0.0));
        assert_eq!(grid.cell(4, 4).velocity, Vec2::ZERO);
        assert_eq!(grid.cell(4, 4).density, 3.0);
    }

    #[test]
    fn margin_guard_skips_but_tracks_pointer() {
        let mut grid = Grid::new(20, 20);
        let mut pointer = PointerState::at(Vec2::new(10.0, 10.0));
        let touched = apply(&mut grid, &mut pointer, Vec2::new(1.0, 10.0), &params(1, 3.0));
        assert!(!touched);
        assert_eq!(grid.total_density(), 0.0);
        assert_eq!(pointer.previous(), Some(Vec2::new(1.0, 10.0)));
    }
}
