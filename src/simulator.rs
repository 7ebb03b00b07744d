use glam::Vec2;

use crate::advection::{self, AdvectionParams};
use crate::color::BYTES_PER_PIXEL;
use crate::config::SimulationSettings;
use crate::diffusion;
use crate::forcing::{self, ForcingParams, PointerState};
use crate::grid::{Cell, Grid};
use crate::projection::{self, ProjectionScratch};
use crate::vorticity;

/// Summary of one tick, cheap enough to compute every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickStats {
    pub dt: f32,
    pub forced: bool,
    pub total_density: f32,
    pub peak_speed: f32,
    /// Largest divergence left after projection.
    pub peak_divergence: f32,
}

/// Tick-local buffers. Sized with the grid, contents never carried over.
#[derive(Debug, Default)]
struct Scratch {
    cells: Vec<Cell>,
    projection: ProjectionScratch,
    curl: Vec<f32>,
    curl_magnitude: Vec<f32>,
}

impl Scratch {
    fn new(len: usize) -> Self {
        Self {
            cells: Vec::with_capacity(len),
            projection: ProjectionScratch::new(len),
            curl: Vec::with_capacity(len),
            curl_magnitude: Vec::with_capacity(len),
        }
    }
}

/// Owns every buffer of the simulation and runs the fixed per-tick pipeline:
/// forcing, diffusion, advection, projection, color mapping.
pub struct FluidSimulator {
    settings: SimulationSettings,
    grid: Grid,
    scratch: Scratch,
    pointer: PointerState,
    pixels: Vec<u8>,
    ticks: u64,
}

impl FluidSimulator {
    pub fn new(mut settings: SimulationSettings) -> Self {
        settings.sanitize();
        let grid = Grid::new(settings.grid_width, settings.grid_height);
        let len = grid.shape().len();
        log::info!(
            "Fluid grid {}x{} ({:?} advection, {:?} walls)",
            grid.width(),
            grid.height(),
            settings.advection,
            settings.walls
        );
        Self {
            settings,
            grid,
            scratch: Scratch::new(len),
            pointer: PointerState::default(),
            pixels: vec![0; len * BYTES_PER_PIXEL],
            ticks: 0,
        }
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn pointer_mut(&mut self) -> &mut PointerState {
        &mut self.pointer
    }

    /// RGBA bytes, row 0 at the bottom. Regenerated in full every tick and
    /// all zero until the first tick after construction, resize or reset.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Reallocate every buffer for the new dimensions, zero-filled.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.settings.grid_width = width;
        self.settings.grid_height = height;
        self.settings.sanitize();
        self.grid = Grid::new(self.settings.grid_width, self.settings.grid_height);
        let len = self.grid.shape().len();
        self.scratch = Scratch::new(len);
        self.pixels = vec![0; len * BYTES_PER_PIXEL];
        self.pointer.clear();
        log::info!("Resized fluid grid to {}x{}", self.grid.width(), self.grid.height());
    }

    /// Zero the fields and forget pointer history, keeping dimensions.
    pub fn reset(&mut self) {
        self.grid.clear();
        self.pointer.clear();
        self.pixels.fill(0);
        log::debug!("Fluid state reset");
    }

    /// `dt` is wall-clock time since the previous tick. Non-finite or negative
    /// values become zero and large ones are clamped to `max_time_step`.
    pub fn sanitize_dt(&self, dt: f32) -> f32 {
        if dt.is_finite() {
            dt.clamp(0.0, self.settings.max_time_step)
        } else {
            0.0
        }
    }

    fn forcing_params(&self) -> ForcingParams {
        ForcingParams {
            radius: self.settings.interaction_radius,
            density_amount: self.settings.density_amount,
            velocity_scale: self.settings.velocity_scale,
            margin: self.settings.pointer_margin,
        }
    }

    /// Run one full tick. `pointer` is the input position in grid coordinates,
    /// `None` when there is nothing to inject (history is then dropped).
    pub fn tick(&mut self, dt: f32, pointer: Option<Vec2>) -> TickStats {
        assert_eq!(
            self.pixels.len(),
            self.grid.shape().len() * BYTES_PER_PIXEL,
            "pixel buffer out of sync with grid"
        );
        let dt = self.sanitize_dt(dt);
        let settings = &self.settings;

        let forced = match pointer {
            Some(position) => {
                let params = self.forcing_params();
                forcing::apply(&mut self.grid, &mut self.pointer, position, &params)
            }
            None => {
                self.pointer.clear();
                false
            }
        };

        vorticity::confine(
            &mut self.grid,
            &mut self.scratch.curl,
            &mut self.scratch.curl_magnitude,
            settings.vorticity_strength,
            dt,
        );

        diffusion::diffuse(
            &mut self.grid,
            &mut self.scratch.cells,
            settings.viscosity,
            dt,
            settings.diffusion_iterations,
        );

        advection::advect(
            &mut self.grid,
            &mut self.scratch.cells,
            dt,
            &AdvectionParams {
                scheme: settings.advection,
                energy_loss: settings.energy_loss,
            },
        );

        projection::project(
            &mut self.grid,
            &mut self.scratch.projection,
            settings.projection_iterations,
            settings.walls,
        );

        let peak_divergence = projection::peak_divergence(&self.grid, &mut self.scratch.projection.divergence);

        self.refresh_pixels();
        self.ticks += 1;

        let stats = TickStats {
            dt,
            forced,
            total_density: self.grid.total_density(),
            peak_speed: self.grid.peak_speed(),
            peak_divergence,
        };
        log::trace!("tick {}: {:?}", self.ticks, stats);
        if !stats.total_density.is_finite() {
            log::warn!("Fluid state became non-finite at tick {}", self.ticks);
        }
        stats
    }

    fn refresh_pixels(&mut self) {
        self.settings.color_map.map_density(
            self.grid.cells(),
            self.grid.width(),
            self.grid.height(),
            &mut self.pixels,
        );
    }
}

/// Supplies the pointer position, in grid coordinates, once per tick.
pub trait InputSource {
    fn pointer(&mut self) -> Option<Vec2>;
}

/// Consumes the RGBA frame once per tick.
pub trait Renderer {
    fn present(&mut self, pixels: &[u8], width: u32, height: u32) -> anyhow::Result<()>;
}

/// Drive `frames` ticks with a fixed `dt`, handing every frame to `renderer`.
pub fn run_frames(
    sim: &mut FluidSimulator,
    input: &mut dyn InputSource,
    renderer: &mut dyn Renderer,
    frames: u64,
    dt: f32,
) -> anyhow::Result<TickStats> {
    let mut stats = TickStats::default();
    for _ in 0..frames {
        stats = sim.tick(dt, input.pointer());
        renderer.present(sim.pixels(), sim.width() as u32, sim.height() as u32)?;
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_settings() -> SimulationSettings {
        SimulationSettings {
            grid_width: 16,
            grid_height: 12,
            interaction_radius: 1,
            pointer_margin: 1.0,
            ..Default::default()
        }
    }

    struct Recorder {
        frames: usize,
        last_len: usize,
    }

    impl Renderer for Recorder {
        fn present(&mut self, pixels: &[u8], width: u32, height: u32) -> anyhow::Result<()> {
            assert_eq!(pixels.len(), (width * height * 4) as usize);
            self.frames += 1;
            self.last_len = pixels.len();
            Ok(())
        }
    }

    struct Still(Vec2);

    impl InputSource for Still {
        fn pointer(&mut self) -> Option<Vec2> {
            Some(self.0)
        }
    }

    #[test]
    fn dt_is_sanitized() {
        let sim = FluidSimulator::new(small_settings());
        assert_eq!(sim.sanitize_dt(f32::NAN), 0.0);
        assert_eq!(sim.sanitize_dt(-1.0), 0.0);
        assert_eq!(sim.sanitize_dt(10.0), sim.settings().max_time_step);
        assert_eq!(sim.sanitize_dt(0.01), 0.01);
    }

    #[test]
    fn missing_pointer_clears_history() {
        let mut sim = FluidSimulator::new(small_settings());
        sim.tick(0.016, Some(Vec2::new(8.0, 6.0)));
        assert!(sim.pointer().previous().is_some());
        let stats = sim.tick(0.016, None);
        assert!(!stats.forced);
        assert!(sim.pointer().previous().is_none());
    }

    #[test]
    fn run_frames_presents_every_tick() {
        let mut sim = FluidSimulator::new(small_settings());
        let mut recorder = Recorder {
            frames: 0,
            last_len: 0,
        };
        let stats = run_frames(&mut sim, &mut Still(Vec2::new(8.0, 6.0)), &mut recorder, 5, 0.016).unwrap();
        assert_eq!(recorder.frames, 5);
        assert_eq!(recorder.last_len, 16 * 12 * 4);
        assert_eq!(sim.ticks(), 5);
        assert!(stats.total_density > 0.0);
        assert!(stats.peak_divergence.is_finite());
    }

    #[test]
    fn reset_zeroes_fields() {
        let mut sim = FluidSimulator::new(small_settings());
        sim.tick(0.016, Some(Vec2::new(8.0, 6.0)));
        sim.reset();
        assert_eq!(sim.grid().total_density(), 0.0);
        assert_eq!(sim.width(), 16);
    }
}
