use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::color::ColorMap;

pub const SETTINGS_FILE_NAME: &str = "fluid_settings.json";

/// How density is transported along the velocity field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdvectionScheme {
    /// Forward splat; conserves total density exactly.
    #[default]
    Scatter,
    /// Backtrace and bilinear resample. Density drifts where the unprojected
    /// flow converges or diverges, in proportion to `dt`: a single pointer
    /// impulse stays within 5% of its injected total for `dt <= 1/60` s and
    /// loses a little over 5% at `dt = 1/30` s.
    Gather,
}

/// Boundary condition applied around the pressure solve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WallMode {
    /// Boundary ring left untouched; pressure held at zero there.
    #[default]
    Open,
    /// Normal velocity mirrored at the ring, zero pressure gradient across it.
    Reflecting,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationSettings {
    pub grid_width: usize,
    pub grid_height: usize,
    pub viscosity: f32,
    pub diffusion_iterations: u32,
    pub projection_iterations: u32,
    pub interaction_radius: usize, // half size of the forcing square
    pub energy_loss: f32,          // multiplier on advected velocity
    pub density_amount: f32,
    pub velocity_scale: f32,
    pub pointer_margin: f32,
    pub max_time_step: f32,
    pub advection: AdvectionScheme,
    pub walls: WallMode,
    pub vorticity_strength: f32, // 0.0 = off
    pub color_map: ColorMap,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            grid_width: 200,
            grid_height: 200,
            viscosity: 0.5,
            diffusion_iterations: 16,
            projection_iterations: 20,
            interaction_radius: 10,
            energy_loss: 0.995,
            density_amount: 2.0,
            velocity_scale: 1.0,
            pointer_margin: 10.0,
            max_time_step: 1.0 / 30.0,
            advection: AdvectionScheme::Scatter,
            walls: WallMode::Open,
            vorticity_strength: 0.0,
            color_map: ColorMap::default(),
        }
    }
}

impl SimulationSettings {
    pub fn default_path() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(SETTINGS_FILE_NAME)
    }

    pub fn load_from_disk(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut settings: Self = serde_json::from_str(&data)?;
        settings.sanitize();
        Ok(settings)
    }

    pub fn save_to_disk(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load `path` if it exists, otherwise write the defaults there.
    /// A broken file is reported and replaced by defaults in memory only.
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            match Self::load_from_disk(path) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(err) => {
                    log::warn!("Failed to load settings from {}: {err:?}", path.display());
                    return Self::default();
                }
            }
        }
        let settings = Self::default();
        if let Err(err) = settings.save_to_disk(path) {
            log::warn!("Failed to write default settings to {}: {err:?}", path.display());
        }
        settings
    }

    pub fn sanitize(&mut self) {
        self.grid_width = self.grid_width.clamp(3, 4096);
        self.grid_height = self.grid_height.clamp(3, 4096);
        self.viscosity = finite_or(self.viscosity, 0.5).clamp(0.0, 100.0);
        self.diffusion_iterations = self.diffusion_iterations.clamp(1, 200);
        self.projection_iterations = self.projection_iterations.clamp(1, 500);
        self.interaction_radius = self.interaction_radius.min(256);
        self.energy_loss = finite_or(self.energy_loss, 1.0).clamp(0.0, 1.0);
        self.density_amount = finite_or(self.density_amount, 0.0).clamp(-1000.0, 1000.0);
        self.velocity_scale = finite_or(self.velocity_scale, 1.0).clamp(-100.0, 100.0);
        self.pointer_margin = finite_or(self.pointer_margin, 0.0).clamp(0.0, 4096.0);
        self.max_time_step = finite_or(self.max_time_step, 1.0 / 30.0).clamp(1.0 / 10_000.0, 1.0);
        self.vorticity_strength = finite_or(self.vorticity_strength, 0.0).clamp(0.0, 100.0);
        self.color_map.sanitize();
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
