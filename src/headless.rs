// Unattended run: a scripted pointer stirs the fluid and frames go to PNG.
// Run with: cargo run --release --bin fluid_headless -- [frames] [every_nth] [out_dir]

use std::path::PathBuf;

use anyhow::Context;
use fluid_canvas::{
    capture::PngCapture, input::WanderingPointer, run_frames, FluidSimulator, SimulationSettings,
};

const DEFAULT_FRAMES: u64 = 600;
const DEFAULT_INTERVAL: u64 = 30;
const FIXED_DT: f32 = 1.0 / 60.0;
const POINTER_SEED: u64 = 0x5eed;

fn parse_arg<T: std::str::FromStr>(args: &[String], index: usize, fallback: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match args.get(index) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("argument {index} ({raw:?}) is not valid")),
        None => Ok(fallback),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let frames = parse_arg(&args, 0, DEFAULT_FRAMES)?;
    let interval = parse_arg(&args, 1, DEFAULT_INTERVAL)?;
    let out_root = args.get(2).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("captures"));

    let settings_path = SimulationSettings::default_path();
    let settings = if settings_path.exists() {
        SimulationSettings::load_from_disk(&settings_path)
            .with_context(|| format!("loading {}", settings_path.display()))?
    } else {
        SimulationSettings::default()
    };

    let mut sim = FluidSimulator::new(settings);
    let mut pointer = WanderingPointer::new(
        POINTER_SEED,
        sim.width(),
        sim.height(),
        sim.settings().pointer_margin,
        (sim.width().min(sim.height()) as f32 / 60.0).max(0.5),
    );
    let mut capture = PngCapture::timestamped(&out_root, interval)?;

    log::info!(
        "Running {} frames at dt={:.4}, saving every {} to {}",
        frames,
        FIXED_DT,
        interval,
        capture.dir().display()
    );
    let stats = run_frames(&mut sim, &mut pointer, &mut capture, frames, FIXED_DT)?;
    log::info!(
        "Done: {} PNGs, total density {:.2}, peak speed {:.2}",
        capture.written().len(),
        stats.total_density,
        stats.peak_speed
    );
    Ok(())
}
