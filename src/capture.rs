use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use image::RgbaImage;

use crate::simulator::Renderer;

/// Renderer that writes every `interval`-th frame to a PNG file.
pub struct PngCapture {
    dir: PathBuf,
    interval: u64,
    frame: u64,
    written: Vec<PathBuf>,
}

impl PngCapture {
    pub fn new(dir: impl Into<PathBuf>, interval: u64) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating capture directory {}", dir.display()))?;
        Ok(Self {
            dir,
            interval: interval.max(1),
            frame: 0,
            written: Vec::new(),
        })
    }

    /// Capture directory named after the current local time, under `root`.
    pub fn timestamped(root: &Path, interval: u64) -> anyhow::Result<Self> {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        Self::new(root.join(format!("run_{stamp}")), interval)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

/// Frame buffer (row 0 at the bottom) to an image (row 0 at the top).
pub fn frame_to_image(pixels: &[u8], width: u32, height: u32) -> anyhow::Result<RgbaImage> {
    let Some(image) = RgbaImage::from_raw(width, height, pixels.to_vec()) else {
        anyhow::bail!(
            "pixel buffer of {} bytes does not hold a {}x{} RGBA frame",
            pixels.len(),
            width,
            height
        );
    };
    Ok(image::imageops::flip_vertical(&image))
}

/// Write one frame as a PNG at `path`.
pub fn save_frame(path: &Path, pixels: &[u8], width: u32, height: u32) -> anyhow::Result<()> {
    frame_to_image(pixels, width, height)?
        .save(path)
        .with_context(|| format!("writing {}", path.display()))
}

/// `screenshot_<local time>.png` in `dir`.
pub fn screenshot_path(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S%.3f").to_string();
    dir.join(format!("screenshot_{stamp}.png"))
}

impl Renderer for PngCapture {
    fn present(&mut self, pixels: &[u8], width: u32, height: u32) -> anyhow::Result<()> {
        let frame = self.frame;
        self.frame += 1;
        if frame % self.interval != 0 {
            return Ok(());
        }
        let path = self.dir.join(format!("frame_{frame:05}.png"));
        save_frame(&path, pixels, width, height)?;
        log::debug!("Saved frame {} to {}", frame, path.display());
        self.written.push(path);
        Ok(())
    }
}
