use serde::{Deserialize, Serialize};

use crate::grid::Cell;

pub const BYTES_PER_PIXEL: usize = 4;

/// Logistic transfer curve `255 / (1 + exp((density - center) / spread))`.
///
/// A negative `spread` makes the channel brighten as density grows, a positive
/// one makes it fade.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ChannelCurve {
    pub center: f32,
    pub spread: f32,
}

impl ChannelCurve {
    pub const fn new(center: f32, spread: f32) -> Self {
        Self { center, spread }
    }

    pub fn apply(&self, density: f32) -> u8 {
        let value = 255.0 / (1.0 + ((density - self.center) / self.spread).exp());
        // NaN density maps to black rather than poisoning the frame.
        if value.is_nan() {
            return 0;
        }
        value.round().clamp(0.0, 255.0) as u8
    }

    fn sanitize(&mut self, fallback: ChannelCurve) {
        if !self.center.is_finite() {
            self.center = fallback.center;
        }
        if !self.spread.is_finite() || self.spread.abs() < 1e-4 {
            self.spread = fallback.spread;
        }
    }
}

/// Density to RGBA. Alpha is always opaque.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColorMap {
    pub red: ChannelCurve,
    pub green: ChannelCurve,
    pub blue: ChannelCurve,
}

impl Default for ColorMap {
    fn default() -> Self {
        // black -> blue -> magenta -> white
        Self {
            red: ChannelCurve::new(1.5, -0.3),
            green: ChannelCurve::new(4.0, -0.8),
            blue: ChannelCurve::new(0.3, -0.1),
        }
    }
}

impl ColorMap {
    pub fn rgba(&self, density: f32) -> [u8; 4] {
        [
            self.red.apply(density),
            self.green.apply(density),
            self.blue.apply(density),
            u8::MAX,
        ]
    }

    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        self.red.sanitize(defaults.red);
        self.green.sanitize(defaults.green);
        self.blue.sanitize(defaults.blue);
    }

    /// Regenerate the whole pixel buffer from `cells` and flip it so that
    /// row 0 is the bottom grid row.
    pub fn map_density(&self, cells: &[Cell], width: usize, height: usize, pixels: &mut [u8]) {
        assert_eq!(cells.len(), width * height, "cell buffer does not match grid");
        assert_eq!(
            pixels.len(),
            width * height * BYTES_PER_PIXEL,
            "pixel buffer does not match grid"
        );
        for (cell, px) in cells.iter().zip(pixels.chunks_exact_mut(BYTES_PER_PIXEL)) {
            px.copy_from_slice(&self.rgba(cell.density));
        }
        flip_rows(pixels, width * BYTES_PER_PIXEL, height);
    }
}

/// Reverse row order of a tightly packed image in place.
pub fn flip_rows(pixels: &mut [u8], row_bytes: usize, rows: usize) {
    debug_assert_eq!(pixels.len(), row_bytes * rows);
    for top in 0..rows / 2 {
        let bottom = rows - 1 - top;
        let (head, tail) = pixels.split_at_mut(bottom * row_bytes);
        head[top * row_bytes..(top + 1) * row_bytes].swap_with_slice(&mut tail[..row_bytes]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_are_monotonic_in_density() {
        let map = ColorMap::default();
        let fading = ChannelCurve::new(2.0, 0.5);
        let mut previous = map.rgba(-5.0);
        let mut previous_fade = fading.apply(-5.0);
        for step in 1..=400 {
            let density = -5.0 + step as f32 * 0.05;
            let rgba = map.rgba(density);
            for c in 0..3 {
                assert!(rgba[c] >= previous[c], "channel {c} dropped at {density}");
            }
            assert_eq!(rgba[3], 255);
            let fade = fading.apply(density);
            assert!(fade <= previous_fade);
            previous = rgba;
            previous_fade = fade;
        }
    }

    #[test]
    fn extreme_densities_stay_in_byte_range() {
        let map = ColorMap::default();
        assert_eq!(map.rgba(1.0e30), [255, 255, 255, 255]);
        assert_eq!(map.rgba(-1.0e30), [0, 0, 0, 255]);
        assert_eq!(map.rgba(f32::NAN)[0], 0);
    }

    #[test]
    fn flip_reverses_rows() {
        let mut pixels: Vec<u8> = (0..6).collect();
        flip_rows(&mut pixels, 2, 3);
        assert_eq!(pixels, vec![4, 5, 2, 3, 0, 1]);
    }

    #[test]
    fn map_density_puts_first_row_last() {
        let mut cells = vec![Cell::default(); 9];
        cells[0].density = 10.0;
        let mut pixels = vec![0u8; 9 * BYTES_PER_PIXEL];
        ColorMap::default().map_density(&cells, 3, 3, &mut pixels);
        let bottom_left = &pixels[6 * BYTES_PER_PIXEL..7 * BYTES_PER_PIXEL];
        assert_eq!(bottom_left, &[255, 255, 255, 255]);
        assert!(pixels[0] < 10);
    }
}
