//! Signal analysis renderings
//!
//! When an analysis mode is active, the reception worker renders one of
//! these images from the decoded RGB frame and delivers it in place of the
//! camera picture. Modes are mutually exclusive; the delivery slot carries
//! whichever rendering is selected.
//!
//! All plots work in BT.601 luma/chroma derived from the RGB pixels, same
//! coefficients as the UYVY conversion path.

use crate::error::{CameraError, Result};
use serde::{Deserialize, Serialize};

/// Analysis rendering selected for a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeMode {
    /// Brightness trace per image column
    LumaWaveform,
    /// Cb/Cr traces per image column
    ChromaWaveform,
    /// Cb/Cr scatter plot
    Vectorscope,
    /// Luma distribution bar chart
    Histogram,
    /// Exposure bands painted over the image geometry
    FalseColor,
}

/// Height of the waveform and vectorscope plots
const PLOT_HEIGHT: u32 = 256;
/// Height of the histogram plot
const HISTOGRAM_HEIGHT: u32 = 128;

/// Renders analysis images, reusing one output buffer across frames
#[derive(Debug, Default)]
pub struct ScopeRenderer {
    scratch: Vec<u8>,
}

impl ScopeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `mode` from a packed RGB888 frame
    ///
    /// Returns the rendered RGB888 pixels (borrowing the internal buffer)
    /// and their dimensions.
    pub fn render(
        &mut self,
        mode: ScopeMode,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<(&[u8], u32, u32)> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(CameraError::stream(format!(
                "RGB buffer is {} bytes, expected {expected} for {width}x{height}",
                rgb.len()
            )));
        }

        let (out_w, out_h) = match mode {
            ScopeMode::LumaWaveform | ScopeMode::ChromaWaveform => (width, PLOT_HEIGHT),
            ScopeMode::Vectorscope => (PLOT_HEIGHT, PLOT_HEIGHT),
            ScopeMode::Histogram => (PLOT_HEIGHT, HISTOGRAM_HEIGHT),
            ScopeMode::FalseColor => (width, height),
        };
        self.scratch.clear();
        self.scratch.resize(out_w as usize * out_h as usize * 3, 0);

        match mode {
            ScopeMode::LumaWaveform => self.luma_waveform(rgb, width),
            ScopeMode::ChromaWaveform => self.chroma_waveform(rgb, width),
            ScopeMode::Vectorscope => self.vectorscope(rgb),
            ScopeMode::Histogram => self.histogram(rgb),
            ScopeMode::FalseColor => self.false_color(rgb),
        }

        Ok((&self.scratch, out_w, out_h))
    }

    fn luma_waveform(&mut self, rgb: &[u8], width: u32) {
        let w = width as usize;
        for (i, px) in rgb.chunks_exact(3).enumerate() {
            let col = i % w;
            let row = 255 - luma(px) as usize;
            let idx = (row * w + col) * 3;
            accumulate(&mut self.scratch[idx..idx + 3], [32, 48, 32]);
        }
    }

    fn chroma_waveform(&mut self, rgb: &[u8], width: u32) {
        let w = width as usize;
        for (i, px) in rgb.chunks_exact(3).enumerate() {
            let col = i % w;
            let (cb, cr) = chroma(px);
            let idx = ((255 - cb as usize) * w + col) * 3;
            accumulate(&mut self.scratch[idx..idx + 3], [0, 16, 48]);
            let idx = ((255 - cr as usize) * w + col) * 3;
            accumulate(&mut self.scratch[idx..idx + 3], [48, 16, 0]);
        }
    }

    fn vectorscope(&mut self, rgb: &[u8]) {
        let w = PLOT_HEIGHT as usize;
        for px in rgb.chunks_exact(3) {
            let (cb, cr) = chroma(px);
            let idx = ((255 - cr as usize) * w + cb as usize) * 3;
            accumulate(&mut self.scratch[idx..idx + 3], [32, 48, 32]);
        }
    }

    fn histogram(&mut self, rgb: &[u8]) {
        let mut bins = [0u32; 256];
        for px in rgb.chunks_exact(3) {
            bins[luma(px) as usize] += 1;
        }
        let max = bins.iter().copied().max().filter(|m| *m > 0).unwrap_or(1);

        let w = PLOT_HEIGHT as usize;
        let h = HISTOGRAM_HEIGHT as usize;
        for (bin, count) in bins.iter().enumerate() {
            let bar = (*count as usize * (h - 1)) / max as usize;
            for row in (h - 1 - bar)..h {
                let idx = (row * w + bin) * 3;
                self.scratch[idx..idx + 3].copy_from_slice(&[220, 220, 220]);
            }
        }
    }

    fn false_color(&mut self, rgb: &[u8]) {
        for (px, out) in rgb.chunks_exact(3).zip(self.scratch.chunks_exact_mut(3)) {
            let y = luma(px);
            out.copy_from_slice(&false_color_band(y));
        }
    }
}

/// Exposure band colors: crushed blacks purple, deep shadows blue, midtone
/// markers green and pink, near-clip yellow, clipped red; greyscale between
fn false_color_band(luma: u8) -> [u8; 3] {
    match luma {
        0..=15 => [80, 0, 145],
        16..=47 => [0, 70, 255],
        108..=128 => [0, 200, 60],
        160..=188 => [255, 150, 160],
        235..=249 => [255, 230, 0],
        250..=255 => [255, 30, 30],
        y => [y, y, y],
    }
}

/// BT.601 luma from one RGB pixel
fn luma(px: &[u8]) -> u8 {
    let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
    y.round().clamp(0.0, 255.0) as u8
}

/// BT.601 chroma (Cb, Cr) from one RGB pixel, offset to 0–255
fn chroma(px: &[u8]) -> (u8, u8) {
    let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
    let cb = 128.0 - 0.169 * r - 0.331 * g + 0.5 * b;
    let cr = 128.0 + 0.5 * r - 0.419 * g - 0.081 * b;
    (
        cb.round().clamp(0.0, 255.0) as u8,
        cr.round().clamp(0.0, 255.0) as u8,
    )
}

fn accumulate(out: &mut [u8], add: [u8; 3]) {
    for (o, a) in out.iter_mut().zip(add) {
        *o = o.saturating_add(a);
    }
}
