//! Pixel layout conversion
//!
//! UYVY 4:2:2 to packed RGB888 using BT.601 coefficients. The converter
//! keeps one scratch buffer and reuses it across frames; at steady state no
//! allocation happens per frame.

use crate::error::{CameraError, Result};

/// UYVY422 to RGB888 converter with a persistent scratch buffer
#[derive(Debug, Default)]
pub struct UyvyConverter {
    scratch: Vec<u8>,
}

impl UyvyConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert one UYVY frame; the returned slice borrows the scratch buffer
    /// and is valid until the next call
    ///
    /// # Errors
    ///
    /// [`CameraError::Stream`] when the buffer size disagrees with the
    /// dimensions or the width is odd (UYVY pairs pixels per macropixel).
    pub fn convert(&mut self, data: &[u8], width: u32, height: u32) -> Result<&[u8]> {
        if width % 2 != 0 {
            return Err(CameraError::stream(format!(
                "UYVY frame width {width} is not even"
            )));
        }
        let expected = width as usize * height as usize * 2;
        if data.len() != expected {
            return Err(CameraError::stream(format!(
                "UYVY buffer is {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }

        let out_len = width as usize * height as usize * 3;
        self.scratch.resize(out_len, 0);

        // One macropixel (U Y0 V Y1) yields two RGB pixels
        for (mp, out) in data.chunks_exact(4).zip(self.scratch.chunks_exact_mut(6)) {
            let u = mp[0] as f32 - 128.0;
            let y0 = mp[1] as f32;
            let v = mp[2] as f32 - 128.0;
            let y1 = mp[3] as f32;

            let (r0, g0, b0) = yuv_to_rgb(y0, u, v);
            let (r1, g1, b1) = yuv_to_rgb(y1, u, v);
            out[0] = r0;
            out[1] = g0;
            out[2] = b0;
            out[3] = r1;
            out[4] = g1;
            out[5] = b1;
        }

        Ok(&self.scratch)
    }
}

/// BT.601 YUV to RGB for one pixel
#[inline]
fn yuv_to_rgb(y: f32, u: f32, v: f32) -> (u8, u8, u8) {
    let r = y + 1.402 * v;
    let g = y - 0.344 * u - 0.714 * v;
    let b = y + 1.772 * u;
    (clamp_u8(r), clamp_u8(g), clamp_u8(b))
}

#[inline]
fn clamp_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
