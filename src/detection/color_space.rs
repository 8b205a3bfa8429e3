//! RGB <-> YCrCb (ITU-R BT.601, 8-bit) conversion.

use image::{GrayImage, RgbImage};
use rayon::prelude::*;

/// An image in YCrCb space. Channel order per pixel is `[Y, Cr, Cb]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaChromaImage {
    buffer: RgbImage,
}

impl LumaChromaImage {
    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// `[Y, Cr, Cb]` at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    pub fn as_raw(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// The Y plane as a grayscale image
    pub fn luma(&self) -> GrayImage {
        let (width, height) = self.dimensions();
        GrayImage::from_fn(width, height, |x, y| image::Luma([self.buffer.get_pixel(x, y)[0]]))
    }

    /// Copy with every Y value passed through `lut`; Cr and Cb untouched
    pub fn map_luma(&self, lut: &[u8; 256]) -> Self {
        let mut buffer = self.buffer.clone();
        buffer.par_chunks_exact_mut(3).for_each(|px| {
            px[0] = lut[px[0] as usize];
        });
        Self { buffer }
    }
}

#[inline]
fn saturate(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

pub fn to_luma_chroma(rgb: &RgbImage) -> LumaChromaImage {
    let (width, height) = rgb.dimensions();
    let mut buffer = RgbImage::new(width, height);

    buffer
        .par_chunks_exact_mut(3)
        .zip(rgb.as_raw().par_chunks_exact(3))
        .for_each(|(dst, src)| {
            let (r, g, b) = (src[0] as f32, src[1] as f32, src[2] as f32);
            let y = 0.299 * r + 0.587 * g + 0.114 * b;
            dst[0] = saturate(y);
            dst[1] = saturate((r - y) * 0.713 + 128.0);
            dst[2] = saturate((b - y) * 0.564 + 128.0);
        });

    LumaChromaImage { buffer }
}

/// Inverse of [`to_luma_chroma`], up to rounding
pub fn to_rgb(ycrcb: &LumaChromaImage) -> RgbImage {
    let (width, height) = ycrcb.dimensions();
    let mut rgb = RgbImage::new(width, height);

    rgb.par_chunks_exact_mut(3)
        .zip(ycrcb.as_raw().par_chunks_exact(3))
        .for_each(|(dst, src)| {
            let y = src[0] as f32;
            let cr = src[1] as f32 - 128.0;
            let cb = src[2] as f32 - 128.0;
            dst[0] = saturate(y + 1.403 * cr);
            dst[1] = saturate(y - 0.714 * cr - 0.344 * cb);
            dst[2] = saturate(y + 1.773 * cb);
        });

    rgb
}
