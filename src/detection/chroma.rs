use image::{GrayImage, RgbImage};
use rayon::prelude::*;

/// Per-pixel colorfulness: `max(R, G, B) - min(R, G, B)`.
///
/// Marker ink scores high, paper and black/gray print score near zero.
pub fn extract_chroma(rgb: &RgbImage) -> GrayImage {
    let (width, height) = rgb.dimensions();
    let mut chroma = GrayImage::new(width, height);

    let samples: &mut [u8] = &mut chroma;
    samples
        .par_iter_mut()
        .zip(rgb.as_raw().par_chunks_exact(3))
        .for_each(|(dst, px)| {
            let max = px[0].max(px[1]).max(px[2]);
            let min = px[0].min(px[1]).min(px[2]);
            *dst = max - min;
        });

    chroma
}
