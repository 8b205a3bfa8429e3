use image::RgbImage;
use imageproc::stats::histogram;
use tracing::debug;

use super::color_space::{self, LumaChromaImage};

/// Lookup table spreading a 256-bin histogram over the full [0, 255] range.
///
/// `lut[v] = round((cdf[v] - cdf_min) * 255 / (n - cdf_min))`, where `cdf_min`
/// is the count of the darkest populated bin. A single populated bin yields
/// the identity table.
pub fn equalization_lut(hist: &[u32; 256]) -> [u8; 256] {
    let mut lut = [0u8; 256];
    let total: u64 = hist.iter().map(|&c| c as u64).sum();

    let Some(first) = hist.iter().position(|&c| c > 0) else {
        return identity_lut();
    };
    let cdf_min = hist[first] as u64;
    if cdf_min == total {
        return identity_lut();
    }

    let scale = 255.0 / (total - cdf_min) as f64;
    let mut cdf = 0u64;
    for (v, &count) in hist.iter().enumerate() {
        cdf += count as u64;
        if v >= first {
            lut[v] = ((cdf - cdf_min) as f64 * scale).round().min(255.0) as u8;
        }
    }
    lut
}

fn identity_lut() -> [u8; 256] {
    std::array::from_fn(|v| v as u8)
}

/// Histogram-equalize the Y channel; Cr/Cb pass through unchanged
pub fn equalize_luma(image: &LumaChromaImage) -> LumaChromaImage {
    let hist = histogram(&image.luma());
    let lut = equalization_lut(&hist.channels[0]);
    debug!(
        "Equalizing luma ({} populated bins)",
        hist.channels[0].iter().filter(|&&c| c > 0).count()
    );
    image.map_luma(&lut)
}

/// RGB -> YCrCb -> equalized Y -> RGB
pub fn equalize_rgb(rgb: &RgbImage) -> RgbImage {
    let ycrcb = color_space::to_luma_chroma(rgb);
    let equalized = equalize_luma(&ycrcb);
    color_space::to_rgb(&equalized)
}
