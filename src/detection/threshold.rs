use image::GrayImage;
use imageproc::stats::histogram;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{HighlightError, Result};
use crate::models::HighlightMask;

/// Result of global Otsu thresholding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdOutcome {
    /// Pixels strictly above this level are highlighted
    pub level: u8,
    pub mask: HighlightMask,
}

/// Otsu's method: the level `t` maximizing between-class variance of the
/// populations `{<= t}` and `{> t}`.
///
/// When consecutive levels tie for the maximum (no pixels between two
/// populated bins), the middle of the first tied run is returned. If no
/// level splits the image into two non-empty classes, the single intensity
/// present is returned.
pub fn otsu_level(image: &GrayImage) -> u8 {
    let hist: [u32; 256] = histogram(image).channels[0];
    let total: u64 = hist.iter().map(|&c| c as u64).sum();
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    // Variance scaled by total², which does not move the maximum
    let mut variances = [None::<f64>; 256];
    let mut weight_bg = 0u64;
    let mut sum_bg = 0.0f64;
    for (t, &count) in hist.iter().enumerate() {
        weight_bg += count as u64;
        sum_bg += t as f64 * count as f64;
        let weight_fg = total - weight_bg;
        if weight_bg == 0 || weight_fg == 0 {
            continue;
        }
        let mean_bg = sum_bg / weight_bg as f64;
        let mean_fg = (sum_total - sum_bg) / weight_fg as f64;
        let diff = mean_bg - mean_fg;
        variances[t] = Some(weight_bg as f64 * weight_fg as f64 * diff * diff);
    }

    let Some(max) = variances.iter().flatten().copied().reduce(f64::max) else {
        return hist.iter().position(|&c| c > 0).unwrap_or(0) as u8;
    };

    let start = variances
        .iter()
        .position(|&v| v == Some(max))
        .unwrap_or(0);
    let run = variances[start..]
        .iter()
        .take_while(|&&v| v == Some(max))
        .count();
    let end = start + run - 1;

    ((start + end) / 2) as u8
}

/// Binarize `image` at `level`: 255 where intensity > level, 0 elsewhere
pub fn apply_level(image: &GrayImage, level: u8) -> HighlightMask {
    let (width, height) = image.dimensions();
    let mut mask = GrayImage::new(width, height);

    let samples: &mut [u8] = &mut mask;
    samples
        .par_iter_mut()
        .zip(image.as_raw().par_iter())
        .for_each(|(dst, &v)| {
            *dst = if v > level {
                HighlightMask::ON
            } else {
                HighlightMask::OFF
            };
        });

    HighlightMask::from_binary(mask)
}

/// Single global Otsu threshold over the whole image
pub fn otsu_threshold(image: &GrayImage) -> Result<ThresholdOutcome> {
    if image.width() == 0 || image.height() == 0 {
        return Err(HighlightError::InvalidImage(
            "cannot threshold an empty image".to_string(),
        ));
    }

    let level = otsu_level(image);
    let mask = apply_level(image, level);
    debug!(
        "Otsu level {} ({} of {} pixels highlighted)",
        level,
        mask.highlighted_count(),
        image.as_raw().len()
    );

    Ok(ThresholdOutcome { level, mask })
}
