pub mod color_space;
pub mod equalize;
pub mod chroma;
pub mod threshold;
pub mod classify;
pub mod ocr;
pub mod steps;

use image::{DynamicImage, GrayImage, RgbImage};
use tracing::debug;

use crate::config::HighlightConfig;
use crate::error::{HighlightError, Result};
use crate::models::{HighlightMask, WordCandidate};
use crate::pipeline::Pipeline;

/// Every intermediate image of one detection run
#[derive(Debug, Clone)]
pub struct DetectionStages {
    pub equalized: RgbImage,
    pub chroma: GrayImage,
    pub level: u8,
    pub mask: HighlightMask,
}

/// Turns a page image into a highlight mask:
/// equalize luma, extract chroma, Otsu threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightDetector;

impl HighlightDetector {
    pub fn new() -> Self {
        Self
    }

    /// Run the full detection on an RGB image
    pub fn detect(&self, rgb: &RgbImage) -> Result<HighlightMask> {
        Ok(self.detect_stages(rgb)?.mask)
    }

    /// Same as [`detect`](Self::detect) for a decoded image of unknown
    /// layout. Only 3-channel images are accepted.
    pub fn detect_dynamic(&self, img: &DynamicImage) -> Result<HighlightMask> {
        let rgb = ensure_rgb(img)?;
        self.detect(&rgb)
    }

    /// Run detection and keep every intermediate image
    pub fn detect_stages(&self, rgb: &RgbImage) -> Result<DetectionStages> {
        validate_image(rgb)?;

        debug!("Equalizing luma histogram...");
        let equalized = equalize::equalize_rgb(rgb);

        debug!("Extracting chroma...");
        let chroma = chroma::extract_chroma(&equalized);

        debug!("Applying Otsu threshold...");
        let outcome = threshold::otsu_threshold(&chroma)?;

        ensure_same_dimensions(rgb.dimensions(), outcome.mask.dimensions())?;

        Ok(DetectionStages {
            equalized,
            chroma,
            level: outcome.level,
            mask: outcome.mask,
        })
    }
}

/// Reject images with no pixels
pub fn validate_image(rgb: &RgbImage) -> Result<()> {
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(HighlightError::InvalidImage(format!(
            "image has zero area ({}x{})",
            width, height
        )));
    }
    Ok(())
}

/// Accept 3-channel images only, converting sample depth to 8 bits
pub fn ensure_rgb(img: &DynamicImage) -> Result<RgbImage> {
    let channels = img.color().channel_count();
    if channels != 3 {
        return Err(HighlightError::InvalidImage(format!(
            "expected 3 color channels, got {}",
            channels
        )));
    }
    let rgb = img.to_rgb8();
    validate_image(&rgb)?;
    Ok(rgb)
}

pub fn ensure_same_dimensions(expected: (u32, u32), actual: (u32, u32)) -> Result<()> {
    if expected != actual {
        return Err(HighlightError::DimensionMismatch {
            expected_width: expected.0,
            expected_height: expected.1,
            width: actual.0,
            height: actual.1,
        });
    }
    Ok(())
}

/// Build the standard step pipeline: detection stages, then word
/// classification, keeping only highlighted words.
pub fn build_standard_pipeline(
    words: Vec<WordCandidate>,
    config: HighlightConfig,
    verbose: bool,
) -> Result<Pipeline> {
    use crate::detection::steps::*;
    use crate::detection::classify::WordClassifier;
    use std::sync::Arc;

    let classifier = WordClassifier::new(config)?;

    Ok(Pipeline::new()
        .with_verbose(verbose)
        .add_step(Arc::new(EqualizeStep))
        .add_step(Arc::new(ChromaStep))
        .add_step(Arc::new(OtsuThresholdStep))
        .add_step(Arc::new(WordClassificationStep::new(classifier, words)))
        .add_step(Arc::new(HighlightFilterStep)))
}
