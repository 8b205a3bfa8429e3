use crate::pipeline::{PipelineData, PipelineStep, PipelineContext, BoundingBox, MetadataValue};
use crate::detection::{chroma, equalize, threshold, ensure_same_dimensions};
use crate::detection::classify::WordClassifier;
use crate::models::{HighlightMask, WordCandidate};
use anyhow::Result;
use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

/// Equalize the luma histogram of the page
pub struct EqualizeStep;

impl PipelineStep for EqualizeStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::with_capacity(data.len());
        for item in data {
            let equalized = equalize::equalize_rgb(&item.image.to_rgb8());
            result.push(item.with_image(DynamicImage::ImageRgb8(equalized)));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Histogram Equalization"
    }
}

/// Replace the page with its chroma map
pub struct ChromaStep;

impl PipelineStep for ChromaStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::with_capacity(data.len());
        for item in data {
            let chroma = chroma::extract_chroma(&item.image.to_rgb8());
            result.push(item.with_image(DynamicImage::ImageLuma8(chroma)));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Chroma Extraction"
    }
}

/// Binarize the chroma map with a global Otsu threshold
pub struct OtsuThresholdStep;

impl PipelineStep for OtsuThresholdStep {
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::with_capacity(data.len());
        for item in data {
            let outcome = threshold::otsu_threshold(&item.image.to_luma8())?;
            ensure_same_dimensions(item.original.dimensions(), outcome.mask.dimensions())?;

            if context.verbose {
                info!("Otsu level: {}", outcome.level);
            }
            if outcome.mask.is_uniform() {
                debug!("Highlight mask is uniform, every word gets the same verdict");
            }

            let highlighted = outcome.mask.highlighted_count() as i64;
            let new_item = item
                .with_image(DynamicImage::ImageLuma8(outcome.mask.into_image()))
                .with_metadata("otsu_level", MetadataValue::Int(outcome.level as i64))
                .with_metadata("mask_pixels", MetadataValue::Int(highlighted));
            result.push(new_item);
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Otsu Threshold"
    }
}

/// Split the page mask into one item per word, recording its coverage.
/// Words lying entirely outside the page are dropped.
pub struct WordClassificationStep {
    classifier: WordClassifier,
    words: Vec<WordCandidate>,
}

impl WordClassificationStep {
    pub fn new(classifier: WordClassifier, words: Vec<WordCandidate>) -> Self {
        Self { classifier, words }
    }
}

/// Word bounds clamped to the image, None when nothing is left
fn clamped_bbox(word: &WordCandidate, width: u32, height: u32) -> Option<BoundingBox> {
    let (min_x, min_y, max_x, max_y) = word.quad.bounds();
    let x0 = min_x.max(0) as i64;
    let y0 = min_y.max(0) as i64;
    let x1 = (max_x as i64).min(width as i64 - 1);
    let y1 = (max_y as i64).min(height as i64 - 1);
    if x0 > x1 || y0 > y1 {
        return None;
    }
    Some(BoundingBox {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0 + 1) as u32,
        height: (y1 - y0 + 1) as u32,
    })
}

impl PipelineStep for WordClassificationStep {
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let mask = HighlightMask::try_from(item.image.to_luma8())?;
            let (width, height) = mask.dimensions();
            let classified = self.classifier.classify_all(&mask, &self.words);

            if context.verbose {
                let count = classified.iter().filter(|c| c.highlighted).count();
                info!("{} of {} words highlighted", count, classified.len());
            }

            for outcome in classified {
                let Some(bbox) = clamped_bbox(&outcome.word, width, height) else {
                    debug!("Word '{}' lies outside the image", outcome.word.text);
                    continue;
                };

                let crop = DynamicImage::ImageLuma8(
                    image::imageops::crop_imm(mask.as_image(), bbox.x, bbox.y, bbox.width, bbox.height)
                        .to_image(),
                );

                let mut word_data = PipelineData::from_word(crop, item.original.clone(), bbox, outcome.word.clone());
                word_data.metadata = item.metadata.clone();
                word_data.metadata.insert("word_text".to_string(), MetadataValue::String(outcome.word.text.clone()));
                word_data.metadata.insert("covered_pixels".to_string(), MetadataValue::Int(outcome.coverage.inside as i64));
                word_data.metadata.insert("highlighted_pixels".to_string(), MetadataValue::Int(outcome.coverage.highlighted as i64));
                word_data.metadata.insert("coverage_ratio".to_string(), MetadataValue::Float(outcome.coverage.ratio()));
                word_data.metadata.insert("highlighted".to_string(), MetadataValue::Bool(outcome.highlighted));
                if let Some(rejected) = &outcome.rejected {
                    word_data.metadata.insert("rejected".to_string(), MetadataValue::String(rejected.to_string()));
                }

                result.push(word_data);
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Word Classification"
    }
}

/// Keep only words classified as highlighted
pub struct HighlightFilterStep;

impl PipelineStep for HighlightFilterStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        Ok(data
            .into_iter()
            .filter(|item| item.get_bool("highlighted").unwrap_or(false))
            .collect())
    }

    fn name(&self) -> &str {
        "Highlight Filtering"
    }
}
