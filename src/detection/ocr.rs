use anyhow::Context;
use image::RgbImage;
pub use ocrs::{ImageSource, OcrEngine};  // Re-export for use in other modules
use ocrs::{OcrEngineParams, TextItem};
use rten::Model;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::{Quadrilateral, Vertex, WordCandidate};

/// Directory holding `text-detection.rten` and `text-recognition.rten`
pub fn model_cache_dir() -> anyhow::Result<PathBuf> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Neither HOME nor USERPROFILE is set")?;
    Ok(Path::new(&home_dir).join(".cache/ocrs"))
}

/// Initialize OCR engine with models from standard cache location
pub fn init_ocr_engine() -> anyhow::Result<OcrEngine> {
    let cache_dir = model_cache_dir()?;
    let detection_model_path = cache_dir.join("text-detection.rten");
    let recognition_model_path = cache_dir.join("text-recognition.rten");

    if !detection_model_path.exists() || !recognition_model_path.exists() {
        anyhow::bail!(
            "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
             Expected locations:\n  - {}\n  - {}\n\
             Alternatively pass a word list with --words",
            detection_model_path.display(),
            recognition_model_path.display()
        );
    }

    let detection_model = Model::load_file(&detection_model_path)?;
    let recognition_model = Model::load_file(&recognition_model_path)?;

    let engine = OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })?;

    info!("OCR engine initialized from {}", cache_dir.display());
    Ok(engine)
}

/// Detect and recognize every word on the page.
///
/// Each word's rotated bounding rect becomes its quadrilateral, so skewed
/// scans keep tight polygons.
pub fn detect_words(engine: &OcrEngine, img: &RgbImage) -> anyhow::Result<Vec<WordCandidate>> {
    let img_source = ImageSource::from_bytes(img.as_raw(), img.dimensions())
        .map_err(|e| anyhow::anyhow!("Invalid OCR input image: {:?}", e))?;
    let ocr_input = engine.prepare_input(img_source)?;

    let word_rects = engine.detect_words(&ocr_input)?;
    let line_rects = engine.find_text_lines(&ocr_input, &word_rects);
    let lines = engine.recognize_text(&ocr_input, &line_rects)?;

    let words: Vec<WordCandidate> = lines
        .iter()
        .flatten()
        .flat_map(|line| line.words())
        .filter_map(|word| {
            let text = word.to_string().trim().to_string();
            if text.is_empty() {
                return None;
            }
            let corners = word
                .rotated_rect()
                .corners()
                .map(|p| Vertex::new(p.x.round() as i32, p.y.round() as i32));
            Some(WordCandidate::new(text, Quadrilateral::new(corners)))
        })
        .collect();

    debug!(
        "OCR found {} word regions, recognized {} words",
        word_rects.len(),
        words.len()
    );
    Ok(words)
}

/// Load words from a JSON list of `{ "text", "bounding_poly" }` entries
pub fn load_words(path: &Path) -> anyhow::Result<Vec<WordCandidate>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read word list {}", path.display()))?;
    let words: Vec<WordCandidate> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse word list {}", path.display()))?;
    Ok(words)
}

/// Keep single words, dropping line/block annotations that contain spaces
pub fn select_single_words(words: Vec<WordCandidate>) -> Vec<WordCandidate> {
    let total = words.len();
    let selected: Vec<WordCandidate> = words.into_iter().filter(|w| w.is_single_word()).collect();
    if selected.len() != total {
        debug!("Dropped {} multi-word annotations", total - selected.len());
    }
    selected
}
