mod common;

use common::*;
use highlight_words::detection::build_standard_pipeline;
use highlight_words::detection::ocr::load_words;
use highlight_words::detection::steps::{ChromaStep, EqualizeStep, OtsuThresholdStep};
use highlight_words::{MetadataValue, Pipeline};
use image::DynamicImage;
use std::sync::Arc;

fn page_words() -> Vec<WordCandidate> {
    vec![
        rect_word("inside", 11, 0, 23, 7),
        rect_word("paper", 28, 0, 38, 7),
        rect_word("mostly", 20, 8, 30, 15),
        rect_word("outside", 100, 100, 120, 110),
    ]
}

fn texts(words: &[WordCandidate]) -> Vec<&str> {
    words.iter().map(|w| w.text.as_str()).collect()
}

#[test]
fn test_executor_returns_highlighted_words_in_order() -> anyhow::Result<()> {
    let img = DynamicImage::ImageRgb8(highlighted_page(40, 16, 10, 25));
    let pipeline = build_standard_pipeline(page_words(), HighlightConfig::default(), false)?;

    let results = pipeline.run_with_executor(img)?;
    let words: Vec<WordCandidate> = results.iter().filter_map(|d| d.word.clone()).collect();
    assert_eq!(texts(&words), vec!["inside", "mostly"]);
    Ok(())
}

#[test]
fn test_sequential_run_matches_executor() -> anyhow::Result<()> {
    let img = DynamicImage::ImageRgb8(highlighted_page(40, 16, 10, 25));
    let pipeline = build_standard_pipeline(page_words(), HighlightConfig::default(), true)?;

    let sequential: Vec<WordCandidate> = pipeline.run(img.clone())?.into_iter().filter_map(|d| d.word).collect();
    let queued: Vec<WordCandidate> = pipeline.run_with_executor(img)?.into_iter().filter_map(|d| d.word).collect();
    assert_eq!(sequential, queued);
    Ok(())
}

#[test]
fn test_word_items_carry_metadata() -> anyhow::Result<()> {
    let img = DynamicImage::ImageRgb8(yellow_gray_4x4());
    let words = vec![rect_word("left", 0, 0, 1, 3)];
    let pipeline = build_standard_pipeline(words, HighlightConfig::default(), false)?;

    let results = pipeline.run_with_executor(img)?;
    assert_eq!(results.len(), 1);

    let item = &results[0];
    assert_eq!(item.get_string("word_text"), Some("left"));
    assert_eq!(item.get_float("coverage_ratio"), Some(1.0));
    assert_eq!(item.get_int("covered_pixels"), Some(8));
    assert_eq!(item.get_bool("highlighted"), Some(true));
    assert!(item.get_int("otsu_level").is_some());

    let bbox = item.bbox.as_ref().expect("word items have a bbox");
    assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (0, 0, 2, 4));
    Ok(())
}

#[test]
fn test_mask_steps_match_detector() -> anyhow::Result<()> {
    let page = highlighted_page(40, 16, 10, 25);
    let pipeline = Pipeline::new()
        .add_step(Arc::new(EqualizeStep))
        .add_step(Arc::new(ChromaStep))
        .add_step(Arc::new(OtsuThresholdStep));

    let results = pipeline.run(DynamicImage::ImageRgb8(page.clone()))?;
    assert_eq!(results.len(), 1);

    let mask = HighlightDetector::new().detect(&page)?;
    assert_eq!(&results[0].image.to_luma8(), mask.as_image());
    assert_eq!(
        results[0].metadata.get("mask_pixels"),
        Some(&MetadataValue::Int(mask.highlighted_count() as i64))
    );
    Ok(())
}

#[test]
fn test_debug_output_is_written_per_step() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let debug_dir = dir.path().join("debug");
    let words = vec![rect_word("left", 0, 0, 1, 3), rect_word("right", 2, 0, 3, 3)];
    let pipeline = build_standard_pipeline(words, HighlightConfig::default(), false)?
        .with_debug(debug_dir.clone())?;

    pipeline.run_with_executor(DynamicImage::ImageRgb8(yellow_gray_4x4()))?;

    for file in [
        "00_input/01.png",
        "01_histogram_equalization/01.png",
        "02_chroma_extraction/01-01.png",
        "03_otsu_threshold/01-01-01.png",
        "04_word_classification/01-01-01-01.png",
        "04_word_classification/01-01-01-02.png",
        "05_highlight_filtering/01-01-01-01-01.png",
    ] {
        assert!(debug_dir.join(file).exists(), "missing {}", file);
    }
    assert!(!debug_dir.join("05_highlight_filtering/01-01-01-02-01.png").exists());
    Ok(())
}

#[test]
fn test_debug_directory_must_be_empty() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("leftover.txt"), "x")?;

    assert!(Pipeline::new().with_debug(dir.path().to_path_buf()).is_err());
    Ok(())
}

#[test]
fn test_invalid_config_fails_to_build() {
    let config = HighlightConfig::new().with_ratio_threshold(0.0);
    assert!(build_standard_pipeline(Vec::new(), config, false).is_err());
}

#[test]
fn test_standard_pipeline_step_order() -> anyhow::Result<()> {
    let pipeline = build_standard_pipeline(Vec::new(), HighlightConfig::default(), false)?;
    assert_eq!(
        pipeline.step_names(),
        vec![
            "Histogram Equalization",
            "Chroma Extraction",
            "Otsu Threshold",
            "Word Classification",
            "Highlight Filtering",
        ]
    );
    Ok(())
}

#[test]
fn test_word_list_with_extreme_corners_is_classified() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("words.json");
    std::fs::write(
        &path,
        r#"[{"text": "everywhere", "bounding_poly": [
            {"x": -2000000000, "y": -2000000000}, {"x": 2000000000, "y": -2000000000},
            {"x": 2000000000, "y": 2000000000}, {"x": -2000000000, "y": 2000000000}]}]"#,
    )?;
    let words = load_words(&path)?;

    let img = DynamicImage::ImageRgb8(yellow_gray_4x4());
    let pipeline = build_standard_pipeline(words, HighlightConfig::default(), false)?;
    let results = pipeline.run_with_executor(img)?;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].get_string("word_text"), Some("everywhere"));
    assert_eq!(results[0].get_int("covered_pixels"), Some(16));
    assert_eq!(results[0].get_bool("highlighted"), Some(true));
    Ok(())
}
