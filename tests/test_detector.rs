mod common;

use common::*;
use image::{DynamicImage, GrayImage, ImageBuffer, Rgb, RgbImage, RgbaImage};

#[test]
fn test_yellow_half_is_detected_and_classified() -> anyhow::Result<()> {
    let img = yellow_gray_4x4();
    let mask = HighlightDetector::new().detect(&img)?;

    for y in 0..4 {
        for x in 0..4 {
            assert_eq!(mask.is_highlighted(x, y), x < 2, "pixel ({}, {})", x, y);
        }
    }

    let classifier = WordClassifier::new(HighlightConfig::default())?;
    let left = rect_word("left", 0, 0, 1, 3);
    let right = rect_word("right", 2, 0, 3, 3);
    assert!(classifier.classify(&mask, &left).highlighted);
    assert!(!classifier.classify(&mask, &right).highlighted);
    Ok(())
}

#[test]
fn test_detection_stages_are_exposed() -> anyhow::Result<()> {
    let stages = HighlightDetector::new().detect_stages(&yellow_gray_4x4())?;

    assert_eq!(stages.equalized.dimensions(), (4, 4));
    // gray drops to black, yellow keeps its color
    assert_eq!(stages.chroma.get_pixel(3, 0)[0], 0);
    assert!(stages.chroma.get_pixel(0, 0)[0] > 200);
    assert!(stages.chroma.get_pixel(0, 0)[0] > stages.level);
    Ok(())
}

#[test]
fn test_mask_matches_input_dimensions() -> anyhow::Result<()> {
    let detector = HighlightDetector::new();
    for (w, h) in [(1, 1), (7, 3), (3, 7), (40, 16)] {
        let img = highlighted_page(w, h, w / 4, w / 2);
        assert_eq!(detector.detect(&img)?.dimensions(), (w, h));
    }
    Ok(())
}

#[test]
fn test_detection_is_idempotent() -> anyhow::Result<()> {
    let img = highlighted_page(40, 16, 10, 25);
    let detector = HighlightDetector::new();

    let first = detector.detect(&img)?;
    let second = detector.detect(&img)?;
    assert_eq!(first.as_image().as_raw(), second.as_image().as_raw());
    Ok(())
}

#[test]
fn test_marker_band_on_a_page() -> anyhow::Result<()> {
    let img = highlighted_page(40, 16, 10, 25);
    let mask = HighlightDetector::new().detect(&img)?;
    let classifier = WordClassifier::new(HighlightConfig::default())?;

    let inside = rect_word("inside", 11, 0, 23, 7);
    let paper = rect_word("paper", 28, 0, 38, 7);
    let mostly = rect_word("mostly", 20, 8, 30, 15);
    let barely = rect_word("barely", 23, 8, 33, 15);

    let results = classifier.classify_all(&mask, &[inside, paper, mostly, barely]);
    let verdicts: Vec<bool> = results.iter().map(|r| r.highlighted).collect();
    assert_eq!(verdicts, vec![true, false, true, false]);
    Ok(())
}

#[test]
fn test_grayscale_page_gives_no_highlights() -> anyhow::Result<()> {
    let img: RgbImage = ImageBuffer::from_fn(12, 12, |x, y| {
        if (x + y) % 5 == 0 { INK } else { Rgb([240, 240, 240]) }
    });
    let mask = HighlightDetector::new().detect(&img)?;
    assert_eq!(mask.highlighted_count(), 0);
    Ok(())
}

#[test]
fn test_empty_image_fails_fast() {
    let img = RgbImage::new(0, 5);
    assert!(matches!(
        HighlightDetector::new().detect(&img),
        Err(HighlightError::InvalidImage(_))
    ));
}

#[test]
fn test_dynamic_image_needs_three_channels() -> anyhow::Result<()> {
    let detector = HighlightDetector::new();

    let gray = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
    assert!(matches!(detector.detect_dynamic(&gray), Err(HighlightError::InvalidImage(_))));

    let rgba = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
    assert!(matches!(detector.detect_dynamic(&rgba), Err(HighlightError::InvalidImage(_))));

    let rgb = DynamicImage::ImageRgb8(yellow_gray_4x4());
    assert_eq!(detector.detect_dynamic(&rgb)?, detector.detect(&yellow_gray_4x4())?);
    Ok(())
}
