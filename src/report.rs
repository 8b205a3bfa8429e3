use anyhow::Context;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use std::path::{Path, PathBuf};

use crate::models::WordCandidate;

pub const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Words in reading order, each followed by a single space
pub fn highlighted_text(words: &[WordCandidate]) -> String {
    words.iter().map(|w| format!("{} ", w.text)).collect()
}

/// `<image path>.txt`, next to the image
pub fn text_output_path(image_path: &Path) -> PathBuf {
    let mut name = image_path.as_os_str().to_owned();
    name.push(".txt");
    PathBuf::from(name)
}

/// `<stem>.highlighted.png`, next to the image
pub fn annotation_output_path(image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    image_path.with_file_name(format!("{}.highlighted.png", stem))
}

pub fn dump_text(words: &[WordCandidate], path: &Path) -> anyhow::Result<()> {
    std::fs::write(path, highlighted_text(words))
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Copy of `image` with every word polygon outlined
pub fn annotate(image: &RgbImage, words: &[WordCandidate], color: Rgb<u8>) -> RgbImage {
    let mut canvas = image.clone();
    for word in words {
        let v = word.quad.vertices();
        for i in 0..4 {
            let a = v[i];
            let b = v[(i + 1) % 4];
            draw_line_segment_mut(
                &mut canvas,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                color,
            );
        }
    }
    canvas
}
