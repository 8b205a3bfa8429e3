#![allow(dead_code)]

use highlight_words::{HighlightMask, Quadrilateral, WordCandidate};
use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

/// Color constants for tests
pub const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);
pub const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
pub const PAPER: Rgb<u8> = Rgb([235, 235, 230]);
pub const INK: Rgb<u8> = Rgb([30, 30, 30]);

/// 4x4 image: left two columns bright yellow, right two columns neutral gray
pub fn yellow_gray_4x4() -> RgbImage {
    ImageBuffer::from_fn(4, 4, |x, _| if x < 2 { YELLOW } else { GRAY })
}

/// Grayscale image with the left half at `left` and the right half at `right`
pub fn two_level_gray(width: u32, height: u32, left: u8, right: u8) -> GrayImage {
    ImageBuffer::from_fn(width, height, |x, _| {
        if x < width / 2 { Luma([left]) } else { Luma([right]) }
    })
}

/// A page of paper with a dark "text" row and a yellow marker band over
/// columns `band_x0..band_x1`
pub fn highlighted_page(width: u32, height: u32, band_x0: u32, band_x1: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        let in_band = x >= band_x0 && x < band_x1;
        let ink_row = y % 8 == 4;
        match (in_band, ink_row) {
            (_, true) if x % 3 == 0 => INK,
            (true, _) => YELLOW,
            (false, _) => PAPER,
        }
    })
}

/// Mask that is highlighted exactly where `on(x, y)` holds
pub fn mask_from_fn(width: u32, height: u32, on: impl Fn(u32, u32) -> bool) -> HighlightMask {
    let image = GrayImage::from_fn(width, height, |x, y| {
        Luma([if on(x, y) { HighlightMask::ON } else { HighlightMask::OFF }])
    });
    HighlightMask::try_from(image).expect("fixture mask is binary")
}

pub fn uniform_mask(width: u32, height: u32, on: bool) -> HighlightMask {
    mask_from_fn(width, height, |_, _| on)
}

pub fn rect_word(text: &str, x0: i32, y0: i32, x1: i32, y1: i32) -> WordCandidate {
    WordCandidate::new(text, Quadrilateral::rect(x0, y0, x1, y1))
}
