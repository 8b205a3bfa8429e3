use highlight_words::{HighlightConfig, HighlightDetector, WordCandidate, WordClassifier, Quadrilateral};
use image::{Rgb, RgbImage};

fn main() -> anyhow::Result<()> {
    let mut img = RgbImage::from_pixel(320, 120, Rgb([238, 236, 230]));

    // Yellow marker stroke over the middle of the second line
    for y in 44..76 {
        for x in 90..230 {
            img.put_pixel(x, y, Rgb([250, 235, 60]));
        }
    }

    // Dark "glyphs" on three lines of text
    for line in 0..3u32 {
        let y0 = 12 + line * 40;
        for x in (10..310).step_by(7) {
            for y in y0..y0 + 16 {
                img.put_pixel(x, y, Rgb([25, 25, 30]));
            }
        }
    }

    let words: Vec<WordCandidate> = (0..3)
        .flat_map(|line| {
            let y0 = 10 + line * 40;
            (0..5).map(move |i| {
                let x0 = 10 + i * 62;
                WordCandidate::new(
                    format!("w{}{}", line + 1, i + 1),
                    Quadrilateral::rect(x0, y0, x0 + 50, y0 + 20),
                )
            })
        })
        .collect();

    let mask = HighlightDetector::new().detect(&img)?;
    let classifier = WordClassifier::new(HighlightConfig::default())?;

    println!("Mask: {} of {} pixels highlighted", mask.highlighted_count(), 320 * 120);
    for result in classifier.classify_all(&mask, &words) {
        println!(
            "  {} coverage={:.2} highlighted={}",
            result.word.text,
            result.coverage.ratio(),
            result.highlighted
        );
    }

    Ok(())
}
