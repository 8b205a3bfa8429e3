use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::HighlightConfig;
use crate::error::{PolygonError, Result};
use crate::models::{ClassificationResult, Coverage, HighlightMask, Quadrilateral, Vertex, WordCandidate};

/// z component of `(a - o) x (b - o)`
#[inline]
fn cross(o: Vertex, a: Vertex, b: Vertex) -> i128 {
    // i32 differences need 33 bits, their products 66
    (a.x as i128 - o.x as i128) * (b.y as i128 - o.y as i128)
        - (a.y as i128 - o.y as i128) * (b.x as i128 - o.x as i128)
}

/// Reject quadrilaterals that cannot be filled as convex polygons
pub fn check_convex(quad: &Quadrilateral) -> std::result::Result<(), PolygonError> {
    let v = quad.vertices();
    let turns: Vec<i128> = (0..4)
        .map(|i| cross(v[i], v[(i + 1) % 4], v[(i + 2) % 4]))
        .collect();
    let left = turns.iter().filter(|&&t| t > 0).count();
    let right = turns.iter().filter(|&&t| t < 0).count();

    if left > 0 && right > 0 {
        // A bow-tie turns twice each way, a dart three times one way
        return Err(if left == right {
            PolygonError::SelfIntersecting
        } else {
            PolygonError::NotConvex
        });
    }
    Ok(())
}

/// Count mask pixels inside `quad` (edges inclusive) and how many of them
/// are highlighted.
///
/// Vertices outside the mask are clipped to it. Zero-area quadrilaterals
/// cover nothing.
pub fn measure_coverage(
    mask: &HighlightMask,
    quad: &Quadrilateral,
) -> std::result::Result<Coverage, PolygonError> {
    check_convex(quad)?;

    let area = quad.doubled_area();
    if area == 0 {
        return Ok(Coverage::default());
    }
    let orientation = area.signum();

    let (width, height) = mask.dimensions();
    let (min_x, min_y, max_x, max_y) = quad.bounds();
    let x0 = min_x.max(0) as i64;
    let y0 = min_y.max(0) as i64;
    let x1 = (max_x as i64).min(width as i64 - 1);
    let y1 = (max_y as i64).min(height as i64 - 1);
    if x0 > x1 || y0 > y1 {
        return Ok(Coverage::default());
    }

    let v = quad.vertices();
    let mut coverage = Coverage::default();
    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = Vertex::new(x as i32, y as i32);
            let inside = (0..4).all(|i| cross(v[i], v[(i + 1) % 4], p) * orientation >= 0);
            if inside {
                coverage.inside += 1;
                if mask.is_highlighted(x as u32, y as u32) {
                    coverage.highlighted += 1;
                }
            }
        }
    }

    Ok(coverage)
}

/// Decides per word whether it sits on a highlight
#[derive(Debug, Clone)]
pub struct WordClassifier {
    config: HighlightConfig,
}

impl WordClassifier {
    pub fn new(config: HighlightConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// Strictly greater than the ratio threshold; empty coverage never qualifies
    pub fn is_highlighted(&self, coverage: &Coverage) -> bool {
        !coverage.is_empty() && coverage.ratio() > self.config.ratio_threshold
    }

    /// Classify one word. A rejected polygon is reported on the result and
    /// counts as not highlighted.
    pub fn classify(&self, mask: &HighlightMask, word: &WordCandidate) -> ClassificationResult {
        match measure_coverage(mask, &word.quad) {
            Ok(coverage) => {
                let highlighted = self.is_highlighted(&coverage);
                debug!(
                    "Word '{}': {}/{} pixels highlighted ({:.2}) -> {}",
                    word.text,
                    coverage.highlighted,
                    coverage.inside,
                    coverage.ratio(),
                    highlighted
                );
                ClassificationResult {
                    word: word.clone(),
                    coverage,
                    highlighted,
                    rejected: None,
                }
            }
            Err(e) => {
                warn!("Word '{}' skipped: {}", word.text, e);
                ClassificationResult {
                    word: word.clone(),
                    coverage: Coverage::default(),
                    highlighted: false,
                    rejected: Some(e),
                }
            }
        }
    }

    /// Classify every word independently, in input order
    pub fn classify_all(
        &self,
        mask: &HighlightMask,
        words: &[WordCandidate],
    ) -> Vec<ClassificationResult> {
        words.par_iter().map(|word| self.classify(mask, word)).collect()
    }

    /// The subset of `words` judged highlighted, in input order
    pub fn highlighted_words(
        &self,
        mask: &HighlightMask,
        words: &[WordCandidate],
    ) -> Vec<WordCandidate> {
        self.classify_all(mask, words)
            .into_iter()
            .filter(|r| r.highlighted)
            .map(|r| r.word)
            .collect()
    }
}
