use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::error::{HighlightError, PolygonError};

/// Pixel coordinate in the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: i32,
    pub y: i32,
}

impl Vertex {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A word's bounding polygon: exactly four ordered vertices.
///
/// Serialized as a plain list of vertices; deserializing a list of any
/// other length fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vertex>", into = "Vec<Vertex>")]
pub struct Quadrilateral {
    vertices: [Vertex; 4],
}

impl Quadrilateral {
    pub fn new(vertices: [Vertex; 4]) -> Self {
        Self { vertices }
    }

    pub fn from_points(points: [(i32, i32); 4]) -> Self {
        Self::new(points.map(|(x, y)| Vertex::new(x, y)))
    }

    /// Axis-aligned rectangle spanning `(x0, y0)` to `(x1, y1)` inclusive
    pub fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self::from_points([(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
    }

    pub fn vertices(&self) -> &[Vertex; 4] {
        &self.vertices
    }

    /// Inclusive bounds as `(min_x, min_y, max_x, max_y)`
    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        let v = &self.vertices;
        let min_x = v.iter().map(|p| p.x).min().unwrap_or(0);
        let min_y = v.iter().map(|p| p.y).min().unwrap_or(0);
        let max_x = v.iter().map(|p| p.x).max().unwrap_or(0);
        let max_y = v.iter().map(|p| p.y).max().unwrap_or(0);
        (min_x, min_y, max_x, max_y)
    }

    /// Twice the signed area (shoelace). Positive for clockwise winding in
    /// image coordinates (y pointing down).
    pub fn doubled_area(&self) -> i128 {
        let v = &self.vertices;
        (0..4)
            .map(|i| {
                let a = v[i];
                let b = v[(i + 1) % 4];
                a.x as i128 * b.y as i128 - b.x as i128 * a.y as i128
            })
            .sum()
    }
}

impl TryFrom<Vec<Vertex>> for Quadrilateral {
    type Error = PolygonError;

    fn try_from(vertices: Vec<Vertex>) -> Result<Self, Self::Error> {
        Self::try_from(vertices.as_slice())
    }
}

impl TryFrom<&[Vertex]> for Quadrilateral {
    type Error = PolygonError;

    fn try_from(vertices: &[Vertex]) -> Result<Self, Self::Error> {
        let vertices: [Vertex; 4] = vertices
            .try_into()
            .map_err(|_| PolygonError::VertexCount(vertices.len()))?;
        Ok(Self::new(vertices))
    }
}

impl From<Quadrilateral> for Vec<Vertex> {
    fn from(quad: Quadrilateral) -> Self {
        quad.vertices.to_vec()
    }
}

/// A detected word: its text and where it sits on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCandidate {
    pub text: String,
    #[serde(rename = "bounding_poly")]
    pub quad: Quadrilateral,
}

impl WordCandidate {
    pub fn new(text: impl Into<String>, quad: Quadrilateral) -> Self {
        Self {
            text: text.into(),
            quad,
        }
    }

    /// Text detectors also report whole lines and blocks; those contain
    /// whitespace and are not words.
    pub fn is_single_word(&self) -> bool {
        !self.text.is_empty() && !self.text.chars().any(char::is_whitespace)
    }
}

/// Pixel counts of a word polygon laid over a highlight mask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Coverage {
    /// Mask pixels inside the polygon
    pub inside: u64,
    /// Of those, pixels that are highlighted
    pub highlighted: u64,
}

impl Coverage {
    pub fn ratio(&self) -> f64 {
        if self.inside == 0 {
            return 0.0;
        }
        self.highlighted as f64 / self.inside as f64
    }

    pub fn is_empty(&self) -> bool {
        self.inside == 0
    }
}

/// Per-word outcome of the overlap test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub word: WordCandidate,
    pub coverage: Coverage,
    pub highlighted: bool,
    /// Set when the word's polygon was rejected; such words are never highlighted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<PolygonError>,
}

/// Binary highlight mask. Every pixel is either [`HighlightMask::ON`] or
/// [`HighlightMask::OFF`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightMask {
    image: GrayImage,
}

impl HighlightMask {
    pub const ON: u8 = 255;
    pub const OFF: u8 = 0;

    /// Caller guarantees the buffer is already binary
    pub(crate) fn from_binary(image: GrayImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn is_highlighted(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] == Self::ON
    }

    pub fn highlighted_count(&self) -> u64 {
        self.image.as_raw().iter().filter(|&&v| v == Self::ON).count() as u64
    }

    /// All-on or all-off. Valid output, but every word gets the same verdict.
    pub fn is_uniform(&self) -> bool {
        let count = self.highlighted_count();
        count == 0 || count == self.image.as_raw().len() as u64
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }
}

impl TryFrom<GrayImage> for HighlightMask {
    type Error = HighlightError;

    fn try_from(image: GrayImage) -> Result<Self, Self::Error> {
        if image.width() == 0 || image.height() == 0 {
            return Err(HighlightError::InvalidMask("mask has zero area".to_string()));
        }
        if let Some(v) = image
            .as_raw()
            .iter()
            .find(|&&v| v != Self::ON && v != Self::OFF)
        {
            return Err(HighlightError::InvalidMask(format!(
                "mask must be binary (0 or 255), found {}",
                v
            )));
        }
        Ok(Self { image })
    }
}
