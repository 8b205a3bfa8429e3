use serde::Serialize;
use thiserror::Error;

/// Image-level failures. These abort processing of the image they occur on.
#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid mask: {0}")]
    InvalidMask(String),

    #[error("Dimension mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Word-level failures. Isolated per word, never abort a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum PolygonError {
    #[error("Quadrilateral needs exactly 4 vertices, got {0}")]
    VertexCount(usize),

    #[error("Quadrilateral is not convex")]
    NotConvex,

    #[error("Quadrilateral is self-intersecting")]
    SelfIntersecting,
}

pub type Result<T> = std::result::Result<T, HighlightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message() {
        let error = HighlightError::DimensionMismatch {
            expected_width: 4,
            expected_height: 3,
            width: 2,
            height: 3,
        };
        assert_eq!(
            error.to_string(),
            "Dimension mismatch: expected 4x3, got 2x3"
        );
    }

    #[test]
    fn test_polygon_vertex_count_message() {
        let error = PolygonError::VertexCount(3);
        assert_eq!(
            error.to_string(),
            "Quadrilateral needs exactly 4 vertices, got 3"
        );
    }
}
