mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from highlight_words for tests
pub use highlight_words::{
    ClassificationResult, Coverage, HighlightConfig, HighlightDetector, HighlightError,
    HighlightMask, PolygonError, Quadrilateral, Vertex, WordCandidate, WordClassifier,
};
