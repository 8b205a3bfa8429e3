pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;

pub use config::HighlightConfig;
pub use detection::HighlightDetector;
pub use detection::classify::WordClassifier;
pub use error::{HighlightError, PolygonError};
pub use models::{
    ClassificationResult, Coverage, HighlightMask, Quadrilateral, Vertex, WordCandidate,
};
pub use pipeline::{
    Pipeline, PipelineData, PipelineStep, PipelineContext,
    BoundingBox, MetadataValue, WorkItem, PipelineExecutor, DebugConfig
};
