//! # groundspeed - Speed Estimation for Tracked Objects
//!
//! Computational core for estimating the ground speed of objects tracked in a
//! video stream.
//!
//! ## Features
//!
//! - Perspective transformation from image pixels to a ground-plane rectangle
//! - Bounded per-track coordinate history (one video-second sliding window)
//! - Windowed speed estimation with exponential smoothing
//! - Threshold-based speed buckets
//! - Polygon zones, anchor extraction and a per-frame pipeline gluing it all
//!
//! Detection and tracking are external: plug them in through the traits in
//! [`pipeline::collaborators`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use groundspeed::{Detection, PipelineConfig, SpeedPipeline};
//!
//! let config = PipelineConfig::vehicle_km_h(
//!     [[1252.0, 787.0], [2298.0, 803.0], [5039.0, 2159.0], [-550.0, 2159.0]],
//!     25.0,
//!     250.0,
//!     30.0,
//! );
//! let mut pipeline = SpeedPipeline::new(config)?;
//!
//! // `tracked` comes from an external tracker, each with `tracker_id` set
//! for observation in pipeline.update(&tracked)? {
//!     println!("{}", observation.label(pipeline.unit()));
//! }
//! ```

// Public modules
pub mod perspective;
pub mod history;
pub mod distances;
pub mod speed;
pub mod classifier;
pub mod detection;
pub mod region;
pub mod pipeline;
pub mod utils;

// Re-exports for convenience
pub use classifier::{Bucket, SpeedClassifier};
pub use detection::{Anchor, Detection};
pub use distances::{metric_by_name, Axis, DistanceMetric, Position};
pub use history::TrackHistory;
pub use perspective::{IdentityTransformation, PointTransformation, ViewTransformer};
pub use pipeline::{
    CountStatistics, FrameProcessor, FrameReport, FrameSummary, PipelineConfig, SpeedObservation, SpeedPipeline,
};
pub use region::PolygonZone;
pub use speed::{CapacityRounding, SpeedConfig, SpeedEstimator, SpeedReading, SpeedUnit};

/// Identity assigned to an object by the external tracker.
pub type TrackId = i64;

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur in the groundspeed library
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid geometry: {0}")]
        InvalidGeometry(String),

        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("Invalid detection: {0}")]
        InvalidDetection(String),

        #[error("Invalid points shape: expected {expected}, got {got}")]
        InvalidPointsShape { expected: String, got: String },

        #[error("Sample mismatch for track {track_id}: cannot measure between {from} and {to} samples")]
        SampleMismatch {
            track_id: crate::TrackId,
            from: &'static str,
            to: &'static str,
        },

        #[error("Collaborator error: {0}")]
        Collaborator(String),

        #[error("Config parse error: {0}")]
        ConfigParse(#[from] serde_json::Error),

        #[error("IO error: {0}")]
        IoError(#[from] std::io::Error),
    }

    /// Result type for groundspeed operations
    pub type Result<T> = std::result::Result<T, Error>;
}
