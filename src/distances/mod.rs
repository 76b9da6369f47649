//! Displacement metrics for speed estimation.
//!
//! This module provides:
//! - `Position` - the sample type stored per frame in a track's history
//! - `DistanceMetric` - enum selecting single-axis or planar Euclidean displacement
//! - Built-in displacement functions (absolute difference, euclidean, per-axis)

mod dispatch;
mod functions;
mod position;

pub use dispatch::{Axis, DistanceMetric};
pub use functions::*;
pub use position::Position;

use crate::{Error, Result};

/// Get a displacement metric by name.
///
/// Supported names:
/// - "x", "axis_x" - absolute difference along the ground-plane x axis
/// - "y", "axis_y" - absolute difference along the ground-plane y axis
/// - "euclidean" - 2D Euclidean distance on the ground plane
pub fn metric_by_name(name: &str) -> Result<DistanceMetric> {
    match name {
        "x" | "axis_x" => Ok(DistanceMetric::Axis(Axis::X)),
        "y" | "axis_y" => Ok(DistanceMetric::Axis(Axis::Y)),
        "euclidean" => Ok(DistanceMetric::Euclidean),
        _ => Err(Error::InvalidConfig(format!("unknown distance metric: {}", name))),
    }
}
