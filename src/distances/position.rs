//! Position samples stored in a track's history.

use serde::{Deserialize, Serialize};

/// One observation of a track on the ground plane.
///
/// Single-axis setups (e.g. a camera looking down a lane) only keep the coordinate along
/// the direction of travel; planar setups keep the full point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Position {
    /// A coordinate along one axis.
    Scalar(f64),
    /// A 2D ground-plane point.
    Planar([f64; 2]),
}

impl Position {
    /// Short name of the sample kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Position::Scalar(_) => "scalar",
            Position::Planar(_) => "planar",
        }
    }
}

impl From<f64> for Position {
    fn from(value: f64) -> Self {
        Position::Scalar(value)
    }
}

impl From<[f64; 2]> for Position {
    fn from(point: [f64; 2]) -> Self {
        Position::Planar(point)
    }
}
