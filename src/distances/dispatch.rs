//! Enum-based displacement metric, chosen at configuration time.
//!
//! `DistanceMetric` unifies the single-axis and the planar speed setups: it decides
//! both how a ground-plane point is reduced to a stored [`Position`] and how the
//! displacement between two stored positions is measured.

use serde::{Deserialize, Serialize};

use super::functions::{absolute_difference, axis_difference, euclidean};
use super::position::Position;

/// A ground-plane axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Index of this axis in a `[x, y]` point.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }
}

/// How displacement between the oldest and newest samples of a track is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// 1D absolute difference along one axis (e.g. the direction of a lane).
    Axis(Axis),
    /// 2D Euclidean distance on the ground plane.
    Euclidean,
}

impl Default for DistanceMetric {
    fn default() -> Self {
        DistanceMetric::Axis(Axis::Y)
    }
}

impl DistanceMetric {
    /// Reduce a ground-plane point to the sample stored in the track history.
    #[inline]
    pub fn sample(&self, ground: [f64; 2]) -> Position {
        match self {
            DistanceMetric::Axis(axis) => Position::Scalar(ground[axis.index()]),
            DistanceMetric::Euclidean => Position::Planar(ground),
        }
    }

    /// Displacement between two samples.
    ///
    /// Scalar samples always use the absolute difference. Planar samples use the
    /// selected axis or the Euclidean distance. Returns `None` when the samples are of
    /// different kinds.
    #[inline]
    pub fn displacement(&self, from: &Position, to: &Position) -> Option<f64> {
        match (from, to) {
            (Position::Scalar(a), Position::Scalar(b)) => Some(absolute_difference(*a, *b)),
            (Position::Planar(a), Position::Planar(b)) => Some(match self {
                DistanceMetric::Axis(axis) => axis_difference(*a, *b, axis.index()),
                DistanceMetric::Euclidean => euclidean(*a, *b),
            }),
            _ => None,
        }
    }

    /// Registry name of this metric (see [`super::metric_by_name`]).
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Axis(Axis::X) => "x",
            DistanceMetric::Axis(Axis::Y) => "y",
            DistanceMetric::Euclidean => "euclidean",
        }
    }
}
