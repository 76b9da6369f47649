//! Threshold-based speed buckets.

use serde::{Deserialize, Serialize};

use crate::speed::SpeedReading;
use crate::{Error, Result};

/// Index of a speed bucket. Bucket 0 also holds tracks without a speed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bucket(pub usize);

impl Bucket {
    /// Position of this bucket in the ordered set.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Maps smoothed speeds onto ordered buckets using half-open, lower-inclusive ranges.
///
/// Thresholds `[t1, t2, ..., tn]` produce `n + 1` buckets:
/// `(-inf, t1) -> 0`, `[t1, t2) -> 1`, ..., `[tn, inf) -> n`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct SpeedClassifier {
    thresholds: Vec<f64>,
}

impl SpeedClassifier {
    /// Create a classifier from finite, strictly increasing thresholds.
    pub fn new(thresholds: Vec<f64>) -> Result<Self> {
        if let Some(bad) = thresholds.iter().find(|t| !t.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "speed thresholds must be finite, got {}",
                bad
            )));
        }

        if thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidConfig(format!(
                "speed thresholds must be strictly increasing, got {:?}",
                thresholds
            )));
        }

        Ok(Self { thresholds })
    }

    /// Highway buckets in km/h: below 80, 80-100, 100-120, 120 and above.
    pub fn highway_km_h() -> Self {
        Self {
            thresholds: vec![80.0, 100.0, 120.0],
        }
    }

    /// A single bucket holding every track, for scenes without speed classes.
    pub fn single_bucket() -> Self {
        Self { thresholds: vec![] }
    }

    /// Bucket for a reading. `Pending` always lands in bucket 0.
    pub fn classify(&self, reading: SpeedReading) -> Bucket {
        match reading {
            SpeedReading::Pending => Bucket(0),
            SpeedReading::Measured(speed) => self.classify_value(speed),
        }
    }

    /// Bucket for a raw speed value. NaN lands in bucket 0.
    pub fn classify_value(&self, speed: f64) -> Bucket {
        Bucket(self.thresholds.partition_point(|&t| t <= speed))
    }

    /// Number of buckets (thresholds + 1).
    pub fn bucket_count(&self) -> usize {
        self.thresholds.len() + 1
    }

    /// The ordered thresholds.
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }
}

impl Default for SpeedClassifier {
    fn default() -> Self {
        Self::highway_km_h()
    }
}

impl TryFrom<Vec<f64>> for SpeedClassifier {
    type Error = Error;

    fn try_from(thresholds: Vec<f64>) -> Result<Self> {
        Self::new(thresholds)
    }
}

impl From<SpeedClassifier> for Vec<f64> {
    fn from(classifier: SpeedClassifier) -> Self {
        classifier.thresholds
    }
}
