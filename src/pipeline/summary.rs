//! Per-frame reports and count statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::SpeedObservation;
use crate::detection::Detection;

/// Counts for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    /// Detections kept after region filtering.
    pub detections: usize,

    /// Detections the tracker associated with an identity.
    pub tracked: usize,

    /// Tracked objects still warming up.
    pub pending: usize,

    /// Detections per class label. Unlabeled detections are only in `detections`.
    pub per_label: BTreeMap<String, usize>,

    /// Tracked objects per speed bucket, indexed by bucket.
    pub per_bucket: Vec<usize>,
}

impl FrameSummary {
    /// Count a frame's detections and the observations derived from them.
    pub fn new(detections: &[Detection], observations: &[SpeedObservation], bucket_count: usize) -> Self {
        let mut per_label = BTreeMap::new();
        for label in detections.iter().filter_map(|det| det.label.as_deref()) {
            *per_label.entry(label.to_string()).or_insert(0) += 1;
        }

        let mut per_bucket = vec![0; bucket_count];
        for obs in observations {
            if let Some(count) = per_bucket.get_mut(obs.bucket.index()) {
                *count += 1;
            }
        }

        Self {
            detections: detections.len(),
            tracked: observations.len(),
            pending: observations.iter().filter(|obs| obs.reading.is_pending()).count(),
            per_label,
            per_bucket,
        }
    }

    /// Number of detections with the given class label.
    pub fn count(&self, label: &str) -> usize {
        self.per_label.get(label).copied().unwrap_or(0)
    }
}

/// Result of processing one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Zero-based index of the frame in the stream.
    pub frame_index: u64,

    pub observations: Vec<SpeedObservation>,

    pub summary: FrameSummary,
}

/// Statistics over a series of per-frame counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountStatistics {
    pub frames: usize,
    pub max: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std: f64,
}

impl CountStatistics {
    /// Statistics of a count series. `None` for an empty series.
    pub fn from_counts(counts: &[usize]) -> Option<Self> {
        let max = *counts.iter().max()?;
        let n = counts.len() as f64;

        let mean = counts.iter().sum::<usize>() as f64 / n;
        let variance = counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = counts.to_vec();
        sorted.sort_unstable();
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
        } else {
            sorted[mid] as f64
        };

        Some(Self {
            frames: counts.len(),
            max,
            mean,
            median,
            std: variance.sqrt(),
        })
    }
}
