//! Per-frame speed pipeline.
//!
//! For each tracked detection of a frame:
//!
//! 1. Take its anchor point in the image
//! 2. Map it onto the ground plane
//! 3. Append the ground sample to the track's history
//! 4. Estimate the track's smoothed speed
//! 5. Classify the speed into a bucket
//!
//! [`SpeedPipeline`] does this for detections that already carry a tracker id.
//! [`FrameProcessor`] wraps it with an external detector, a region filter and an
//! external tracker to handle a whole frame.

pub mod collaborators;
mod config;
mod processor;
mod summary;

pub use collaborators::{AnchorExtractor, Detector, ObjectTracker, RegionFilter};
pub use config::PipelineConfig;
pub use processor::FrameProcessor;
pub use summary::{CountStatistics, FrameReport, FrameSummary};

use serde::{Deserialize, Serialize};

use crate::classifier::{Bucket, SpeedClassifier};
use crate::detection::{Anchor, Detection};
use crate::distances::Position;
use crate::history::TrackHistory;
use crate::perspective::{PointTransformation, ViewTransformer};
use crate::speed::{SpeedConfig, SpeedEstimator, SpeedReading, SpeedUnit};
use crate::{Result, TrackId};

/// Speed result for one tracked detection on one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedObservation {
    pub track_id: TrackId,

    /// Anchor point in the image, pixels.
    pub anchor: [f64; 2],

    /// Anchor point on the ground plane, world units.
    pub ground: [f64; 2],

    pub reading: SpeedReading,

    pub bucket: Bucket,

    /// Class label of the detection, if the detector provided one.
    #[serde(default)]
    pub class_label: Option<String>,
}

impl SpeedObservation {
    /// Annotation text, e.g. `"#3 87 km/h"` or `"#3: Calculating..."`.
    pub fn label(&self, unit: SpeedUnit) -> String {
        match self.reading {
            SpeedReading::Pending => format!("#{}: {}", self.track_id, self.reading.label(unit)),
            SpeedReading::Measured(_) => format!("#{} {}", self.track_id, self.reading.label(unit)),
        }
    }
}

/// Turns tracked detections into per-track speed observations, frame after frame.
///
/// Owns the ground-plane transformation, the per-track histories, the previous
/// smoothed speeds and the classifier. State only changes through `&mut self`.
#[derive(Debug, Clone)]
pub struct SpeedPipeline {
    transformation: Box<dyn PointTransformation>,
    anchor: Anchor,
    history: TrackHistory<Position>,
    estimator: SpeedEstimator,
    classifier: SpeedClassifier,
    warned_untracked: bool,
}

impl SpeedPipeline {
    /// Build a pipeline mapping the configured source view onto the target view.
    ///
    /// # Errors
    /// `Error::InvalidGeometry` for degenerate views, `Error::InvalidConfig` for bad
    /// speed settings.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let transformer = ViewTransformer::new(config.source_view, config.target_view)?;

        Self::with_transformation(Box::new(transformer), config.speed, config.thresholds, config.anchor)
    }

    /// Build a pipeline around any point transformation, e.g.
    /// [`IdentityTransformation`](crate::IdentityTransformation) to measure in pixels.
    pub fn with_transformation(
        transformation: Box<dyn PointTransformation>,
        speed: SpeedConfig,
        classifier: SpeedClassifier,
        anchor: Anchor,
    ) -> Result<Self> {
        let estimator = SpeedEstimator::new(speed)?;
        let history = estimator.new_history()?;

        log::info!(
            "speed pipeline: history capacity {}, {} buckets, anchor {:?}",
            history.capacity(),
            classifier.bucket_count(),
            anchor
        );

        Ok(Self {
            transformation,
            anchor,
            history,
            estimator,
            classifier,
            warned_untracked: false,
        })
    }

    /// Process the tracked detections of one frame.
    ///
    /// Returns one observation per detection with a `tracker_id`, in input order.
    /// Detections without one are skipped.
    pub fn update(&mut self, detections: &[Detection]) -> Result<Vec<SpeedObservation>> {
        let tracked: Vec<(TrackId, &Detection)> = detections
            .iter()
            .filter_map(|det| det.tracker_id.map(|id| (id, det)))
            .collect();

        if tracked.len() < detections.len() && !self.warned_untracked {
            log::warn!(
                "speed pipeline received {} detections without a tracker id, skipping them",
                detections.len() - tracked.len()
            );
            self.warned_untracked = true;
        }

        if tracked.is_empty() {
            return Ok(Vec::new());
        }

        let anchors: Vec<[f64; 2]> = tracked
            .iter()
            .map(|(_, det)| AnchorExtractor::anchor(&self.anchor, det))
            .collect();
        let grounds = self.transformation.transform_points(&anchors);

        let metric = self.estimator.config().metric;
        let mut observations = Vec::with_capacity(tracked.len());

        for (((track_id, det), anchor), ground) in tracked.into_iter().zip(anchors).zip(grounds) {
            self.history.append(track_id, metric.sample(ground));
            let reading = self.estimator.estimate(track_id, &self.history)?;

            observations.push(SpeedObservation {
                track_id,
                anchor,
                ground,
                reading,
                bucket: self.classifier.classify(reading),
                class_label: det.label.clone(),
            });
        }

        Ok(observations)
    }

    /// Forget everything about a track, so a reused id starts a fresh warm-up.
    ///
    /// Returns whether the track was known.
    pub fn reset_track(&mut self, track_id: TrackId) -> bool {
        let had_history = self.history.reset(track_id);
        let had_speed = self.estimator.reset(track_id);
        had_history || had_speed
    }

    /// Unit of the reported speeds.
    pub fn unit(&self) -> SpeedUnit {
        self.estimator.config().unit
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn history(&self) -> &TrackHistory<Position> {
        &self.history
    }

    pub fn estimator(&self) -> &SpeedEstimator {
        &self.estimator
    }

    pub fn classifier(&self) -> &SpeedClassifier {
        &self.classifier
    }

    pub fn transformation(&self) -> &dyn PointTransformation {
        self.transformation.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distances::{Axis, DistanceMetric};
    use crate::perspective::{rectangle, IdentityTransformation};
    use crate::Error;
    use approx::assert_relative_eq;

    fn square_config() -> PipelineConfig {
        PipelineConfig {
            source_view: [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
            target_view: rectangle(100.0, 100.0),
            speed: SpeedConfig {
                unit: SpeedUnit::MetersPerSecond,
                metric: DistanceMetric::Axis(Axis::Y),
                ..SpeedConfig::new(10.0, 5)
            },
            thresholds: SpeedClassifier::new(vec![8.05]).unwrap(),
            anchor: Anchor::BottomCenter,
            restrict_to_source: true,
        }
    }

    /// Box whose bottom-center moves 0.1 px down per frame, 1 ground unit per frame.
    fn moving_box(track_id: TrackId, frame: usize) -> Detection {
        let y = 1.0 + 0.1 * frame as f64;
        Detection::new([4.0, y - 1.0, 6.0, y]).unwrap().with_tracker_id(track_id)
    }

    // ===== Pipeline Tests =====

    #[test]
    fn test_pipeline_warm_up_then_measure() {
        let mut pipeline = SpeedPipeline::new(square_config()).unwrap();

        for frame in 0..4 {
            let obs = pipeline.update(&[moving_box(1, frame)]).unwrap();
            assert_eq!(obs.len(), 1);
            assert!(obs[0].reading.is_pending());
            assert_eq!(obs[0].bucket, Bucket(0));
        }

        // 5 samples spanning 4 units over 0.5 s
        let obs = pipeline.update(&[moving_box(1, 4)]).unwrap();
        assert_relative_eq!(obs[0].reading.value().unwrap(), 8.0, epsilon = 1e-6);
        assert_eq!(obs[0].bucket, Bucket(0));
        assert_relative_eq!(obs[0].ground[1], 14.0, epsilon = 1e-6);

        // raw 10 * 5 / 6, smoothed against 8.0
        let obs = pipeline.update(&[moving_box(1, 5)]).unwrap();
        let expected = (50.0 / 6.0) * 0.2 + 8.0 * 0.8;
        assert_relative_eq!(obs[0].reading.value().unwrap(), expected, epsilon = 1e-6);
        assert_eq!(obs[0].bucket, Bucket(1));
    }

    #[test]
    fn test_pipeline_maps_anchor_to_ground() {
        let mut pipeline = SpeedPipeline::new(square_config()).unwrap();
        let det = Detection::new([4.0, 3.0, 6.0, 5.0]).unwrap().with_tracker_id(9);

        let obs = pipeline.update(&[det]).unwrap();

        assert_eq!(obs[0].anchor, [5.0, 5.0]);
        assert_relative_eq!(obs[0].ground[0], 50.0, epsilon = 1e-6);
        assert_relative_eq!(obs[0].ground[1], 50.0, epsilon = 1e-6);
        assert_eq!(pipeline.history().len(9), 1);
    }

    #[test]
    fn test_pipeline_skips_untracked() {
        let mut pipeline = SpeedPipeline::new(square_config()).unwrap();
        let untracked = Detection::new([0.0, 0.0, 1.0, 1.0]).unwrap();

        let obs = pipeline.update(&[untracked.clone(), moving_box(2, 0), untracked]).unwrap();

        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].track_id, 2);
        assert_eq!(pipeline.history().track_count(), 1);
    }

    #[test]
    fn test_pipeline_empty_frame() {
        let mut pipeline = SpeedPipeline::new(square_config()).unwrap();
        assert!(pipeline.update(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_pipeline_tracks_are_independent() {
        let mut pipeline = SpeedPipeline::new(square_config()).unwrap();

        for frame in 0..5 {
            pipeline.update(&[moving_box(1, frame)]).unwrap();
        }

        // Track 2 appears late and warms up on its own
        let obs = pipeline.update(&[moving_box(1, 5), moving_box(2, 0)]).unwrap();
        assert!(obs[0].reading.value().is_some());
        assert!(obs[1].reading.is_pending());
        assert_eq!(pipeline.history().len(2), 1);
    }

    #[test]
    fn test_reset_track_restarts_warm_up() {
        let mut pipeline = SpeedPipeline::new(square_config()).unwrap();

        for frame in 0..6 {
            pipeline.update(&[moving_box(1, frame)]).unwrap();
        }
        assert!(pipeline.estimator().previous_speed(1) > 0.0);

        assert!(pipeline.reset_track(1));
        assert!(!pipeline.reset_track(1));
        assert_eq!(pipeline.history().len(1), 0);
        assert_eq!(pipeline.estimator().previous_speed(1), 0.0);

        let obs = pipeline.update(&[moving_box(1, 40)]).unwrap();
        assert!(obs[0].reading.is_pending());
    }

    #[test]
    fn test_identity_transformation_measures_pixels() {
        let speed = SpeedConfig {
            metric: DistanceMetric::Axis(Axis::Y),
            ..SpeedConfig::new(10.0, 2)
        };
        let mut pipeline = SpeedPipeline::with_transformation(
            Box::new(IdentityTransformation),
            speed,
            SpeedClassifier::single_bucket(),
            Anchor::BottomCenter,
        )
        .unwrap();

        pipeline.update(&[Detection::new([0.0, 0.0, 2.0, 10.0]).unwrap().with_tracker_id(1)]).unwrap();
        let obs = pipeline
            .update(&[Detection::new([0.0, 0.0, 2.0, 14.0]).unwrap().with_tracker_id(1)])
            .unwrap();

        // 4 px over 2 samples at 10 fps
        assert_relative_eq!(obs[0].reading.value().unwrap(), 20.0, epsilon = 1e-9);
        assert_eq!(obs[0].ground, [1.0, 14.0]);
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let mut config = square_config();
        config.source_view = [[0.0, 0.0], [5.0, 0.0], [10.0, 0.0], [0.0, 10.0]];

        assert!(matches!(SpeedPipeline::new(config), Err(Error::InvalidGeometry(_))));
    }

    #[test]
    fn test_invalid_speed_config_rejected() {
        let mut config = square_config();
        config.speed.min_samples = 0;

        assert!(matches!(SpeedPipeline::new(config), Err(Error::InvalidConfig(_))));
    }

    // ===== SpeedObservation Tests =====

    #[test]
    fn test_observation_labels() {
        let mut obs = SpeedObservation {
            track_id: 3,
            anchor: [0.0, 0.0],
            ground: [0.0, 0.0],
            reading: SpeedReading::Pending,
            bucket: Bucket(0),
            class_label: Some("car".to_string()),
        };
        assert_eq!(obs.label(SpeedUnit::KilometersPerHour), "#3: Calculating...");

        obs.reading = SpeedReading::Measured(87.9);
        assert_eq!(obs.label(SpeedUnit::KilometersPerHour), "#3 87 km/h");
    }
}
