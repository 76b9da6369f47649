//! Whole-frame processing: detect, filter, track, measure.

use super::collaborators::{Detector, ObjectTracker, RegionFilter};
use super::summary::{FrameReport, FrameSummary};
use super::{PipelineConfig, SpeedPipeline};
use crate::region::PolygonZone;
use crate::Result;

/// Runs the external detector and tracker around a [`SpeedPipeline`], one frame at a time.
#[derive(Debug, Clone)]
pub struct FrameProcessor {
    pipeline: SpeedPipeline,
    zone: Option<PolygonZone>,
    frame_index: u64,
}

impl FrameProcessor {
    /// Build from a configuration. With `restrict_to_source` set, only detections whose
    /// anchor lies inside the source view are tracked.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let zone = if config.restrict_to_source {
            Some(PolygonZone::with_anchor(config.source_view.to_vec(), config.anchor)?)
        } else {
            None
        };

        Ok(Self::with_pipeline(SpeedPipeline::new(config)?, zone))
    }

    /// Wrap an existing pipeline with an optional region of interest.
    pub fn with_pipeline(pipeline: SpeedPipeline, zone: Option<PolygonZone>) -> Self {
        Self {
            pipeline,
            zone,
            frame_index: 0,
        }
    }

    /// Process one frame.
    ///
    /// The summary counts the detections handed to the tracker, so detections the
    /// tracker could not associate still show up in `summary.detections`.
    /// Detection and tracking failures are returned as-is and leave the speed state
    /// untouched; the frame still counts towards `frame_index`.
    pub fn process<F, D, T>(&mut self, frame: &F, detector: &mut D, tracker: &mut T) -> Result<FrameReport>
    where
        D: Detector<F>,
        T: ObjectTracker,
    {
        let frame_index = self.frame_index;
        self.frame_index += 1;

        let mut detections = detector.detect(frame)?;
        if let Some(zone) = &self.zone {
            detections = zone.filter(detections);
        }

        let tracked = tracker.update(detections.clone())?;
        let observations = self.pipeline.update(&tracked)?;

        let summary = FrameSummary::new(&detections, &observations, self.pipeline.classifier().bucket_count());
        log::debug!(
            "frame {}: {} detections, {} tracked, {} pending",
            frame_index,
            summary.detections,
            summary.tracked,
            summary.pending
        );

        Ok(FrameReport {
            frame_index,
            observations,
            summary,
        })
    }

    /// Index the next processed frame will get.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn pipeline(&self) -> &SpeedPipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut SpeedPipeline {
        &mut self.pipeline
    }

    pub fn zone(&self) -> Option<&PolygonZone> {
        self.zone.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Detection;
    use crate::speed::{SpeedConfig, SpeedUnit};
    use crate::{Error, SpeedClassifier};

    fn config() -> PipelineConfig {
        PipelineConfig {
            speed: SpeedConfig {
                unit: SpeedUnit::MetersPerSecond,
                ..SpeedConfig::new(10.0, 3)
            },
            thresholds: SpeedClassifier::single_bucket(),
            ..PipelineConfig::vehicle_km_h([[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]], 100.0, 100.0, 10.0)
        }
    }

    /// Frames are plain y offsets; the detector returns one car there and one far outside.
    fn detector(frame: &f64) -> Result<Vec<Detection>> {
        Ok(vec![
            Detection::with_config([4.0, frame - 1.0, 6.0, *frame], Some(0.9), Some("car".to_string()))?,
            Detection::with_config([50.0, 50.0, 60.0, 60.0], Some(0.8), Some("truck".to_string()))?,
        ])
    }

    /// Gives every detection id 1 + its position.
    fn tracker(detections: Vec<Detection>) -> Result<Vec<Detection>> {
        Ok(detections
            .into_iter()
            .enumerate()
            .map(|(i, det)| det.with_tracker_id(i as i64 + 1))
            .collect())
    }

    #[test]
    fn test_process_frames() {
        let mut processor = FrameProcessor::new(config()).unwrap();
        let mut detector = detector;
        let mut tracker = tracker;

        let mut last = None;
        for frame in [2.0, 2.5, 3.0] {
            last = Some(processor.process(&frame, &mut detector, &mut tracker).unwrap());
        }
        let report = last.unwrap();

        assert_eq!(report.frame_index, 2);
        assert_eq!(processor.frame_index(), 3);

        // Truck is outside the zone and never reaches the tracker
        assert_eq!(report.observations.len(), 1);
        assert_eq!(report.summary.count("car"), 1);
        assert_eq!(report.summary.count("truck"), 0);

        // 3 samples spanning 10 units over 0.3 s
        let speed = report.observations[0].reading.value().unwrap();
        assert!((speed - 100.0 / 3.0).abs() < 1e-6);
        assert_eq!(report.summary.per_bucket, vec![1]);
    }

    #[test]
    fn test_process_without_zone() {
        let mut config = config();
        config.restrict_to_source = false;
        let mut processor = FrameProcessor::new(config).unwrap();
        assert!(processor.zone().is_none());

        let report = processor.process(&2.0, &mut detector, &mut tracker).unwrap();

        assert_eq!(report.observations.len(), 2);
        assert_eq!(report.summary.pending, 2);
    }

    #[test]
    fn test_detector_failure_propagates() {
        let mut processor = FrameProcessor::new(config()).unwrap();
        let mut failing = |_: &f64| -> Result<Vec<Detection>> { Err(Error::Collaborator("camera offline".to_string())) };

        assert!(matches!(
            processor.process(&2.0, &mut failing, &mut tracker),
            Err(Error::Collaborator(_))
        ));
        assert_eq!(processor.pipeline().history().track_count(), 0);
        assert_eq!(processor.frame_index(), 1);
    }

    #[test]
    fn test_untracked_detections_are_counted_but_not_measured() {
        let mut processor = FrameProcessor::new(config()).unwrap();
        let mut no_ids = |detections: Vec<Detection>| -> Result<Vec<Detection>> { Ok(detections) };

        let report = processor.process(&2.0, &mut detector, &mut no_ids).unwrap();

        assert!(report.observations.is_empty());
        assert_eq!(report.summary.detections, 1);
        assert_eq!(report.summary.tracked, 0);
    }

    #[test]
    fn test_zone_follows_source_view() {
        let processor = FrameProcessor::new(config()).unwrap();
        let zone = processor.zone().unwrap();

        assert_eq!(zone.vertices(), &config().source_view[..]);
        assert_eq!(zone.anchor(), config().anchor);
    }

    #[test]
    fn test_with_pipeline() {
        let pipeline = SpeedPipeline::new(config()).unwrap();
        let mut processor = FrameProcessor::with_pipeline(pipeline, None);

        let report = processor.process(&2.0, &mut detector, &mut tracker).unwrap();
        assert_eq!(report.frame_index, 0);
        assert_eq!(report.summary.count("truck"), 1);
    }
}
