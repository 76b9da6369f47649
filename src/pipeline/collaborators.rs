//! Contracts of the external components around the speed pipeline.
//!
//! Detection and tracking are done elsewhere (a neural network detector, a
//! ByteTrack-style tracker, ...). Implement these traits to plug them into a
//! [`FrameProcessor`](super::FrameProcessor). Closures with the matching
//! signature implement [`Detector`] and [`ObjectTracker`] directly.

use crate::detection::{Anchor, Detection};
use crate::region::PolygonZone;
use crate::Result;

/// Produces detections for a frame of type `F`.
pub trait Detector<F> {
    /// Detect objects in a frame.
    ///
    /// Failures should be reported as [`Error::Collaborator`](crate::Error::Collaborator).
    fn detect(&mut self, frame: &F) -> Result<Vec<Detection>>;
}

impl<F, D> Detector<F> for D
where
    D: FnMut(&F) -> Result<Vec<Detection>>,
{
    fn detect(&mut self, frame: &F) -> Result<Vec<Detection>> {
        self(frame)
    }
}

/// Drops detections outside a region of interest.
pub trait RegionFilter {
    /// Keep only the detections inside the region, preserving their order.
    fn filter(&self, detections: Vec<Detection>) -> Vec<Detection>;
}

impl RegionFilter for PolygonZone {
    fn filter(&self, detections: Vec<Detection>) -> Vec<Detection> {
        let mask = self.trigger(&detections);
        detections
            .into_iter()
            .zip(mask)
            .filter_map(|(det, inside)| inside.then_some(det))
            .collect()
    }
}

/// Assigns persistent identities to detections across frames.
pub trait ObjectTracker {
    /// Update the tracker with the detections of a new frame.
    ///
    /// Returns the detections it could associate, with `tracker_id` set.
    fn update(&mut self, detections: Vec<Detection>) -> Result<Vec<Detection>>;
}

impl<T> ObjectTracker for T
where
    T: FnMut(Vec<Detection>) -> Result<Vec<Detection>>,
{
    fn update(&mut self, detections: Vec<Detection>) -> Result<Vec<Detection>> {
        self(detections)
    }
}

/// Reduces a detection to the single image point that gets tracked over time.
pub trait AnchorExtractor {
    fn anchor(&self, detection: &Detection) -> [f64; 2];
}

impl AnchorExtractor for Anchor {
    fn anchor(&self, detection: &Detection) -> [f64; 2] {
        self.point(&detection.xyxy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn det(xyxy: [f64; 4]) -> Detection {
        Detection::new(xyxy).unwrap()
    }

    #[test]
    fn test_zone_filter_preserves_order() {
        let zone = PolygonZone::new(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]).unwrap();
        let detections = vec![
            det([1.0, 1.0, 2.0, 2.0]),
            det([20.0, 20.0, 30.0, 30.0]),
            det([5.0, 5.0, 7.0, 9.0]),
        ];

        let kept = zone.filter(detections);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].xyxy, [1.0, 1.0, 2.0, 2.0]);
        assert_eq!(kept[1].xyxy, [5.0, 5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_zone_filter_empty() {
        let zone = PolygonZone::new(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap();
        assert!(zone.filter(Vec::new()).is_empty());
    }

    #[test]
    fn test_closure_detector() {
        let mut calls = 0;
        let mut detector = |frame: &usize| -> Result<Vec<Detection>> {
            calls += 1;
            Ok(vec![det([0.0, 0.0, *frame as f64, 1.0])])
        };

        let detections = detector.detect(&4).unwrap();
        assert_eq!(detections[0].xyxy[2], 4.0);
        drop(detector);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_closure_tracker_error() {
        let mut tracker = |_: Vec<Detection>| -> Result<Vec<Detection>> {
            Err(Error::Collaborator("tracker lost".to_string()))
        };

        assert!(matches!(
            tracker.update(vec![det([0.0, 0.0, 1.0, 1.0])]),
            Err(Error::Collaborator(_))
        ));
    }

    #[test]
    fn test_anchor_extractor() {
        let detection = det([10.0, 20.0, 30.0, 60.0]);

        assert_eq!(AnchorExtractor::anchor(&Anchor::BottomCenter, &detection), [20.0, 60.0]);
        assert_eq!(AnchorExtractor::anchor(&Anchor::Center, &detection), [20.0, 40.0]);
    }
}
