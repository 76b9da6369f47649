//! Detection struct exchanged with the external detector and tracker.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, TrackId};

/// Reference point of a bounding box used to represent the whole object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Center,
    CenterLeft,
    CenterRight,
    TopCenter,
    TopLeft,
    TopRight,
    BottomLeft,
    /// Where a vehicle or pedestrian touches the ground.
    #[default]
    BottomCenter,
    BottomRight,
}

impl Anchor {
    /// Anchor point of an `[x1, y1, x2, y2]` box.
    pub fn point(self, xyxy: &[f64; 4]) -> [f64; 2] {
        let [x1, y1, x2, y2] = *xyxy;
        let cx = (x1 + x2) / 2.0;
        let cy = (y1 + y2) / 2.0;

        match self {
            Anchor::Center => [cx, cy],
            Anchor::CenterLeft => [x1, cy],
            Anchor::CenterRight => [x2, cy],
            Anchor::TopCenter => [cx, y1],
            Anchor::TopLeft => [x1, y1],
            Anchor::TopRight => [x2, y1],
            Anchor::BottomLeft => [x1, y2],
            Anchor::BottomCenter => [cx, y2],
            Anchor::BottomRight => [x2, y2],
        }
    }
}

/// A detected object in a frame.
///
/// Produced by the detector, filtered by a region, then given a `tracker_id` by the
/// tracker before it reaches the speed pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box `[x1, y1, x2, y2]` in image pixels (top-left, bottom-right).
    pub xyxy: [f64; 4],

    /// Optional detector confidence.
    #[serde(default)]
    pub confidence: Option<f64>,

    /// Optional class label, e.g. "car" or "person".
    #[serde(default)]
    pub label: Option<String>,

    /// Identity assigned by the tracker.
    #[serde(default)]
    pub tracker_id: Option<TrackId>,
}

impl Detection {
    /// Create a detection from a bounding box.
    ///
    /// # Arguments
    /// * `xyxy` - `[x1, y1, x2, y2]` with `x1 <= x2` and `y1 <= y2`
    pub fn new(xyxy: [f64; 4]) -> Result<Self> {
        validate_box(&xyxy)?;
        Ok(Self {
            xyxy,
            confidence: None,
            label: None,
            tracker_id: None,
        })
    }

    /// Create a detection from a slice holding exactly 4 box coordinates.
    pub fn from_slice(xyxy: &[f64]) -> Result<Self> {
        let xyxy: [f64; 4] = xyxy.try_into().map_err(|_| {
            Error::InvalidDetection(format!(
                "bounding box needs 4 coordinates, got {}",
                xyxy.len()
            ))
        })?;
        Self::new(xyxy)
    }

    /// Create a detection with optional metadata.
    pub fn with_config(
        xyxy: [f64; 4],
        confidence: Option<f64>,
        label: Option<String>,
    ) -> Result<Self> {
        let mut detection = Self::new(xyxy)?;
        detection.confidence = confidence;
        detection.label = label;
        Ok(detection)
    }

    /// Attach a tracker identity.
    pub fn with_tracker_id(mut self, tracker_id: TrackId) -> Self {
        self.tracker_id = Some(tracker_id);
        self
    }

    /// Anchor point of this detection's box.
    pub fn anchor(&self, anchor: Anchor) -> [f64; 2] {
        anchor.point(&self.xyxy)
    }

    /// Box width in pixels.
    pub fn width(&self) -> f64 {
        self.xyxy[2] - self.xyxy[0]
    }

    /// Box height in pixels.
    pub fn height(&self) -> f64 {
        self.xyxy[3] - self.xyxy[1]
    }
}

fn validate_box(xyxy: &[f64; 4]) -> Result<()> {
    if xyxy.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidDetection(format!(
            "bounding box has non-finite coordinates: {:?}",
            xyxy
        )));
    }

    if xyxy[0] > xyxy[2] || xyxy[1] > xyxy[3] {
        return Err(Error::InvalidDetection(format!(
            "bounding box corners out of order: {:?}",
            xyxy
        )));
    }

    Ok(())
}
