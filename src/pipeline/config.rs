//! Pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classifier::SpeedClassifier;
use crate::detection::Anchor;
use crate::perspective::{rectangle, Quad};
use crate::speed::SpeedConfig;
use crate::Result;

fn default_restrict_to_source() -> bool {
    true
}

/// Everything needed to build a [`SpeedPipeline`](super::SpeedPipeline) or a
/// [`FrameProcessor`](super::FrameProcessor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Image-space quadrilateral covering the measured ground region, in pixels.
    pub source_view: Quad,

    /// Ground-plane rectangle the source view maps onto, in world units.
    pub target_view: Quad,

    /// Speed estimation settings.
    #[serde(default)]
    pub speed: SpeedConfig,

    /// Bucket thresholds in the speed's output unit.
    #[serde(default)]
    pub thresholds: SpeedClassifier,

    /// Box point tracked over time.
    #[serde(default)]
    pub anchor: Anchor,

    /// Drop detections whose anchor falls outside the source view.
    #[serde(default = "default_restrict_to_source")]
    pub restrict_to_source: bool,
}

impl PipelineConfig {
    /// Vehicles on a road section `width` x `height` meters, speeds in km/h with
    /// highway buckets.
    ///
    /// # Arguments
    /// * `source` - Road section corners in the image, clockwise from top-left
    /// * `width` - Real width of the section, meters
    /// * `height` - Real length of the section along the direction of travel, meters
    /// * `frame_rate` - Video frames per second
    pub fn vehicle_km_h(source: Quad, width: f64, height: f64, frame_rate: f64) -> Self {
        Self {
            source_view: source,
            target_view: rectangle(width, height),
            speed: SpeedConfig::vehicle_km_h(frame_rate),
            thresholds: SpeedClassifier::highway_km_h(),
            anchor: Anchor::BottomCenter,
            restrict_to_source: true,
        }
    }

    /// Pedestrians on a ground area `width` x `height` meters, speeds in m/s.
    pub fn pedestrian_m_s(source: Quad, width: f64, height: f64, frame_rate: f64) -> Self {
        Self {
            speed: SpeedConfig::pedestrian_m_s(frame_rate),
            thresholds: SpeedClassifier::single_bucket(),
            ..Self::vehicle_km_h(source, width, height, frame_rate)
        }
    }

    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Validate the speed settings. Geometry is checked when the homography is built.
    pub fn validate(&self) -> Result<()> {
        self.speed.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distances::{Axis, DistanceMetric};
    use crate::speed::SpeedUnit;
    use crate::Error;

    const SOURCE: Quad = [[1252.0, 787.0], [2298.0, 803.0], [5039.0, 2159.0], [-550.0, 2159.0]];

    #[test]
    fn test_vehicle_preset() {
        let config = PipelineConfig::vehicle_km_h(SOURCE, 25.0, 250.0, 30.0);

        assert_eq!(config.target_view, [[0.0, 0.0], [25.0, 0.0], [25.0, 250.0], [0.0, 250.0]]);
        assert_eq!(config.speed.unit, SpeedUnit::KilometersPerHour);
        assert_eq!(config.speed.metric, DistanceMetric::Axis(Axis::Y));
        assert_eq!(config.thresholds, SpeedClassifier::highway_km_h());
        assert!(config.restrict_to_source);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pedestrian_preset() {
        let config = PipelineConfig::pedestrian_m_s(SOURCE, 10.0, 20.0, 25.0);

        assert_eq!(config.speed.unit, SpeedUnit::MetersPerSecond);
        assert_eq!(config.speed.metric, DistanceMetric::Euclidean);
        assert_eq!(config.speed.min_samples, 25);
        assert_eq!(config.thresholds.bucket_count(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"{
            "source_view": [[0, 0], [10, 0], [10, 10], [0, 10]],
            "target_view": [[0, 0], [100, 0], [100, 100], [0, 100]]
        }"#;

        let config = PipelineConfig::from_json_str(json).unwrap();

        assert_eq!(config.speed, SpeedConfig::default());
        assert_eq!(config.thresholds, SpeedClassifier::highway_km_h());
        assert_eq!(config.anchor, Anchor::BottomCenter);
        assert!(config.restrict_to_source);
    }

    #[test]
    fn test_json_speed_follows_frame_rate() {
        let json = r#"{
            "source_view": [[0, 0], [10, 0], [10, 10], [0, 10]],
            "target_view": [[0, 0], [100, 0], [100, 100], [0, 100]],
            "speed": {"frame_rate": 60.0}
        }"#;

        let config = PipelineConfig::from_json_str(json).unwrap();

        assert_eq!(config.speed.min_samples, 30);
        assert_eq!(config.speed, SpeedConfig::vehicle_km_h(60.0));
    }

    #[test]
    fn test_json_round_trip() {
        let config = PipelineConfig::vehicle_km_h(SOURCE, 25.0, 250.0, 30.0);
        let json = serde_json::to_string(&config).unwrap();

        assert_eq!(PipelineConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_json_rejects_bad_values() {
        let bad_thresholds = r#"{
            "source_view": [[0, 0], [10, 0], [10, 10], [0, 10]],
            "target_view": [[0, 0], [100, 0], [100, 100], [0, 100]],
            "thresholds": [100, 80]
        }"#;
        assert!(matches!(
            PipelineConfig::from_json_str(bad_thresholds),
            Err(Error::ConfigParse(_))
        ));

        let bad_speed = r#"{
            "source_view": [[0, 0], [10, 0], [10, 10], [0, 10]],
            "target_view": [[0, 0], [100, 0], [100, 100], [0, 100]],
            "speed": {"frame_rate": 0}
        }"#;
        assert!(matches!(
            PipelineConfig::from_json_str(bad_speed),
            Err(Error::InvalidConfig(_))
        ));

        let three_corners = r#"{
            "source_view": [[0, 0], [10, 0], [10, 10]],
            "target_view": [[0, 0], [100, 0], [100, 100], [0, 100]]
        }"#;
        assert!(PipelineConfig::from_json_str(three_corners).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            PipelineConfig::from_json_file("/nonexistent/pipeline.json"),
            Err(Error::IoError(_))
        ));
    }
}
