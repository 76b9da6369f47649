//! Speed estimation configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::distances::{Axis, DistanceMetric};
use crate::{Error, Result};

/// Default weight of the newest measurement in the exponential moving average.
pub const DEFAULT_SMOOTHING: f64 = 0.2;

/// Frame rate assumed when a configuration does not give one.
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Highest accepted frame rate. History buffers hold one second of samples.
pub const MAX_FRAME_RATE: f64 = 1000.0;

/// How a fractional frame rate becomes a whole number of history slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityRounding {
    #[default]
    Nearest,
    Floor,
    Ceil,
}

impl CapacityRounding {
    /// Number of frames in one second of video at `frame_rate`.
    pub fn capacity(self, frame_rate: f64) -> Result<usize> {
        check_frame_rate(frame_rate)?;

        let frames = match self {
            CapacityRounding::Nearest => frame_rate.round(),
            CapacityRounding::Floor => frame_rate.floor(),
            CapacityRounding::Ceil => frame_rate.ceil(),
        };

        if frames < 1.0 {
            return Err(Error::InvalidConfig(format!(
                "frame rate {} gives an empty history window",
                frame_rate
            )));
        }

        Ok(frames as usize)
    }
}

/// Unit in which speeds are reported.
///
/// Ground-plane coordinates are assumed to be in meters, so raw speeds are in m/s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedUnit {
    #[default]
    MetersPerSecond,
    KilometersPerHour,
    MilesPerHour,
}

impl SpeedUnit {
    /// Multiplier converting m/s into this unit.
    pub fn factor(self) -> f64 {
        match self {
            SpeedUnit::MetersPerSecond => 1.0,
            SpeedUnit::KilometersPerHour => 3.6,
            SpeedUnit::MilesPerHour => 2.236_936_292_054_402,
        }
    }

    /// Display suffix.
    pub fn suffix(self) -> &'static str {
        match self {
            SpeedUnit::MetersPerSecond => "m/s",
            SpeedUnit::KilometersPerHour => "km/h",
            SpeedUnit::MilesPerHour => "mph",
        }
    }
}

/// Configuration for the speed estimator.
///
/// When read from JSON, missing fields follow [`SpeedConfig::vehicle_km_h`] at the
/// given frame rate, so an absent `min_samples` is half a second of frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SpeedConfigSpec")]
pub struct SpeedConfig {
    /// Video frame rate, frames per second.
    pub frame_rate: f64,

    /// Rounding applied to `frame_rate` to size the one-second history window.
    pub capacity_rounding: CapacityRounding,

    /// Samples required before a speed is reported.
    pub min_samples: usize,

    /// Weight of the newest measurement in the exponential moving average, in (0, 1].
    pub smoothing: f64,

    /// Output unit.
    pub unit: SpeedUnit,

    /// Displacement metric between oldest and newest samples.
    pub metric: DistanceMetric,
}

impl SpeedConfig {
    /// Create a configuration reporting m/s from planar Euclidean displacement.
    ///
    /// # Arguments
    /// * `frame_rate` - Video frames per second
    /// * `min_samples` - Samples required before the first speed is reported
    pub fn new(frame_rate: f64, min_samples: usize) -> Self {
        Self {
            frame_rate,
            capacity_rounding: CapacityRounding::Nearest,
            min_samples,
            smoothing: DEFAULT_SMOOTHING,
            unit: SpeedUnit::MetersPerSecond,
            metric: DistanceMetric::Euclidean,
        }
    }

    /// Vehicles driving along the target view's y axis, reported in km/h.
    ///
    /// Speeds appear once half a second of samples is available.
    pub fn vehicle_km_h(frame_rate: f64) -> Self {
        Self {
            min_samples: half_second(frame_rate),
            unit: SpeedUnit::KilometersPerHour,
            metric: DistanceMetric::Axis(Axis::Y),
            ..Self::new(frame_rate, 1)
        }
    }

    /// Pedestrians moving freely on the ground plane, reported in m/s.
    ///
    /// Speeds appear once the full one-second window is available.
    pub fn pedestrian_m_s(frame_rate: f64) -> Self {
        let config = Self::new(frame_rate, 1);
        Self {
            min_samples: config
                .capacity_rounding
                .capacity(frame_rate)
                .unwrap_or(1),
            ..config
        }
    }

    /// Parse a configuration from JSON. Missing fields take their default values.
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

    /// Number of samples kept per track (one second of frames).
    pub fn history_capacity(&self) -> Result<usize> {
        self.capacity_rounding.capacity(self.frame_rate)
    }

    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        let capacity = self.history_capacity()?;

        if self.min_samples == 0 {
            return Err(Error::InvalidConfig(
                "min_samples must be at least 1".to_string(),
            ));
        }

        if self.min_samples > capacity {
            return Err(Error::InvalidConfig(format!(
                "min_samples ({}) exceeds the history capacity ({}), speeds would never be reported",
                self.min_samples, capacity
            )));
        }

        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "smoothing must be in (0, 1], got {}",
                self.smoothing
            )));
        }

        Ok(())
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self::vehicle_km_h(DEFAULT_FRAME_RATE)
    }
}

/// Serialized form of [`SpeedConfig`] with every field optional.
#[derive(Deserialize)]
struct SpeedConfigSpec {
    frame_rate: Option<f64>,
    capacity_rounding: Option<CapacityRounding>,
    min_samples: Option<usize>,
    smoothing: Option<f64>,
    unit: Option<SpeedUnit>,
    metric: Option<DistanceMetric>,
}

impl From<SpeedConfigSpec> for SpeedConfig {
    fn from(spec: SpeedConfigSpec) -> Self {
        let defaults = SpeedConfig::vehicle_km_h(spec.frame_rate.unwrap_or(DEFAULT_FRAME_RATE));
        Self {
            capacity_rounding: spec.capacity_rounding.unwrap_or(defaults.capacity_rounding),
            min_samples: spec.min_samples.unwrap_or(defaults.min_samples),
            smoothing: spec.smoothing.unwrap_or(defaults.smoothing),
            unit: spec.unit.unwrap_or(defaults.unit),
            metric: spec.metric.unwrap_or(defaults.metric),
            ..defaults
        }
    }
}

fn check_frame_rate(frame_rate: f64) -> Result<()> {
    if !frame_rate.is_finite() || frame_rate <= 0.0 {
        return Err(Error::InvalidConfig(format!(
            "frame rate must be positive, got {}",
            frame_rate
        )));
    }
    if frame_rate > MAX_FRAME_RATE {
        return Err(Error::InvalidConfig(format!(
            "frame rate {} exceeds the maximum of {}",
            frame_rate, MAX_FRAME_RATE
        )));
    }
    Ok(())
}

/// Smallest sample count n with n >= frame_rate / 2.
fn half_second(frame_rate: f64) -> usize {
    (frame_rate / 2.0).ceil().max(1.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_rounding() {
        assert_eq!(CapacityRounding::Nearest.capacity(30.0).unwrap(), 30);
        assert_eq!(CapacityRounding::Nearest.capacity(29.97).unwrap(), 30);
        assert_eq!(CapacityRounding::Floor.capacity(29.97).unwrap(), 29);
        assert_eq!(CapacityRounding::Ceil.capacity(25.2).unwrap(), 26);
    }

    #[test]
    fn test_capacity_rejects_bad_frame_rates() {
        assert!(CapacityRounding::Nearest.capacity(0.0).is_err());
        assert!(CapacityRounding::Nearest.capacity(-30.0).is_err());
        assert!(CapacityRounding::Nearest.capacity(f64::NAN).is_err());
        assert!(CapacityRounding::Nearest.capacity(f64::INFINITY).is_err());
        assert!(CapacityRounding::Floor.capacity(0.5).is_err());
        assert!(CapacityRounding::Nearest.capacity(1e13).is_err());
        assert_eq!(CapacityRounding::Nearest.capacity(MAX_FRAME_RATE).unwrap(), 1000);
    }

    #[test]
    fn test_unit_factors() {
        assert_eq!(SpeedUnit::MetersPerSecond.factor(), 1.0);
        assert_eq!(SpeedUnit::KilometersPerHour.factor(), 3.6);
        assert_eq!(SpeedUnit::KilometersPerHour.suffix(), "km/h");
    }

    #[test]
    fn test_vehicle_preset() {
        let config = SpeedConfig::vehicle_km_h(30.0);

        assert_eq!(config.min_samples, 15);
        assert_eq!(config.unit, SpeedUnit::KilometersPerHour);
        assert_eq!(config.metric, DistanceMetric::Axis(Axis::Y));
        assert_eq!(config.smoothing, DEFAULT_SMOOTHING);
        assert!(config.validate().is_ok());

        // 25 fps: len < 12.5 is warm-up, so 13 samples are needed
        assert_eq!(SpeedConfig::vehicle_km_h(25.0).min_samples, 13);
    }

    #[test]
    fn test_pedestrian_preset() {
        let config = SpeedConfig::pedestrian_m_s(30.0);

        assert_eq!(config.min_samples, 30);
        assert_eq!(config.unit, SpeedUnit::MetersPerSecond);
        assert_eq!(config.metric, DistanceMetric::Euclidean);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SpeedConfig::new(30.0, 0);
        assert!(config.validate().is_err());

        config.min_samples = 31;
        assert!(config.validate().is_err());

        config.min_samples = 30;
        assert!(config.validate().is_ok());

        config.smoothing = 0.0;
        assert!(config.validate().is_err());

        config.smoothing = 1.5;
        assert!(config.validate().is_err());

        config.smoothing = 1.0;
        config.frame_rate = 0.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_from_json_defaults() {
        let config = SpeedConfig::from_json_str(r#"{"frame_rate": 30.0, "min_samples": 15}"#).unwrap();

        assert_eq!(config.frame_rate, 30.0);
        assert_eq!(config.min_samples, 15);
        assert_eq!(config.unit, SpeedUnit::KilometersPerHour);
        assert_eq!(config.history_capacity().unwrap(), 30);
    }

    #[test]
    fn test_from_json_min_samples_follows_frame_rate() {
        let config = SpeedConfig::from_json_str(r#"{"frame_rate": 60.0}"#).unwrap();
        assert_eq!(config.min_samples, 30);
        assert_eq!(config.history_capacity().unwrap(), 60);

        let config = SpeedConfig::from_json_str(r#"{"frame_rate": 10.0}"#).unwrap();
        assert_eq!(config.min_samples, 5);
        assert_eq!(config, SpeedConfig::vehicle_km_h(10.0));

        let config = SpeedConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SpeedConfig::default());
    }

    #[test]
    fn test_from_json_rejects_huge_frame_rate() {
        assert!(matches!(
            SpeedConfig::from_json_str(r#"{"frame_rate": 1e13}"#),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_json_full() {
        let json = r#"{
            "frame_rate": 25.0,
            "capacity_rounding": "floor",
            "min_samples": 25,
            "smoothing": 0.5,
            "unit": "meters_per_second",
            "metric": "euclidean"
        }"#;
        let config = SpeedConfig::from_json_str(json).unwrap();

        assert_eq!(config.capacity_rounding, CapacityRounding::Floor);
        assert_eq!(config.smoothing, 0.5);
        assert_eq!(config.metric, DistanceMetric::Euclidean);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            SpeedConfig::from_json_str("{not json"),
            Err(Error::ConfigParse(_))
        ));
        assert!(matches!(
            SpeedConfig::from_json_str(r#"{"frame_rate": -1.0}"#),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let config = SpeedConfig::pedestrian_m_s(24.0);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(SpeedConfig::from_json_str(&json).unwrap(), config);
    }
}
