//! Windowed speed estimation with exponential smoothing.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::{SpeedConfig, SpeedUnit};
use crate::distances::Position;
use crate::history::TrackHistory;
use crate::{Error, Result, TrackId};

/// Speed output for one track on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedReading {
    /// Not enough history yet.
    Pending,
    /// Smoothed speed in the configured unit.
    Measured(f64),
}

impl SpeedReading {
    /// The smoothed speed, if available.
    pub fn value(&self) -> Option<f64> {
        match self {
            SpeedReading::Pending => None,
            SpeedReading::Measured(speed) => Some(*speed),
        }
    }

    /// Whether the track is still warming up.
    pub fn is_pending(&self) -> bool {
        matches!(self, SpeedReading::Pending)
    }

    /// Human-readable label: `"Calculating..."` or the speed truncated to an integer.
    pub fn label(&self, unit: SpeedUnit) -> String {
        match self {
            SpeedReading::Pending => "Calculating...".to_string(),
            SpeedReading::Measured(speed) => format!("{} {}", speed.trunc() as i64, unit.suffix()),
        }
    }
}

impl fmt::Display for SpeedReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeedReading::Pending => write!(f, "pending"),
            SpeedReading::Measured(speed) => write!(f, "{:.2}", speed),
        }
    }
}

/// Exponential moving average of speeds.
///
/// A previous value of exactly 0 means "no previous measurement", so the first
/// measurement passes through unchanged.
#[inline]
pub fn ema_speed(current: f64, previous: f64, alpha: f64) -> f64 {
    if previous == 0.0 {
        current
    } else {
        current * alpha + previous * (1.0 - alpha)
    }
}

/// Average speed over a window of `samples` frames covering `displacement` units.
///
/// Elapsed time is `samples / frame_rate` seconds.
#[inline]
pub fn raw_speed(displacement: f64, samples: usize, frame_rate: f64) -> f64 {
    let elapsed = samples as f64 / frame_rate;
    displacement / elapsed
}

/// Per-track speed estimator.
///
/// Holds the previous smoothed speed of every track it has seen. The speed of a track
/// only ever depends on that track's own history and previous speed.
#[derive(Debug, Clone)]
pub struct SpeedEstimator {
    config: SpeedConfig,
    previous: HashMap<TrackId, f64>,
}

impl SpeedEstimator {
    /// Create an estimator, validating the configuration.
    pub fn new(config: SpeedConfig) -> Result<Self> {
        config.validate()?;

        log::info!(
            "speed estimator: {} fps, min {} samples, alpha {}, metric {}, unit {}",
            config.frame_rate,
            config.min_samples,
            config.smoothing,
            config.metric.name(),
            config.unit.suffix()
        );

        Ok(Self {
            config,
            previous: HashMap::new(),
        })
    }

    /// Create an empty history sized for this estimator's frame rate.
    pub fn new_history(&self) -> Result<TrackHistory<Position>> {
        TrackHistory::for_frame_rate(self.config.frame_rate, self.config.capacity_rounding)
    }

    /// Estimate the smoothed speed of a track from its current history.
    ///
    /// Below `min_samples` samples the reading is `Pending` and the track's previous speed
    /// is reset to 0. Otherwise the displacement between the oldest and newest samples is
    /// divided by the window duration, converted to the output unit and smoothed against
    /// the track's previous speed, which is then replaced by the result.
    ///
    /// # Errors
    /// `Error::SampleMismatch` when the window mixes scalar and planar samples.
    pub fn estimate(&mut self, track_id: TrackId, history: &TrackHistory<Position>) -> Result<SpeedReading> {
        let samples = history.len(track_id);

        let (Some(oldest), Some(newest)) = (history.oldest(track_id), history.newest(track_id)) else {
            self.previous.insert(track_id, 0.0);
            return Ok(SpeedReading::Pending);
        };

        if samples < self.config.min_samples {
            self.previous.insert(track_id, 0.0);
            return Ok(SpeedReading::Pending);
        }

        let displacement = self
            .config
            .metric
            .displacement(oldest, newest)
            .ok_or(Error::SampleMismatch {
                track_id,
                from: oldest.kind(),
                to: newest.kind(),
            })?;

        let current = raw_speed(displacement, samples, self.config.frame_rate) * self.config.unit.factor();
        let smoothed = ema_speed(current, self.previous_speed(track_id), self.config.smoothing);
        self.previous.insert(track_id, smoothed);

        log::trace!(
            "track {}: {} samples, displacement {:.3}, raw {:.3}, smoothed {:.3}",
            track_id,
            samples,
            displacement,
            current,
            smoothed
        );

        Ok(SpeedReading::Measured(smoothed))
    }

    /// Last smoothed speed of a track, 0 if unseen or warming up.
    pub fn previous_speed(&self, track_id: TrackId) -> f64 {
        self.previous.get(&track_id).copied().unwrap_or(0.0)
    }

    /// Forget a track's previous speed. Returns whether one was stored.
    pub fn reset(&mut self, track_id: TrackId) -> bool {
        self.previous.remove(&track_id).is_some()
    }

    /// Estimator configuration.
    pub fn config(&self) -> &SpeedConfig {
        &self.config
    }
}
