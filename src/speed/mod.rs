//! Speed estimation from per-track coordinate histories.
//!
//! Speeds are windowed averages: the displacement between the oldest and newest
//! samples of a one-second sliding window, divided by the window duration, then
//! smoothed with an exponential moving average per track.

mod config;
mod estimator;

pub use config::{CapacityRounding, SpeedConfig, SpeedUnit, DEFAULT_FRAME_RATE, DEFAULT_SMOOTHING, MAX_FRAME_RATE};
pub use estimator::{ema_speed, raw_speed, SpeedEstimator, SpeedReading};
