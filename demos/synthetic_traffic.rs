//! Speed estimation on synthetic highway traffic.
//!
//! Usage:
//!     cargo run --release --example synthetic_traffic [config.json] [frames]
//!
//! Without a config file the 25 x 250 m highway section preset is used. Set
//! `RUST_LOG=debug` to see per-frame counts and new track buffers.

use std::collections::HashMap;
use std::env;
use std::time::Instant;

use serde::Serialize;

use groundspeed::pipeline::{Detector, ObjectTracker};
use groundspeed::{
    CountStatistics, Detection, FrameProcessor, PipelineConfig, Result, SpeedReading, TrackId, ViewTransformer,
};

const HIGHWAY_SOURCE: [[f64; 2]; 4] = [[1252.0, 787.0], [2298.0, 803.0], [5039.0, 2159.0], [-550.0, 2159.0]];

/// A vehicle driving along the section at constant speed.
struct Vehicle {
    label: &'static str,
    lane_x: f64,
    start_y: f64,
    speed_km_h: f64,
    enters_at: usize,
}

/// Renders vehicles into image-space boxes, as a detector would report them.
struct SyntheticDetector {
    vehicles: Vec<Vehicle>,
    transformer: ViewTransformer,
    frame_rate: f64,
}

impl Detector<usize> for SyntheticDetector {
    fn detect(&mut self, frame: &usize) -> Result<Vec<Detection>> {
        let mut detections = Vec::new();

        for vehicle in self.vehicles.iter().filter(|v| *frame >= v.enters_at) {
            let elapsed = (*frame - vehicle.enters_at) as f64 / self.frame_rate;
            let ground_y = vehicle.start_y + vehicle.speed_km_h / 3.6 * elapsed;
            let [x, y] = self.transformer.inverse_transform_points(&[[vehicle.lane_x, ground_y]])[0];

            // Boxes grow towards the bottom of the frame
            let size = 40.0 + y / 20.0;
            detections.push(Detection::with_config(
                [x - size, y - size * 0.8, x + size, y],
                Some(0.9),
                Some(vehicle.label.to_string()),
            )?);
        }

        Ok(detections)
    }
}

/// Greedy nearest-neighbour tracker on bottom-center points.
struct NearestTracker {
    max_jump: f64,
    next_id: TrackId,
    last_seen: HashMap<TrackId, [f64; 2]>,
}

impl ObjectTracker for NearestTracker {
    fn update(&mut self, detections: Vec<Detection>) -> Result<Vec<Detection>> {
        let mut previous = std::mem::take(&mut self.last_seen);
        let mut tracked = Vec::with_capacity(detections.len());

        for det in detections {
            let [x, y] = det.anchor(groundspeed::Anchor::BottomCenter);
            let nearest = previous
                .iter()
                .map(|(&id, &[px, py])| (id, (x - px).hypot(y - py)))
                .filter(|&(_, dist)| dist <= self.max_jump)
                .min_by(|a, b| a.1.total_cmp(&b.1));

            let id = match nearest {
                Some((id, _)) => {
                    previous.remove(&id);
                    id
                }
                None => {
                    self.next_id += 1;
                    self.next_id
                }
            };

            self.last_seen.insert(id, [x, y]);
            tracked.push(det.with_tracker_id(id));
        }

        Ok(tracked)
    }
}

#[derive(Debug, Serialize)]
struct Results {
    frames: usize,
    elapsed_seconds: f64,
    fps: f64,
    final_speeds: Vec<(TrackId, Option<f64>)>,
    vehicles_per_frame: Option<CountStatistics>,
}

fn load_config(path: Option<&String>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_json_file(path),
        None => Ok(PipelineConfig::vehicle_km_h(HIGHWAY_SOURCE, 25.0, 250.0, 30.0)),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let config = load_config(args.get(1))?;
    let frames: usize = args.get(2).and_then(|n| n.parse().ok()).unwrap_or(150);

    let frame_rate = config.speed.frame_rate;
    let mut detector = SyntheticDetector {
        vehicles: vec![
            Vehicle { label: "car", lane_x: 5.0, start_y: 5.0, speed_km_h: 72.0, enters_at: 0 },
            Vehicle { label: "car", lane_x: 10.0, start_y: 0.0, speed_km_h: 95.0, enters_at: 10 },
            Vehicle { label: "truck", lane_x: 15.0, start_y: 20.0, speed_km_h: 110.0, enters_at: 20 },
            Vehicle { label: "car", lane_x: 20.0, start_y: 0.0, speed_km_h: 135.0, enters_at: 35 },
        ],
        transformer: ViewTransformer::new(config.source_view, config.target_view)?,
        frame_rate,
    };
    let mut tracker = NearestTracker {
        max_jump: 150.0,
        next_id: 0,
        last_seen: HashMap::new(),
    };
    let mut processor = FrameProcessor::new(config)?;

    let start = Instant::now();
    let mut counts = Vec::with_capacity(frames);
    let mut last_report = None;

    for frame in 0..frames {
        let report = processor.process(&frame, &mut detector, &mut tracker)?;
        counts.push(report.summary.detections);

        if frame % frame_rate.round().max(1.0) as usize == 0 {
            let unit = processor.pipeline().unit();
            let labels: Vec<String> = report.observations.iter().map(|obs| obs.label(unit)).collect();
            println!("frame {:>4}: {}", frame, labels.join(", "));
        }
        last_report = Some(report);
    }

    let elapsed = start.elapsed().as_secs_f64();
    let final_speeds = last_report
        .map(|report| {
            report
                .observations
                .iter()
                .map(|obs| (obs.track_id, obs.reading.value()))
                .collect()
        })
        .unwrap_or_default();

    let results = Results {
        frames,
        elapsed_seconds: elapsed,
        fps: frames as f64 / elapsed.max(f64::EPSILON),
        final_speeds,
        vehicles_per_frame: CountStatistics::from_counts(&counts),
    };
    println!("{}", serde_json::to_string_pretty(&results)?);

    if results.final_speeds.iter().all(|(_, speed)| speed.is_none()) {
        log::warn!("no speed measured, try more frames (reading: {})", SpeedReading::Pending);
    }

    Ok(())
}
