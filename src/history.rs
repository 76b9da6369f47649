//! Per-track coordinate history.

use std::collections::{HashMap, VecDeque};

use crate::distances::Position;
use crate::speed::CapacityRounding;
use crate::{Error, Result, TrackId};

/// Bounded, per-track ring buffers of ground-plane samples.
///
/// Every track gets the same capacity (one video-second of frames). Buffers are created
/// on the first append for a track and live until [`TrackHistory::reset`] is called;
/// tracks that leave the scene simply stop receiving samples.
#[derive(Debug, Clone)]
pub struct TrackHistory<S = Position> {
    capacity: usize,
    tracks: HashMap<TrackId, VecDeque<S>>,
}

impl<S: Clone> TrackHistory<S> {
    /// Create an empty history keeping at most `capacity` samples per track.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfig(
                "history capacity must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            capacity,
            tracks: HashMap::new(),
        })
    }

    /// Create a history holding one second of samples at `frame_rate`.
    pub fn for_frame_rate(frame_rate: f64, rounding: CapacityRounding) -> Result<Self> {
        Self::new(rounding.capacity(frame_rate)?)
    }

    /// Append a sample, evicting the oldest one if the track's buffer is full.
    pub fn append(&mut self, track_id: TrackId, sample: S) {
        let capacity = self.capacity;
        let buffer = self.tracks.entry(track_id).or_insert_with(|| {
            log::debug!("new history buffer for track {} (capacity {})", track_id, capacity);
            VecDeque::new()
        });

        if buffer.len() == capacity {
            buffer.pop_front();
        }
        buffer.push_back(sample);
    }

    /// All samples for a track, oldest first. Unseen tracks yield an empty vector.
    pub fn get(&self, track_id: TrackId) -> Vec<S> {
        self.tracks
            .get(&track_id)
            .map(|buffer| buffer.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Iterate a track's samples, oldest first, without copying.
    pub fn iter(&self, track_id: TrackId) -> impl Iterator<Item = &S> + '_ {
        self.tracks.get(&track_id).into_iter().flatten()
    }

    /// Number of samples currently held for a track (0 if unseen).
    pub fn len(&self, track_id: TrackId) -> usize {
        self.tracks.get(&track_id).map_or(0, VecDeque::len)
    }

    /// Oldest sample still in the window.
    pub fn oldest(&self, track_id: TrackId) -> Option<&S> {
        self.tracks.get(&track_id).and_then(VecDeque::front)
    }

    /// Most recently appended sample.
    pub fn newest(&self, track_id: TrackId) -> Option<&S> {
        self.tracks.get(&track_id).and_then(VecDeque::back)
    }

    /// Whether a buffer exists for this track.
    pub fn contains(&self, track_id: TrackId) -> bool {
        self.tracks.contains_key(&track_id)
    }

    /// Forget a track's samples, e.g. when the tracker reassigns its identity.
    ///
    /// Returns whether the track had a buffer.
    pub fn reset(&mut self, track_id: TrackId) -> bool {
        let existed = self.tracks.remove(&track_id).is_some();
        if existed {
            log::debug!("history for track {} reset", track_id);
        }
        existed
    }

    /// Maximum samples kept per track.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tracks with a buffer.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Identities of all tracks with a buffer, in no particular order.
    pub fn track_ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.tracks.keys().copied()
    }
}
