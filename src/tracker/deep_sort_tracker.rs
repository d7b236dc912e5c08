//! Main DeepSORT tracking loop.

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::tracker::appearance::{Feature, zero_features};
use crate::tracker::kalman_filter::MotionConfig;
use crate::tracker::matching::{self, AssignmentResult, AssignmentStrategy, Detection};
use crate::tracker::rect::Rect;
use crate::tracker::track::Track;
use crate::tracker::track_state::LifecyclePolicy;

/// Configuration for the DeepSortTracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Consecutive hits before a track is confirmed.
    pub n_init: u32,
    /// Frames a track may go unmatched before it is deleted.
    pub max_age: u32,
    /// Largest association cost accepted as a match; `<= 0` disables the gate.
    pub match_thresh: f32,
    /// Length of the zero descriptors substituted when extraction fails.
    pub feature_dim: usize,
    /// Weight of the cosine appearance distance in the association cost.
    /// Zero matches on `1 - IoU` alone.
    pub appearance_weight: f32,
    pub assignment: AssignmentStrategy,
    pub motion: MotionConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            n_init: 3,
            max_age: 30,
            match_thresh: 0.7,
            feature_dim: 512,
            appearance_weight: 0.0,
            assignment: AssignmentStrategy::Greedy,
            motion: MotionConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn lifecycle(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            n_init: self.n_init,
            max_age: self.max_age,
        }
    }
}

pub struct DeepSortTracker {
    tracks: Vec<Track>,
    frame_id: u64,
    config: TrackerConfig,
}

impl Default for DeepSortTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl DeepSortTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            tracks: Vec::new(),
            frame_id: 0,
            config,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Number of frames processed so far.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// All live tracks, tentative ones included.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Process one frame and return the confirmed tracks.
    ///
    /// `features[i]` is the appearance descriptor of `detections[i]`. When the
    /// counts differ every detection gets a zero descriptor of
    /// `feature_dim` length instead.
    pub fn update(&mut self, detections: &[Detection], features: Vec<Feature>) -> Vec<Track> {
        self.frame_id += 1;
        let policy = self.config.lifecycle();
        let mut features = self.checked_features(features, detections.len());

        self.predict();

        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = self.associate(detections, &features);

        for &(itracked, idet) in &matches {
            let feature = std::mem::take(&mut features[idet]);
            self.tracks[itracked].update(&detections[idet], feature, &policy);
        }

        let mut missed = vec![false; self.tracks.len()];
        for &idx in &unmatched_tracks {
            missed[idx] = true;
        }

        let previous = std::mem::take(&mut self.tracks);
        let mut live = Vec::with_capacity(previous.len() + unmatched_detections.len());
        for (idx, mut track) in previous.into_iter().enumerate() {
            if !missed[idx] || track.mark_missed(&policy) {
                live.push(track);
            } else {
                trace!(track_id = track.id(), age = track.age(), "track deleted");
            }
        }

        for idx in unmatched_detections {
            let feature = std::mem::take(&mut features[idx]);
            live.push(Track::new(&detections[idx], feature, &self.config.motion, &policy));
        }

        self.tracks = live;

        let confirmed: Vec<Track> = self
            .tracks
            .iter()
            .filter(|t| t.is_confirmed())
            .cloned()
            .collect();

        debug!(
            frame_id = self.frame_id,
            detections = detections.len(),
            matches = matches.len(),
            live = self.tracks.len(),
            confirmed = confirmed.len(),
            "frame processed"
        );

        confirmed
    }

    fn checked_features(&self, features: Vec<Feature>, num_detections: usize) -> Vec<Feature> {
        if features.len() == num_detections {
            return features;
        }
        warn!(
            expected = num_detections,
            got = features.len(),
            "appearance feature count mismatch, using zero descriptors"
        );
        zero_features(num_detections, self.config.feature_dim)
    }

    fn predict(&mut self) {
        #[cfg(feature = "rayon")]
        self.tracks.par_iter_mut().for_each(Track::predict);
        #[cfg(not(feature = "rayon"))]
        self.tracks.iter_mut().for_each(Track::predict);
    }

    fn associate(&self, detections: &[Detection], features: &[Feature]) -> AssignmentResult {
        let track_rects: Vec<Rect> = self.tracks.iter().map(|t| t.rect()).collect();
        let track_features: Vec<&[f32]> = self.tracks.iter().map(|t| t.feature()).collect();
        let det_rects: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();

        let cost = matching::cost_matrix(
            &track_rects,
            &track_features,
            &det_rects,
            features,
            self.config.appearance_weight,
        );
        matching::assign(&cost, self.config.match_thresh, self.config.assignment)
    }
}
