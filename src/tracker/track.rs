//! Single object track for multi-object tracking.

use std::sync::atomic::{AtomicU64, Ordering};

use ndarray::{Array1, Array2};
use tracing::{trace, warn};

use crate::tracker::appearance::Feature;
use crate::tracker::kalman_filter::{KalmanFilter, MotionConfig};
use crate::tracker::matching::Detection;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::{LifecyclePolicy, MatchOutcome, TrackState};

/// Global track ID counter. Ids are unique for the lifetime of the process.
static TRACK_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Get the next unique track ID.
fn next_track_id() -> u64 {
    TRACK_ID_COUNTER.fetch_add(1, Ordering::SeqCst) + 1
}

/// Single object track.
#[derive(Debug, Clone)]
pub struct Track {
    track_id: u64,
    /// Current box in TLWH format: the last matched detection, or the motion
    /// prediction while the object goes unmatched
    rect: Rect,
    /// Most recent appearance descriptor
    feature: Feature,
    kalman_filter: KalmanFilter,
    hits: u32,
    age: u32,
    time_since_update: u32,
    state: TrackState,
}

impl Track {
    /// Create a track from an unmatched detection.
    pub fn new(
        detection: &Detection,
        feature: Feature,
        motion: &MotionConfig,
        policy: &LifecyclePolicy,
    ) -> Self {
        let kalman_filter = KalmanFilter::initiate(detection.bbox.to_xyah_f64(), motion.clone());
        let track = Self {
            track_id: next_track_id(),
            rect: detection.bbox,
            feature,
            kalman_filter,
            hits: 1,
            age: 1,
            time_since_update: 0,
            state: TrackState::initial(policy),
        };
        trace!(track_id = track.track_id, state = ?track.state, "track created");
        track
    }

    pub fn id(&self) -> u64 {
        self.track_id
    }

    /// Current bounding box in TLWH format.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn feature(&self) -> &[f32] {
        &self.feature
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn time_since_update(&self) -> u32 {
        self.time_since_update
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    /// Kalman filter state mean (8-dim)
    pub fn mean(&self) -> &Array1<f64> {
        self.kalman_filter.mean()
    }

    /// Kalman filter state covariance (8x8)
    pub fn covariance(&self) -> &Array2<f64> {
        self.kalman_filter.covariance()
    }

    /// Advance the motion model one frame.
    ///
    /// The predicted box replaces the current one and both `age` and
    /// `time_since_update` grow by one. A match later in the frame resets
    /// `time_since_update`.
    pub fn predict(&mut self) {
        let [cx, cy, aspect, h] = self.kalman_filter.predict();
        self.rect = Rect::from_xyah(cx as f32, cy as f32, aspect as f32, h as f32);
        self.age = self.age.saturating_add(1);
        self.time_since_update = self.time_since_update.saturating_add(1);
    }

    /// Apply a matched detection.
    pub fn update(&mut self, detection: &Detection, feature: Feature, policy: &LifecyclePolicy) {
        if let Err(err) = self.kalman_filter.update(detection.bbox.to_xyah_f64()) {
            warn!(track_id = self.track_id, %err, "kalman update skipped");
        }
        self.rect = detection.bbox;
        self.feature = feature;
        self.hits = self.hits.saturating_add(1);
        self.time_since_update = 0;
        self.advance(MatchOutcome::Matched, policy);
    }

    /// Record that no detection matched this frame. Returns `false` when the
    /// track must be removed from the live set.
    pub fn mark_missed(&mut self, policy: &LifecyclePolicy) -> bool {
        self.advance(MatchOutcome::Missed, policy);
        self.state != TrackState::Deleted
    }

    fn advance(&mut self, outcome: MatchOutcome, policy: &LifecyclePolicy) {
        let next = self
            .state
            .transition(outcome, self.hits, self.time_since_update, policy);
        if next != self.state {
            trace!(track_id = self.track_id, from = ?self.state, to = ?next, "track state changed");
        }
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const POLICY: LifecyclePolicy = LifecyclePolicy {
        n_init: 3,
        max_age: 30,
    };

    fn track_at(x: f32, y: f32) -> Track {
        Track::new(
            &Detection::new(x, y, 50.0, 100.0),
            vec![1.0, 0.0],
            &MotionConfig::default(),
            &POLICY,
        )
    }

    #[test]
    fn test_new_track_counters() {
        let track = track_at(100.0, 100.0);
        assert_eq!(track.hits(), 1);
        assert_eq!(track.age(), 1);
        assert_eq!(track.time_since_update(), 0);
        assert_eq!(track.state(), TrackState::Tentative);
        assert_eq!(track.rect(), Rect::new(100.0, 100.0, 50.0, 100.0));
        assert_eq!(track.feature(), &[1.0, 0.0]);
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let a = track_at(0.0, 0.0);
        let b = track_at(0.0, 0.0);
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_predict_and_update_counters() {
        let mut track = track_at(100.0, 100.0);
        track.predict();
        assert_eq!(track.age(), 2);
        assert_eq!(track.time_since_update(), 1);

        track.update(&Detection::new(101.0, 100.0, 50.0, 100.0), vec![0.0, 1.0], &POLICY);
        assert_eq!(track.hits(), 2);
        assert_eq!(track.time_since_update(), 0);
        assert_eq!(track.rect(), Rect::new(101.0, 100.0, 50.0, 100.0));
        assert_eq!(track.feature(), &[0.0, 1.0]);
        assert_eq!(track.state(), TrackState::Tentative);

        track.predict();
        track.update(&Detection::new(102.0, 100.0, 50.0, 100.0), vec![0.0, 1.0], &POLICY);
        assert_eq!(track.state(), TrackState::Confirmed);
    }

    #[test]
    fn test_stationary_prediction() {
        let mut track = track_at(100.0, 100.0);
        track.predict();
        let rect = track.rect();
        assert_abs_diff_eq!(rect.x, 100.0, epsilon = 0.1);
        assert_abs_diff_eq!(rect.y, 100.0, epsilon = 0.1);
        assert_abs_diff_eq!(rect.width, 50.0, epsilon = 0.1);
        assert_abs_diff_eq!(rect.height, 100.0, epsilon = 0.1);
    }

    #[test]
    fn test_tentative_miss_removes() {
        let mut track = track_at(0.0, 0.0);
        track.predict();
        assert!(!track.mark_missed(&POLICY));
        assert_eq!(track.state(), TrackState::Deleted);
    }

    #[test]
    fn test_confirmed_miss_survives() {
        let policy = LifecyclePolicy {
            n_init: 1,
            max_age: 2,
        };
        let mut track = Track::new(
            &Detection::new(0.0, 0.0, 10.0, 10.0),
            vec![],
            &MotionConfig::default(),
            &policy,
        );
        assert!(track.is_confirmed());
        for _ in 0..2 {
            track.predict();
            assert!(track.mark_missed(&policy));
        }
        track.predict();
        assert!(!track.mark_missed(&policy));
    }

    #[test]
    fn test_counters_saturate() {
        let mut track = track_at(0.0, 0.0);
        track.age = u32::MAX;
        track.time_since_update = u32::MAX;
        track.hits = u32::MAX;
        track.predict();
        assert_eq!(track.age(), u32::MAX);
        assert_eq!(track.time_since_update(), u32::MAX);

        track.update(&Detection::new(0.0, 0.0, 50.0, 100.0), vec![], &POLICY);
        assert_eq!(track.hits(), u32::MAX);
        assert_eq!(track.time_since_update(), 0);
    }
}
