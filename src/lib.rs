//! DeepSORT-style multi-object tracking.
//!
//! The [`tracker`] module holds the tracking core: a constant-velocity Kalman
//! filter per track, IoU (optionally appearance-blended) association and the
//! tentative/confirmed track lifecycle. The [`integration`] module connects an
//! appearance embedding extractor to the core.
//!
//! ```rust,ignore
//! use deepsort_rs::{DeepSortTracker, Detection, TrackerConfig};
//!
//! let mut tracker = DeepSortTracker::new(TrackerConfig::default());
//! let detections = vec![Detection::new(100.0, 100.0, 50.0, 100.0)];
//! let features = vec![vec![0.0; 512]];
//! let confirmed = tracker.update(&detections, features);
//! ```

pub mod error;
pub mod integration;
pub mod tracker;

pub use error::TrackerError;
pub use integration::{Crop, DetectionBuilder, FeatureExtractor, Frame, TrackerPipeline};
pub use tracker::{
    AssignmentResult, AssignmentStrategy, DeepSortTracker, Detection, Feature, MotionConfig,
    NoiseModel, Rect, Track, TrackState, TrackerConfig,
};
