mod appearance;
mod deep_sort_tracker;
mod kalman_filter;
mod matching;
mod rect;
mod track;
mod track_state;

pub use appearance::{Feature, INVALID_DISTANCE, cosine_distance, zero_features};
pub use deep_sort_tracker::{DeepSortTracker, TrackerConfig};
pub use kalman_filter::{KalmanFilter, MotionConfig, NoiseModel};
pub use matching::{
    AssignmentResult, AssignmentStrategy, Detection, assign, cost_matrix, greedy_assignment,
    iou_distance, linear_assignment,
};
pub use rect::{MIN_HEIGHT, Rect, iou_batch};
pub use track::Track;
pub use track_state::{LifecyclePolicy, MatchOutcome, TrackState};
