//! TrackerPipeline for combining appearance extraction with tracking.

use tracing::warn;

use crate::tracker::{DeepSortTracker, Detection, Feature, Track, TrackerConfig, zero_features};

use super::{FeatureExtractor, Frame};

/// A tracker bundled with the appearance extractor that feeds it.
///
/// Each frame the detections are cropped out of the image, described by the
/// extractor and handed to the [`DeepSortTracker`]. Extraction failures never
/// fail the frame: the tracker receives zero descriptors instead.
pub struct TrackerPipeline<E: FeatureExtractor> {
    extractor: E,
    tracker: DeepSortTracker,
}

impl<E: FeatureExtractor> TrackerPipeline<E> {
    /// Create a new tracking pipeline with the given extractor and tracker config.
    pub fn new(extractor: E, config: TrackerConfig) -> Self {
        Self {
            extractor,
            tracker: DeepSortTracker::new(config),
        }
    }

    /// Create a new tracking pipeline with default tracker configuration.
    pub fn with_default_config(extractor: E) -> Self {
        Self::new(extractor, TrackerConfig::default())
    }

    /// Process a single frame and return the confirmed tracks.
    pub fn process_frame(&mut self, frame: &Frame<'_>, detections: &[Detection]) -> Vec<Track> {
        let features = self.extract_features(frame, detections);
        self.tracker.update(detections, features)
    }

    fn extract_features(&mut self, frame: &Frame<'_>, detections: &[Detection]) -> Vec<Feature> {
        if detections.is_empty() {
            return Vec::new();
        }

        let crops: Vec<_> = detections.iter().map(|d| frame.crop(&d.bbox)).collect();
        match self.extractor.extract(&crops) {
            Ok(features) => features,
            Err(err) => {
                warn!(%err, detections = detections.len(), "appearance extraction failed, using zero descriptors");
                zero_features(detections.len(), self.tracker.config().feature_dim)
            }
        }
    }

    /// Get a reference to the underlying extractor.
    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Get a mutable reference to the underlying extractor.
    pub fn extractor_mut(&mut self) -> &mut E {
        &mut self.extractor
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &DeepSortTracker {
        &self.tracker
    }

    /// Get a mutable reference to the underlying tracker.
    pub fn tracker_mut(&mut self) -> &mut DeepSortTracker {
        &mut self.tracker
    }
}
