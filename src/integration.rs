//! Integration module for connecting appearance extractors with the tracker.
//!
//! This module provides the extractor trait, the image types it consumes and
//! a pipeline that runs extraction and tracking frame by frame.

mod builder;
mod extractor;
mod pipeline;

pub use builder::DetectionBuilder;
pub use extractor::{Crop, FeatureExtractor, Frame};
pub use pipeline::TrackerPipeline;

#[cfg(feature = "burn-backend")]
mod burn_backend;

#[cfg(feature = "burn-backend")]
pub use burn_backend::{BurnEmbeddingModel, BurnExtractor, BurnExtractorError};
