//! Burn inference backend for appearance embeddings.
//!
//! This module provides a `BurnExtractor` that implements `FeatureExtractor`
//! for re-identification models built with the Burn framework.
//!
//! # Example
//!
//! ```ignore
//! use deepsort_rs::integration::{BurnExtractor, BurnEmbeddingModel};
//! use burn::backend::NdArray;
//!
//! // Implement BurnEmbeddingModel for your re-identification model
//! struct MyReidModel { /* ... */ }
//!
//! impl BurnEmbeddingModel<NdArray> for MyReidModel {
//!     fn forward(&self, input: burn::tensor::Tensor<NdArray, 4>) -> Vec<Vec<f32>> {
//!         // Run inference, one embedding per batch entry
//!     }
//! }
//!
//! let model = MyReidModel::load("osnet.bin");
//! let extractor = BurnExtractor::new(model, Default::default());
//! ```

use burn::prelude::*;
use burn::tensor::Tensor;
use thiserror::Error;

use super::{Crop, FeatureExtractor};
use crate::tracker::Feature;

/// ImageNet channel statistics, the usual normalization for re-id backbones.
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Error type for Burn extraction failures.
#[derive(Debug, Clone, Error)]
pub enum BurnExtractorError {
    /// Crop channel count differs from the model input.
    #[error("crop has {got} channels, model expects {expected}")]
    ChannelMismatch { expected: u32, got: u32 },
    /// Preprocessing failed.
    #[error("preprocessing error: {0}")]
    PreprocessingError(String),
}

/// Trait for Burn-based embedding models.
///
/// Implement this trait for your specific model architecture.
pub trait BurnEmbeddingModel<B: Backend>: Send + Sync {
    /// Run forward pass on the input tensor.
    ///
    /// # Arguments
    /// * `input` - Input tensor of shape [batch, channels, height, width]
    ///
    /// # Returns
    /// One embedding per batch entry, in batch order.
    fn forward(&self, input: Tensor<B, 4>) -> Vec<Feature>;

    /// Get the expected input size (channels, height, width).
    fn input_size(&self) -> (u32, u32, u32) {
        (3, 256, 128) // Common person re-id input size
    }
}

/// Burn-based appearance extractor implementing `FeatureExtractor`.
pub struct BurnExtractor<B: Backend, M: BurnEmbeddingModel<B>> {
    model: M,
    device: B::Device,
    mean: [f32; 3],
    std: [f32; 3],
}

impl<B: Backend, M: BurnEmbeddingModel<B>> BurnExtractor<B, M> {
    /// Create a new Burn extractor with the given model and device.
    pub fn new(model: M, device: B::Device) -> Self {
        Self {
            model,
            device,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }

    /// Override the per-channel normalization statistics.
    pub fn with_normalization(mut self, mean: [f32; 3], std: [f32; 3]) -> Self {
        self.mean = mean;
        self.std = std;
        self
    }

    /// Resize one crop (nearest neighbor) and normalize it into CHW floats,
    /// appending to `out`. Empty crops contribute an all-zero image.
    fn preprocess_into(&self, crop: &Crop, out: &mut Vec<f32>) -> Result<(), BurnExtractorError> {
        let (channels, target_h, target_w) = self.model.input_size();
        let plane = target_h as usize * target_w as usize;

        if crop.is_empty() {
            out.extend(std::iter::repeat_n(0.0, channels as usize * plane));
            return Ok(());
        }
        if crop.channels != channels {
            return Err(BurnExtractorError::ChannelMismatch {
                expected: channels,
                got: crop.channels,
            });
        }

        let src_c = crop.channels as usize;
        if crop.data.len() != crop.width as usize * crop.height as usize * src_c {
            return Err(BurnExtractorError::PreprocessingError(format!(
                "crop buffer of {} bytes does not match {}x{}x{}",
                crop.data.len(),
                crop.width,
                crop.height,
                crop.channels
            )));
        }
        for c in 0..channels as usize {
            let (mean, sd) = (self.mean[c % 3], self.std[c % 3]);
            for oy in 0..target_h {
                let sy = (oy as u64 * crop.height as u64 / target_h as u64) as usize;
                for ox in 0..target_w {
                    let sx = (ox as u64 * crop.width as u64 / target_w as u64) as usize;
                    let px = crop.data[(sy * crop.width as usize + sx) * src_c + c];
                    out.push((px as f32 / 255.0 - mean) / sd);
                }
            }
        }
        Ok(())
    }

    /// Batch all crops into one [N, C, H, W] tensor.
    pub fn preprocess(&self, crops: &[Crop]) -> Result<Tensor<B, 4>, BurnExtractorError> {
        let (channels, target_h, target_w) = self.model.input_size();
        if channels == 0 || target_h == 0 || target_w == 0 {
            return Err(BurnExtractorError::PreprocessingError(format!(
                "model input size {}x{}x{} is empty",
                channels, target_h, target_w
            )));
        }

        let mut data =
            Vec::with_capacity(crops.len() * channels as usize * target_h as usize * target_w as usize);
        for crop in crops {
            self.preprocess_into(crop, &mut data)?;
        }

        Ok(
            Tensor::<B, 1>::from_floats(data.as_slice(), &self.device).reshape([
                crops.len(),
                channels as usize,
                target_h as usize,
                target_w as usize,
            ]),
        )
    }
}

impl<B: Backend, M: BurnEmbeddingModel<B>> FeatureExtractor for BurnExtractor<B, M> {
    type Error = BurnExtractorError;

    fn extract(&mut self, crops: &[Crop]) -> Result<Vec<Feature>, Self::Error> {
        if crops.is_empty() {
            return Ok(Vec::new());
        }
        let tensor = self.preprocess(crops)?;
        Ok(self.model.forward(tensor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    /// Two-by-two single channel input; the forward pass is never run here.
    struct TinyModel;

    impl BurnEmbeddingModel<NdArray> for TinyModel {
        fn forward(&self, _input: Tensor<NdArray, 4>) -> Vec<Feature> {
            Vec::new()
        }

        fn input_size(&self) -> (u32, u32, u32) {
            (1, 2, 2)
        }
    }

    fn extractor() -> BurnExtractor<NdArray, TinyModel> {
        BurnExtractor::new(TinyModel, Default::default())
            .with_normalization([0.5; 3], [0.5; 3])
    }

    #[test]
    fn test_preprocess_resizes_and_normalizes() {
        let crop = Crop {
            data: vec![255, 0, 0, 255, 0, 255, 0, 255, 255],
            width: 3,
            height: 3,
            channels: 1,
        };
        let mut out = Vec::new();
        extractor().preprocess_into(&crop, &mut out).unwrap();
        // Nearest neighbor samples (row, col) = (0,0), (0,1), (1,0), (1,1)
        assert_eq!(out, vec![1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn test_empty_crop_gives_zero_image() {
        let mut out = Vec::new();
        extractor().preprocess_into(&Crop::empty(1), &mut out).unwrap();
        assert_eq!(out, vec![0.0; 4]);
    }

    #[test]
    fn test_channel_and_size_mismatch() {
        let rgb = Crop {
            data: vec![0; 3],
            width: 1,
            height: 1,
            channels: 3,
        };
        let mut out = Vec::new();
        assert!(matches!(
            extractor().preprocess_into(&rgb, &mut out),
            Err(BurnExtractorError::ChannelMismatch { expected: 1, got: 3 })
        ));

        let short = Crop {
            data: vec![0; 2],
            width: 2,
            height: 2,
            channels: 1,
        };
        assert!(matches!(
            extractor().preprocess_into(&short, &mut out),
            Err(BurnExtractorError::PreprocessingError(_))
        ));
    }
}
