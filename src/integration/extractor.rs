//! Trait for appearance embedding backends and the image types they consume.

use std::fmt::Display;

use crate::error::TrackerError;
use crate::tracker::{Feature, Rect};

/// Borrowed interleaved (HWC) 8-bit image.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    channels: u32,
}

impl<'a> Frame<'a> {
    /// Wrap a raw buffer, checking that it holds `width * height * channels` bytes.
    pub fn new(data: &'a [u8], width: u32, height: u32, channels: u32) -> Result<Self, TrackerError> {
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(TrackerError::InvalidFrame {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Copy out the pixels under `rect`.
    ///
    /// The box is truncated to integer pixels and clipped to the frame. A box
    /// that ends up with no pixels yields an empty crop.
    pub fn crop(&self, rect: &Rect) -> Crop {
        let x0 = rect.x as i64;
        let y0 = rect.y as i64;
        let x1 = x0.max(0);
        let y1 = y0.max(0);
        let x2 = x0.saturating_add(rect.width as i64).min(self.width as i64);
        let y2 = y0.saturating_add(rect.height as i64).min(self.height as i64);

        if x2 <= x1 || y2 <= y1 {
            return Crop::empty(self.channels);
        }

        let channels = self.channels as usize;
        let stride = self.width as usize * channels;
        let (x1, x2) = (x1 as usize, x2 as usize);
        let mut data = Vec::with_capacity((x2 - x1) * (y2 - y1) as usize * channels);
        for row in y1 as usize..y2 as usize {
            let start = row * stride + x1 * channels;
            let end = row * stride + x2 * channels;
            data.extend_from_slice(&self.data[start..end]);
        }

        Crop {
            data,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
            channels: self.channels,
        }
    }
}

/// Owned image region cut from a [`Frame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crop {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

impl Crop {
    pub fn empty(channels: u32) -> Self {
        Self {
            data: Vec::new(),
            width: 0,
            height: 0,
            channels,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Trait for appearance embedding backends.
///
/// Implement this trait to connect a re-identification model to the tracker.
///
/// # Example
///
/// ```ignore
/// use deepsort_rs::{Crop, Feature, FeatureExtractor};
///
/// struct MyReid {
///     // Your model here
/// }
///
/// impl FeatureExtractor for MyReid {
///     type Error = std::io::Error;
///
///     fn extract(&mut self, crops: &[Crop]) -> Result<Vec<Feature>, Self::Error> {
///         Ok(crops.iter().map(|_| vec![0.0; 512]).collect())
///     }
/// }
/// ```
pub trait FeatureExtractor {
    /// Error type for extraction failures.
    type Error: Display;

    /// Return one descriptor per crop, in the same order.
    ///
    /// Crops may be empty when a detection lies outside the frame.
    fn extract(&mut self, crops: &[Crop]) -> Result<Vec<Feature>, Self::Error>;
}
