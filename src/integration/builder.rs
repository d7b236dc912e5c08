//! Turns raw detector boxes into tracker [`Detection`]s.

use crate::tracker::{Detection, Rect};

/// Collects a box in whichever layout the detector emits, plus optional
/// score and class, and produces a [`Detection`].
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    rect: Rect,
    score: Option<f32>,
    class_id: Option<usize>,
}

impl DetectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-left corner plus size.
    pub fn tlwh(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.rect = Rect::new(x, y, w, h);
        self
    }

    /// Two opposite corners.
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.rect = Rect::from_tlbr(x1, y1, x2, y2);
        self
    }

    /// Center plus size, as YOLO-style heads report it.
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.rect = Rect::new(cx - w / 2.0, cy - h / 2.0, w, h);
        self
    }

    pub fn score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn class_id(mut self, class_id: usize) -> Self {
        self.class_id = Some(class_id);
        self
    }

    pub fn build(self) -> Detection {
        Detection {
            bbox: self.rect,
            score: self.score,
            class_id: self.class_id,
        }
    }
}
