use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Smallest height used when converting to XYAH form.
pub const MIN_HEIGHT: f32 = 1e-6;

/// Box in image pixels, stored as top-left corner plus size (TLWH).
///
/// The motion filter works in XYAH (center x, center y, width / height,
/// height); detectors often report TLBR corners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box spanning the corners `(x1, y1)` and `(x2, y2)`.
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// Inverse of [`Rect::to_xyah`].
    #[inline]
    pub fn from_xyah(cx: f32, cy: f32, aspect_ratio: f32, height: f32) -> Self {
        let width = aspect_ratio * height;
        Self::new(cx - 0.5 * width, cy - 0.5 * height, width, height)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.right(), self.bottom()]
    }

    #[inline]
    pub fn to_tlwh(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// `[cx, cy, width / height, height]`.
    ///
    /// Heights that are not positive are raised to [`MIN_HEIGHT`] first, so
    /// finite input always gives finite output.
    #[inline]
    pub fn to_xyah(&self) -> [f32; 4] {
        let h = if self.height > 0.0 {
            self.height
        } else {
            MIN_HEIGHT
        };
        [
            self.x + 0.5 * self.width,
            self.y + 0.5 * h,
            self.width / h,
            h,
        ]
    }

    /// [`Rect::to_xyah`] widened to the filter's precision.
    #[inline]
    pub fn to_xyah_f64(&self) -> [f64; 4] {
        self.to_xyah().map(f64::from)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Intersection over union in `[0, 1]`.
    ///
    /// Zero when the boxes are disjoint or merely touch, and whenever either
    /// box has no positive area.
    pub fn iou(&self, other: &Rect) -> f32 {
        let degenerate = |r: &Rect| r.width <= 0.0 || r.height <= 0.0;
        if degenerate(self) || degenerate(other) {
            return 0.0;
        }

        let inter_w = self.right().min(other.right()) - self.x.max(other.x);
        let inter_h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if inter_w <= 0.0 || inter_h <= 0.0 {
            return 0.0;
        }

        let inter = inter_w * inter_h;
        let union = self.area() + other.area() - inter;
        if union > 0.0 {
            (inter / union).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Pairwise IoU, rows indexed by `boxes_a` and columns by `boxes_b`.
pub fn iou_batch(boxes_a: &[Rect], boxes_b: &[Rect]) -> Array2<f32> {
    Array2::from_shape_fn((boxes_a.len(), boxes_b.len()), |(i, j)| {
        boxes_a[i].iou(&boxes_b[j])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_rect_conversions() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);

        assert_eq!(rect.to_tlbr(), [10.0, 20.0, 40.0, 60.0]);
        assert_eq!((rect.right(), rect.bottom()), (40.0, 60.0));

        let [cx, cy, aspect, h] = rect.to_xyah();
        assert_eq!((cx, cy, h), (25.0, 40.0, 40.0));
        assert_abs_diff_eq!(aspect, 0.75, epsilon = 1e-6);
    }

    #[test]
    fn test_from_tlbr() {
        let rect = Rect::from_tlbr(-5.0, 20.0, 40.0, 60.0);
        assert_eq!(rect.to_tlwh(), [-5.0, 20.0, 45.0, 40.0]);
    }

    #[test]
    fn test_from_xyah() {
        let rect = Rect::from_xyah(25.0, 40.0, 0.75, 40.0);
        assert_abs_diff_eq!(rect.x, 10.0, epsilon = 1e-6);
        assert_abs_diff_eq!(rect.y, 20.0, epsilon = 1e-6);
        assert_abs_diff_eq!(rect.width, 30.0, epsilon = 1e-6);
        assert_abs_diff_eq!(rect.height, 40.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_height_is_clamped() {
        let xyah = Rect::new(0.0, 0.0, 10.0, 0.0).to_xyah();
        assert_eq!(xyah[3], MIN_HEIGHT);
        assert!(xyah[2].is_finite());
    }

    #[test]
    fn test_iou() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);

        // 5x5 intersection over 100 + 100 - 25
        assert_abs_diff_eq!(a.iou(&b), 25.0 / 175.0, epsilon = 1e-6);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 10.0, 10.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_touching_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_degenerate_box() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let flat = Rect::new(0.0, 0.0, 10.0, 0.0);
        let inverted = Rect::new(5.0, 5.0, -3.0, 4.0);
        assert_eq!(a.iou(&flat), 0.0);
        assert_eq!(a.iou(&inverted), 0.0);
        assert_eq!(flat.iou(&flat), 0.0);
    }

    #[test]
    fn test_iou_same_box() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_abs_diff_eq!(a.iou(&a), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_iou_batch_shape() {
        let a = [Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(50.0, 50.0, 5.0, 5.0)];
        let b = [Rect::new(0.0, 0.0, 10.0, 10.0)];
        let ious = iou_batch(&a, &b);
        assert_eq!(ious.dim(), (2, 1));
        assert_abs_diff_eq!(ious[[0, 0]], 1.0, epsilon = 1e-6);
        assert_eq!(ious[[1, 0]], 0.0);
    }

    fn any_rect() -> impl Strategy<Value = Rect> {
        (-500.0f32..500.0, -500.0f32..500.0, 0.0f32..300.0, 0.0f32..300.0)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_iou_symmetric_and_bounded(a in any_rect(), b in any_rect()) {
            let ab = a.iou(&b);
            let ba = b.iou(&a);
            prop_assert!((0.0..=1.0).contains(&ab));
            prop_assert!((ab - ba).abs() < 1e-6);
        }

        #[test]
        fn prop_iou_self_is_one(
            x in -500.0f32..500.0,
            y in -500.0f32..500.0,
            w in 0.5f32..300.0,
            h in 0.5f32..300.0,
        ) {
            let r = Rect::new(x, y, w, h);
            prop_assert!((r.iou(&r) - 1.0).abs() < 1e-3);
        }

        #[test]
        fn prop_xyah_round_trip(
            x in -500.0f32..500.0,
            y in -500.0f32..500.0,
            w in 0.0f32..300.0,
            h in 0.5f32..300.0,
        ) {
            let r = Rect::new(x, y, w, h);
            let [cx, cy, a, hh] = r.to_xyah();
            let back = Rect::from_xyah(cx, cy, a, hh);
            prop_assert!((back.x - r.x).abs() < 1e-3);
            prop_assert!((back.y - r.y).abs() < 1e-3);
            prop_assert!((back.width - r.width).abs() < 1e-3);
            prop_assert!((back.height - r.height).abs() < 1e-3);
        }
    }
}
