//! Appearance descriptor utilities.

use ndarray::Array2;

/// Appearance embedding produced by an extractor for one detection.
pub type Feature = Vec<f32>;

/// Distance reported when appearance data is missing or unusable.
pub const INVALID_DISTANCE: f32 = 1.0;

/// Cosine distance `1 - cos(a, b)`, in `[0, 2]`.
///
/// Empty vectors, vectors of different length, and zero-norm vectors carry no
/// evidence of similarity and yield [`INVALID_DISTANCE`].
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return INVALID_DISTANCE;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a <= 0.0 || norm_b <= 0.0 {
        return INVALID_DISTANCE;
    }

    let similarity = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    (1.0 - similarity) as f32
}

/// Pairwise cosine distances, rows = `track_features`, columns = `det_features`.
pub fn cosine_distance_matrix(track_features: &[&[f32]], det_features: &[Feature]) -> Array2<f32> {
    let mut dists = Array2::zeros((track_features.len(), det_features.len()));
    for (i, t) in track_features.iter().enumerate() {
        for (j, d) in det_features.iter().enumerate() {
            dists[[i, j]] = cosine_distance(t, d);
        }
    }
    dists
}

/// `count` all-zero descriptors of length `dim`, used when extraction fails.
pub fn zero_features(count: usize, dim: usize) -> Vec<Feature> {
    vec![vec![0.0; dim]; count]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_identical_vectors() {
        let v = [0.3, -1.2, 4.0];
        assert_abs_diff_eq!(cosine_distance(&v, &v), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_opposite_and_orthogonal() {
        assert_abs_diff_eq!(cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]), 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cosine_distance(&[1.0, 0.0], &[0.0, 3.0]), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(cosine_distance(&[], &[]), INVALID_DISTANCE);
        assert_eq!(cosine_distance(&[1.0], &[]), INVALID_DISTANCE);
        assert_eq!(cosine_distance(&[1.0, 2.0], &[1.0]), INVALID_DISTANCE);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 2.0]), INVALID_DISTANCE);
    }

    #[test]
    fn test_zero_features() {
        let feats = zero_features(3, 4);
        assert_eq!(feats.len(), 3);
        assert!(feats.iter().all(|f| f.len() == 4 && f.iter().all(|&x| x == 0.0)));
    }

    #[test]
    fn test_distance_matrix() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let dists = cosine_distance_matrix(&[a.as_slice(), b.as_slice()], &[a.clone()]);
        assert_eq!(dists.dim(), (2, 1));
        assert_abs_diff_eq!(dists[[0, 0]], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(dists[[1, 0]], 1.0, epsilon = 1e-6);
    }

    proptest! {
        #[test]
        fn prop_distance_bounded(
            pair in (1usize..32).prop_flat_map(|n| (
                prop::collection::vec(-10.0f32..10.0, n),
                prop::collection::vec(-10.0f32..10.0, n),
            ))
        ) {
            let d = cosine_distance(&pair.0, &pair.1);
            prop_assert!((0.0..=2.0).contains(&d));
        }

        #[test]
        fn prop_self_distance_near_zero(v in prop::collection::vec(0.1f32..10.0, 1..32)) {
            prop_assert!(cosine_distance(&v, &v).abs() < 1e-5);
        }
    }
}
