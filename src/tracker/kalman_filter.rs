//! Constant-velocity Kalman filter over the XYAH bounding box space.
//!
//! The state is `[cx, cy, a, h, vcx, vcy, va, vh]`; observations are
//! `[cx, cy, a, h]`. Every track owns exactly one filter.

use ndarray::{Array1, Array2, s};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

const NDIM: usize = 4;

/// How process and observation noise are derived each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoiseModel {
    /// Constant diagonal covariances built once from the configured scales.
    #[default]
    Fixed,
    /// Position and velocity noise proportional to the previous box height.
    HeightScaled,
}

/// Noise parameters of the motion filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub std_weight_position: f64,
    pub std_weight_velocity: f64,
    pub std_observation: f64,
    pub initial_covariance: f64,
    pub noise_model: NoiseModel,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 160.0,
            std_observation: 0.05,
            initial_covariance: 1000.0,
            noise_model: NoiseModel::Fixed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: Array2<f64>,
    update_mat: Array2<f64>,
    config: MotionConfig,
    mean: Array1<f64>,
    covariance: Array2<f64>,
}

impl KalmanFilter {
    /// Filter with a zero mean and `initial_covariance * I` covariance.
    pub fn new(config: MotionConfig) -> Self {
        let mut motion_mat = Array2::<f64>::eye(2 * NDIM);
        for i in 0..NDIM {
            motion_mat[[i, NDIM + i]] = 1.0;
        }

        let mut update_mat = Array2::<f64>::zeros((NDIM, 2 * NDIM));
        for i in 0..NDIM {
            update_mat[[i, i]] = 1.0;
        }

        let covariance = Array2::<f64>::eye(2 * NDIM) * config.initial_covariance;

        Self {
            motion_mat,
            update_mat,
            config,
            mean: Array1::zeros(2 * NDIM),
            covariance,
        }
    }

    /// Filter seeded by a first measurement.
    ///
    /// The measurement is folded in with a regular update against the
    /// uninformative prior, so a fresh track goes through the same code path
    /// as every later match.
    pub fn initiate(measurement: [f64; 4], config: MotionConfig) -> Self {
        let mut kf = Self::new(config);
        if kf.update(measurement).is_err() {
            kf.mean
                .slice_mut(s![..NDIM])
                .assign(&Array1::from_vec(measurement.to_vec()));
        }
        kf
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    /// Current `[cx, cy, a, h]` estimate.
    pub fn measurement(&self) -> [f64; 4] {
        [self.mean[0], self.mean[1], self.mean[2], self.mean[3]]
    }

    fn process_noise(&self) -> Array2<f64> {
        let pos = self.config.std_weight_position;
        let vel = self.config.std_weight_velocity;
        let std = match self.config.noise_model {
            NoiseModel::Fixed => [pos, pos, pos, pos, vel, vel, vel, vel],
            NoiseModel::HeightScaled => {
                let h = self.mean[3];
                [pos * h, pos * h, 1e-2, pos * h, vel * h, vel * h, 1e-5, vel * h]
            }
        };
        Array2::from_diag(&Array1::from_iter(std.iter().map(|s| s * s)))
    }

    fn observation_noise(&self) -> Array2<f64> {
        let std = match self.config.noise_model {
            NoiseModel::Fixed => [self.config.std_observation; NDIM],
            NoiseModel::HeightScaled => {
                let pos = self.config.std_weight_position * self.mean[3];
                [pos, pos, 1e-1, pos]
            }
        };
        Array2::from_diag(&Array1::from_iter(std.iter().map(|s| s * s)))
    }

    /// Advance the state one step and return the predicted `[cx, cy, a, h]`.
    pub fn predict(&mut self) -> [f64; 4] {
        let motion_cov = self.process_noise();
        self.mean = self.motion_mat.dot(&self.mean);
        self.covariance =
            self.motion_mat.dot(&self.covariance).dot(&self.motion_mat.t()) + motion_cov;
        self.measurement()
    }

    /// Project the state into measurement space: `(H x, H P H^T + R)`.
    pub fn project(&self) -> (Array1<f64>, Array2<f64>) {
        let mean_proj = self.update_mat.dot(&self.mean);
        let covariance_proj = self
            .update_mat
            .dot(&self.covariance)
            .dot(&self.update_mat.t())
            + self.observation_noise();
        (mean_proj, covariance_proj)
    }

    /// Correct the state with a `[cx, cy, a, h]` measurement.
    ///
    /// The covariance uses the Joseph form followed by explicit
    /// symmetrization. On a singular innovation covariance the state is left
    /// untouched.
    pub fn update(&mut self, measurement: [f64; 4]) -> Result<(), TrackerError> {
        let (projected_mean, projected_cov) = self.project();
        let innovation = Array1::from_vec(measurement.to_vec()) - projected_mean;

        let s_inv = invert_4x4(&projected_cov)?;
        let pht = self.covariance.dot(&self.update_mat.t()); // 8x4
        let kalman_gain = pht.dot(&s_inv); // 8x4

        let obs_noise = self.observation_noise();
        let i_kh = Array2::<f64>::eye(2 * NDIM) - kalman_gain.dot(&self.update_mat);
        let joseph = i_kh.dot(&self.covariance).dot(&i_kh.t())
            + kalman_gain.dot(&obs_noise).dot(&kalman_gain.t());

        self.mean = &self.mean + &kalman_gain.dot(&innovation);
        self.covariance = (&joseph + &joseph.t()) * 0.5;
        Ok(())
    }
}

/// Invert a 4x4 matrix using nalgebra (pure Rust).
fn invert_4x4(m: &Array2<f64>) -> Result<Array2<f64>, TrackerError> {
    let mut nm = nalgebra::Matrix4::zeros();
    for i in 0..NDIM {
        for j in 0..NDIM {
            nm[(i, j)] = m[[i, j]];
        }
    }
    let inv = nm.try_inverse().ok_or(TrackerError::SingularCovariance)?;
    let mut res = Array2::zeros((NDIM, NDIM));
    for i in 0..NDIM {
        for j in 0..NDIM {
            res[[i, j]] = inv[(i, j)];
        }
    }
    Ok(res)
}
