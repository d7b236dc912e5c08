use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrackerError {
    #[error("innovation covariance is singular")]
    SingularCovariance,
    #[error("frame buffer holds {got} bytes, expected {expected}")]
    InvalidFrame { expected: usize, got: usize },
    #[error("appearance extraction failed: {0}")]
    Extraction(String),
}
