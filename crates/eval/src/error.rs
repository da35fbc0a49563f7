//! Error types for the evaluation harness.
//!
//! Scoring never fails outright: the evaluators log these and fall back to a
//! degraded result. They are returned directly only by the strict parsing
//! helpers and by parallel batch setup.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvalError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EvalError {
    /// `extracted` / `groundTruth` missing or not an array.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Unknown match mode: {0}")]
    UnknownMode(String),

    #[error("Invalid similarity threshold: {0}")]
    InvalidThreshold(f64),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl EvalError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        EvalError::MalformedInput(msg.into())
    }
}
