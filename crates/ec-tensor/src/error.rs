use thiserror::Error;

use crate::dtype::{Environment, Precision};

#[derive(Error, Debug)]
pub enum TensorError {
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },
    #[error("buffer resides in {actual} memory but was accessed as {requested}")]
    WrongEnvironment {
        requested: Environment,
        actual: Environment,
    },
    #[error("precision mismatch: expected {expected}, got {got}")]
    PrecisionMismatch { expected: Precision, got: Precision },
    #[error("memory layout {0} is not implemented")]
    UnimplementedLayout(crate::backend::TensorLayout),
    #[error("buffer region out of bounds: offset {offset} + extent {extent} exceeds {len} elements")]
    OutOfBounds {
        offset: usize,
        extent: usize,
        len: usize,
    },
    #[error("gemm dimension mismatch: [{m}x{k}] @ [{k}x{n}]")]
    GemmMismatch { m: usize, n: usize, k: usize },
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TensorError>;
