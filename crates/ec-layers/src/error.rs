use ec_tensor::backend::TensorLayout;
use ec_tensor::dtype::Environment;
use ec_tensor::TensorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayerError {
    #[error("[{layer}] expects exactly 1 input tensor, got {got}")]
    InvalidInputCount { layer: String, got: usize },
    #[error("[{layer}] memory layout {layout} is not implemented")]
    UnimplementedLayout { layer: String, layout: TensorLayout },
    #[error("[{layer}] environment mismatch: expected {expected}, got {got}")]
    EnvironmentMismatch {
        layer: String,
        expected: Environment,
        got: Environment,
    },
    #[error("tensor error: {0}")]
    Tensor(#[from] TensorError),
}

pub type Result<T> = std::result::Result<T, LayerError>;
