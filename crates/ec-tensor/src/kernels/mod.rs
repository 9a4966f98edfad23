//! Reference im2col and GEMM kernels.
//!
//! Straightforward loops optimized for correctness rather than peak
//! performance; the backends validate arguments and buffer residency before
//! dispatching here. In a production build these are the seams where a
//! native BLAS/kernel library plugs in.

pub mod gemm;
pub mod im2col;

pub use gemm::{gemm_f16, gemm_f32};
pub use im2col::{im2col_f16, im2col_f32};
