//! `ec-tensor` - Tensor buffers and the execution-backend dispatch surface
//! for edgecnn.
//!
//! This crate provides:
//! - A `TensorBuffer` type: shaped, typed storage resident in exactly one
//!   compute environment (host or device), with a sticky corrupted flag
//! - An `ExecutionBackend` trait exposing im2col and row-major GEMM
//!   primitives plus the device command queue
//! - A blocking `HostBackend` and a queue-owning `DeviceBackend`
//! - Reference f32/f16 kernels the backends dispatch to

pub mod backend;
pub mod buffer;
pub mod device;
mod dispatch;
pub mod dtype;
pub mod error;
pub mod host;
pub mod kernels;
pub mod shape;
pub mod storage;

// Re-export primary types at the crate root for convenience.
pub use backend::{CommandQueue, ExecutionBackend, GemmCall, GemmEvent, Im2ColCall, TensorLayout};
pub use buffer::TensorBuffer;
pub use device::DeviceBackend;
pub use dtype::{Environment, Precision};
pub use error::{Result, TensorError};
pub use host::HostBackend;
pub use shape::Shape;
pub use storage::BufferStorage;
