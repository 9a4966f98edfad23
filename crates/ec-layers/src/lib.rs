//! `ec-layers` - Convolution and fully-connected layers for edgecnn.
//!
//! Layers own their weight buffers, drive an `ExecutionBackend` to populate
//! a freshly allocated output buffer on each forward call, and hand that
//! buffer's ownership to the caller. Backend primitive failures are reported
//! through the output buffer's corrupted flag, never by unwinding; callers
//! must check `is_corrupted()` after every forward call.

pub mod conv;
pub mod error;
pub mod fc;
#[cfg(test)]
pub(crate) mod test_support;

pub use conv::{ConvConfig, ConvLayer};
pub use error::{LayerError, Result};
pub use fc::FcLayer;
