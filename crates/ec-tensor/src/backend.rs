use std::fmt::Debug;

use crate::buffer::TensorBuffer;
use crate::dtype::{Environment, Precision};
use crate::error::Result;

/// Memory layout convention for 4-D activation tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TensorLayout {
    /// Batch, channel, height, width. The implemented standard layout.
    Nchw,
    /// Batch, height, width, channel. Recognized but not implemented; every
    /// code path that receives it must fail explicitly.
    Nhwc,
}

impl std::fmt::Display for TensorLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TensorLayout::Nchw => write!(f, "nchw"),
            TensorLayout::Nhwc => write!(f, "nhwc"),
        }
    }
}

/// Opaque handle to the shared device command queue.
///
/// One queue exists per device backend instance, not per call; `queue()`
/// hands out handles to the same underlying queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandQueue {
    id: u64,
}

impl CommandQueue {
    pub(crate) fn new(id: u64) -> Self {
        CommandQueue { id }
    }

    /// Identifier of the underlying queue.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Completion handle for an issued GEMM.
///
/// Device GEMMs are asynchronous at issue time; the caller must wait before
/// reading the result or issuing a dependent GEMM into the same region.
/// Host GEMMs complete synchronously but report status through the same
/// handle so callers have a single contract.
#[derive(Debug)]
#[must_use = "a GEMM result is not readable until the event has been waited on"]
pub struct GemmEvent {
    status: Result<()>,
}

impl GemmEvent {
    pub(crate) fn completed() -> Self {
        GemmEvent { status: Ok(()) }
    }

    pub(crate) fn failed(err: crate::error::TensorError) -> Self {
        GemmEvent { status: Err(err) }
    }

    /// Block until the GEMM has completed and return its final status.
    pub fn wait(self) -> Result<()> {
        self.status
    }
}

/// Parameters for one im2col invocation.
///
/// Offsets are element counts (not bytes) into the respective buffers,
/// computed by the caller as `batch_index * per_batch_element_count`.
/// Channel count and input height/width are read from the input buffer's
/// shape.
#[derive(Debug, Clone)]
pub struct Im2ColCall {
    pub layout: TensorLayout,
    pub precision: Precision,
    pub input_offset: usize,
    pub filter_h: usize,
    pub filter_w: usize,
    pub stride_h: usize,
    pub stride_w: usize,
    pub pad_left: usize,
    pub pad_top: usize,
    pub pad_right: usize,
    pub pad_bottom: usize,
    pub dilation_h: usize,
    pub dilation_w: usize,
    pub output_h: usize,
    pub output_w: usize,
    pub output_offset: usize,
}

/// Parameters for one row-major GEMM invocation: `C = alpha * op(A) * op(B)
/// + beta * C`.
///
/// Offsets are element counts into the respective buffers; `lda`/`ldb`/`ldc`
/// are leading dimensions (row strides) of the stored matrices.
#[derive(Debug, Clone)]
pub struct GemmCall {
    pub precision: Precision,
    pub transpose_a: bool,
    pub transpose_b: bool,
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub alpha: f32,
    pub a_offset: usize,
    pub lda: usize,
    pub b_offset: usize,
    pub ldb: usize,
    pub beta: f32,
    pub c_offset: usize,
    pub ldc: usize,
}

/// Dispatch surface over the im2col and GEMM primitives of one compute
/// environment.
///
/// Implementations validate that every buffer is resident in their
/// environment and stored at the call's precision before touching data;
/// 32- and 16-bit kernels are selected by `precision` the way the native
/// library exposes separate sgemm/hgemm entry points.
pub trait ExecutionBackend: Send + Sync + Debug {
    /// The environment this backend executes in.
    fn environment(&self) -> Environment;

    /// Unfold sliding convolution windows of `input` (starting at
    /// `call.input_offset`) into columns of `output` (starting at
    /// `call.output_offset`).
    fn im2col(
        &self,
        call: &Im2ColCall,
        input: &TensorBuffer,
        output: &mut TensorBuffer,
    ) -> Result<()>;

    /// Issue a GEMM. `Err` means the call was rejected at issue time; an
    /// `Ok` event must still be waited on before the result is read or a
    /// dependent GEMM is issued.
    fn gemm(
        &self,
        call: &GemmCall,
        a: &TensorBuffer,
        b: &TensorBuffer,
        c: &mut TensorBuffer,
    ) -> Result<GemmEvent>;

    /// Handle to the shared device command queue, `None` on host backends.
    fn queue(&self) -> Option<&CommandQueue>;
}
