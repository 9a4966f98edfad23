use crate::backend::{CommandQueue, ExecutionBackend, GemmCall, GemmEvent, Im2ColCall};
use crate::buffer::TensorBuffer;
use crate::dispatch;
use crate::dtype::Environment;
use crate::error::Result;

/// Blocking CPU execution backend.
///
/// Operates on host-resident buffers only. Every primitive completes before
/// the call returns; the `GemmEvent` handed back is already completed and
/// waiting on it merely reports status.
#[derive(Debug, Clone)]
pub struct HostBackend;

impl HostBackend {
    pub fn new() -> Self {
        HostBackend
    }
}

impl Default for HostBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionBackend for HostBackend {
    fn environment(&self) -> Environment {
        Environment::Host
    }

    fn im2col(
        &self,
        call: &Im2ColCall,
        input: &TensorBuffer,
        output: &mut TensorBuffer,
    ) -> Result<()> {
        dispatch::im2col(Environment::Host, call, input, output)
    }

    fn gemm(
        &self,
        call: &GemmCall,
        a: &TensorBuffer,
        b: &TensorBuffer,
        c: &mut TensorBuffer,
    ) -> Result<GemmEvent> {
        dispatch::gemm(Environment::Host, call, a, b, c)?;
        Ok(GemmEvent::completed())
    }

    fn queue(&self) -> Option<&CommandQueue> {
        None
    }
}
