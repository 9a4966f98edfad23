//! Backend test doubles: a call-counting wrapper and a failure-injecting
//! wrapper around `HostBackend`.

use std::sync::atomic::{AtomicUsize, Ordering};

use ec_tensor::backend::{CommandQueue, ExecutionBackend, GemmCall, GemmEvent, Im2ColCall};
use ec_tensor::dtype::Environment;
use ec_tensor::{HostBackend, Result, TensorBuffer, TensorError};

/// Counts im2col and GEMM issues while delegating to the host backend.
#[derive(Debug, Default)]
pub struct CountingBackend {
    inner: HostBackend,
    im2col_calls: AtomicUsize,
    gemm_calls: AtomicUsize,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn im2col_calls(&self) -> usize {
        self.im2col_calls.load(Ordering::SeqCst)
    }

    pub fn gemm_calls(&self) -> usize {
        self.gemm_calls.load(Ordering::SeqCst)
    }
}

impl ExecutionBackend for CountingBackend {
    fn environment(&self) -> Environment {
        Environment::Host
    }

    fn im2col(
        &self,
        call: &Im2ColCall,
        input: &TensorBuffer,
        output: &mut TensorBuffer,
    ) -> Result<()> {
        self.im2col_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.im2col(call, input, output)
    }

    fn gemm(
        &self,
        call: &GemmCall,
        a: &TensorBuffer,
        b: &TensorBuffer,
        c: &mut TensorBuffer,
    ) -> Result<GemmEvent> {
        self.gemm_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.gemm(call, a, b, c)
    }

    fn queue(&self) -> Option<&CommandQueue> {
        None
    }
}

/// Fails the nth GEMM or im2col issue (0-based) with a non-success status,
/// delegating every other call to the host backend. Output regions of failed
/// calls are left untouched.
#[derive(Debug)]
pub struct FailingBackend {
    inner: HostBackend,
    fail_gemm_at: Option<usize>,
    fail_im2col_at: Option<usize>,
    gemm_calls: AtomicUsize,
    im2col_calls: AtomicUsize,
}

impl FailingBackend {
    pub fn failing_gemm_at(idx: usize) -> Self {
        FailingBackend {
            inner: HostBackend::new(),
            fail_gemm_at: Some(idx),
            fail_im2col_at: None,
            gemm_calls: AtomicUsize::new(0),
            im2col_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_im2col_at(idx: usize) -> Self {
        FailingBackend {
            inner: HostBackend::new(),
            fail_gemm_at: None,
            fail_im2col_at: Some(idx),
            gemm_calls: AtomicUsize::new(0),
            im2col_calls: AtomicUsize::new(0),
        }
    }
}

impl ExecutionBackend for FailingBackend {
    fn environment(&self) -> Environment {
        Environment::Host
    }

    fn im2col(
        &self,
        call: &Im2ColCall,
        input: &TensorBuffer,
        output: &mut TensorBuffer,
    ) -> Result<()> {
        let idx = self.im2col_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_im2col_at == Some(idx) {
            return Err(TensorError::Other(format!(
                "injected im2col failure at call {}",
                idx
            )));
        }
        self.inner.im2col(call, input, output)
    }

    fn gemm(
        &self,
        call: &GemmCall,
        a: &TensorBuffer,
        b: &TensorBuffer,
        c: &mut TensorBuffer,
    ) -> Result<GemmEvent> {
        let idx = self.gemm_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_gemm_at == Some(idx) {
            return Err(TensorError::Other(format!(
                "injected gemm failure at call {}",
                idx
            )));
        }
        self.inner.gemm(call, a, b, c)
    }

    fn queue(&self) -> Option<&CommandQueue> {
        None
    }
}
