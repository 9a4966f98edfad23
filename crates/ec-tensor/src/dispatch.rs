//! Argument validation and kernel selection shared by the host and device
//! backends.

use crate::backend::{GemmCall, Im2ColCall, TensorLayout};
use crate::buffer::TensorBuffer;
use crate::dtype::{Environment, Precision};
use crate::error::{Result, TensorError};
use crate::kernels;
use crate::storage::BufferStorage;

fn storage(buf: &TensorBuffer, env: Environment) -> Result<&BufferStorage> {
    match env {
        Environment::Host => buf.host_data(),
        Environment::Device => buf.device_data(),
    }
}

fn storage_mut(buf: &mut TensorBuffer, env: Environment) -> Result<&mut BufferStorage> {
    match env {
        Environment::Host => buf.host_data_mut(),
        Environment::Device => buf.device_data_mut(),
    }
}

fn check_precision(expected: Precision, buf: &TensorBuffer) -> Result<()> {
    if buf.precision() != expected {
        return Err(TensorError::PrecisionMismatch {
            expected,
            got: buf.precision(),
        });
    }
    Ok(())
}

fn check_region(offset: usize, extent: usize, len: usize) -> Result<()> {
    if offset + extent > len {
        return Err(TensorError::OutOfBounds {
            offset,
            extent,
            len,
        });
    }
    Ok(())
}

/// Validate and run one im2col call in the given environment.
pub(crate) fn im2col(
    env: Environment,
    call: &Im2ColCall,
    input: &TensorBuffer,
    output: &mut TensorBuffer,
) -> Result<()> {
    if call.layout != TensorLayout::Nchw {
        return Err(TensorError::UnimplementedLayout(call.layout));
    }
    check_precision(call.precision, input)?;
    check_precision(call.precision, output)?;
    if input.shape().ndim() != 4 {
        return Err(TensorError::ShapeMismatch {
            expected: vec![4],
            got: input.shape().dims().to_vec(),
        });
    }

    let channels = input.dim(1);
    let input_h = input.dim(2);
    let input_w = input.dim(3);

    if call.filter_h == 0
        || call.filter_w == 0
        || call.stride_h == 0
        || call.stride_w == 0
        || call.dilation_h == 0
        || call.dilation_w == 0
    {
        return Err(TensorError::Other(
            "im2col: filter, stride and dilation must be nonzero".to_string(),
        ));
    }
    // The declared output extents must agree with the padded input span.
    let span_h = call.dilation_h * (call.filter_h - 1) + 1;
    let span_w = call.dilation_w * (call.filter_w - 1) + 1;
    let padded_h = input_h + call.pad_top + call.pad_bottom;
    let padded_w = input_w + call.pad_left + call.pad_right;
    if padded_h < span_h || padded_w < span_w {
        return Err(TensorError::ShapeMismatch {
            expected: vec![span_h, span_w],
            got: vec![padded_h, padded_w],
        });
    }
    let out_h = (padded_h - span_h) / call.stride_h + 1;
    let out_w = (padded_w - span_w) / call.stride_w + 1;
    if out_h != call.output_h || out_w != call.output_w {
        return Err(TensorError::ShapeMismatch {
            expected: vec![out_h, out_w],
            got: vec![call.output_h, call.output_w],
        });
    }

    let in_extent = channels * input_h * input_w;
    let out_extent = channels * call.filter_h * call.filter_w * call.output_h * call.output_w;
    check_region(call.input_offset, in_extent, input.numel())?;
    check_region(call.output_offset, out_extent, output.numel())?;

    let in_store = storage(input, env)?;
    let out_store = storage_mut(output, env)?;
    match call.precision {
        Precision::Fp32 => {
            let src = &in_store.as_f32_slice()?[call.input_offset..call.input_offset + in_extent];
            let dst = &mut out_store.as_f32_slice_mut()?
                [call.output_offset..call.output_offset + out_extent];
            kernels::im2col_f32(call, channels, input_h, input_w, src, dst);
        }
        Precision::Fp16 => {
            let src = &in_store.as_f16_slice()?[call.input_offset..call.input_offset + in_extent];
            let dst = &mut out_store.as_f16_slice_mut()?
                [call.output_offset..call.output_offset + out_extent];
            kernels::im2col_f16(call, channels, input_h, input_w, src, dst);
        }
    }
    Ok(())
}

/// Validate and run one GEMM call in the given environment.
pub(crate) fn gemm(
    env: Environment,
    call: &GemmCall,
    a: &TensorBuffer,
    b: &TensorBuffer,
    c: &mut TensorBuffer,
) -> Result<()> {
    if call.m == 0 || call.n == 0 || call.k == 0 {
        return Err(TensorError::GemmMismatch {
            m: call.m,
            n: call.n,
            k: call.k,
        });
    }
    check_precision(call.precision, a)?;
    check_precision(call.precision, b)?;
    check_precision(call.precision, c)?;

    // Stored dimensions of op(A)/op(B) before transposition.
    let (a_rows, a_cols) = if call.transpose_a {
        (call.k, call.m)
    } else {
        (call.m, call.k)
    };
    let (b_rows, b_cols) = if call.transpose_b {
        (call.n, call.k)
    } else {
        (call.k, call.n)
    };
    if call.lda < a_cols || call.ldb < b_cols || call.ldc < call.n {
        return Err(TensorError::GemmMismatch {
            m: call.m,
            n: call.n,
            k: call.k,
        });
    }
    let a_extent = (a_rows - 1) * call.lda + a_cols;
    let b_extent = (b_rows - 1) * call.ldb + b_cols;
    let c_extent = (call.m - 1) * call.ldc + call.n;
    check_region(call.a_offset, a_extent, a.numel())?;
    check_region(call.b_offset, b_extent, b.numel())?;
    check_region(call.c_offset, c_extent, c.numel())?;

    let a_store = storage(a, env)?;
    let b_store = storage(b, env)?;
    let c_store = storage_mut(c, env)?;
    match call.precision {
        Precision::Fp32 => kernels::gemm_f32(
            call.transpose_a,
            call.transpose_b,
            call.m,
            call.n,
            call.k,
            call.alpha,
            &a_store.as_f32_slice()?[call.a_offset..call.a_offset + a_extent],
            call.lda,
            &b_store.as_f32_slice()?[call.b_offset..call.b_offset + b_extent],
            call.ldb,
            call.beta,
            &mut c_store.as_f32_slice_mut()?[call.c_offset..call.c_offset + c_extent],
            call.ldc,
        ),
        Precision::Fp16 => kernels::gemm_f16(
            call.transpose_a,
            call.transpose_b,
            call.m,
            call.n,
            call.k,
            call.alpha,
            &a_store.as_f16_slice()?[call.a_offset..call.a_offset + a_extent],
            call.lda,
            &b_store.as_f16_slice()?[call.b_offset..call.b_offset + b_extent],
            call.ldb,
            call.beta,
            &mut c_store.as_f16_slice_mut()?[call.c_offset..call.c_offset + c_extent],
            call.ldc,
        ),
    }
    Ok(())
}
