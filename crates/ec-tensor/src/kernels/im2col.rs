use half::f16;

use crate::backend::Im2ColCall;

/// NCHW im2col: unfold one batch element's sliding convolution windows into
/// a [channels * filter_h * filter_w, output_h * output_w] column matrix.
///
/// `input` is the batch element's [channels, input_h, input_w] data and
/// `output` the column matrix region, both pre-offset by the caller. Taps
/// that fall in the padding band write zero.
pub fn im2col_f32(
    call: &Im2ColCall,
    channels: usize,
    input_h: usize,
    input_w: usize,
    input: &[f32],
    output: &mut [f32],
) {
    let out_plane = call.output_h * call.output_w;
    for c in 0..channels {
        for ki in 0..call.filter_h {
            for kj in 0..call.filter_w {
                let row = c * call.filter_h * call.filter_w + ki * call.filter_w + kj;
                for oh in 0..call.output_h {
                    let ih = (oh * call.stride_h + ki * call.dilation_h) as isize
                        - call.pad_top as isize;
                    for ow in 0..call.output_w {
                        let iw = (ow * call.stride_w + kj * call.dilation_w) as isize
                            - call.pad_left as isize;
                        let val = if ih >= 0
                            && (ih as usize) < input_h
                            && iw >= 0
                            && (iw as usize) < input_w
                        {
                            input[(c * input_h + ih as usize) * input_w + iw as usize]
                        } else {
                            0.0
                        };
                        output[row * out_plane + oh * call.output_w + ow] = val;
                    }
                }
            }
        }
    }
}

/// Half-precision im2col; identical addressing to [`im2col_f32`].
pub fn im2col_f16(
    call: &Im2ColCall,
    channels: usize,
    input_h: usize,
    input_w: usize,
    input: &[f16],
    output: &mut [f16],
) {
    let out_plane = call.output_h * call.output_w;
    for c in 0..channels {
        for ki in 0..call.filter_h {
            for kj in 0..call.filter_w {
                let row = c * call.filter_h * call.filter_w + ki * call.filter_w + kj;
                for oh in 0..call.output_h {
                    let ih = (oh * call.stride_h + ki * call.dilation_h) as isize
                        - call.pad_top as isize;
                    for ow in 0..call.output_w {
                        let iw = (ow * call.stride_w + kj * call.dilation_w) as isize
                            - call.pad_left as isize;
                        let val = if ih >= 0
                            && (ih as usize) < input_h
                            && iw >= 0
                            && (iw as usize) < input_w
                        {
                            input[(c * input_h + ih as usize) * input_w + iw as usize]
                        } else {
                            f16::ZERO
                        };
                        output[row * out_plane + oh * call.output_w + ow] = val;
                    }
                }
            }
        }
    }
}
