use ec_tensor::backend::{ExecutionBackend, GemmCall, GemmEvent, Im2ColCall, TensorLayout};
use ec_tensor::dtype::Precision;
use ec_tensor::{Shape, TensorBuffer, TensorError};

use crate::error::{LayerError, Result};

/// Hyperparameters of a convolution layer.
///
/// `out_h`/`out_w` are the declared spatial output dimensions; together with
/// the padding they are taken as given rather than re-derived, the way the
/// surrounding framework's model loader configures layers. `out_channels`
/// must equal the number of filters.
#[derive(Debug, Clone)]
pub struct ConvConfig {
    pub name: String,
    pub channels: usize,
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
    pub layout: TensorLayout,
    pub precision: Precision,
    pub out_channels: usize,
    pub out_h: usize,
    pub out_w: usize,
}

/// A convolution layer lowered to im2col followed by per-batch GEMMs.
///
/// Owns its filter weights ([out_channels, channels, filter_h, filter_w])
/// and optional per-filter biases ([out_channels]) for its lifetime; each
/// forward call returns a freshly owned output buffer.
#[derive(Debug)]
pub struct ConvLayer {
    config: ConvConfig,
    filters: TensorBuffer,
    biases: Option<TensorBuffer>,
}

impl ConvLayer {
    /// Create a layer from its configuration and weight buffers.
    ///
    /// # Errors
    /// Returns an error if the filter or bias shapes or precisions do not
    /// match the configuration.
    pub fn new(
        config: ConvConfig,
        filters: TensorBuffer,
        biases: Option<TensorBuffer>,
    ) -> Result<Self> {
        let expected = vec![
            config.out_channels,
            config.channels,
            config.filter_h,
            config.filter_w,
        ];
        if filters.shape().dims() != expected.as_slice() {
            return Err(TensorError::ShapeMismatch {
                expected,
                got: filters.shape().dims().to_vec(),
            }
            .into());
        }
        if filters.precision() != config.precision {
            return Err(TensorError::PrecisionMismatch {
                expected: config.precision,
                got: filters.precision(),
            }
            .into());
        }
        if let Some(b) = &biases {
            if b.shape().dims() != &[config.out_channels] {
                return Err(TensorError::ShapeMismatch {
                    expected: vec![config.out_channels],
                    got: b.shape().dims().to_vec(),
                }
                .into());
            }
            if b.precision() != config.precision {
                return Err(TensorError::PrecisionMismatch {
                    expected: config.precision,
                    got: b.precision(),
                }
                .into());
            }
        }
        Ok(ConvLayer {
            config,
            filters,
            biases,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Run the convolution over a [batch, channels, h, w] input.
    ///
    /// The output is allocated in the input's environment and precision with
    /// shape [batch, out_channels, out_h, out_w]. A backend primitive
    /// failure marks the output corrupted, aborts the remaining batch work
    /// and still returns the partial output; already-computed batches keep
    /// their values and untouched batches stay zero. Callers must check
    /// `is_corrupted()` before trusting the result.
    pub fn forward(
        &self,
        input: &TensorBuffer,
        backend: &dyn ExecutionBackend,
    ) -> Result<TensorBuffer> {
        let cfg = &self.config;
        if cfg.layout != TensorLayout::Nchw {
            return Err(LayerError::UnimplementedLayout {
                layer: cfg.name.clone(),
                layout: cfg.layout,
            });
        }
        if input.environment() != backend.environment() {
            return Err(LayerError::EnvironmentMismatch {
                layer: cfg.name.clone(),
                expected: backend.environment(),
                got: input.environment(),
            });
        }
        if self.filters.environment() != backend.environment() {
            return Err(LayerError::EnvironmentMismatch {
                layer: cfg.name.clone(),
                expected: backend.environment(),
                got: self.filters.environment(),
            });
        }
        if input.shape().ndim() != 4 || input.dim(1) != cfg.channels {
            return Err(TensorError::ShapeMismatch {
                expected: vec![0, cfg.channels, 0, 0],
                got: input.shape().dims().to_vec(),
            }
            .into());
        }
        if input.precision() != cfg.precision {
            return Err(TensorError::PrecisionMismatch {
                expected: cfg.precision,
                got: input.precision(),
            }
            .into());
        }

        let batch = input.dim(0);
        let env = input.environment();
        let mut output = TensorBuffer::new(
            Shape::new(vec![batch, cfg.out_channels, cfg.out_h, cfg.out_w]),
            env,
            cfg.precision,
            None,
        )?;

        let m = cfg.out_channels;
        let k = cfg.channels * cfg.filter_h * cfg.filter_w;
        let n = cfg.out_h * cfg.out_w;
        let in_plane = cfg.channels * input.dim(2) * input.dim(3);
        let out_plane = cfg.out_channels * cfg.out_h * cfg.out_w;

        let mut im2col = TensorBuffer::new(
            Shape::new(vec![batch, k, cfg.out_h, cfg.out_w]),
            env,
            cfg.precision,
            None,
        )?;
        for b in 0..batch {
            let call = Im2ColCall {
                layout: cfg.layout,
                precision: cfg.precision,
                input_offset: b * in_plane,
                filter_h: cfg.filter_h,
                filter_w: cfg.filter_w,
                stride_h: cfg.stride_h,
                stride_w: cfg.stride_w,
                pad_left: cfg.pad_left,
                pad_top: cfg.pad_top,
                pad_right: cfg.pad_right,
                pad_bottom: cfg.pad_bottom,
                dilation_h: cfg.dilation_h,
                dilation_w: cfg.dilation_w,
                output_h: cfg.out_h,
                output_w: cfg.out_w,
                output_offset: b * k * n,
            };
            if let Err(e) = backend.im2col(&call, input, &mut im2col) {
                log::error!("[{}] im2col failed for batch {}: {}", cfg.name, b, e);
                output.mark_corrupted();
                return Ok(output);
            }
        }

        // Ones vector for the rank-1 bias broadcast, allocated once per call.
        let ones = match &self.biases {
            Some(_) => Some(TensorBuffer::new(
                Shape::new(vec![n]),
                env,
                cfg.precision,
                Some(&vec![1.0; n]),
            )?),
            None => None,
        };

        for b in 0..batch {
            let call = GemmCall {
                precision: cfg.precision,
                transpose_a: false,
                transpose_b: false,
                m,
                n,
                k,
                alpha: 1.0,
                a_offset: 0,
                lda: k,
                b_offset: b * k * n,
                ldb: n,
                beta: 0.0,
                c_offset: b * out_plane,
                ldc: n,
            };
            let status = backend
                .gemm(&call, &self.filters, &im2col, &mut output)
                .and_then(GemmEvent::wait);
            if let Err(e) = status {
                log::error!("[{}] gemm_1 failed for batch {}: {}", cfg.name, b, e);
                output.mark_corrupted();
                break;
            }

            if let (Some(biases), Some(ones)) = (&self.biases, &ones) {
                let call = GemmCall {
                    precision: cfg.precision,
                    transpose_a: false,
                    transpose_b: false,
                    m,
                    n,
                    k: 1,
                    alpha: 1.0,
                    a_offset: 0,
                    lda: 1,
                    b_offset: 0,
                    ldb: n,
                    beta: 1.0,
                    c_offset: b * out_plane,
                    ldc: n,
                };
                let status = backend
                    .gemm(&call, biases, ones, &mut output)
                    .and_then(GemmEvent::wait);
                if let Err(e) = status {
                    log::error!("[{}] gemm_2 failed for batch {}: {}", cfg.name, b, e);
                    output.mark_corrupted();
                    break;
                }
            }
        }

        // im2col and ones buffers drop here.
        Ok(output)
    }
}
