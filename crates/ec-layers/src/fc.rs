use ec_tensor::backend::{ExecutionBackend, GemmCall, GemmEvent};
use ec_tensor::dtype::{Environment, Precision};
use ec_tensor::{Shape, TensorBuffer, TensorError};

use crate::error::{LayerError, Result};

/// A fully-connected layer: one dense GEMM over the whole batch.
///
/// The host path is f32 only. Input is [batch, input_size] and the output
/// [batch, num_neurons] is computed as `input × filtersᵀ` in a single GEMM;
/// the whole batch is expressed as rows of that product, so no per-batch
/// loop is needed.
#[derive(Debug)]
pub struct FcLayer {
    name: String,
    num_neurons: usize,
    input_size: usize,
    filters: TensorBuffer,
    biases: Option<TensorBuffer>,
}

impl FcLayer {
    /// Create a layer from its weight buffers.
    ///
    /// `filters` must be a host-resident f32 [num_neurons, input_size]
    /// buffer; `biases`, if present, [num_neurons].
    pub fn new(
        name: impl Into<String>,
        num_neurons: usize,
        input_size: usize,
        filters: TensorBuffer,
        biases: Option<TensorBuffer>,
    ) -> Result<Self> {
        let name = name.into();
        if filters.shape().dims() != &[num_neurons, input_size] {
            return Err(TensorError::ShapeMismatch {
                expected: vec![num_neurons, input_size],
                got: filters.shape().dims().to_vec(),
            }
            .into());
        }
        if filters.environment() != Environment::Host {
            return Err(LayerError::EnvironmentMismatch {
                layer: name,
                expected: Environment::Host,
                got: filters.environment(),
            });
        }
        if filters.precision() != Precision::Fp32 {
            return Err(TensorError::PrecisionMismatch {
                expected: Precision::Fp32,
                got: filters.precision(),
            }
            .into());
        }
        if let Some(b) = &biases {
            if b.shape().dims() != &[num_neurons] {
                return Err(TensorError::ShapeMismatch {
                    expected: vec![num_neurons],
                    got: b.shape().dims().to_vec(),
                }
                .into());
            }
            if b.environment() != Environment::Host {
                return Err(LayerError::EnvironmentMismatch {
                    layer: name,
                    expected: Environment::Host,
                    got: b.environment(),
                });
            }
        }
        Ok(FcLayer {
            name,
            num_neurons,
            input_size,
            filters,
            biases,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the layer over exactly one input buffer.
    ///
    /// Any other input count is a contract violation: it is logged and
    /// reported as `InvalidInputCount` without touching any buffer. A GEMM
    /// failure marks the output corrupted and returns it, mirroring the
    /// convolution layer's fail-fast contract.
    pub fn forward(
        &self,
        inputs: &[TensorBuffer],
        backend: &dyn ExecutionBackend,
    ) -> Result<TensorBuffer> {
        if inputs.len() != 1 {
            log::error!(
                "[{}] expects exactly 1 input tensor, got {}",
                self.name,
                inputs.len()
            );
            return Err(LayerError::InvalidInputCount {
                layer: self.name.clone(),
                got: inputs.len(),
            });
        }
        let input = &inputs[0];
        if backend.environment() != Environment::Host {
            return Err(LayerError::EnvironmentMismatch {
                layer: self.name.clone(),
                expected: Environment::Host,
                got: backend.environment(),
            });
        }
        if input.environment() != Environment::Host {
            return Err(LayerError::EnvironmentMismatch {
                layer: self.name.clone(),
                expected: Environment::Host,
                got: input.environment(),
            });
        }
        if input.shape().ndim() != 2 || input.dim(1) != self.input_size {
            return Err(TensorError::ShapeMismatch {
                expected: vec![0, self.input_size],
                got: input.shape().dims().to_vec(),
            }
            .into());
        }
        if input.precision() != Precision::Fp32 {
            return Err(TensorError::PrecisionMismatch {
                expected: Precision::Fp32,
                got: input.precision(),
            }
            .into());
        }

        let batch = input.dim(0);
        let n = self.num_neurons;
        let k = self.input_size;
        let mut output = TensorBuffer::new(
            Shape::new(vec![batch, n]),
            Environment::Host,
            Precision::Fp32,
            None,
        )?;

        let call = GemmCall {
            precision: Precision::Fp32,
            transpose_a: false,
            transpose_b: true,
            m: batch,
            n,
            k,
            alpha: 1.0,
            a_offset: 0,
            lda: k,
            b_offset: 0,
            ldb: k,
            beta: 0.0,
            c_offset: 0,
            ldc: n,
        };
        let status = backend
            .gemm(&call, input, &self.filters, &mut output)
            .and_then(GemmEvent::wait);
        if let Err(e) = status {
            log::error!("[{}] gemm_1 failed: {}", self.name, e);
            output.mark_corrupted();
            return Ok(output);
        }

        if let Some(biases) = &self.biases {
            let ones = TensorBuffer::new(
                Shape::new(vec![batch]),
                Environment::Host,
                Precision::Fp32,
                Some(&vec![1.0; batch]),
            )?;
            let call = GemmCall {
                precision: Precision::Fp32,
                transpose_a: false,
                transpose_b: false,
                m: batch,
                n,
                k: 1,
                alpha: 1.0,
                a_offset: 0,
                lda: 1,
                b_offset: 0,
                ldb: n,
                beta: 1.0,
                c_offset: 0,
                ldc: n,
            };
            let status = backend
                .gemm(&call, &ones, biases, &mut output)
                .and_then(GemmEvent::wait);
            if let Err(e) = status {
                log::error!("[{}] gemm_2 failed: {}", self.name, e);
                output.mark_corrupted();
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CountingBackend, FailingBackend};
    use ec_tensor::HostBackend;

    fn host_buf(dims: Vec<usize>, data: &[f32]) -> TensorBuffer {
        TensorBuffer::new(
            Shape::new(dims),
            Environment::Host,
            Precision::Fp32,
            Some(data),
        )
        .unwrap()
    }

    /// filters[j][i] = 1 when i == j: output row is the first `neurons`
    /// elements of the input row.
    fn identity_filters(neurons: usize, input_size: usize) -> TensorBuffer {
        let mut data = vec![0.0; neurons * input_size];
        for j in 0..neurons {
            data[j * input_size + j] = 1.0;
        }
        host_buf(vec![neurons, input_size], &data)
    }

    #[test]
    fn test_output_shape() {
        let layer = FcLayer::new("fc1", 5, 10, identity_filters(5, 10), None).unwrap();
        let input = host_buf(vec![3, 10], &vec![0.5; 30]);
        let out = layer.forward(&[input], &HostBackend::new()).unwrap();
        assert_eq!(out.shape().dims(), &[3, 5]);
        assert!(!out.is_corrupted());
    }

    #[test]
    fn test_identity_filter_zero_bias_exact_product() {
        // batch 4, input_size 10, num_neurons 5, identity-like filter.
        let biases = host_buf(vec![5], &[0.0; 5]);
        let layer = FcLayer::new("fc1", 5, 10, identity_filters(5, 10), Some(biases)).unwrap();

        let data: Vec<f32> = (0..40).map(|v| v as f32).collect();
        let input = host_buf(vec![4, 10], &data);
        let out = layer.forward(&[input], &HostBackend::new()).unwrap();

        // input × filtersᵀ picks the first 5 columns of each row.
        let got = out.host_data().unwrap().as_f32_slice().unwrap();
        for row in 0..4 {
            for col in 0..5 {
                assert_eq!(got[row * 5 + col], (row * 10 + col) as f32);
            }
        }
        assert!(!out.is_corrupted());
    }

    #[test]
    fn test_bias_broadcast_per_neuron() {
        let biases = host_buf(vec![3], &[1.0, 2.0, 3.0]);
        let filters = host_buf(vec![3, 2], &[0.0; 6]);
        let layer = FcLayer::new("fc1", 3, 2, filters, Some(biases)).unwrap();

        let input = host_buf(vec![2, 2], &[9.0, 9.0, 9.0, 9.0]);
        let out = layer.forward(&[input], &HostBackend::new()).unwrap();
        assert_eq!(
            out.host_data().unwrap().as_f32_slice().unwrap(),
            &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn test_no_bias_issues_single_gemm() {
        let layer = FcLayer::new("fc1", 2, 2, identity_filters(2, 2), None).unwrap();
        let backend = CountingBackend::new();
        let input = host_buf(vec![2, 2], &[1.0, 2.0, 3.0, 4.0]);
        let out = layer.forward(&[input], &backend).unwrap();
        assert_eq!(backend.gemm_calls(), 1);
        assert_eq!(
            out.host_data().unwrap().as_f32_slice().unwrap(),
            &[1.0, 2.0, 3.0, 4.0]
        );
    }

    #[test]
    fn test_invalid_input_count_no_mutation() {
        let layer = FcLayer::new("fc1", 2, 2, identity_filters(2, 2), None).unwrap();
        let backend = HostBackend::new();

        let r = layer.forward(&[], &backend);
        assert!(matches!(r, Err(LayerError::InvalidInputCount { got: 0, .. })));

        let a = host_buf(vec![1, 2], &[1.0, 2.0]);
        let b = host_buf(vec![1, 2], &[3.0, 4.0]);
        let two = [a, b];
        let r = layer.forward(&two, &backend);
        assert!(matches!(r, Err(LayerError::InvalidInputCount { got: 2, .. })));
        // Inputs untouched.
        assert_eq!(
            two[0].host_data().unwrap().as_f32_slice().unwrap(),
            &[1.0, 2.0]
        );
        assert_eq!(
            two[1].host_data().unwrap().as_f32_slice().unwrap(),
            &[3.0, 4.0]
        );
    }

    #[test]
    fn test_gemm_failure_marks_output_corrupted() {
        let layer = FcLayer::new("fc1", 2, 2, identity_filters(2, 2), None).unwrap();
        let backend = FailingBackend::failing_gemm_at(0);
        let input = host_buf(vec![1, 2], &[1.0, 2.0]);
        let out = layer.forward(&[input], &backend).unwrap();
        assert!(out.is_corrupted());
        assert_eq!(out.host_data().unwrap().as_f32_slice().unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn test_bias_gemm_failure_keeps_product_but_corrupts() {
        let biases = host_buf(vec![2], &[1.0, 1.0]);
        let layer = FcLayer::new("fc1", 2, 2, identity_filters(2, 2), Some(biases)).unwrap();
        let backend = FailingBackend::failing_gemm_at(1);
        let input = host_buf(vec![1, 2], &[5.0, 6.0]);
        let out = layer.forward(&[input], &backend).unwrap();
        assert!(out.is_corrupted());
        // The first GEMM's result is retained; only the bias pass failed.
        assert_eq!(out.host_data().unwrap().as_f32_slice().unwrap(), &[5.0, 6.0]);
    }

    #[test]
    fn test_fractional_weights() {
        use approx::assert_relative_eq;
        let filters = host_buf(vec![1, 2], &[0.25, 0.75]);
        let layer = FcLayer::new("fc1", 1, 2, filters, None).unwrap();
        let input = host_buf(vec![1, 2], &[0.4, 0.8]);
        let out = layer.forward(&[input], &HostBackend::new()).unwrap();
        let got = out.host_data().unwrap().as_f32_slice().unwrap();
        assert_relative_eq!(got[0], 0.7, epsilon = 1e-6);
    }

    #[test]
    fn test_input_size_mismatch() {
        let layer = FcLayer::new("fc1", 2, 3, identity_filters(2, 3), None).unwrap();
        let input = host_buf(vec![1, 2], &[1.0, 2.0]);
        assert!(layer.forward(&[input], &HostBackend::new()).is_err());
    }
}
