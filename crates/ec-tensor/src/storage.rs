use half::f16;

use crate::dtype::Precision;
use crate::error::{Result, TensorError};

/// Backing storage for a tensor buffer, one variant per supported precision.
#[derive(Debug, Clone)]
pub enum BufferStorage {
    /// 32-bit floating point storage.
    F32(Vec<f32>),
    /// 16-bit floating point storage.
    F16(Vec<f16>),
}

impl BufferStorage {
    /// Number of elements in this storage.
    pub fn len(&self) -> usize {
        match self {
            BufferStorage::F32(v) => v.len(),
            BufferStorage::F16(v) => v.len(),
        }
    }

    /// Returns true if the storage contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the precision of this storage.
    pub fn precision(&self) -> Precision {
        match self {
            BufferStorage::F32(_) => Precision::Fp32,
            BufferStorage::F16(_) => Precision::Fp16,
        }
    }

    /// Returns the data as an f32 slice.
    ///
    /// # Errors
    /// Returns an error if the storage is not Fp32.
    pub fn as_f32_slice(&self) -> Result<&[f32]> {
        match self {
            BufferStorage::F32(v) => Ok(v.as_slice()),
            other => Err(TensorError::PrecisionMismatch {
                expected: Precision::Fp32,
                got: other.precision(),
            }),
        }
    }

    /// Returns the data as a mutable f32 slice.
    ///
    /// # Errors
    /// Returns an error if the storage is not Fp32.
    pub fn as_f32_slice_mut(&mut self) -> Result<&mut [f32]> {
        match self {
            BufferStorage::F32(v) => Ok(v.as_mut_slice()),
            other => Err(TensorError::PrecisionMismatch {
                expected: Precision::Fp32,
                got: other.precision(),
            }),
        }
    }

    /// Returns the data as an f16 slice.
    ///
    /// # Errors
    /// Returns an error if the storage is not Fp16.
    pub fn as_f16_slice(&self) -> Result<&[f16]> {
        match self {
            BufferStorage::F16(v) => Ok(v.as_slice()),
            other => Err(TensorError::PrecisionMismatch {
                expected: Precision::Fp16,
                got: other.precision(),
            }),
        }
    }

    /// Returns the data as a mutable f16 slice.
    ///
    /// # Errors
    /// Returns an error if the storage is not Fp16.
    pub fn as_f16_slice_mut(&mut self) -> Result<&mut [f16]> {
        match self {
            BufferStorage::F16(v) => Ok(v.as_mut_slice()),
            other => Err(TensorError::PrecisionMismatch {
                expected: Precision::Fp16,
                got: other.precision(),
            }),
        }
    }

    /// Create zero-filled storage for the given precision and element count.
    pub fn zeros(precision: Precision, n: usize) -> Self {
        match precision {
            Precision::Fp32 => BufferStorage::F32(vec![0.0; n]),
            Precision::Fp16 => BufferStorage::F16(vec![f16::ZERO; n]),
        }
    }

    /// Create storage from f32 host data, converting to f16 if needed.
    pub fn from_f32(precision: Precision, data: &[f32]) -> Self {
        match precision {
            Precision::Fp32 => BufferStorage::F32(data.to_vec()),
            Precision::Fp16 => {
                BufferStorage::F16(data.iter().map(|&v| f16::from_f32(v)).collect())
            }
        }
    }
}
