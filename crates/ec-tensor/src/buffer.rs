use crate::dtype::{Environment, Precision};
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::storage::BufferStorage;

/// A shaped, typed block of data resident in exactly one compute environment.
///
/// A buffer's shape, environment and precision are fixed at construction.
/// Layers allocate one for their output on each forward call and hand
/// ownership to the caller; weights are buffers owned by the layer itself.
///
/// The `corrupted` flag is sticky: a backend primitive failure during the
/// computation that produced this buffer sets it, and nothing ever clears it.
/// It is the caller's sole authoritative signal that the contents are
/// unreliable.
#[derive(Debug, Clone)]
pub struct TensorBuffer {
    shape: Shape,
    environment: Environment,
    precision: Precision,
    storage: BufferStorage,
    corrupted: bool,
}

impl TensorBuffer {
    /// Create a new buffer.
    ///
    /// `initial` is host-side f32 data copied (and converted, for Fp16
    /// buffers) into the backing storage; `None` zero-fills.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if `initial` is present and its length does
    /// not equal the shape's element count.
    pub fn new(
        shape: Shape,
        environment: Environment,
        precision: Precision,
        initial: Option<&[f32]>,
    ) -> Result<Self> {
        let n = shape.numel();
        let storage = match initial {
            Some(data) => {
                if data.len() != n {
                    return Err(TensorError::ShapeMismatch {
                        expected: shape.dims().to_vec(),
                        got: vec![data.len()],
                    });
                }
                BufferStorage::from_f32(precision, data)
            }
            None => BufferStorage::zeros(precision, n),
        };
        Ok(TensorBuffer {
            shape,
            environment,
            precision,
            storage,
            corrupted: false,
        })
    }

    /// Returns a reference to the buffer's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the size of dimension `i`.
    ///
    /// # Panics
    /// Panics if `i` is out of range for the shape.
    pub fn dim(&self, i: usize) -> usize {
        self.shape.dim(i)
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Environment this buffer is resident in.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Numeric precision of the elements.
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Raw host-side storage.
    ///
    /// # Errors
    /// Returns `WrongEnvironment` if the buffer is device-resident.
    pub fn host_data(&self) -> Result<&BufferStorage> {
        self.data(Environment::Host)
    }

    /// Mutable host-side storage.
    ///
    /// # Errors
    /// Returns `WrongEnvironment` if the buffer is device-resident.
    pub fn host_data_mut(&mut self) -> Result<&mut BufferStorage> {
        self.data_mut(Environment::Host)
    }

    /// Raw device-side storage.
    ///
    /// # Errors
    /// Returns `WrongEnvironment` if the buffer is host-resident.
    pub fn device_data(&self) -> Result<&BufferStorage> {
        self.data(Environment::Device)
    }

    /// Mutable device-side storage.
    ///
    /// # Errors
    /// Returns `WrongEnvironment` if the buffer is host-resident.
    pub fn device_data_mut(&mut self) -> Result<&mut BufferStorage> {
        self.data_mut(Environment::Device)
    }

    fn data(&self, requested: Environment) -> Result<&BufferStorage> {
        if self.environment != requested {
            return Err(TensorError::WrongEnvironment {
                requested,
                actual: self.environment,
            });
        }
        Ok(&self.storage)
    }

    fn data_mut(&mut self, requested: Environment) -> Result<&mut BufferStorage> {
        if self.environment != requested {
            return Err(TensorError::WrongEnvironment {
                requested,
                actual: self.environment,
            });
        }
        Ok(&mut self.storage)
    }

    /// True if a backend primitive failed while producing this buffer.
    pub fn is_corrupted(&self) -> bool {
        self.corrupted
    }

    /// Marks the buffer corrupted. Set-once; there is no way to clear it.
    pub fn mark_corrupted(&mut self) {
        self.corrupted = true;
    }
}
