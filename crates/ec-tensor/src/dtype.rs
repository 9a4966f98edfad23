use std::fmt;

/// Numeric precision of a buffer's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    /// 32-bit floating point.
    Fp32,
    /// 16-bit floating point (IEEE 754 half-precision, via the `half` crate).
    Fp16,
}

impl Precision {
    /// Size in bytes of a single element at this precision.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            Precision::Fp32 => 4,
            Precision::Fp16 => 2,
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Fp32 => write!(f, "f32"),
            Precision::Fp16 => write!(f, "f16"),
        }
    }
}

/// Compute environment a buffer is resident in.
///
/// A buffer lives in exactly one environment for its whole lifetime; there is
/// no cross-environment copy in this core, so each layer allocates its output
/// in the environment of its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Host-accessible (CPU) memory.
    Host,
    /// Device (GPU) memory.
    Device,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Host => write!(f, "host"),
            Environment::Device => write!(f, "device"),
        }
    }
}
