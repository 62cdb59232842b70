use std::error;
use std::fmt;

/// Fatal conditions raised by the Lagrange cycle or at initialization.
///
/// None of these are recoverable: there is no rollback to an earlier cycle
/// and no element-local retry. A distributed transport must translate any of
/// them into a global abort so no rank is left waiting on a collective.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// An element's new volume came out nonpositive; the mesh has tangled.
    VolumeError { element: usize, volume: f64 },
    /// An element's artificial viscosity exceeded the runaway threshold.
    QStopError { element: usize, q: f64 },
    /// Rank count, real width, or buffer constants rejected at startup.
    InvalidConfiguration(String),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        use SimulationError::*;

        match self {
            VolumeError { element, volume } => {
                write!(fmt, "nonpositive volume {volume:e} in element {element}")
            }
            QStopError { element, q } => {
                write!(fmt, "artificial viscosity {q:e} exceeded qstop in element {element}")
            }
            InvalidConfiguration(msg) => write!(fmt, "invalid configuration: {msg}"),
        }
    }
}

impl error::Error for SimulationError {}

impl SimulationError {
    /// Process exit code reported by the driver for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SimulationError::VolumeError { .. } => 1,
            SimulationError::QStopError { .. } => 2,
            SimulationError::InvalidConfiguration(_) => 3,
        }
    }
}
