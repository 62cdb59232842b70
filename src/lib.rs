pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod lagrange;
pub mod mesh;
pub mod timestep;

/// Floating point representation used throughout the solver.
///
/// Double precision is the default; the `single-precision` feature swaps the
/// alias to `f32`. All root/abs/cbrt calls go through `Real` methods so the
/// correctly-typed variant is selected either way.
#[cfg(not(feature = "single-precision"))]
pub type Real = f64;
#[cfg(feature = "single-precision")]
pub type Real = f32;

pub use config::RunOptions;
pub use diagnostics::{final_summary, RunSummary};
pub use domain::{Domain, MaterialParameters, RegionPartition};
pub use error::SimulationError;
pub use exchange::{CommBufferSpec, FieldId, GhostExchange, MessageKind, NullExchange};
pub use lagrange::lagrange_leap_frog;
pub use mesh::{Connectivity, FaceAdjacency, HexElement, NodeElemMap, RankLayout};
pub use timestep::time_increment;
