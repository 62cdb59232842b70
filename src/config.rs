//! Command-line surface of the solver binary.

use clap::Parser;

/// Lagrangian shock hydrodynamics proxy driving the Sedov blast-wave
/// problem on a uniform hexahedral mesh.
#[derive(Debug, Clone, Parser)]
#[command(name = "sedov", version, about)]
pub struct RunOptions {
    /// Number of cycles to run; 0 runs to the physics stop time
    #[arg(short = 'i', long = "iterations", default_value_t = 0)]
    pub iterations: u32,

    /// Elements along each edge of the per-rank subdomain
    #[arg(short = 's', long = "size", default_value_t = 30)]
    pub edge_elems: usize,

    /// Number of material-like regions
    #[arg(short = 'r', long = "regions", default_value_t = 11)]
    pub num_regions: usize,

    /// Region size balance exponent (larger skews region sizes harder)
    #[arg(short = 'b', long = "balance", default_value_t = 1)]
    pub balance: u32,

    /// Extra EOS work multiplier on each rank's designated region
    #[arg(short = 'c', long = "cost", default_value_t = 1)]
    pub cost: u32,

    /// Number of visualization output files
    #[arg(short = 'f', long = "files", default_value_t = 0)]
    pub num_files: u32,

    /// Print a progress line every cycle
    #[arg(short = 'p', long = "progress")]
    pub show_progress: bool,

    /// Suppress run chatter
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Write a visualization dump at the end of the run
    #[arg(short = 'v', long = "viz")]
    pub viz: bool,
}
