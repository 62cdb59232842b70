//! Rank-cube decomposition of the global problem.
//!
//! The global mesh is a cube of t x t x t subdomains, one per rank, so the
//! rank count must be a perfect integer cube. Anything else is rejected at
//! startup before any allocation happens.

use crate::error::SimulationError;
use crate::exchange;
use crate::Real;

/// Placement of one rank's subdomain inside the t x t x t cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankLayout {
    pub rank: usize,
    pub num_ranks: usize,
    /// Subdomains per global edge (t)
    pub side: usize,
    pub col: usize,
    pub row: usize,
    pub plane: usize,
}

impl RankLayout {
    /// Locate `rank` inside the cube decomposition of `num_ranks` subdomains.
    ///
    /// Fails when the rank count is not a perfect cube, when `Real` is not a
    /// 32- or 64-bit type, or when the exchange buffer constants are
    /// inconsistent.
    pub fn new(rank: usize, num_ranks: usize) -> Result<Self, SimulationError> {
        let side = (num_ranks as f64).cbrt().round() as usize;
        if side * side * side != num_ranks {
            return Err(SimulationError::InvalidConfiguration(format!(
                "rank count must be a cube of an integer (1, 8, 27, ...), got {num_ranks}"
            )));
        }
        if rank >= num_ranks {
            return Err(SimulationError::InvalidConfiguration(format!(
                "rank {rank} out of range for {num_ranks} ranks"
            )));
        }

        let real_bytes = std::mem::size_of::<Real>();
        if real_bytes != 4 && real_bytes != 8 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "ghost exchange supports 32- and 64-bit reals only, got {} bytes",
                real_bytes
            )));
        }
        if exchange::MAX_FIELDS_PER_EXCHANGE > exchange::CACHE_COHERENCE_PAD {
            return Err(SimulationError::InvalidConfiguration(
                "corner exchange buffers smaller than the field count; \
                 adjust MAX_FIELDS_PER_EXCHANGE or the coherence pad"
                    .to_string(),
            ));
        }

        Ok(Self {
            rank,
            num_ranks,
            side,
            col: rank % side,
            row: (rank / side) % side,
            plane: rank / (side * side),
        })
    }

    /// True when this subdomain sits at the global origin corner.
    pub fn at_global_origin(&self) -> bool {
        self.col + self.row + self.plane == 0
    }

    pub fn on_min_col(&self) -> bool {
        self.col == 0
    }
    pub fn on_max_col(&self) -> bool {
        self.col == self.side - 1
    }
    pub fn on_min_row(&self) -> bool {
        self.row == 0
    }
    pub fn on_max_row(&self) -> bool {
        self.row == self.side - 1
    }
    pub fn on_min_plane(&self) -> bool {
        self.plane == 0
    }
    pub fn on_max_plane(&self) -> bool {
        self.plane == self.side - 1
    }
}
