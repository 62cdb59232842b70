//! Ghost exchange interface between the core and whatever transport carries
//! boundary data between ranks.
//!
//! The core never talks to a network; it drives the four operations below at
//! its three per-cycle suspension points and expects the transport to have
//! filled (or summed into) the named fields by the time the matching apply
//! call returns. A single-rank run plugs in [`NullExchange`], which does
//! nothing at all.

use crate::domain::Domain;
use crate::mesh::RankLayout;
use crate::Real;

/// Fields at most one exchange message ever carries.
pub const MAX_FIELDS_PER_EXCHANGE: usize = 6;

/// Reals per assumed 128-byte coherence line; corner messages are padded to
/// this so neighboring buffers never share a line.
pub const CACHE_COHERENCE_PAD: usize = 128 / std::mem::size_of::<Real>();

fn cache_align(n: usize) -> usize {
    (n + CACHE_COHERENCE_PAD - 1) & !(CACHE_COHERENCE_PAD - 1)
}

/// The three message families the cycle produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Sum-of-nodal-quantities (forces, lumped masses): contributions from
    /// every rank sharing a boundary node are accumulated
    NodalSum,
    /// Position/velocity synchronization after the nodal advance
    PositionVelocitySync,
    /// Monotonic-q velocity gradients copied into element ghost slots
    MonotonicQGradients,
}

/// Field selectors an exchange message can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldId {
    CoordX,
    CoordY,
    CoordZ,
    VelX,
    VelY,
    VelZ,
    ForceX,
    ForceY,
    ForceZ,
    NodalMass,
    DelvXi,
    DelvEta,
    DelvZeta,
}

/// The transport collaborator the core requires.
///
/// Implementations pair non-blocking receives with sends and complete them
/// in the apply calls; `apply_sum` accumulates into local boundary nodes,
/// `apply_copy` overwrites ghost slots. `reduce_min` is the collective the
/// time controller uses to agree on the next step; the default is the
/// single-rank identity.
pub trait GhostExchange {
    /// Post receives for an upcoming message of `kind` carrying
    /// `num_fields` fields.
    fn post_receives(
        &mut self,
        domain: &Domain,
        kind: MessageKind,
        num_fields: usize,
        plane_only: bool,
    );

    /// Pack the named fields from the domain boundary and send them to every
    /// neighbor.
    fn send(&mut self, domain: &Domain, kind: MessageKind, fields: &[FieldId], plane_only: bool);

    /// Wait for the posted receives and accumulate into the local fields.
    fn apply_sum(&mut self, domain: &mut Domain, fields: &[FieldId]);

    /// Wait for the posted receives and overwrite ghost slots.
    fn apply_copy(&mut self, domain: &mut Domain, fields: &[FieldId]);

    /// Global minimum across ranks.
    fn reduce_min(&mut self, value: Real) -> Real {
        value
    }
}

/// The no-op transport for single-rank runs: every boundary face is a
/// symmetry or free surface, so there is nothing to move.
pub struct NullExchange;

impl GhostExchange for NullExchange {
    fn post_receives(
        &mut self,
        _domain: &Domain,
        _kind: MessageKind,
        _num_fields: usize,
        _plane_only: bool,
    ) {
    }

    fn send(
        &mut self,
        _domain: &Domain,
        _kind: MessageKind,
        _fields: &[FieldId],
        _plane_only: bool,
    ) {
    }

    fn apply_sum(&mut self, _domain: &mut Domain, _fields: &[FieldId]) {}

    fn apply_copy(&mut self, _domain: &mut Domain, _fields: &[FieldId]) {}
}

/// Send/receive buffer capacities for one subdomain, sized once at setup.
///
/// A rank talks to up to 6 face, 12 edge and 8 corner neighbors; each
/// message slot is cache-line aligned so concurrent packers never share a
/// line, and every slot is sized for the largest message family
/// ([`MAX_FIELDS_PER_EXCHANGE`] fields).
#[derive(Debug, Clone, Copy)]
pub struct CommBufferSpec {
    pub max_plane_size: usize,
    pub max_edge_size: usize,
    /// Total reals per direction (send and receive each need this much)
    pub capacity: usize,
}

impl CommBufferSpec {
    pub fn for_subdomain(layout: &RankLayout, nx: usize) -> Self {
        let edge_nodes = nx + 1;
        let max_plane_size = cache_align(edge_nodes * edge_nodes);
        let max_edge_size = cache_align(edge_nodes);

        let rmin = !layout.on_min_row() as usize;
        let rmax = !layout.on_max_row() as usize;
        let cmin = !layout.on_min_col() as usize;
        let cmax = !layout.on_max_col() as usize;
        let pmin = !layout.on_min_plane() as usize;
        let pmax = !layout.on_max_plane() as usize;

        let faces = rmin + rmax + cmin + cmax + pmin + pmax;
        let edges = (rmin & cmin)
            + (rmin & pmin)
            + (cmin & pmin)
            + (rmax & cmax)
            + (rmax & pmax)
            + (cmax & pmax)
            + (rmax & cmin)
            + (rmin & pmax)
            + (cmin & pmax)
            + (rmin & cmax)
            + (rmax & pmin)
            + (cmax & pmin);
        let corners = (rmin & cmin & pmin)
            + (rmin & cmin & pmax)
            + (rmin & cmax & pmin)
            + (rmin & cmax & pmax)
            + (rmax & cmin & pmin)
            + (rmax & cmin & pmax)
            + (rmax & cmax & pmin)
            + (rmax & cmax & pmax);

        let capacity = faces * max_plane_size * MAX_FIELDS_PER_EXCHANGE
            + edges * max_edge_size * MAX_FIELDS_PER_EXCHANGE
            + corners * CACHE_COHERENCE_PAD;

        Self {
            max_plane_size,
            max_edge_size,
            capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_rank_needs_no_buffers() {
        let layout = RankLayout::new(0, 1).unwrap();
        let spec = CommBufferSpec::for_subdomain(&layout, 10);
        assert_eq!(spec.capacity, 0);
    }

    #[test]
    fn interior_rank_talks_to_all_26_neighbors() {
        let layout = RankLayout::new(13, 27).unwrap();
        let spec = CommBufferSpec::for_subdomain(&layout, 10);

        let expected = 6 * spec.max_plane_size * MAX_FIELDS_PER_EXCHANGE
            + 12 * spec.max_edge_size * MAX_FIELDS_PER_EXCHANGE
            + 8 * CACHE_COHERENCE_PAD;
        assert_eq!(spec.capacity, expected);
    }

    #[test]
    fn corner_rank_of_the_cube_talks_to_seven() {
        let layout = RankLayout::new(0, 27).unwrap();
        let spec = CommBufferSpec::for_subdomain(&layout, 4);

        let expected = 3 * spec.max_plane_size * MAX_FIELDS_PER_EXCHANGE
            + 3 * spec.max_edge_size * MAX_FIELDS_PER_EXCHANGE
            + CACHE_COHERENCE_PAD;
        assert_eq!(spec.capacity, expected);
    }

    #[test]
    fn buffer_sizes_are_cache_aligned() {
        let layout = RankLayout::new(13, 27).unwrap();
        let spec = CommBufferSpec::for_subdomain(&layout, 7);
        assert_eq!(spec.max_plane_size % CACHE_COHERENCE_PAD, 0);
        assert_eq!(spec.max_edge_size % CACHE_COHERENCE_PAD, 0);
        assert!(spec.max_plane_size >= 64);
    }

    #[test]
    fn message_field_counts_fit_the_pad() {
        // the startup validation depends on this relation
        assert!(MAX_FIELDS_PER_EXCHANGE <= CACHE_COHERENCE_PAD);
    }
}
