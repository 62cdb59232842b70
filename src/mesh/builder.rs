//! Uniform hexahedral subdomain construction.
//!
//! Builds the node lattice, the canonical element connectivity, the axial
//! face adjacency with ghost extensions, the per-face boundary condition
//! masks, and the symmetry-plane node sets for one rank's subdomain of the
//! global cube.

use super::decomposition::RankLayout;
use super::topology::{face_bc, Connectivity, FaceAdjacency, HexElement};
use crate::Real;

/// Everything the builder needs to know about one subdomain.
#[derive(Debug, Clone, Copy)]
pub struct SubdomainSpec {
    /// Elements along one subdomain edge (nx)
    pub nx: usize,
    pub layout: RankLayout,
}

impl SubdomainSpec {
    pub fn num_elems(&self) -> usize {
        self.nx * self.nx * self.nx
    }

    pub fn num_nodes(&self) -> usize {
        let en = self.nx + 1;
        en * en * en
    }

    /// Elements along one edge of the whole problem (nx * t)
    pub fn global_edge_elems(&self) -> usize {
        self.nx * self.layout.side
    }
}

/// Ghost-slot layout appended past the local element range.
///
/// One contiguous block per communicating face, in the fixed order
/// zeta-, zeta+, eta-, eta+, xi-, xi+. An offset is present iff the
/// subdomain has a neighbor through that face.
#[derive(Debug, Clone, Copy, Default)]
pub struct GhostLayout {
    pub offsets: [Option<usize>; 6],
    pub total: usize,
}

/// Node coordinates for the subdomain lattice.
///
/// Spacing is 1.125/global_edge_elems by convention; every coordinate is
/// recomputed from integer lattice indices rather than accumulated, so no
/// roundoff drifts across the subdomain.
pub fn build_lattice(spec: &SubdomainSpec) -> (Vec<Real>, Vec<Real>, Vec<Real>) {
    let edge_nodes = spec.nx + 1;
    let mesh_edge = spec.global_edge_elems() as Real;
    let layout = spec.layout;

    let num_nodes = spec.num_nodes();
    let mut x = Vec::with_capacity(num_nodes);
    let mut y = Vec::with_capacity(num_nodes);
    let mut z = Vec::with_capacity(num_nodes);

    let coord = |block: usize, local: usize| -> Real {
        1.125 * ((block * spec.nx + local) as Real) / mesh_edge
    };

    for plane in 0..edge_nodes {
        let tz = coord(layout.plane, plane);
        for row in 0..edge_nodes {
            let ty = coord(layout.row, row);
            for col in 0..edge_nodes {
                x.push(coord(layout.col, col));
                y.push(ty);
                z.push(tz);
            }
        }
    }

    (x, y, z)
}

/// Embed hex elements in the node lattice, eight surrounding nodes each in
/// the canonical corner order.
pub fn build_connectivity(nx: usize) -> Connectivity {
    let edge_nodes = nx + 1;
    let plane_nodes = edge_nodes * edge_nodes;
    let mut conn = Connectivity::new();

    let mut nidx = 0;
    for _plane in 0..nx {
        for _row in 0..nx {
            for _col in 0..nx {
                conn.add_element(HexElement::new([
                    nidx,
                    nidx + 1,
                    nidx + edge_nodes + 1,
                    nidx + edge_nodes,
                    nidx + plane_nodes,
                    nidx + plane_nodes + 1,
                    nidx + plane_nodes + edge_nodes + 1,
                    nidx + plane_nodes + edge_nodes,
                ]));
                nidx += 1;
            }
            nidx += 1;
        }
        nidx += edge_nodes;
    }

    conn
}

/// Node sets on the subdomain faces lying on a global minimum plane
/// (x = 0, y = 0, z = 0), in that order. Empty when the subdomain does not
/// touch the respective plane.
pub fn build_symmetry_nodesets(spec: &SubdomainSpec) -> [Vec<usize>; 3] {
    let edge_nodes = spec.nx + 1;
    let plane_nodes = edge_nodes * edge_nodes;
    let layout = spec.layout;

    let mut symm_x = Vec::new();
    let mut symm_y = Vec::new();
    let mut symm_z = Vec::new();

    for i in 0..edge_nodes {
        let plane_inc = i * plane_nodes;
        let row_inc = i * edge_nodes;
        for j in 0..edge_nodes {
            if layout.on_min_plane() {
                symm_z.push(row_inc + j);
            }
            if layout.on_min_row() {
                symm_y.push(plane_inc + j);
            }
            if layout.on_min_col() {
                symm_x.push(plane_inc + j * edge_nodes);
            }
        }
    }

    [symm_x, symm_y, symm_z]
}

/// Face-neighbor adjacency, boundary condition masks, and the ghost layout.
///
/// Interior neighbors are the axial strides (1 for xi, nx for eta, nx*nx for
/// zeta). Minimal global faces are symmetry, the maximal global faces of the
/// whole cube are free surfaces, and internal subdomain faces communicate
/// through ghost slots appended past the local element range. Boundary faces
/// keep the element's own index so a masked read never leaves the array.
pub fn build_face_topology(spec: &SubdomainSpec) -> (FaceAdjacency, Vec<u32>, GhostLayout) {
    let nx = spec.nx;
    let num_elem = spec.num_elems();
    let plane_elems = nx * nx;
    let layout = spec.layout;

    let mut adj = FaceAdjacency::with_len(num_elem);

    // interior strides; boundary rows are overwritten by the mask setup below
    adj.xi_m[0] = 0;
    for i in 1..num_elem {
        adj.xi_m[i] = i - 1;
        adj.xi_p[i - 1] = i;
    }
    adj.xi_p[num_elem - 1] = num_elem - 1;

    for i in 0..nx {
        adj.eta_m[i] = i;
        adj.eta_p[num_elem - nx + i] = num_elem - nx + i;
    }
    for i in nx..num_elem {
        adj.eta_m[i] = i - nx;
        adj.eta_p[i - nx] = i;
    }

    for i in 0..plane_elems {
        adj.zeta_m[i] = i;
        adj.zeta_p[num_elem - plane_elems + i] = num_elem - plane_elems + i;
    }
    for i in plane_elems..num_elem {
        adj.zeta_m[i] = i - plane_elems;
        adj.zeta_p[i - plane_elems] = i;
    }

    // ghost blocks, one per communicating face
    let mut ghosts = GhostLayout::default();
    let face_sizes = [
        plane_elems, // zeta-
        plane_elems, // zeta+
        nx * nx,     // eta-
        nx * nx,     // eta+
        nx * nx,     // xi-
        nx * nx,     // xi+
    ];
    let face_comms = [
        !layout.on_min_plane(),
        !layout.on_max_plane(),
        !layout.on_min_row(),
        !layout.on_max_row(),
        !layout.on_min_col(),
        !layout.on_max_col(),
    ];
    let mut next = num_elem;
    for (f, (&size, &comms)) in face_sizes.iter().zip(face_comms.iter()).enumerate() {
        if comms {
            ghosts.offsets[f] = Some(next);
            next += size;
        }
    }
    ghosts.total = next - num_elem;

    let mut elem_bc = vec![0u32; num_elem];
    for i in 0..nx {
        let plane_inc = i * plane_elems;
        let row_inc = i * nx;
        for j in 0..nx {
            // zeta faces
            if layout.on_min_plane() {
                elem_bc[row_inc + j] |= face_bc::ZETA_M_SYMM;
            } else {
                elem_bc[row_inc + j] |= face_bc::ZETA_M_COMM;
                adj.zeta_m[row_inc + j] = ghosts.offsets[0].unwrap() + row_inc + j;
            }
            if layout.on_max_plane() {
                elem_bc[row_inc + j + num_elem - plane_elems] |= face_bc::ZETA_P_FREE;
            } else {
                elem_bc[row_inc + j + num_elem - plane_elems] |= face_bc::ZETA_P_COMM;
                adj.zeta_p[row_inc + j + num_elem - plane_elems] =
                    ghosts.offsets[1].unwrap() + row_inc + j;
            }

            // eta faces
            if layout.on_min_row() {
                elem_bc[plane_inc + j] |= face_bc::ETA_M_SYMM;
            } else {
                elem_bc[plane_inc + j] |= face_bc::ETA_M_COMM;
                adj.eta_m[plane_inc + j] = ghosts.offsets[2].unwrap() + row_inc + j;
            }
            if layout.on_max_row() {
                elem_bc[plane_inc + j + plane_elems - nx] |= face_bc::ETA_P_FREE;
            } else {
                elem_bc[plane_inc + j + plane_elems - nx] |= face_bc::ETA_P_COMM;
                adj.eta_p[plane_inc + j + plane_elems - nx] =
                    ghosts.offsets[3].unwrap() + row_inc + j;
            }

            // xi faces
            if layout.on_min_col() {
                elem_bc[plane_inc + j * nx] |= face_bc::XI_M_SYMM;
            } else {
                elem_bc[plane_inc + j * nx] |= face_bc::XI_M_COMM;
                adj.xi_m[plane_inc + j * nx] = ghosts.offsets[4].unwrap() + row_inc + j;
            }
            if layout.on_max_col() {
                elem_bc[plane_inc + j * nx + nx - 1] |= face_bc::XI_P_FREE;
            } else {
                elem_bc[plane_inc + j * nx + nx - 1] |= face_bc::XI_P_COMM;
                adj.xi_p[plane_inc + j * nx + nx - 1] =
                    ghosts.offsets[5].unwrap() + row_inc + j;
            }
        }
    }

    (adj, elem_bc, ghosts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single_rank_spec(nx: usize) -> SubdomainSpec {
        SubdomainSpec {
            nx,
            layout: RankLayout::new(0, 1).unwrap(),
        }
    }

    #[test]
    fn lattice_spans_the_unit_box_scaled() {
        let spec = single_rank_spec(4);
        let (x, y, z) = build_lattice(&spec);

        assert_eq!(x.len(), 125);
        assert_relative_eq!(x[0], 0.0);
        assert_relative_eq!(y[0], 0.0);
        assert_relative_eq!(z[0], 0.0);
        // far corner of the subdomain is the full 1.125 box edge
        let last = x.len() - 1;
        assert_relative_eq!(x[last], 1.125, max_relative = 1e-12);
        assert_relative_eq!(y[last], 1.125, max_relative = 1e-12);
        assert_relative_eq!(z[last], 1.125, max_relative = 1e-12);
        // uniform spacing along the first row
        assert_relative_eq!(x[1] - x[0], 1.125 / 4.0, max_relative = 1e-12);
    }

    #[test]
    fn connectivity_follows_canonical_corner_order() {
        let conn = build_connectivity(3);
        assert_eq!(conn.num_elements(), 27);

        let en = 4;
        let pn = en * en;
        assert_eq!(
            *conn.nodes_of(0),
            [0, 1, en + 1, en, pn, pn + 1, pn + en + 1, pn + en]
        );
        // second element along xi shares the 1-2-5-6 face of the first
        let e1 = conn.nodes_of(1);
        let e0 = conn.nodes_of(0);
        assert_eq!(e1[0], e0[1]);
        assert_eq!(e1[3], e0[2]);
        assert_eq!(e1[4], e0[5]);
        assert_eq!(e1[7], e0[6]);
    }

    #[test]
    fn single_rank_faces_are_symmetry_and_free() {
        let spec = single_rank_spec(3);
        let (adj, bc, ghosts) = build_face_topology(&spec);

        assert_eq!(ghosts.total, 0);
        assert!(ghosts.offsets.iter().all(Option::is_none));

        // origin element touches all three symmetry planes
        assert_ne!(bc[0] & face_bc::XI_M_SYMM, 0);
        assert_ne!(bc[0] & face_bc::ETA_M_SYMM, 0);
        assert_ne!(bc[0] & face_bc::ZETA_M_SYMM, 0);
        // far corner element touches the three free surfaces
        assert_ne!(bc[26] & face_bc::XI_P_FREE, 0);
        assert_ne!(bc[26] & face_bc::ETA_P_FREE, 0);
        assert_ne!(bc[26] & face_bc::ZETA_P_FREE, 0);
        // interior element carries no face bits
        assert_eq!(bc[13], 0);

        // interior strides
        assert_eq!(adj.xi_p[13], 14);
        assert_eq!(adj.xi_m[13], 12);
        assert_eq!(adj.eta_p[13], 16);
        assert_eq!(adj.eta_m[13], 10);
        assert_eq!(adj.zeta_p[13], 22);
        assert_eq!(adj.zeta_m[13], 4);
    }

    #[test]
    fn interior_rank_gets_six_ghost_blocks() {
        let spec = SubdomainSpec {
            nx: 3,
            layout: RankLayout::new(13, 27).unwrap(), // center of the 3x3x3 cube
        };
        let (adj, bc, ghosts) = build_face_topology(&spec);

        assert_eq!(ghosts.total, 6 * 9);
        assert!(ghosts.offsets.iter().all(Option::is_some));

        // every boundary face communicates; ghost indices live past numElem
        assert_ne!(bc[0] & face_bc::XI_M_COMM, 0);
        assert!(adj.xi_m[0] >= spec.num_elems());
        assert_ne!(bc[26] & face_bc::ZETA_P_COMM, 0);
        assert!(adj.zeta_p[26] >= spec.num_elems());
    }

    #[test]
    fn symmetry_sets_cover_whole_min_faces() {
        let spec = single_rank_spec(3);
        let [sx, sy, sz] = build_symmetry_nodesets(&spec);

        assert_eq!(sx.len(), 16);
        assert_eq!(sy.len(), 16);
        assert_eq!(sz.len(), 16);

        let (x, y, z) = build_lattice(&spec);
        assert!(sx.iter().all(|&n| x[n] == 0.0));
        assert!(sy.iter().all(|&n| y[n] == 0.0));
        assert!(sz.iter().all(|&n| z[n] == 0.0));
    }

    #[test]
    fn max_rank_has_no_symmetry_sets() {
        let spec = SubdomainSpec {
            nx: 3,
            layout: RankLayout::new(26, 27).unwrap(),
        };
        let sets = build_symmetry_nodesets(&spec);
        assert!(sets.iter().all(Vec::is_empty));
    }
}
