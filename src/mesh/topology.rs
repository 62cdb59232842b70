/// An 8-node hexahedral element.
///
/// Node numbering follows the canonical single-point-quadrature hex:
/// nodes 0-3 are the bottom face counter-clockwise, nodes 4-7 the top face
/// directly above them:
///   0: (0,0,0)  1: (1,0,0)  2: (1,1,0)  3: (0,1,0)
///   4: (0,0,1)  5: (1,0,1)  6: (1,1,1)  7: (0,1,1)
#[derive(Debug, Clone, Copy)]
pub struct HexElement {
    /// Global node indices for this element (8 corners)
    pub nodes: [usize; 8],
}

impl HexElement {
    pub fn new(nodes: [usize; 8]) -> Self {
        Self { nodes }
    }

    /// Bottom-face node indices
    pub fn bottom(&self) -> [usize; 4] {
        [self.nodes[0], self.nodes[1], self.nodes[2], self.nodes[3]]
    }

    /// Top-face node indices
    pub fn top(&self) -> [usize; 4] {
        [self.nodes[4], self.nodes[5], self.nodes[6], self.nodes[7]]
    }
}

/// Element-to-node connectivity for the mesh. Immutable after setup.
#[derive(Debug, Clone, Default)]
pub struct Connectivity {
    pub hex_elements: Vec<HexElement>,
}

impl Connectivity {
    pub fn new() -> Self {
        Self { hex_elements: Vec::new() }
    }

    pub fn add_element(&mut self, element: HexElement) {
        self.hex_elements.push(element);
    }

    pub fn num_elements(&self) -> usize {
        self.hex_elements.len()
    }

    pub fn nodes_of(&self, elem: usize) -> &[usize; 8] {
        &self.hex_elements[elem].nodes
    }
}

/// Per-face boundary condition flags, two bit-triplets per axis
/// (12 active bits total). Exactly one of SYMM/FREE/COMM may be set per face;
/// interior faces carry no bits.
pub mod face_bc {
    pub const XI_M: u32 = 0x0000_0007;
    pub const XI_M_SYMM: u32 = 0x0000_0001;
    pub const XI_M_FREE: u32 = 0x0000_0002;
    pub const XI_M_COMM: u32 = 0x0000_0004;

    pub const XI_P: u32 = 0x0000_0038;
    pub const XI_P_SYMM: u32 = 0x0000_0008;
    pub const XI_P_FREE: u32 = 0x0000_0010;
    pub const XI_P_COMM: u32 = 0x0000_0020;

    pub const ETA_M: u32 = 0x0000_01c0;
    pub const ETA_M_SYMM: u32 = 0x0000_0040;
    pub const ETA_M_FREE: u32 = 0x0000_0080;
    pub const ETA_M_COMM: u32 = 0x0000_0100;

    pub const ETA_P: u32 = 0x0000_0e00;
    pub const ETA_P_SYMM: u32 = 0x0000_0200;
    pub const ETA_P_FREE: u32 = 0x0000_0400;
    pub const ETA_P_COMM: u32 = 0x0000_0800;

    pub const ZETA_M: u32 = 0x0000_7000;
    pub const ZETA_M_SYMM: u32 = 0x0000_1000;
    pub const ZETA_M_FREE: u32 = 0x0000_2000;
    pub const ZETA_M_COMM: u32 = 0x0000_4000;

    pub const ZETA_P: u32 = 0x0003_8000;
    pub const ZETA_P_SYMM: u32 = 0x0000_8000;
    pub const ZETA_P_FREE: u32 = 0x0001_0000;
    pub const ZETA_P_COMM: u32 = 0x0002_0000;
}

/// Inter-element adjacency through the six axial faces.
///
/// Each entry is either a local element index, the element's own index on a
/// domain-boundary face, or a ghost index at/above `num_elements` pointing
/// into the boundary-contiguous extension of the gradient arrays. A ghost
/// index exists for a face iff the matching COMM bit is set.
#[derive(Debug, Clone, Default)]
pub struct FaceAdjacency {
    pub xi_m: Vec<usize>,
    pub xi_p: Vec<usize>,
    pub eta_m: Vec<usize>,
    pub eta_p: Vec<usize>,
    pub zeta_m: Vec<usize>,
    pub zeta_p: Vec<usize>,
}

impl FaceAdjacency {
    pub fn with_len(num_elem: usize) -> Self {
        Self {
            xi_m: vec![0; num_elem],
            xi_p: vec![0; num_elem],
            eta_m: vec![0; num_elem],
            eta_p: vec![0; num_elem],
            zeta_m: vec![0; num_elem],
            zeta_p: vec![0; num_elem],
        }
    }
}

/// Inverted node-to-element-corner adjacency in CSR form.
///
/// Row `n` lists the corner slots `elem*8 + corner` incident on node `n`,
/// so each thread of the force scatter can sum its own nodes without
/// touching anyone else's. Rebuilt from the element connectivity at setup,
/// stored as row pointer + column array.
#[derive(Debug, Clone)]
pub struct NodeElemMap {
    start: Vec<usize>,
    corners: Vec<usize>,
}

impl NodeElemMap {
    pub fn build(connectivity: &Connectivity, num_nodes: usize) -> Self {
        let mut count = vec![0usize; num_nodes];
        for elem in &connectivity.hex_elements {
            for &n in &elem.nodes {
                count[n] += 1;
            }
        }

        let mut start = vec![0usize; num_nodes + 1];
        for n in 0..num_nodes {
            start[n + 1] = start[n] + count[n];
        }

        let mut corners = vec![0usize; start[num_nodes]];
        count.iter_mut().for_each(|c| *c = 0);
        for (k, elem) in connectivity.hex_elements.iter().enumerate() {
            for (j, &n) in elem.nodes.iter().enumerate() {
                corners[start[n] + count[n]] = k * 8 + j;
                count[n] += 1;
            }
        }

        Self { start, corners }
    }

    /// Corner slots (elem*8 + corner) incident on a node
    pub fn corners_of(&self, node: usize) -> &[usize] {
        &self.corners[self.start[node]..self.start[node + 1]]
    }

    pub fn num_corners(&self) -> usize {
        self.corners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_elem_connectivity() -> Connectivity {
        // two hexes sharing a face, 12 nodes
        let mut conn = Connectivity::new();
        conn.add_element(HexElement::new([0, 1, 4, 3, 6, 7, 10, 9]));
        conn.add_element(HexElement::new([1, 2, 5, 4, 7, 8, 11, 10]));
        conn
    }

    #[test]
    fn corner_map_covers_every_corner_once() {
        let conn = two_elem_connectivity();
        let map = NodeElemMap::build(&conn, 12);

        assert_eq!(map.num_corners(), 16);

        let mut seen = vec![false; 16];
        for n in 0..12 {
            for &c in map.corners_of(n) {
                assert!(!seen[c], "corner {} listed twice", c);
                seen[c] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn corner_map_rows_point_back_at_their_node() {
        let conn = two_elem_connectivity();
        let map = NodeElemMap::build(&conn, 12);

        for n in 0..12 {
            for &c in map.corners_of(n) {
                let (elem, corner) = (c / 8, c % 8);
                assert_eq!(conn.nodes_of(elem)[corner], n);
            }
        }
    }

    #[test]
    fn shared_face_nodes_touch_both_elements() {
        let conn = two_elem_connectivity();
        let map = NodeElemMap::build(&conn, 12);

        // nodes 1, 4, 7, 10 sit on the shared face
        for n in [1, 4, 7, 10] {
            let elems: Vec<usize> = map.corners_of(n).iter().map(|c| c / 8).collect();
            assert!(elems.contains(&0) && elems.contains(&1));
        }
    }

    #[test]
    fn face_bc_triplets_do_not_overlap() {
        use face_bc::*;
        let masks = [XI_M, XI_P, ETA_M, ETA_P, ZETA_M, ZETA_P];
        for (i, a) in masks.iter().enumerate() {
            for b in &masks[i + 1..] {
                assert_eq!(a & b, 0);
            }
        }
    }
}
