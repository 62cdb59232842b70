//! The simulation domain: one rank's subdomain worth of node- and
//! element-centered field arrays plus the static topology they live on.
//!
//! Everything is allocated at construction and retained for the whole run;
//! nothing resizes afterwards. Scratch arrays (strain rates, gradients,
//! v_new) are logically per-cycle but kept resident.

pub mod params;
pub mod regions;

pub use params::MaterialParameters;
pub use regions::RegionPartition;

use crate::error::SimulationError;
use crate::exchange::CommBufferSpec;
use crate::lagrange::hex;
use crate::mesh::builder::{self, GhostLayout, SubdomainSpec};
use crate::mesh::{Connectivity, FaceAdjacency, NodeElemMap, RankLayout};
use crate::Real;

/// Baseline Sedov energy deposit for a 45-zone global edge; other problem
/// sizes scale it by (edge/45)^3.
const EBASE: Real = 3.948746e+7;
const REFERENCE_EDGE: Real = 45.0;

pub struct Domain {
    // -- node-centered fields --------------------------------------------
    pub x: Vec<Real>,
    pub y: Vec<Real>,
    pub z: Vec<Real>,
    pub xd: Vec<Real>,
    pub yd: Vec<Real>,
    pub zd: Vec<Real>,
    pub xdd: Vec<Real>,
    pub ydd: Vec<Real>,
    pub zdd: Vec<Real>,
    pub fx: Vec<Real>,
    pub fy: Vec<Real>,
    pub fz: Vec<Real>,
    pub nodal_mass: Vec<Real>,

    /// Node sets on the x=0 / y=0 / z=0 symmetry planes (may be empty)
    pub symm_x: Vec<usize>,
    pub symm_y: Vec<usize>,
    pub symm_z: Vec<usize>,

    // -- element-centered fields -----------------------------------------
    pub connectivity: Connectivity,
    pub face_adjacency: FaceAdjacency,
    pub elem_bc: Vec<u32>,

    pub e: Vec<Real>,
    pub p: Vec<Real>,
    pub q: Vec<Real>,
    pub ql: Vec<Real>,
    pub qq: Vec<Real>,
    pub v: Vec<Real>,
    pub volo: Vec<Real>,
    pub delv: Vec<Real>,
    pub vdov: Vec<Real>,
    pub arealg: Vec<Real>,
    pub ss: Vec<Real>,
    pub elem_mass: Vec<Real>,

    // -- per-cycle scratch -----------------------------------------------
    pub dxx: Vec<Real>,
    pub dyy: Vec<Real>,
    pub dzz: Vec<Real>,
    pub vnew: Vec<Real>,
    pub delx_xi: Vec<Real>,
    pub delx_eta: Vec<Real>,
    pub delx_zeta: Vec<Real>,
    /// Velocity-difference gradients, extended past the local range by the
    /// ghost blocks the exchange fills in
    pub delv_xi: Vec<Real>,
    pub delv_eta: Vec<Real>,
    pub delv_zeta: Vec<Real>,

    // -- partitioning and adjacency helpers ------------------------------
    pub regions: RegionPartition,
    /// Inverted corner adjacency; present when more than one worker thread
    /// will scatter forces
    pub node_elem_map: Option<NodeElemMap>,
    pub ghosts: GhostLayout,
    pub comm_buffers: CommBufferSpec,

    // -- immutable run constants -----------------------------------------
    pub params: MaterialParameters,
    pub layout: RankLayout,
    /// Elements along each subdomain edge
    pub nx: usize,
    /// EOS work replication factor for the rank's designated region
    pub imbalance_cost: u32,

    // -- time state -------------------------------------------------------
    pub time: Real,
    pub deltatime: Real,
    pub dtfixed: Real,
    pub stoptime: Real,
    pub dtcourant: Real,
    pub dthydro: Real,
    pub dtmax: Real,
    pub delta_time_mult_lb: Real,
    pub delta_time_mult_ub: Real,
    pub cycle: u32,
}

impl Domain {
    /// Build one rank's subdomain and apply the Sedov initial condition.
    ///
    /// # Arguments
    /// * `layout` - rank placement in the t x t x t cube
    /// * `nx` - elements along each subdomain edge
    /// * `num_regions` - number of material-like regions
    /// * `balance` - region-size weighting exponent
    /// * `cost` - EOS work replication for this rank's designated region
    pub fn build(
        layout: RankLayout,
        nx: usize,
        num_regions: usize,
        balance: u32,
        cost: u32,
    ) -> Result<Self, SimulationError> {
        if nx == 0 {
            return Err(SimulationError::InvalidConfiguration(
                "subdomain edge must have at least one element".to_string(),
            ));
        }
        if num_regions == 0 {
            return Err(SimulationError::InvalidConfiguration(
                "at least one region is required".to_string(),
            ));
        }

        let spec = SubdomainSpec { nx, layout };
        let num_elem = spec.num_elems();
        let num_node = spec.num_nodes();

        let (x, y, z) = builder::build_lattice(&spec);
        let connectivity = builder::build_connectivity(nx);
        let (face_adjacency, elem_bc, ghosts) = builder::build_face_topology(&spec);
        let [symm_x, symm_y, symm_z] = builder::build_symmetry_nodesets(&spec);
        let regions = RegionPartition::build(num_elem, num_regions, balance, layout.rank);

        let node_elem_map = if rayon::current_num_threads() > 1 {
            Some(NodeElemMap::build(&connectivity, num_node))
        } else {
            None
        };

        let comm_buffers = CommBufferSpec::for_subdomain(&layout, nx);

        let all_elem = num_elem + ghosts.total;
        let mut domain = Self {
            x,
            y,
            z,
            xd: vec![0.0; num_node],
            yd: vec![0.0; num_node],
            zd: vec![0.0; num_node],
            xdd: vec![0.0; num_node],
            ydd: vec![0.0; num_node],
            zdd: vec![0.0; num_node],
            fx: vec![0.0; num_node],
            fy: vec![0.0; num_node],
            fz: vec![0.0; num_node],
            nodal_mass: vec![0.0; num_node],
            symm_x,
            symm_y,
            symm_z,
            connectivity,
            face_adjacency,
            elem_bc,
            e: vec![0.0; num_elem],
            p: vec![0.0; num_elem],
            q: vec![0.0; num_elem],
            ql: vec![0.0; num_elem],
            qq: vec![0.0; num_elem],
            // relative volume starts at one, not zero
            v: vec![1.0; num_elem],
            volo: vec![0.0; num_elem],
            delv: vec![0.0; num_elem],
            vdov: vec![0.0; num_elem],
            arealg: vec![0.0; num_elem],
            ss: vec![0.0; num_elem],
            elem_mass: vec![0.0; num_elem],
            dxx: vec![0.0; num_elem],
            dyy: vec![0.0; num_elem],
            dzz: vec![0.0; num_elem],
            vnew: vec![0.0; num_elem],
            delx_xi: vec![0.0; num_elem],
            delx_eta: vec![0.0; num_elem],
            delx_zeta: vec![0.0; num_elem],
            delv_xi: vec![0.0; all_elem],
            delv_eta: vec![0.0; all_elem],
            delv_zeta: vec![0.0; all_elem],
            regions,
            node_elem_map,
            ghosts,
            comm_buffers,
            params: MaterialParameters::default(),
            layout,
            nx,
            imbalance_cost: cost.max(1),
            time: 0.0,
            deltatime: 0.0,
            // negative means "derive the step from the constraints"
            dtfixed: -1.0e-6,
            stoptime: 1.0e-2,
            dtcourant: 1.0e+20,
            dthydro: 1.0e+20,
            dtmax: 1.0e-2,
            delta_time_mult_lb: 1.1,
            delta_time_mult_ub: 1.2,
            cycle: 0,
        };

        domain.init_volumes_and_masses()?;
        domain.deposit_initial_energy();

        Ok(domain)
    }

    /// Reference volumes, element masses, and lumped nodal masses.
    ///
    /// Element mass equals the reference volume (unit density); each corner
    /// receives an eighth of it, so nodal and elemental totals agree by
    /// construction.
    fn init_volumes_and_masses(&mut self) -> Result<(), SimulationError> {
        for i in 0..self.num_elem() {
            let (xl, yl, zl) = self.collect_elem_coords(i);
            let volume = hex::calc_elem_volume(&xl, &yl, &zl);
            if volume <= 0.0 {
                return Err(SimulationError::VolumeError {
                    element: i,
                    volume: volume as f64,
                });
            }
            self.volo[i] = volume;
            self.elem_mass[i] = volume;
            for &n in self.connectivity.nodes_of(i) {
                self.nodal_mass[n] += volume / 8.0;
            }
        }
        Ok(())
    }

    /// Point deposit at the global origin element, scaled from the 45-zone
    /// calibration, plus the matching analytic initial time step.
    fn deposit_initial_energy(&mut self) {
        let edge = (self.nx * self.layout.side) as Real;
        let scale = edge / REFERENCE_EDGE;
        let einit = EBASE * scale * scale * scale;

        if self.layout.at_global_origin() {
            self.e[0] = einit;
        }
        self.deltatime = 0.5 * self.volo[0].cbrt() / (2.0 * einit).sqrt();
    }

    pub fn num_elem(&self) -> usize {
        self.connectivity.num_elements()
    }

    pub fn num_node(&self) -> usize {
        self.x.len()
    }

    /// Gather the eight corner coordinates of an element.
    pub fn collect_elem_coords(&self, elem: usize) -> ([Real; 8], [Real; 8], [Real; 8]) {
        let nodes = self.connectivity.nodes_of(elem);
        let mut xl = [0.0; 8];
        let mut yl = [0.0; 8];
        let mut zl = [0.0; 8];
        for j in 0..8 {
            xl[j] = self.x[nodes[j]];
            yl[j] = self.y[nodes[j]];
            zl[j] = self.z[nodes[j]];
        }
        (xl, yl, zl)
    }

    /// Gather the eight corner velocities of an element.
    pub fn collect_elem_velocities(&self, elem: usize) -> ([Real; 8], [Real; 8], [Real; 8]) {
        let nodes = self.connectivity.nodes_of(elem);
        let mut xdl = [0.0; 8];
        let mut ydl = [0.0; 8];
        let mut zdl = [0.0; 8];
        for j in 0..8 {
            xdl[j] = self.xd[nodes[j]];
            ydl[j] = self.yd[nodes[j]];
            zdl[j] = self.zd[nodes[j]];
        }
        (xdl, ydl, zdl)
    }

    /// Energy of the element at the blast origin.
    pub fn origin_energy(&self) -> Real {
        self.e[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small_domain(nx: usize) -> Domain {
        let layout = RankLayout::new(0, 1).unwrap();
        Domain::build(layout, nx, 11, 1, 1).unwrap()
    }

    #[test]
    fn field_lengths_match_the_mesh() {
        let d = small_domain(3);
        assert_eq!(d.num_elem(), 27);
        assert_eq!(d.num_node(), 64);
        assert_eq!(d.nodal_mass.len(), 64);
        assert_eq!(d.e.len(), 27);
        assert_eq!(d.delv_xi.len(), 27); // no ghosts on a single rank
    }

    #[test]
    fn initial_state_is_quiescent_except_the_origin() {
        let d = small_domain(3);
        assert!(d.e[0] > 0.0);
        assert!(d.e[1..].iter().all(|&e| e == 0.0));
        assert!(d.p.iter().all(|&p| p == 0.0));
        assert!(d.q.iter().all(|&q| q == 0.0));
        assert!(d.v.iter().all(|&v| v == 1.0));
        assert!(d.xd.iter().all(|&u| u == 0.0));
    }

    #[test]
    fn mass_is_conserved_by_the_corner_lumping() {
        let d = small_domain(4);
        let node_total: Real = d.nodal_mass.iter().sum();
        let elem_total: Real = d.elem_mass.iter().sum();
        assert_relative_eq!(node_total, elem_total, max_relative = 1e-12);
    }

    #[test]
    fn reference_volumes_fill_the_box() {
        let d = small_domain(3);
        let total: Real = d.volo.iter().sum();
        let edge: Real = 1.125;
        assert_relative_eq!(total, edge * edge * edge, max_relative = 1e-12);
    }

    #[test]
    fn energy_deposit_scales_with_problem_size() {
        let d10 = small_domain(10);
        let d20 = small_domain(20);
        // (20/45)^3 is eight times (10/45)^3
        assert_relative_eq!(d20.e[0] / d10.e[0], 8.0, max_relative = 1e-12);
    }

    #[test]
    fn initial_timestep_follows_the_deposit() {
        let d = small_domain(10);
        let einit = d.e[0];
        let expected = 0.5 * d.volo[0].cbrt() / (2.0 * einit).sqrt();
        assert_relative_eq!(d.deltatime, expected);
        assert!(d.deltatime > 0.0);
    }
}
