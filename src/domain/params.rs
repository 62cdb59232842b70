use crate::Real;

/// Material cutoffs, EOS bounds and stabilization coefficients.
///
/// Fixed at domain construction and immutable for the whole run; real codes
/// read these from an input deck, the proxy hardwires the Sedov values.
#[derive(Debug, Clone, Copy)]
pub struct MaterialParameters {
    /// Energy tolerance; |e| below this snaps to zero
    pub e_cut: Real,
    /// Pressure tolerance
    pub p_cut: Real,
    /// Artificial viscosity tolerance
    pub q_cut: Real,
    /// Relative volume tolerance; |v - 1| below this snaps to one
    pub v_cut: Real,
    /// Velocity tolerance; components below this snap to zero
    pub u_cut: Real,

    /// Hourglass stabilization coefficient
    pub hgcoef: Real,
    /// 4/3 sound-speed factor kept for the EOS family
    pub ss4o3: Real,
    /// Runaway artificial viscosity threshold
    pub qstop: Real,
    /// Monotonic limiter slope cap
    pub monoq_max_slope: Real,
    /// Monotonic limiter multiplier
    pub monoq_limiter_mult: Real,
    /// Linear artificial viscosity coefficient
    pub qlc_monoq: Real,
    /// Quadratic artificial viscosity coefficient
    pub qqc_monoq: Real,
    /// Courant quadratic-viscosity coefficient
    pub qqc: Real,

    /// Relative volume clamps applied before the EOS
    pub eosvmax: Real,
    pub eosvmin: Real,
    /// Pressure floor
    pub pmin: Real,
    /// Energy floor
    pub emin: Real,
    /// Maximum allowable relative volume change per step
    pub dvovmax: Real,
    /// Reference density
    pub refdens: Real,
}

impl Default for MaterialParameters {
    fn default() -> Self {
        Self {
            e_cut: 1.0e-7,
            p_cut: 1.0e-7,
            q_cut: 1.0e-7,
            v_cut: 1.0e-10,
            u_cut: 1.0e-7,
            hgcoef: 3.0,
            ss4o3: 4.0 / 3.0,
            qstop: 1.0e+12,
            monoq_max_slope: 1.0,
            monoq_limiter_mult: 2.0,
            qlc_monoq: 0.5,
            qqc_monoq: 2.0 / 3.0,
            qqc: 2.0,
            eosvmax: 1.0e+9,
            eosvmin: 1.0e-9,
            pmin: 0.0,
            emin: -1.0e+15,
            dvovmax: 0.1,
            refdens: 1.0,
        }
    }
}
