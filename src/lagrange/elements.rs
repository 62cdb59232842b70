//! Element stage of the Lagrange cycle: volumes, strain rates, and the
//! monotonic artificial viscosity.
//!
//! All kernels read the nodal state the kinematics just produced; no element
//! sees a half-updated neighbor within a cycle. Neighbor velocity gradients
//! cross subdomain boundaries through ghost slots the exchange fills between
//! the gradient and limiter passes.

use nalgebra::Vector3;
use rayon::prelude::*;

use super::hex;
use crate::domain::Domain;
use crate::error::SimulationError;
use crate::mesh::face_bc;
use crate::Real;

const PTINY: Real = 1.0e-36;

#[derive(Debug, Clone, Copy)]
struct ElemKinematics {
    vnew: Real,
    delv: Real,
    arealg: Real,
    dxx: Real,
    dyy: Real,
    dzz: Real,
    vdov: Real,
}

/// New volumes, characteristic lengths, and deviatoric principal strain
/// rates from the just-moved nodes. Strain rates are evaluated at the
/// half-step geometry.
pub fn calc_lagrange_elements(domain: &mut Domain) -> Result<(), SimulationError> {
    let num_elem = domain.num_elem();
    let dt = domain.deltatime;

    let domain_ref: &Domain = domain;
    let results: Vec<ElemKinematics> = (0..num_elem)
        .into_par_iter()
        .map(|k| {
            let (mut xl, mut yl, mut zl) = domain_ref.collect_elem_coords(k);
            let (xdl, ydl, zdl) = domain_ref.collect_elem_velocities(k);

            let volume = hex::calc_elem_volume(&xl, &yl, &zl);
            let relative_volume = volume / domain_ref.volo[k];
            let arealg = hex::calc_elem_characteristic_length(&xl, &yl, &zl, volume);

            // strain rates at the half step
            let dt2 = 0.5 * dt;
            for j in 0..8 {
                xl[j] -= dt2 * xdl[j];
                yl[j] -= dt2 * ydl[j];
                zl[j] -= dt2 * zdl[j];
            }
            let (b, detj) = hex::calc_elem_shape_function_derivatives(&xl, &yl, &zl);
            let d = hex::calc_elem_velocity_gradient(&xdl, &ydl, &zdl, &b, detj);

            let vdov = d[0] + d[1] + d[2];
            let third = vdov / 3.0;

            ElemKinematics {
                vnew: relative_volume,
                delv: relative_volume - domain_ref.v[k],
                arealg,
                dxx: d[0] - third,
                dyy: d[1] - third,
                dzz: d[2] - third,
                vdov,
            }
        })
        .collect();

    for (k, r) in results.iter().enumerate() {
        if r.vnew <= 0.0 {
            return Err(SimulationError::VolumeError {
                element: k,
                volume: r.vnew as f64,
            });
        }
        domain.vnew[k] = r.vnew;
        domain.delv[k] = r.delv;
        domain.arealg[k] = r.arealg;
        domain.dxx[k] = r.dxx;
        domain.dyy[k] = r.dyy;
        domain.dzz[k] = r.dzz;
        domain.vdov[k] = r.vdov;
    }

    Ok(())
}

/// Face-normal velocity differences and matching length scales along the
/// three element axes, the raw material the monotonic limiter works on.
pub fn calc_monotonic_q_gradients(domain: &mut Domain) {
    let num_elem = domain.num_elem();

    let domain_ref: &Domain = domain;
    let results: Vec<[Real; 6]> = (0..num_elem)
        .into_par_iter()
        .map(|k| {
            let nodes = domain_ref.connectivity.nodes_of(k);
            let p: Vec<Vector3<Real>> = nodes
                .iter()
                .map(|&n| Vector3::new(domain_ref.x[n], domain_ref.y[n], domain_ref.z[n]))
                .collect();
            let u: Vec<Vector3<Real>> = nodes
                .iter()
                .map(|&n| Vector3::new(domain_ref.xd[n], domain_ref.yd[n], domain_ref.zd[n]))
                .collect();

            let vol = domain_ref.volo[k] * domain_ref.vnew[k];
            let norm = 1.0 / (vol + PTINY);

            let di = 0.25 * ((p[1] + p[2] + p[6] + p[5]) - (p[0] + p[3] + p[7] + p[4]));
            let dj = -0.25 * ((p[0] + p[1] + p[5] + p[4]) - (p[3] + p[2] + p[6] + p[7]));
            let dk = 0.25 * ((p[4] + p[5] + p[6] + p[7]) - (p[0] + p[1] + p[2] + p[3]));

            // zeta: axis i x j
            let a = di.cross(&dj);
            let delx_zeta = vol / (a.dot(&a) + PTINY).sqrt();
            let dv = 0.25 * ((u[4] + u[5] + u[6] + u[7]) - (u[0] + u[1] + u[2] + u[3]));
            let delv_zeta = (a * norm).dot(&dv);

            // xi: axis j x k
            let a = dj.cross(&dk);
            let delx_xi = vol / (a.dot(&a) + PTINY).sqrt();
            let dv = 0.25 * ((u[1] + u[2] + u[6] + u[5]) - (u[0] + u[3] + u[7] + u[4]));
            let delv_xi = (a * norm).dot(&dv);

            // eta: axis k x i
            let a = dk.cross(&di);
            let delx_eta = vol / (a.dot(&a) + PTINY).sqrt();
            let dv = -0.25 * ((u[0] + u[1] + u[5] + u[4]) - (u[3] + u[2] + u[6] + u[7]));
            let delv_eta = (a * norm).dot(&dv);

            [delx_xi, delx_eta, delx_zeta, delv_xi, delv_eta, delv_zeta]
        })
        .collect();

    for (k, g) in results.iter().enumerate() {
        domain.delx_xi[k] = g[0];
        domain.delx_eta[k] = g[1];
        domain.delx_zeta[k] = g[2];
        domain.delv_xi[k] = g[3];
        domain.delv_eta[k] = g[4];
        domain.delv_zeta[k] = g[5];
    }
}

/// Monotonic slope-limited q terms, region by region, then the runaway
/// viscosity check.
pub fn calc_monotonic_q(domain: &mut Domain) -> Result<(), SimulationError> {
    for r in 0..domain.regions.num_regions {
        let elems = std::mem::take(&mut domain.regions.elem_lists[r]);

        let domain_ref: &Domain = domain;
        let results: Vec<(Real, Real)> = elems
            .par_iter()
            .map(|&i| monotonic_q_for_elem(domain_ref, i))
            .collect();

        for (&i, &(qlin, qquad)) in elems.iter().zip(results.iter()) {
            domain.ql[i] = qlin;
            domain.qq[i] = qquad;
        }
        domain.regions.elem_lists[r] = elems;
    }

    // don't allow excessive artificial viscosity
    for (i, &q) in domain.q.iter().enumerate() {
        if q > domain.params.qstop {
            return Err(SimulationError::QStopError {
                element: i,
                q: q as f64,
            });
        }
    }
    Ok(())
}

/// Limited linear and quadratic q terms for one element.
///
/// The slope ratio toward each face neighbor is normalized by the element's
/// own gradient, clamped to [0, monoq_max_slope] after the limiter
/// multiplier, and symmetry/free faces substitute reflection/zero for the
/// missing neighbor. Expanding elements carry no q at all.
fn monotonic_q_for_elem(domain: &Domain, i: usize) -> (Real, Real) {
    let params = &domain.params;
    let bc = domain.elem_bc[i];
    let adj = &domain.face_adjacency;

    let limited_phi = |delv: &[Real],
                       own: Real,
                       bc_mask: u32,
                       bc_symm: u32,
                       bc_free: u32,
                       neighbor_m: usize,
                       neighbor_p: usize,
                       mask_p: u32,
                       symm_p: u32,
                       free_p: u32|
     -> Real {
        let norm = 1.0 / (own + PTINY);

        let masked = bc & bc_mask;
        let mut delvm = if masked == bc_symm {
            own
        } else if masked == bc_free {
            0.0
        } else {
            delv[neighbor_m]
        };
        let masked = bc & mask_p;
        let mut delvp = if masked == symm_p {
            own
        } else if masked == free_p {
            0.0
        } else {
            delv[neighbor_p]
        };
        delvm *= norm;
        delvp *= norm;

        let mut phi = 0.5 * (delvm + delvp);
        delvm *= params.monoq_limiter_mult;
        delvp *= params.monoq_limiter_mult;
        if delvm < phi {
            phi = delvm;
        }
        if delvp < phi {
            phi = delvp;
        }
        phi.clamp(0.0, params.monoq_max_slope)
    };

    let phixi = limited_phi(
        &domain.delv_xi,
        domain.delv_xi[i],
        face_bc::XI_M,
        face_bc::XI_M_SYMM,
        face_bc::XI_M_FREE,
        adj.xi_m[i],
        adj.xi_p[i],
        face_bc::XI_P,
        face_bc::XI_P_SYMM,
        face_bc::XI_P_FREE,
    );
    let phieta = limited_phi(
        &domain.delv_eta,
        domain.delv_eta[i],
        face_bc::ETA_M,
        face_bc::ETA_M_SYMM,
        face_bc::ETA_M_FREE,
        adj.eta_m[i],
        adj.eta_p[i],
        face_bc::ETA_P,
        face_bc::ETA_P_SYMM,
        face_bc::ETA_P_FREE,
    );
    let phizeta = limited_phi(
        &domain.delv_zeta,
        domain.delv_zeta[i],
        face_bc::ZETA_M,
        face_bc::ZETA_M_SYMM,
        face_bc::ZETA_M_FREE,
        adj.zeta_m[i],
        adj.zeta_p[i],
        face_bc::ZETA_P,
        face_bc::ZETA_P_SYMM,
        face_bc::ZETA_P_FREE,
    );

    if domain.vdov[i] > 0.0 {
        // expanding element, no shock to spread
        (0.0, 0.0)
    } else {
        let mut delvxxi = domain.delv_xi[i] * domain.delx_xi[i];
        let mut delvxeta = domain.delv_eta[i] * domain.delx_eta[i];
        let mut delvxzeta = domain.delv_zeta[i] * domain.delx_zeta[i];
        if delvxxi > 0.0 {
            delvxxi = 0.0;
        }
        if delvxeta > 0.0 {
            delvxeta = 0.0;
        }
        if delvxzeta > 0.0 {
            delvxzeta = 0.0;
        }

        let rho = domain.elem_mass[i] / (domain.volo[i] * domain.vnew[i]);

        let qlin = -params.qlc_monoq
            * rho
            * (delvxxi * (1.0 - phixi)
                + delvxeta * (1.0 - phieta)
                + delvxzeta * (1.0 - phizeta));
        let qquad = params.qqc_monoq
            * rho
            * (delvxxi * delvxxi * (1.0 - phixi * phixi)
                + delvxeta * delvxeta * (1.0 - phieta * phieta)
                + delvxzeta * delvxzeta * (1.0 - phizeta * phizeta));

        (qlin, qquad)
    }
}
