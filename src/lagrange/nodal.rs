//! Nodal stage of the Lagrange cycle: integrate element stresses and
//! hourglass resistance into nodal forces, then advance accelerations,
//! velocities and positions.
//!
//! The force scatter is the one place element parallelism meets shared
//! nodes. Corner forces are first written into a per-element buffer
//! (8 disjoint slots per element), then either summed per node through the
//! inverted corner map so concurrent writers never collide, or accumulated
//! directly when running single-threaded.

use rayon::prelude::*;

use super::hex;
use crate::domain::Domain;
use crate::error::SimulationError;
use crate::Real;

/// Hourglass mode basis: four zero-energy deformation shapes per axis.
const GAMMA: [[Real; 8]; 4] = [
    [1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0, 1.0],
    [1.0, -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0],
    [1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0, -1.0],
];

/// Assemble the nodal force accumulators from element pressure/viscosity
/// stresses plus hourglass stabilization.
pub fn calc_volume_force(domain: &mut Domain) -> Result<(), SimulationError> {
    let num_elem = domain.num_elem();
    if num_elem == 0 {
        return Ok(());
    }

    domain.fx.fill(0.0);
    domain.fy.fill(0.0);
    domain.fz.fill(0.0);

    // one 8-corner slot group per element; both force passes add into it
    let mut corner_force = vec![[0.0 as Real; 3]; num_elem * 8];

    integrate_stress_terms(domain, &mut corner_force)?;
    add_hourglass_control(domain, &mut corner_force)?;
    scatter_corner_forces(domain, &corner_force);

    Ok(())
}

/// Pressure + artificial viscosity integrated over each element through the
/// corner face normals.
fn integrate_stress_terms(
    domain: &Domain,
    corner_force: &mut [[Real; 3]],
) -> Result<(), SimulationError> {
    let num_elem = domain.num_elem();
    let mut determ = vec![0.0 as Real; num_elem];

    corner_force
        .par_chunks_mut(8)
        .zip(determ.par_iter_mut())
        .enumerate()
        .for_each(|(k, (corners, det_out))| {
            let (xl, yl, zl) = domain.collect_elem_coords(k);
            let (_, det) = hex::calc_elem_shape_function_derivatives(&xl, &yl, &zl);
            *det_out = det;

            // isotropic stress: sigma = -(p + q) I
            let sig = -domain.p[k] - domain.q[k];
            let normals = hex::calc_elem_node_normals(&xl, &yl, &zl);
            let f = hex::sum_elem_stresses_to_node_forces(&normals, sig, sig, sig);
            corners.copy_from_slice(&f);
        });

    for (k, &det) in determ.iter().enumerate() {
        if det <= 0.0 {
            return Err(SimulationError::VolumeError {
                element: k,
                volume: det as f64,
            });
        }
    }
    Ok(())
}

/// Flanagan-Belytschko hourglass resistance on the four-mode gamma basis,
/// scaled by density, sound speed and cube-root volume.
fn add_hourglass_control(
    domain: &Domain,
    corner_force: &mut [[Real; 3]],
) -> Result<(), SimulationError> {
    let hgcoef = domain.params.hgcoef;
    if hgcoef <= 0.0 {
        return Ok(());
    }

    for (k, &v) in domain.v.iter().enumerate() {
        if v <= 0.0 {
            return Err(SimulationError::VolumeError {
                element: k,
                volume: v as f64,
            });
        }
    }

    corner_force
        .par_chunks_mut(8)
        .enumerate()
        .for_each(|(k, corners)| {
            let (xl, yl, zl) = domain.collect_elem_coords(k);
            let dvd = hex::calc_elem_volume_derivative(&xl, &yl, &zl);

            let determ = domain.volo[k] * domain.v[k];
            let volinv = 1.0 / determ;

            // project the gamma basis out of the current geometry
            let mut hourgam = [[0.0 as Real; 8]; 4];
            for i1 in 0..4 {
                let mut hourmodx = 0.0;
                let mut hourmody = 0.0;
                let mut hourmodz = 0.0;
                for j in 0..8 {
                    hourmodx += xl[j] * GAMMA[i1][j];
                    hourmody += yl[j] * GAMMA[i1][j];
                    hourmodz += zl[j] * GAMMA[i1][j];
                }
                for j in 0..8 {
                    hourgam[i1][j] = GAMMA[i1][j]
                        - volinv
                            * (dvd[j][0] * hourmodx
                                + dvd[j][1] * hourmody
                                + dvd[j][2] * hourmodz);
                }
            }

            let ss1 = domain.ss[k];
            let mass1 = domain.elem_mass[k];
            let volume13 = determ.cbrt();
            let coefficient = -hgcoef * 0.01 * ss1 * mass1 / volume13;

            let (xdl, ydl, zdl) = domain.collect_elem_velocities(k);

            let mut hx = [0.0 as Real; 4];
            let mut hy = [0.0 as Real; 4];
            let mut hz = [0.0 as Real; 4];
            for i1 in 0..4 {
                for j in 0..8 {
                    hx[i1] += hourgam[i1][j] * xdl[j];
                    hy[i1] += hourgam[i1][j] * ydl[j];
                    hz[i1] += hourgam[i1][j] * zdl[j];
                }
            }

            for j in 0..8 {
                let mut fx = 0.0;
                let mut fy = 0.0;
                let mut fz = 0.0;
                for i1 in 0..4 {
                    fx += hourgam[i1][j] * hx[i1];
                    fy += hourgam[i1][j] * hy[i1];
                    fz += hourgam[i1][j] * hz[i1];
                }
                corners[j][0] += coefficient * fx;
                corners[j][1] += coefficient * fy;
                corners[j][2] += coefficient * fz;
            }
        });

    Ok(())
}

/// Sum the per-corner contributions into the three nodal force components.
fn scatter_corner_forces(domain: &mut Domain, corner_force: &[[Real; 3]]) {
    let Domain {
        ref node_elem_map,
        ref connectivity,
        ref mut fx,
        ref mut fy,
        ref mut fz,
        ..
    } = *domain;

    match node_elem_map {
        Some(map) => {
            // each node owns its row of the corner map: disjoint writes
            fx.par_iter_mut()
                .zip(fy.par_iter_mut().zip(fz.par_iter_mut()))
                .enumerate()
                .for_each(|(n, (fx_n, (fy_n, fz_n)))| {
                    let mut sx = 0.0;
                    let mut sy = 0.0;
                    let mut sz = 0.0;
                    for &c in map.corners_of(n) {
                        sx += corner_force[c][0];
                        sy += corner_force[c][1];
                        sz += corner_force[c][2];
                    }
                    *fx_n = sx;
                    *fy_n = sy;
                    *fz_n = sz;
                });
        }
        None => {
            for (k, elem) in connectivity.hex_elements.iter().enumerate() {
                for (j, &n) in elem.nodes.iter().enumerate() {
                    let f = corner_force[k * 8 + j];
                    fx[n] += f[0];
                    fy[n] += f[1];
                    fz[n] += f[2];
                }
            }
        }
    }
}

/// a = f / m per node.
pub fn calc_acceleration(domain: &mut Domain) {
    let Domain {
        ref fx,
        ref fy,
        ref fz,
        ref nodal_mass,
        ref mut xdd,
        ref mut ydd,
        ref mut zdd,
        ..
    } = *domain;

    xdd.par_iter_mut()
        .zip(ydd.par_iter_mut().zip(zdd.par_iter_mut()))
        .enumerate()
        .for_each(|(n, (ax, (ay, az)))| {
            *ax = fx[n] / nodal_mass[n];
            *ay = fy[n] / nodal_mass[n];
            *az = fz[n] / nodal_mass[n];
        });
}

/// Zero the acceleration component normal to each symmetry plane so nothing
/// ever pushes material through it.
pub fn apply_acceleration_boundary_conditions(domain: &mut Domain) {
    for &n in &domain.symm_x {
        domain.xdd[n] = 0.0;
    }
    for &n in &domain.symm_y {
        domain.ydd[n] = 0.0;
    }
    for &n in &domain.symm_z {
        domain.zdd[n] = 0.0;
    }
}

/// Integrate velocities, snapping components below u_cut to exactly zero to
/// stop denormal drift.
pub fn calc_velocity(domain: &mut Domain, dt: Real) {
    let u_cut = domain.params.u_cut;
    let Domain {
        ref xdd,
        ref ydd,
        ref zdd,
        ref mut xd,
        ref mut yd,
        ref mut zd,
        ..
    } = *domain;

    xd.par_iter_mut()
        .zip(yd.par_iter_mut().zip(zd.par_iter_mut()))
        .enumerate()
        .for_each(|(n, (ux, (uy, uz)))| {
            let mut vx = *ux + xdd[n] * dt;
            if vx.abs() < u_cut {
                vx = 0.0;
            }
            let mut vy = *uy + ydd[n] * dt;
            if vy.abs() < u_cut {
                vy = 0.0;
            }
            let mut vz = *uz + zdd[n] * dt;
            if vz.abs() < u_cut {
                vz = 0.0;
            }
            *ux = vx;
            *uy = vy;
            *uz = vz;
        });
}

/// Move the nodes with the material.
pub fn calc_position(domain: &mut Domain, dt: Real) {
    let Domain {
        ref xd,
        ref yd,
        ref zd,
        ref mut x,
        ref mut y,
        ref mut z,
        ..
    } = *domain;

    x.par_iter_mut()
        .zip(y.par_iter_mut().zip(z.par_iter_mut()))
        .enumerate()
        .for_each(|(n, (px, (py, pz)))| {
            *px += xd[n] * dt;
            *py += yd[n] * dt;
            *pz += zd[n] * dt;
        });
}
