//! Gamma-law equation of state applied region by region.
//!
//! The update iterates pressure and energy so the p dV work stays
//! compatible with the energy equation: a half-step pressure predictor, two
//! corrector passes, then the new artificial viscosity and sound speed from
//! the converged state. One region per rank carries replicated work to
//! stand in for an expensive material.

use rayon::prelude::*;

use crate::domain::{Domain, MaterialParameters};
use crate::error::SimulationError;
use crate::Real;

/// Smallest admissible squared sound speed before the fallback value kicks in.
const SSC_FLOOR: Real = 0.1111111e-36;
const SSC_FALLBACK: Real = 0.3333333e-18;

/// Clamp new volumes into the EOS validity window, sanity-check the old
/// ones, and run the EOS over every region.
pub fn apply_material_properties(domain: &mut Domain) -> Result<(), SimulationError> {
    let params = domain.params;

    if params.eosvmin != 0.0 {
        domain.vnew.par_iter_mut().for_each(|v| {
            if *v < params.eosvmin {
                *v = params.eosvmin;
            }
        });
    }
    if params.eosvmax != 0.0 {
        domain.vnew.par_iter_mut().for_each(|v| {
            if *v > params.eosvmax {
                *v = params.eosvmax;
            }
        });
    }

    // the old volumes must still be usable under the same clamps
    for (i, &v) in domain.v.iter().enumerate() {
        let mut vc = v;
        if params.eosvmin != 0.0 && vc < params.eosvmin {
            vc = params.eosvmin;
        }
        if params.eosvmax != 0.0 && vc > params.eosvmax {
            vc = params.eosvmax;
        }
        if vc <= 0.0 {
            return Err(SimulationError::VolumeError {
                element: i,
                volume: vc as f64,
            });
        }
    }

    // one region per rank replicates its EOS work `cost` times
    let expensive_region = domain.layout.rank % domain.regions.num_regions + 1;
    for r in 0..domain.regions.num_regions {
        let rep = if r + 1 == expensive_region {
            domain.imbalance_cost
        } else {
            1
        };
        eval_eos_for_region(domain, r, rep);
    }

    Ok(())
}

/// Commit the clamped new volumes, snapping values within v_cut of one back
/// to exactly one.
pub fn update_volumes(domain: &mut Domain) {
    let v_cut = domain.params.v_cut;
    let Domain {
        ref vnew,
        ref mut v,
        ..
    } = *domain;

    v.par_iter_mut().zip(vnew.par_iter()).for_each(|(v, &vn)| {
        let mut tmp = vn;
        if v_cut != 0.0 && (tmp - 1.0).abs() < v_cut {
            tmp = 1.0;
        }
        *v = tmp;
    });
}

/// Run the EOS update over one region's element list, `rep` times.
///
/// Each repetition re-gathers from the domain and recomputes, so repetition
/// only burns time, never changes the answer; the writeback happens once at
/// the end.
fn eval_eos_for_region(domain: &mut Domain, region_index: usize, rep: u32) {
    let params = domain.params;
    let elems = std::mem::take(&mut domain.regions.elem_lists[region_index]);
    let n = elems.len();
    if n == 0 {
        domain.regions.elem_lists[region_index] = elems;
        return;
    }

    let eos_pass = |domain_ref: &Domain| -> EosOutcome {
        let e_old: Vec<Real> = elems.par_iter().map(|&i| domain_ref.e[i]).collect();
        let delvc: Vec<Real> = elems.par_iter().map(|&i| domain_ref.delv[i]).collect();
        let p_old: Vec<Real> = elems.par_iter().map(|&i| domain_ref.p[i]).collect();
        let q_old: Vec<Real> = elems.par_iter().map(|&i| domain_ref.q[i]).collect();
        let qq_old: Vec<Real> = elems.par_iter().map(|&i| domain_ref.qq[i]).collect();
        let ql_old: Vec<Real> = elems.par_iter().map(|&i| domain_ref.ql[i]).collect();
        let vnewc: Vec<Real> = elems.par_iter().map(|&i| domain_ref.vnew[i]).collect();

        let mut compression: Vec<Real> =
            vnewc.par_iter().map(|&v| 1.0 / v - 1.0).collect();
        let mut comp_half_step: Vec<Real> = vnewc
            .par_iter()
            .zip(delvc.par_iter())
            .map(|(&v, &dv)| {
                let vchalf = v - dv * 0.5;
                1.0 / vchalf - 1.0
            })
            .collect();

        let mut p_old = p_old;
        if params.eosvmin != 0.0 {
            for i in 0..n {
                if vnewc[i] <= params.eosvmin {
                    comp_half_step[i] = compression[i];
                }
            }
        }
        if params.eosvmax != 0.0 {
            for i in 0..n {
                if vnewc[i] >= params.eosvmax {
                    p_old[i] = 0.0;
                    compression[i] = 0.0;
                    comp_half_step[i] = 0.0;
                }
            }
        }

        let work = vec![0.0 as Real; n];
        calc_energy(
            &params,
            &p_old,
            &e_old,
            &q_old,
            &compression,
            &comp_half_step,
            &vnewc,
            &work,
            &delvc,
            &qq_old,
            &ql_old,
        )
    };

    // every repetition re-gathers the same inputs; only the last result is kept
    let mut outcome = eos_pass(domain);
    for _ in 1..rep.max(1) {
        outcome = eos_pass(domain);
    }

    for (j, &i) in elems.iter().enumerate() {
        domain.p[i] = outcome.p_new[j];
        domain.e[i] = outcome.e_new[j];
        domain.q[i] = outcome.q_new[j];
    }

    // sound speed from the converged state
    let vnewc: Vec<Real> = elems.iter().map(|&i| domain.vnew[i]).collect();
    for (j, &i) in elems.iter().enumerate() {
        let ssc = (outcome.pbvc[j] * outcome.e_new[j]
            + vnewc[j] * vnewc[j] * outcome.bvc[j] * outcome.p_new[j])
            / params.refdens;
        domain.ss[i] = if ssc <= SSC_FLOOR {
            SSC_FALLBACK
        } else {
            ssc.sqrt()
        };
    }

    domain.regions.elem_lists[region_index] = elems;
}

struct EosOutcome {
    p_new: Vec<Real>,
    e_new: Vec<Real>,
    q_new: Vec<Real>,
    bvc: Vec<Real>,
    pbvc: Vec<Real>,
}

/// Gamma-law pressure from energy and compression: p = (2/3) (1/v) e, with
/// the pressure cut, the free-expansion zero past eosvmax, and the floor.
fn calc_pressure(
    params: &MaterialParameters,
    e: &[Real],
    compression: &[Real],
    vnewc: &[Real],
) -> (Vec<Real>, Vec<Real>, Vec<Real>) {
    let c1s: Real = 2.0 / 3.0;

    let bvc: Vec<Real> = compression.par_iter().map(|&c| c1s * (c + 1.0)).collect();
    let pbvc: Vec<Real> = compression.par_iter().map(|_| c1s).collect();

    let p_new: Vec<Real> = bvc
        .par_iter()
        .zip(e.par_iter().zip(vnewc.par_iter()))
        .map(|(&bvc_i, (&e_i, &v_i))| {
            let mut p = bvc_i * e_i;
            if p.abs() < params.p_cut {
                p = 0.0;
            }
            if params.eosvmax != 0.0 && v_i >= params.eosvmax {
                p = 0.0;
            }
            if p < params.pmin {
                p = params.pmin;
            }
            p
        })
        .collect();

    (p_new, bvc, pbvc)
}

/// Predictor/corrector energy update with compatible p dV work.
#[allow(clippy::too_many_arguments)]
fn calc_energy(
    params: &MaterialParameters,
    p_old: &[Real],
    e_old: &[Real],
    q_old: &[Real],
    compression: &[Real],
    comp_half_step: &[Real],
    vnewc: &[Real],
    work: &[Real],
    delvc: &[Real],
    qq_old: &[Real],
    ql_old: &[Real],
) -> EosOutcome {
    let n = e_old.len();
    let sixth: Real = 1.0 / 6.0;
    let rho0 = params.refdens;

    let mut e_new: Vec<Real> = (0..n)
        .into_par_iter()
        .map(|i| {
            let e = e_old[i] - 0.5 * delvc[i] * (p_old[i] + q_old[i]) + 0.5 * work[i];
            e.max(params.emin)
        })
        .collect();

    let (p_half_step, bvc, pbvc) = calc_pressure(params, &e_new, comp_half_step, vnewc);

    let q_new: Vec<Real> = (0..n)
        .into_par_iter()
        .map(|i| {
            if delvc[i] > 0.0 {
                0.0
            } else {
                let vhalf = 1.0 / (1.0 + comp_half_step[i]);
                let mut ssc = (pbvc[i] * e_new[i]
                    + vhalf * vhalf * bvc[i] * p_half_step[i])
                    / rho0;
                ssc = if ssc <= SSC_FLOOR { SSC_FALLBACK } else { ssc.sqrt() };
                ssc * ql_old[i] + qq_old[i]
            }
        })
        .collect();

    e_new
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, e)| {
            *e += 0.5
                * delvc[i]
                * (3.0 * (p_old[i] + q_old[i]) - 4.0 * (p_half_step[i] + q_new[i]));
            *e += 0.5 * work[i];
            if e.abs() < params.e_cut {
                *e = 0.0;
            }
            if *e < params.emin {
                *e = params.emin;
            }
        });

    let (p_interim, bvc, pbvc) = calc_pressure(params, &e_new, compression, vnewc);

    e_new.par_iter_mut().enumerate().for_each(|(i, e)| {
        let q_tilde = if delvc[i] > 0.0 {
            0.0
        } else {
            let mut ssc = (pbvc[i] * *e + vnewc[i] * vnewc[i] * bvc[i] * p_interim[i]) / rho0;
            ssc = if ssc <= SSC_FLOOR { SSC_FALLBACK } else { ssc.sqrt() };
            ssc * ql_old[i] + qq_old[i]
        };

        *e -= (7.0 * (p_old[i] + q_old[i])
            - 8.0 * (p_half_step[i] + q_new[i])
            + (p_interim[i] + q_tilde))
            * delvc[i]
            * sixth;
        if e.abs() < params.e_cut {
            *e = 0.0;
        }
        if *e < params.emin {
            *e = params.emin;
        }
    });

    let (p_new, bvc, pbvc) = calc_pressure(params, &e_new, compression, vnewc);

    let q_new: Vec<Real> = (0..n)
        .into_par_iter()
        .map(|i| {
            if delvc[i] <= 0.0 {
                let mut ssc =
                    (pbvc[i] * e_new[i] + vnewc[i] * vnewc[i] * bvc[i] * p_new[i]) / rho0;
                ssc = if ssc <= SSC_FLOOR { SSC_FALLBACK } else { ssc.sqrt() };
                let q = ssc * ql_old[i] + qq_old[i];
                if q.abs() < params.q_cut {
                    0.0
                } else {
                    q
                }
            } else {
                q_new[i]
            }
        })
        .collect();

    EosOutcome {
        p_new,
        e_new,
        q_new,
        bvc,
        pbvc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::RankLayout;
    use approx::assert_relative_eq;

    fn test_domain() -> Domain {
        let layout = RankLayout::new(0, 1).unwrap();
        Domain::build(layout, 3, 1, 1, 1).unwrap()
    }

    #[test]
    fn quiescent_elements_stay_quiescent() {
        let mut d = test_domain();
        d.e[0] = 0.0;
        d.vnew.iter_mut().for_each(|v| *v = 1.0);
        apply_material_properties(&mut d).unwrap();

        assert!(d.e.iter().all(|&e| e == 0.0));
        assert!(d.p.iter().all(|&p| p == 0.0));
        assert!(d.q.iter().all(|&q| q == 0.0));
    }

    #[test]
    fn hot_element_gets_gamma_law_pressure_and_sound_speed() {
        let mut d = test_domain();
        d.vnew.iter_mut().for_each(|v| *v = 1.0);
        apply_material_properties(&mut d).unwrap();

        // p = (2/3) e / v for the undisturbed deposit element
        let e0 = d.e[0];
        assert!(e0 > 0.0);
        assert_relative_eq!(d.p[0], 2.0 / 3.0 * e0, max_relative = 1e-12);
        assert!(d.ss[0] > 0.0);
        // c^2 = (2/3 e + 2/3 p) / rho0 at v = 1
        let expected_ss = ((2.0 / 3.0) * e0 + (2.0 / 3.0) * d.p[0]).sqrt();
        assert_relative_eq!(d.ss[0], expected_ss, max_relative = 1e-12);
    }

    #[test]
    fn energy_floor_is_enforced() {
        let mut d = test_domain();
        d.e.iter_mut().for_each(|e| *e = -1.0e+20);
        d.vnew.iter_mut().for_each(|v| *v = 1.0);
        apply_material_properties(&mut d).unwrap();
        assert!(d.e.iter().all(|&e| e >= d.params.emin));
    }

    #[test]
    fn pressure_never_drops_below_the_floor() {
        let mut d = test_domain();
        d.e.iter_mut().for_each(|e| *e = -1.0);
        d.vnew.iter_mut().for_each(|v| *v = 1.0);
        apply_material_properties(&mut d).unwrap();
        assert!(d.p.iter().all(|&p| p >= d.params.pmin));
    }

    #[test]
    fn new_volumes_are_clamped_into_the_eos_window() {
        let mut d = test_domain();
        d.vnew[0] = 1.0e-12;
        d.vnew[1] = 1.0e+12;
        apply_material_properties(&mut d).unwrap();
        assert_eq!(d.vnew[0], d.params.eosvmin);
        assert_eq!(d.vnew[1], d.params.eosvmax);
    }

    #[test]
    fn volume_update_snaps_near_unity() {
        let mut d = test_domain();
        d.vnew.iter_mut().for_each(|v| *v = 1.0 + 1.0e-12);
        d.vnew[3] = 1.5;
        update_volumes(&mut d);
        assert_eq!(d.v[0], 1.0);
        assert_eq!(d.v[3], 1.5);
    }

    #[test]
    fn work_replication_does_not_change_the_answer() {
        let layout = RankLayout::new(0, 1).unwrap();

        let mut base = Domain::build(layout, 3, 1, 1, 1).unwrap();
        base.vnew.iter_mut().for_each(|v| *v = 1.0);
        apply_material_properties(&mut base).unwrap();

        let mut replicated = Domain::build(layout, 3, 1, 1, 4).unwrap();
        replicated.vnew.iter_mut().for_each(|v| *v = 1.0);
        apply_material_properties(&mut replicated).unwrap();

        assert_eq!(base.e, replicated.e);
        assert_eq!(base.p, replicated.p);
        assert_eq!(base.ss, replicated.ss);
    }
}
