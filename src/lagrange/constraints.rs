//! Next-cycle time-step constraint scans.
//!
//! Both scans run per region and reduce to a single minimum; the reductions
//! are associative min operations, so the parallel fold order does not
//! change the result.

use rayon::prelude::*;

use crate::domain::Domain;
use crate::Real;

const HUGE_DT: Real = 1.0e+20;

/// Scan every element for the Courant and volume-change constraints the
/// next TimeIncrement will honor.
pub fn calc_time_constraints(domain: &mut Domain) {
    domain.dtcourant = HUGE_DT;
    domain.dthydro = HUGE_DT;

    let qqc2 = 64.0 * domain.params.qqc * domain.params.qqc;
    let dvovmax = domain.params.dvovmax;

    for r in 0..domain.regions.num_regions {
        let elems = &domain.regions.elem_lists[r];

        // Courant: wave transit across the characteristic length, with the
        // quadratic viscosity stiffening the denominator under compression
        let dtcourant = elems
            .par_iter()
            .map(|&i| {
                if domain.vdov[i] == 0.0 {
                    return HUGE_DT;
                }
                let mut dtf = domain.ss[i] * domain.ss[i];
                if domain.vdov[i] < 0.0 {
                    dtf += qqc2
                        * domain.arealg[i]
                        * domain.arealg[i]
                        * domain.vdov[i]
                        * domain.vdov[i];
                }
                domain.arealg[i] / dtf.sqrt()
            })
            .reduce(|| HUGE_DT, Real::min);

        // hydro: bound the relative volume change per step
        let dthydro = elems
            .par_iter()
            .map(|&i| {
                if domain.vdov[i] == 0.0 {
                    HUGE_DT
                } else {
                    dvovmax / (domain.vdov[i].abs() + 1.0e-20)
                }
            })
            .reduce(|| HUGE_DT, Real::min);

        domain.dtcourant = domain.dtcourant.min(dtcourant);
        domain.dthydro = domain.dthydro.min(dthydro);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::RankLayout;
    use approx::assert_relative_eq;

    fn test_domain() -> Domain {
        let layout = RankLayout::new(0, 1).unwrap();
        Domain::build(layout, 3, 2, 1, 1).unwrap()
    }

    #[test]
    fn static_elements_impose_no_constraints() {
        let mut d = test_domain();
        d.ss.iter_mut().for_each(|s| *s = 1.0);
        d.arealg.iter_mut().for_each(|a| *a = 0.1);
        calc_time_constraints(&mut d);
        assert_eq!(d.dtcourant, HUGE_DT);
        assert_eq!(d.dthydro, HUGE_DT);
    }

    #[test]
    fn expanding_element_sets_the_plain_courant_bound() {
        let mut d = test_domain();
        d.ss.iter_mut().for_each(|s| *s = 2.0);
        d.arealg.iter_mut().for_each(|a| *a = 0.5);
        d.vdov[7] = 1.0e-6; // expanding: no viscosity stiffening

        calc_time_constraints(&mut d);
        assert_relative_eq!(d.dtcourant, 0.5 / 2.0, max_relative = 1e-10);
    }

    #[test]
    fn compression_tightens_the_courant_bound() {
        let mut d = test_domain();
        d.ss.iter_mut().for_each(|s| *s = 2.0);
        d.arealg.iter_mut().for_each(|a| *a = 0.5);
        d.vdov[7] = -3.0;

        calc_time_constraints(&mut d);
        let qqc2 = 64.0 * d.params.qqc * d.params.qqc;
        let expected = 0.5 / (4.0 as Real + qqc2 * 0.25 * 9.0).sqrt();
        assert_relative_eq!(d.dtcourant, expected, max_relative = 1e-10);
        assert!(d.dtcourant < 0.25);
    }

    #[test]
    fn hydro_bound_tracks_the_fastest_volume_change() {
        let mut d = test_domain();
        d.ss.iter_mut().for_each(|s| *s = 1.0);
        d.arealg.iter_mut().for_each(|a| *a = 1.0);
        d.vdov[3] = -0.5;
        d.vdov[9] = 0.2;

        calc_time_constraints(&mut d);
        assert_relative_eq!(
            d.dthydro,
            d.params.dvovmax / 0.5,
            max_relative = 1e-10
        );
    }

    #[test]
    fn minimum_wins_across_regions() {
        let mut d = test_domain();
        d.ss.iter_mut().for_each(|s| *s = 1.0);
        d.arealg.iter_mut().for_each(|a| *a = 1.0);
        // put a constraint in every region, keep the tightest distinct
        d.vdov[0] = 1.0e-9;
        for i in 1..d.num_elem() {
            d.vdov[i] = 1.0e-12;
        }
        calc_time_constraints(&mut d);
        assert!(d.dtcourant <= 1.0);
        assert!(d.dthydro <= d.params.dvovmax / 1.0e-9 + 1.0);
    }
}
