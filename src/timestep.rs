//! The Courant/volume-change time increment controller.
//!
//! Starting from the previous step, the controller takes the tighter of the
//! two constraint targets (half the Courant bound, two thirds of the hydro
//! bound), lets the step grow by at most the upper ratio per cycle, caps it
//! at the configured maximum, and finally avoids overshooting the stop time.
//! On distributed runs every rank proposes its own candidate and the
//! collective minimum wins.

use crate::domain::Domain;
use crate::exchange::GhostExchange;
use crate::Real;

const HUGE_DT: Real = 1.0e+20;

/// Choose the time step for the coming cycle and advance the clock.
pub fn time_increment(domain: &mut Domain, exchange: &mut dyn GhostExchange) {
    let mut targetdt = domain.stoptime - domain.time;

    if domain.dtfixed <= 0.0 && domain.cycle != 0 {
        let olddt = domain.deltatime;

        let mut gnewdt = HUGE_DT;
        if domain.dtcourant < gnewdt {
            gnewdt = domain.dtcourant / 2.0;
        }
        if domain.dthydro < gnewdt {
            gnewdt = domain.dthydro * 2.0 / 3.0;
        }

        let mut newdt = exchange.reduce_min(gnewdt);

        let ratio = newdt / olddt;
        if ratio >= 1.0 {
            if ratio < domain.delta_time_mult_lb {
                newdt = olddt;
            } else if ratio > domain.delta_time_mult_ub {
                newdt = olddt * domain.delta_time_mult_ub;
            }
        }
        if newdt > domain.dtmax {
            newdt = domain.dtmax;
        }
        domain.deltatime = newdt;
    }

    // stretch a near-final step instead of leaving a sliver for the last cycle
    if targetdt > domain.deltatime && targetdt < 4.0 * domain.deltatime / 3.0 {
        targetdt = 2.0 * domain.deltatime / 3.0;
    }
    if targetdt < domain.deltatime {
        domain.deltatime = targetdt;
    }

    domain.time += domain.deltatime;
    domain.cycle += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::NullExchange;
    use crate::mesh::RankLayout;
    use approx::assert_relative_eq;

    fn controller_domain(dt: Real) -> Domain {
        let layout = RankLayout::new(0, 1).unwrap();
        let mut d = Domain::build(layout, 2, 1, 1, 1).unwrap();
        d.deltatime = dt;
        d.cycle = 1; // past the first cycle, so the controller is active
        d
    }

    #[test]
    fn first_cycle_keeps_the_analytic_step() {
        let layout = RankLayout::new(0, 1).unwrap();
        let mut d = Domain::build(layout, 2, 1, 1, 1).unwrap();
        let dt0 = d.deltatime;
        time_increment(&mut d, &mut NullExchange);
        assert_relative_eq!(d.deltatime, dt0);
        assert_relative_eq!(d.time, dt0);
        assert_eq!(d.cycle, 1);
    }

    #[test]
    fn growth_is_capped_at_the_upper_ratio() {
        let mut d = controller_domain(1.0e-6);
        d.dtcourant = 1.0; // would allow a huge step
        d.dthydro = 1.0;
        time_increment(&mut d, &mut NullExchange);
        assert_relative_eq!(d.deltatime, 1.2e-6, max_relative = 1e-12);
    }

    #[test]
    fn growth_below_the_lower_ratio_is_ignored() {
        let mut d = controller_domain(1.0e-6);
        // candidate is olddt * 1.05: inside the dead band, keep olddt
        d.dtcourant = 2.1e-6;
        d.dthydro = HUGE_DT;
        time_increment(&mut d, &mut NullExchange);
        assert_relative_eq!(d.deltatime, 1.0e-6, max_relative = 1e-12);
    }

    #[test]
    fn constraints_shrink_the_step_without_a_floor() {
        let mut d = controller_domain(1.0e-4);
        d.dtcourant = 1.0e-6;
        d.dthydro = HUGE_DT;
        time_increment(&mut d, &mut NullExchange);
        assert_relative_eq!(d.deltatime, 0.5e-6, max_relative = 1e-12);
    }

    #[test]
    fn hydro_target_is_two_thirds() {
        let mut d = controller_domain(1.0e-4);
        d.dtcourant = HUGE_DT;
        d.dthydro = 3.0e-6;
        time_increment(&mut d, &mut NullExchange);
        assert_relative_eq!(d.deltatime, 2.0e-6, max_relative = 1e-12);
    }

    #[test]
    fn step_never_exceeds_dtmax() {
        let mut d = controller_domain(9.9e-3);
        d.dtmax = 1.0e-2;
        d.dtcourant = 1.0e+6;
        d.dthydro = 1.0e+6;
        // growth cap gives 1.188e-2, dtmax clamps it back
        time_increment(&mut d, &mut NullExchange);
        assert!(d.deltatime <= d.dtmax + 1.0e-18);
    }

    #[test]
    fn final_step_lands_exactly_on_stop_time() {
        let mut d = controller_domain(1.0e-3);
        d.dtcourant = HUGE_DT;
        d.dthydro = HUGE_DT;
        d.time = d.stoptime - 5.0e-4; // remaining time smaller than dt
        time_increment(&mut d, &mut NullExchange);
        assert_relative_eq!(d.time, d.stoptime, max_relative = 1e-12);
    }

    #[test]
    fn near_final_step_is_split_rather_than_slivered() {
        let mut d = controller_domain(1.0e-3);
        // candidate inside the dead band keeps the old step
        d.dtcourant = 2.1e-3;
        d.dthydro = HUGE_DT;
        // remaining time is 1.25 dt: inside (dt, 4dt/3), so take 2dt/3
        d.time = d.stoptime - 1.25e-3;
        time_increment(&mut d, &mut NullExchange);
        assert_relative_eq!(d.deltatime, 2.0 / 3.0 * 1.0e-3, max_relative = 1e-10);
    }
}
