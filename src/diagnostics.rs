//! End-of-run reporting: the one-line summary, the grind figures, and the
//! blast symmetry diagnostic.

use serde::Serialize;

use crate::domain::Domain;
use crate::Real;

/// Everything the final report carries; serializable so harnesses can
/// consume it structurally instead of scraping stdout.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Elements along one subdomain edge
    pub problem_size: usize,
    pub num_ranks: usize,
    pub cycles: u32,
    pub final_time: f64,
    pub elapsed_secs: f64,
    pub final_origin_energy: f64,
    /// Microseconds per zone per cycle
    pub grind_us_per_zone_cycle: f64,
    /// Zones times cycles per second of wall time
    pub fom_zone_cycles_per_sec: f64,
    /// Largest |e(j,k) - e(k,j)| over the origin plane, absolute and
    /// relative: the blast is symmetric, so these measure accumulated
    /// asymmetry
    pub max_abs_diff: f64,
    pub max_rel_diff: f64,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "size={edge}^3 ranks={ranks} cycles={cycles} time={time:.6e} \
             elapsed={elapsed:.3}s origin_energy={energy:.6e} \
             grind={grind:.4}us/z/c fom={fom:.6e}z*c/s",
            edge = self.problem_size,
            ranks = self.num_ranks,
            cycles = self.cycles,
            time = self.final_time,
            elapsed = self.elapsed_secs,
            energy = self.final_origin_energy,
            grind = self.grind_us_per_zone_cycle,
            fom = self.fom_zone_cycles_per_sec,
        )
    }
}

/// Build the final report for a finished run.
pub fn final_summary(
    domain: &Domain,
    elapsed_secs: f64,
    nx: usize,
    num_ranks: usize,
) -> RunSummary {
    let zones = (nx * nx * nx * num_ranks) as f64;
    let cycles = domain.cycle.max(1) as f64;

    let (max_abs_diff, max_rel_diff) = origin_plane_asymmetry(domain, nx);

    RunSummary {
        problem_size: nx,
        num_ranks,
        cycles: domain.cycle,
        final_time: domain.time as f64,
        elapsed_secs,
        final_origin_energy: domain.origin_energy() as f64,
        grind_us_per_zone_cycle: elapsed_secs * 1.0e6 / (zones * cycles),
        fom_zone_cycles_per_sec: zones * cycles / elapsed_secs.max(1.0e-12),
        max_abs_diff,
        max_rel_diff,
    }
}

/// The Sedov blast is symmetric under swapping the row and column axes;
/// compare transposed element pairs of the origin plane.
fn origin_plane_asymmetry(domain: &Domain, nx: usize) -> (f64, f64) {
    let mut max_abs: Real = 0.0;
    let mut max_rel: Real = 0.0;

    for j in 0..nx {
        for k in (j + 1)..nx {
            let a = domain.e[j * nx + k];
            let b = domain.e[k * nx + j];
            let abs_diff = (a - b).abs();
            max_abs = max_abs.max(abs_diff);
            if b != 0.0 {
                max_rel = max_rel.max(abs_diff / b);
            }
        }
    }

    (max_abs as f64, max_rel as f64)
}

/// Per-cycle progress line, emitted under the progress flag.
pub fn progress_line(domain: &Domain) -> String {
    format!(
        "cycle = {}, time = {:.6e}, dt = {:.6e}",
        domain.cycle, domain.time, domain.deltatime
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::RankLayout;

    #[test]
    fn summary_reports_the_deposit_before_any_cycle() {
        let layout = RankLayout::new(0, 1).unwrap();
        let domain = Domain::build(layout, 3, 1, 1, 1).unwrap();
        let summary = final_summary(&domain, 1.0, 3, 1);

        assert_eq!(summary.cycles, 0);
        assert_eq!(summary.problem_size, 3);
        assert!(summary.final_origin_energy > 0.0);
        // untouched field: perfectly symmetric
        assert_eq!(summary.max_abs_diff, 0.0);
    }

    #[test]
    fn grind_and_fom_are_reciprocal() {
        let layout = RankLayout::new(0, 1).unwrap();
        let mut domain = Domain::build(layout, 3, 1, 1, 1).unwrap();
        domain.cycle = 10;
        let summary = final_summary(&domain, 2.0, 3, 1);

        let product = summary.grind_us_per_zone_cycle * summary.fom_zone_cycles_per_sec;
        assert!((product - 1.0e6).abs() < 1.0);
    }
}
