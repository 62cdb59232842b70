use std::time::Instant;

use clap::Parser;
use log::{error, info, warn, LevelFilter};
use simple_logger::SimpleLogger;

use shock_hydro::diagnostics::{self, progress_line};
use shock_hydro::exchange::{FieldId, MessageKind};
use shock_hydro::{
    lagrange_leap_frog, time_increment, Domain, NullExchange, RankLayout, RunOptions,
    RunSummary, SimulationError,
};
use shock_hydro::exchange::GhostExchange;

fn main() {
    let opts = RunOptions::parse();
    init_logging(opts.quiet);

    match run(&opts) {
        Ok(summary) => {
            println!("{}", summary);
        }
        Err(err) => {
            error!("fatal: {}", err);
            std::process::exit(err.exit_code());
        }
    }
}

fn run(opts: &RunOptions) -> Result<RunSummary, SimulationError> {
    // single-process driver: one rank, the no-op transport
    let num_ranks = 1;
    let layout = RankLayout::new(0, num_ranks)?;

    info!(
        "building {edge}x{edge}x{edge} subdomain, {r} regions, balance {b}, cost {c}",
        edge = opts.edge_elems,
        r = opts.num_regions,
        b = opts.balance,
        c = opts.cost,
    );

    let mut domain = Domain::build(
        layout,
        opts.edge_elems,
        opts.num_regions,
        opts.balance,
        opts.cost,
    )?;
    let mut exchange = NullExchange;

    // boundary nodes carry mass from every rank touching them
    exchange.post_receives(&domain, MessageKind::NodalSum, 1, false);
    exchange.send(&domain, MessageKind::NodalSum, &[FieldId::NodalMass], false);
    exchange.apply_sum(&mut domain, &[FieldId::NodalMass]);

    if opts.viz || opts.num_files > 0 {
        warn!("visualization dump requested, but no dump collaborator is linked in");
    }

    let start = Instant::now();

    while domain.time < domain.stoptime
        && (opts.iterations == 0 || domain.cycle < opts.iterations)
    {
        time_increment(&mut domain, &mut exchange);
        lagrange_leap_frog(&mut domain, &mut exchange)?;

        if opts.show_progress && !opts.quiet {
            println!("{}", progress_line(&domain));
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    let summary = diagnostics::final_summary(&domain, elapsed, opts.edge_elems, num_ranks);

    info!(
        "run completed: {} cycles to t = {:.6e}, origin energy {:.12e}",
        summary.cycles, summary.final_time, summary.final_origin_energy
    );
    info!(
        "symmetry check: max abs diff {:.6e}, max rel diff {:.6e}",
        summary.max_abs_diff, summary.max_rel_diff
    );

    Ok(summary)
}

fn init_logging(quiet: bool) {
    let level = if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init().unwrap();
}
