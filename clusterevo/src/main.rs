use clusterevo::{ScenarioConfig, Scenario};
use clusterevo::{bench_integrators, bench_kepler};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// Scenario file, relative to the crate's `scenarios/` directory or absolute
    #[arg(short, default_value = "default.yaml")]
    file_name: String,

    /// Time the integrators and the Kepler solver instead of running a scenario
    #[arg(long)]
    bench: bool,

    /// Print every n-th snapshot of the finished run
    #[arg(long, default_value_t = 100)]
    summary_every: usize,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name);
    let file = File::open(&config_path)
        .with_context(|| format!("failed to open scenario {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("failed to parse scenario {}", config_path.display()))?;

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.bench {
        bench_integrators();
        bench_kepler();
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let scenario = Scenario::build_scenario(scenario_cfg);
    info!("loaded scenario {}", args.file_name);

    let mut sim = scenario.simulation().context("invalid scenario")?;
    let termination = sim.run().context("evolution failed")?;

    let run_info = sim.run_info();
    println!(
        "{} integration, M0 = {:.4e} Msun, rh0 = {} pc, ra = {} pc, rp = {} pc, e = {:.4}",
        run_info.method,
        run_info.initial_mass,
        run_info.initial_half_mass_radius,
        run_info.apogalacticon,
        run_info.perigalacticon,
        run_info.eccentricity
    );
    if let Some(orbit) = &run_info.fast {
        println!("orbital period = {:.2} Myr", orbit.period);
    }

    let track = sim.track();
    println!("{:>12} {:>14} {:>10} {:>10}", "t [Myr]", "M [Msun]", "rh [pc]", "rc [pc]");
    let every = args.summary_every.max(1);
    let initial = std::iter::once(&track.initial);
    let sampled = track.snapshots.iter().skip(every - 1).step_by(every);
    for s in initial.chain(sampled) {
        println!("{:12.2} {:14.6e} {:10.4} {:10.4}", s.t, s.mass, s.half_mass_radius, s.core_radius);
    }

    let last = track.last();
    let reported = sim.reported();
    println!(
        "stopped ({termination:?}) after {} steps at t = {:.2} Myr with M = {:.6e} Msun, N = {:.0}, rJ = {:.3} pc, rv = {:.3} pc",
        track.len(),
        last.t,
        last.mass,
        reported.n,
        reported.rj,
        reported.rv
    );

    Ok(())
}
