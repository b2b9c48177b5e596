//! Evolution loop
//!
//! `Simulation` owns the state and drives the configured integrator one fixed
//! step at a time until a termination criterion holds. After every step a
//! snapshot goes to the track; every `output_frequency` steps a row goes to the
//! data file when output is enabled.

use std::time::Instant;

use chrono::Local;
use log::{debug, info, warn};

use super::cluster::Cluster;
use super::derived::{ClusterConstants, DerivedEngine};
use super::engine::EvolutionOptions;
use super::error::{ConfigError, EvolutionError};
use super::integrator::IntegrationMethod;
use super::orbit::{OrbitModel, OrbitProvider, OrbitalConstants};
use super::output::{DataWriter, OrbitInfo, OutputFiles, RunInfo};
use super::params::{Parameters, Termination, TerminationCriteria};
use super::states::{DerivedParameters, EvolutionTrack, OutputParameters, Snapshot, State};

pub struct Simulation {
    engine: DerivedEngine,
    method: IntegrationMethod,
    parameters: Parameters,
    criteria: TerminationCriteria,
    state: State,
    steps: usize,
    reported: OutputParameters,
    track: EvolutionTrack,
    files: Option<OutputFiles>,
    data: Option<DataWriter>,
    opened: bool,
    run_info: RunInfo,
}

impl Simulation {
    /// Validate inputs, fix the orbit and build the initial state.
    /// Output files, if requested, are truncated here
    pub fn new(cluster: &Cluster, provider: &dyn OrbitProvider, options: EvolutionOptions) -> Result<Self, EvolutionError> {
        cluster.validate()?;
        options.validate()?;

        let EvolutionOptions { parameters, method, fast, initial_true_anomaly, output, constants } = options;
        let orbit = OrbitalConstants::from_provider(provider, &constants)?;
        if orbit.eccentricity > 0.9 {
            warn!(
                "orbit eccentricity {:.3} is close to unity; Kepler iterations may be slow and stop at {} (kepler_max_iterations)",
                orbit.eccentricity, constants.kepler_max_iterations
            );
        }

        let model = if fast {
            OrbitModel::analytic(&orbit, &constants, initial_true_anomaly)
        } else {
            let times = parameters.sample_times();
            let samples = provider.sample(&times, &constants)?;
            if samples.len() < times.len() {
                return Err(ConfigError::InsufficientOrbitSamples {
                    required: times.len(),
                    available: samples.len(),
                }
                .into());
            }
            OrbitModel::Sampled(samples)
        };

        let fast_info = model.period().map(|period| OrbitInfo {
            initial_true_anomaly,
            mean_motion: orbit.mean_motion(&constants),
            period,
        });

        let cluster_constants =
            ClusterConstants::new(cluster.mass, cluster.half_mass_radius, cluster.mean_stellar_mass, &constants);
        let state = cluster_constants.initial_state(parameters.initial_time, &constants);
        let engine = DerivedEngine::new(constants, cluster_constants, orbit, model);

        let initial = engine.derive(&state, 0)?;
        info!(
            "initial cluster: M = {:.4e} Msun, rh = {:.3} pc, rc = {:.3} pc, kappa = {:.4}, rJ = {:.3} pc, MG = {:.4e} Msun",
            state.m, state.rh, state.rc, state.kappa, initial.rj, orbit.point_mass
        );

        let files = output.as_ref().map(OutputFiles::create).transpose()?;

        let run_info = RunInfo {
            initial_stars: cluster.stars(),
            mean_mass: cluster.mean_stellar_mass,
            initial_mass: cluster.mass,
            initial_half_mass_radius: cluster.half_mass_radius,
            apogalacticon: orbit.apogalacticon,
            perigalacticon: orbit.perigalacticon,
            eccentricity: orbit.eccentricity,
            fast: fast_info,
            initial_time: parameters.initial_time,
            final_time: parameters.final_time,
            time_step: parameters.time_step,
            critical_mass_fraction: parameters.critical_mass_fraction,
            critical_half_mass_radius: parameters.critical_half_mass_radius,
            method,
            started: Local::now(),
        };

        Ok(Self {
            criteria: parameters.termination(cluster.mass),
            reported: OutputParameters { n: initial.n, rv: initial.rv, rj: initial.rj, x: initial.x, y: initial.y },
            track: EvolutionTrack::new(Snapshot::from(&state)),
            engine,
            method,
            parameters,
            state,
            steps: 0,
            files,
            data: None,
            opened: false,
            run_info,
        })
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Completed steps
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn track(&self) -> &EvolutionTrack {
        &self.track
    }

    pub fn into_track(self) -> EvolutionTrack {
        self.track
    }

    pub fn engine(&self) -> &DerivedEngine {
        &self.engine
    }

    pub fn run_info(&self) -> &RunInfo {
        &self.run_info
    }

    /// Reporting quantities of the latest accepted step
    pub fn reported(&self) -> &OutputParameters {
        &self.reported
    }

    /// Derived set at the current state, as the next step will first see it
    pub fn derived(&self) -> Result<DerivedParameters, EvolutionError> {
        self.engine.derive(&self.state, self.steps)
    }

    /// `Some` once any of the stopping thresholds holds
    pub fn termination(&self) -> Option<Termination> {
        self.criteria.check(&self.state)
    }

    /// Advance by one time step, record the snapshot and write the data row if due.
    /// The first call writes the info file and the data header
    pub fn step(&mut self) -> Result<(), EvolutionError> {
        self.open_output()?;
        self.method.step(&mut self.state, &self.engine, self.parameters.time_step, self.steps)?;
        self.steps += 1;
        self.reported = self.engine.output_parameters(&self.state, self.steps)?;

        if (self.steps - 1) % self.parameters.output_frequency == 0 {
            if let Some(data) = self.data.as_mut() {
                let r = &self.reported;
                let s = &self.state;
                data.write_row(&[s.t, s.m, s.rh, s.rc, r.rj, r.rv, r.x, r.y])?;
            }
        }

        self.track.add_snapshot(Snapshot::from(&self.state));
        debug!(
            "step {}: t = {:.3} Myr, M = {:.5e}, rh = {:.4}, rc = {:.4}, rJ = {:.4}",
            self.steps, self.state.t, self.state.m, self.state.rh, self.state.rc, self.reported.rj
        );
        Ok(())
    }

    /// Step until a termination criterion holds. The data file is closed on
    /// every exit path
    pub fn run(&mut self) -> Result<Termination, EvolutionError> {
        let started = Instant::now();
        let result = self.open_output().and_then(|_| self.run_loop());
        let closed = self.data.take().map(DataWriter::finish).transpose();
        let termination = result?;
        if let Some(rows) = closed? {
            debug!("wrote {rows} data rows");
        }

        info!(
            "stopped ({:?}) after {} steps in {:.3} s: t = {:.2} Myr, M = {:.4e} Msun, rh = {:.3} pc, rc = {:.3} pc",
            termination,
            self.steps,
            started.elapsed().as_secs_f64(),
            self.state.t,
            self.state.m,
            self.state.rh,
            self.state.rc
        );
        Ok(termination)
    }

    fn run_loop(&mut self) -> Result<Termination, EvolutionError> {
        loop {
            if let Some(reason) = self.termination() {
                return Ok(reason);
            }
            self.step()?;
        }
    }

    fn open_output(&mut self) -> Result<(), EvolutionError> {
        if self.opened {
            return Ok(());
        }
        self.opened = true;
        if let Some(files) = &self.files {
            files.write_info(&self.run_info)?;
            let mut data = files.open_data()?;
            data.write_header()?;
            self.data = Some(data);
        }
        Ok(())
    }
}

/// Evolve `cluster` along the orbit from `provider` until it dissolves or the
/// final time is reached
pub fn evolve(cluster: &Cluster, provider: &dyn OrbitProvider, options: EvolutionOptions) -> Result<EvolutionTrack, EvolutionError> {
    let mut sim = Simulation::new(cluster, provider, options)?;
    sim.run()?;
    Ok(sim.into_track())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::orbit::PointMassGalaxy;

    fn cluster() -> Cluster {
        Cluster::new(1e5, 3.0, 0.5).unwrap()
    }

    #[test]
    fn snapshot_per_step() {
        let galaxy = PointMassGalaxy::new(1e11, 1000.0, 500.0);
        let mut sim = Simulation::new(&cluster(), &galaxy, EvolutionOptions::fast(20.0)).unwrap();
        assert_eq!(sim.run().unwrap(), Termination::FinalTime);
        assert_eq!(sim.steps(), 20);
        assert_eq!(sim.track().len(), 20);
        assert_eq!(sim.track().initial.t, 0.0);
        assert_eq!(sim.track().last().t, 20.0);
    }

    #[test]
    fn manual_stepping_matches_run() {
        let galaxy = PointMassGalaxy::new(1e11, 1000.0, 500.0);
        let mut a = Simulation::new(&cluster(), &galaxy, EvolutionOptions::fast(5.0)).unwrap();
        let mut b = Simulation::new(&cluster(), &galaxy, EvolutionOptions::fast(5.0)).unwrap();
        a.run().unwrap();
        while b.termination().is_none() {
            b.step().unwrap();
        }
        assert_eq!(a.track(), b.track());
    }

    #[test]
    fn kepler_failure_keeps_partial_track() {
        let galaxy = PointMassGalaxy::new(1e11, 1000.0, 500.0);
        let mut options = EvolutionOptions::fast(50.0);
        // e = 1/3 needs a few iterations at any phase but the first
        options.constants.kepler_max_iterations = 0;
        // t = 0 sits at pericentre where E = M = 0 solves immediately, so setup succeeds
        let mut sim = Simulation::new(&cluster(), &galaxy, options).unwrap();
        let result = sim.run();
        assert!(matches!(result, Err(EvolutionError::KeplerNonConvergence { .. })));
        assert_eq!(sim.track().len(), sim.steps());
    }
}
