//! Build fully-initialized evolution scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle
//! `Scenario` containing:
//! - the initial cluster (`Cluster`)
//! - the orbit source (`PointMassGalaxy` or `SampledOrbit` behind `OrbitProvider`)
//! - run options (`EvolutionOptions`: parameters, integrator, output, constants)
//!
//! `Scenario::simulation` then hands these to `Simulation::new`

use crate::configuration::config::ScenarioConfig;
use crate::simulation::cluster::Cluster;
use crate::simulation::engine::EvolutionOptions;
use crate::simulation::error::EvolutionError;
use crate::simulation::evolution::Simulation;
use crate::simulation::orbit::OrbitProvider;
use crate::simulation::states::EvolutionTrack;
use crate::simulation::params::Termination;

/// Runtime bundle built from a [`ScenarioConfig`]
pub struct Scenario {
    pub cluster: Cluster,
    pub galaxy: Box<dyn OrbitProvider>,
    pub options: EvolutionOptions,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Self {
        let cluster = Cluster::from(&cfg.cluster);

        // Engine (runtime) from EngineConfig
        let e_cfg = cfg.engine;
        let options = EvolutionOptions {
            parameters: cfg.parameters,
            method: e_cfg.integrator,
            fast: e_cfg.fast,
            initial_true_anomaly: e_cfg.initial_true_anomaly,
            output: cfg.output,
            constants: cfg.constants,
        };

        // Galaxy: a point mass carries the initial phase, samples are used as given
        let galaxy = cfg.galaxy.provider(e_cfg.initial_true_anomaly);

        Self { cluster, galaxy, options }
    }

    /// Validate everything and set up the run without stepping
    pub fn simulation(&self) -> Result<Simulation, EvolutionError> {
        Simulation::new(&self.cluster, self.galaxy.as_ref(), self.options.clone())
    }

    /// Run to completion
    pub fn run(&self) -> Result<(Termination, EvolutionTrack), EvolutionError> {
        let mut sim = self.simulation()?;
        let termination = sim.run()?;
        Ok((termination, sim.into_track()))
    }
}
