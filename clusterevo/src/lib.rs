pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use simulation::states::{State, StateField, DerivedParameters, Regime, RateCoefficients, Snapshot, EvolutionTrack};
pub use simulation::error::{ConfigError, EvolutionError};
pub use simulation::constants::Constants;
pub use simulation::cluster::{Cluster, Star};
pub use simulation::kepler::{solve_kepler, KeplerOrbit, OrbitPosition};
pub use simulation::orbit::{OrbitProvider, OrbitSamples, OrbitalConstants, PointMassGalaxy, SampledOrbit};
pub use simulation::derived::DerivedEngine;
pub use simulation::integrator::{euler_step, rk4_step, IntegrationMethod, RateModel};
pub use simulation::params::{Parameters, Termination};
pub use simulation::engine::EvolutionOptions;
pub use simulation::output::OutputOptions;
pub use simulation::evolution::{evolve, Simulation};
pub use simulation::scenario::Scenario;

pub use configuration::config::{ScenarioConfig, ClusterConfig, GalaxyConfig, EngineConfig};

pub use benchmark::benchmark::{bench_integrators, bench_kepler};
