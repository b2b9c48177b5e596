//! Configuration types for loading evolution scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! scenario. A scenario consists of:
//!
//! - [`EngineConfig`]  – integrator, orbit mode and initial orbital phase
//! - [`Parameters`]    – time grid and termination thresholds
//! - [`ClusterConfig`] – initial bulk state of the cluster
//! - [`GalaxyConfig`]  – where the orbit and tidal field come from
//! - [`OutputOptions`] – optional info/data files
//! - [`Constants`]     – optional overrides of the model constants
//!
//! # YAML format
//! ```yaml
//! engine:
//!   integrator: "rk4"         # or "euler", case-insensitive
//!   fast: true                # Kepler orbit instead of orbit samples
//!   initial_true_anomaly: 0.0 # rad, fast mode only
//!
//! parameters:
//!   initial_time: 0.0         # Myr
//!   final_time: 1000.0        # Myr
//!   time_step: 1.0            # Myr
//!   output_frequency: 1       # data row every k steps
//!   critical_mass_fraction: 0.5
//!   critical_half_mass_radius: 0.0
//!
//! cluster:
//!   mass: 1.0e5               # Msun
//!   half_mass_radius: 3.0     # pc
//!   mean_stellar_mass: 0.5    # Msun
//!
//! galaxy:
//!   point_mass:
//!     mass: 1.0e11            # Msun
//!     apogalacticon: 1000.0   # pc
//!     perigalacticon: 500.0   # pc
//!
//! output:                     # omit to keep results in memory only
//!   path: "./"
//!   filename: "evolve"
//! ```
//!
//! A `sampled` galaxy takes pre-integrated orbit samples instead:
//!
//! ```yaml
//! galaxy:
//!   sampled:
//!     apogalacticon: 2000.0
//!     perigalacticon: 2000.0
//!     potential_at_apogalacticon: -215000.0  # (km/s)^2
//!     tidal_norm: [ 0.29876, 0.29876, 0.29876 ] # pc per Msun^(1/3)
//!     positions: [ [2000.0, 0.0, 0.0], [1948.75, 449.86, 0.0], [1797.63, 876.66, 0.0] ]
//! ```

use serde::Deserialize;

use crate::simulation::cluster::Cluster;
use crate::simulation::constants::Constants;
use crate::simulation::integrator::IntegrationMethod;
use crate::simulation::orbit::{NVec3, OrbitProvider, OrbitSamples, PointMassGalaxy, SampledOrbit};
use crate::simulation::output::OutputOptions;
use crate::simulation::params::Parameters;

/// Engine-level switches
#[derive(Deserialize, Debug, Clone, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub integrator: IntegrationMethod, // Time integrator used for advancing the cluster state
    #[serde(default)]
    pub fast: bool, // `true` - analytic Kepler orbit, `false` - orbit samples from the galaxy
    #[serde(default)]
    pub initial_true_anomaly: f64, // orbital phase at the initial time, fast mode only
}

/// Initial bulk state of the cluster
#[derive(Deserialize, Debug, Clone)]
pub struct ClusterConfig {
    pub mass: f64,              // total mass [Msun]
    pub half_mass_radius: f64,  // [pc]
    pub mean_stellar_mass: f64, // [Msun]
}

impl From<&ClusterConfig> for Cluster {
    fn from(c: &ClusterConfig) -> Self {
        Cluster { mass: c.mass, half_mass_radius: c.half_mass_radius, mean_stellar_mass: c.mean_stellar_mass }
    }
}

/// Host galaxy / orbit source
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub enum GalaxyConfig {
    /// Keplerian orbit around a point mass
    PointMass {
        mass: f64,
        apogalacticon: f64,
        perigalacticon: f64,
    },
    /// Orbit integrated elsewhere, one sample per step
    Sampled {
        apogalacticon: f64,
        perigalacticon: f64,
        potential_at_apogalacticon: f64,
        tidal_norm: Vec<f64>,
        positions: Vec<[f64; 3]>,
    },
}

impl GalaxyConfig {
    /// Runtime orbit source. `initial_true_anomaly` only matters for a point mass
    pub fn provider(&self, initial_true_anomaly: f64) -> Box<dyn OrbitProvider> {
        match self {
            GalaxyConfig::PointMass { mass, apogalacticon, perigalacticon } => Box::new(
                PointMassGalaxy::new(*mass, *apogalacticon, *perigalacticon).with_true_anomaly(initial_true_anomaly),
            ),
            GalaxyConfig::Sampled { apogalacticon, perigalacticon, potential_at_apogalacticon, tidal_norm, positions } => {
                Box::new(SampledOrbit {
                    apogalacticon: *apogalacticon,
                    perigalacticon: *perigalacticon,
                    potential_at_apogalacticon: *potential_at_apogalacticon,
                    samples: OrbitSamples {
                        tidal_norm: tidal_norm.clone(),
                        positions: positions.iter().map(|p| NVec3::new(p[0], p[1], p[2])).collect(),
                    },
                })
            }
        }
    }
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub engine: EngineConfig, // Integrator and orbit mode
    #[serde(default)]
    pub parameters: Parameters, // Time grid and termination thresholds
    pub cluster: ClusterConfig, // Initial cluster
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub galaxy: GalaxyConfig, // Orbit source, `point_mass:` or `sampled:` map
    #[serde(default)]
    pub output: Option<OutputOptions>, // Info/data files, none by default
    #[serde(default)]
    pub constants: Constants, // Model constant overrides
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
engine:
  integrator: "Euler"
  fast: true
parameters:
  final_time: 1000
  critical_mass_fraction: 0.5
cluster:
  mass: 1.0e5
  half_mass_radius: 3.0
  mean_stellar_mass: 0.5
galaxy:
  point_mass:
    mass: 1.0e11
    apogalacticon: 1000.0
    perigalacticon: 500.0
constants:
  transition_width: 0.1
"#;

    #[test]
    fn parses_full_scenario() {
        let cfg: ScenarioConfig = serde_yaml::from_str(SCENARIO).unwrap();
        assert_eq!(cfg.engine.integrator, IntegrationMethod::Euler);
        assert!(cfg.engine.fast);
        assert_eq!(cfg.parameters.final_time, 1000.0);
        assert_eq!(cfg.parameters.time_step, 1.0);
        assert_eq!(cfg.parameters.critical_mass_fraction, 0.5);
        assert!(cfg.output.is_none());
        assert_eq!(cfg.constants.transition_width, 0.1);
        assert_eq!(cfg.constants.zeta, 0.1);
        let galaxy = cfg.galaxy.provider(0.0);
        assert_eq!(galaxy.apogalacticon(), 1000.0);
        assert_eq!(galaxy.perigalacticon(), 500.0);
        assert_eq!(galaxy.potential_at_apogalacticon(), -4.3e-3 * 1.0e11 / 1000.0);
    }

    #[test]
    fn unknown_integrator_fails_to_parse() {
        let bad = SCENARIO.replace("\"Euler\"", "\"verlet\"");
        let err = serde_yaml::from_str::<ScenarioConfig>(&bad).unwrap_err();
        assert!(err.to_string().contains("integration_method"));
    }

    #[test]
    fn parses_sampled_galaxy() {
        let yaml = r#"
sampled:
  apogalacticon: 2000.0
  perigalacticon: 2000.0
  potential_at_apogalacticon: -215000.0
  tidal_norm: [0.01, 0.02]
  positions: [[2000.0, 0.0, 0.0], [0.0, 2000.0, 0.0]]
"#;
        let galaxy: GalaxyConfig =
            serde_yaml::with::singleton_map::deserialize(serde_yaml::Deserializer::from_str(yaml)).unwrap();
        let provider = galaxy.provider(0.0);
        assert_eq!(provider.potential_at_apogalacticon(), -215000.0);
        let samples = provider.sample(&[0.0, 1.0], &Constants::default()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples.positions[1].y, 2000.0);
        assert!(provider.sample(&[0.0, 1.0, 2.0], &Constants::default()).is_err());
    }
}
