//! High-level runtime engine settings
//!
//! Selects orbit mode (fast analytic or sampled), integrator, output files and
//! the constants used when building and running a `Simulation`

use std::f64::consts::TAU;

use super::constants::Constants;
use super::error::{finite, ConfigError};
use super::integrator::IntegrationMethod;
use super::output::OutputOptions;
use super::params::Parameters;

#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionOptions {
    pub parameters: Parameters,
    pub method: IntegrationMethod,     // euler or rk4
    pub fast: bool,                    // true = Kepler orbit, false = orbit samples
    pub initial_true_anomaly: f64,     // fast mode phase [rad]
    pub output: Option<OutputOptions>, // None = keep everything in memory
    pub constants: Constants,
}

impl Default for EvolutionOptions {
    fn default() -> Self {
        Self {
            parameters: Parameters::default(),
            method: IntegrationMethod::Rk4,
            fast: false,
            initial_true_anomaly: 0.0,
            output: None,
            constants: Constants::default(),
        }
    }
}

impl EvolutionOptions {
    pub fn fast(final_time: f64) -> Self {
        let mut options = Self { fast: true, ..Default::default() };
        options.parameters.final_time = final_time;
        options
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parameters.validate()?;
        let nu0 = finite("initial_true_anomaly", self.initial_true_anomaly)?;
        if self.fast && !(0.0..=TAU).contains(&nu0) {
            return Err(ConfigError::TrueAnomalyOutOfRange(nu0));
        }
        Ok(())
    }
}
