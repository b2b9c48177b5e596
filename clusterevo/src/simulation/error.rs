//! Error types for setup and evolution
//!
//! `ConfigError` covers everything rejected before the first step.
//! `EvolutionError` wraps it together with I/O and numerical failures.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid input detected at the constructor boundary.
/// Every variant names the parameter that failed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("'{name}' must be a finite number, got {value}")]
    NotFinite { name: &'static str, value: f64 },

    #[error("'{name}' must be greater than 0, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("'{name}' must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("'final_time' ({final_time}) must be larger than 'initial_time' ({initial_time})")]
    FinalTimeBeforeInitial { initial_time: f64, final_time: f64 },

    #[error("'integration_method' must be either 'Euler' or 'RK4' (case-insensitive), got '{0}'")]
    UnknownIntegrationMethod(String),

    #[error("'initial_true_anomaly' must be in the range [0, 2*pi] (inclusive), got {0}")]
    TrueAnomalyOutOfRange(f64),

    #[error("'output_frequency' must be at least 1")]
    ZeroOutputFrequency,

    #[error("perigalactic distance ({perigalacticon} pc) exceeds apogalactic distance ({apogalacticon} pc)")]
    PericentreBeyondApocentre { apogalacticon: f64, perigalacticon: f64 },

    #[error("orbit provides {available} samples but the run needs {required}")]
    InsufficientOrbitSamples { required: usize, available: usize },
}

/// Failure while setting up or advancing a simulation
#[derive(Debug, Error)]
pub enum EvolutionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Kepler equation did not converge after {iterations} iterations (t = {time} Myr, e = {eccentricity})")]
    KeplerNonConvergence {
        time: f64,
        eccentricity: f64,
        iterations: usize,
    },

    #[error("orbit sample {step} requested but only {available} are available")]
    OrbitSampleOutOfRange { step: usize, available: usize },
}

impl EvolutionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Reject NaN and infinities
pub(crate) fn finite(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NotFinite { name, value })
    }
}

/// Finite and strictly greater than zero
pub(crate) fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if finite(name, value)? > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

/// Finite and not below zero
pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if finite(name, value)? >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Negative { name, value })
    }
}
