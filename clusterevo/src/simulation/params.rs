//! Time-grid and termination parameters
//!
//! `Parameters` holds the run's clock and stopping thresholds:
//! - initial/final time and the fixed step,
//! - output cadence for the data file,
//! - critical mass fraction and half-mass radius

use serde::Deserialize;

use super::error::{non_negative, positive, ConfigError};
use super::states::State;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Parameters {
    pub initial_time: f64,              // Myr
    pub final_time: f64,                // Myr
    pub time_step: f64,                 // Myr
    pub output_frequency: usize,        // data-file row every k steps
    pub critical_mass_fraction: f64,    // stop once M < fraction * M0
    pub critical_half_mass_radius: f64, // stop once rh < this [pc]
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            initial_time: 0.0,
            final_time: 12000.0,
            time_step: 1.0,
            output_frequency: 1,
            critical_mass_fraction: 0.01,
            critical_half_mass_radius: 0.0,
        }
    }
}

impl Parameters {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t0 = non_negative("initial_time", self.initial_time)?;
        let tf = non_negative("final_time", self.final_time)?;
        positive("time_step", self.time_step)?;
        non_negative("critical_mass_fraction", self.critical_mass_fraction)?;
        non_negative("critical_half_mass_radius", self.critical_half_mass_radius)?;
        if self.output_frequency == 0 {
            return Err(ConfigError::ZeroOutputFrequency);
        }
        if tf < t0 {
            return Err(ConfigError::FinalTimeBeforeInitial { initial_time: t0, final_time: tf });
        }
        Ok(())
    }

    /// Upper bound on the steps a run can take, used to size orbit samples.
    /// Two spare entries absorb floating accumulation of t
    pub fn sample_count(&self) -> usize {
        ((self.final_time - self.initial_time) / self.time_step).ceil() as usize + 2
    }

    /// Sample grid t_i = t0 + i dt
    pub fn sample_times(&self) -> Vec<f64> {
        (0..self.sample_count())
            .map(|i| self.initial_time + i as f64 * self.time_step)
            .collect()
    }

    pub fn termination(&self, initial_mass: f64) -> TerminationCriteria {
        TerminationCriteria {
            final_time: self.final_time,
            mass_floor: self.critical_mass_fraction * initial_mass,
            radius_floor: self.critical_half_mass_radius,
        }
    }
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    FinalTime,
    MassFloor,
    RadiusFloor,
}

/// The three stopping thresholds, checked before every step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminationCriteria {
    pub final_time: f64,
    pub mass_floor: f64,
    pub radius_floor: f64,
}

impl TerminationCriteria {
    /// `None` while t < tf, M >= mass floor and rh >= radius floor
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn check(&self, state: &State) -> Option<Termination> {
        if !(state.t < self.final_time) {
            Some(Termination::FinalTime)
        } else if !(state.m >= self.mass_floor) {
            Some(Termination::MassFloor)
        } else if !(state.rh >= self.radius_floor) {
            Some(Termination::RadiusFloor)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Parameters::default().validate(), Ok(()));
    }

    #[test]
    fn final_time_before_initial_is_rejected() {
        let p = Parameters { initial_time: 10.0, final_time: 5.0, ..Default::default() };
        assert_eq!(
            p.validate(),
            Err(ConfigError::FinalTimeBeforeInitial { initial_time: 10.0, final_time: 5.0 })
        );
    }

    #[test]
    fn each_parameter_is_checked_by_name() {
        let p = Parameters { time_step: 0.0, ..Default::default() };
        assert!(matches!(p.validate(), Err(ConfigError::NotPositive { name: "time_step", .. })));

        let p = Parameters { critical_mass_fraction: -0.1, ..Default::default() };
        assert!(matches!(p.validate(), Err(ConfigError::Negative { name: "critical_mass_fraction", .. })));

        let p = Parameters { output_frequency: 0, ..Default::default() };
        assert_eq!(p.validate(), Err(ConfigError::ZeroOutputFrequency));
    }

    #[test]
    fn sample_grid_covers_the_run() {
        let p = Parameters { initial_time: 5.0, final_time: 15.0, time_step: 0.5, ..Default::default() };
        let times = p.sample_times();
        assert_eq!(times.len(), 22);
        assert_eq!(times[0], 5.0);
        assert_eq!(times[20], 15.0);
    }

    #[test]
    fn termination_order() {
        let c = TerminationCriteria { final_time: 100.0, mass_floor: 50.0, radius_floor: 0.1 };
        let s = State { t: 10.0, m: 60.0, rh: 1.0, kappa: 0.2, rc: 0.4 };
        assert_eq!(c.check(&s), None);
        assert_eq!(c.check(&State { m: 49.0, ..s }), Some(Termination::MassFloor));
        assert_eq!(c.check(&State { rh: 0.05, ..s }), Some(Termination::RadiusFloor));
        assert_eq!(c.check(&State { t: 100.0, m: 0.0, ..s }), Some(Termination::FinalTime));
        // NaN mass stops the run instead of looping
        assert_eq!(c.check(&State { m: f64::NAN, ..s }), Some(Termination::MassFloor));
    }
}
