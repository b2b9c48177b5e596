//! Fixed-step time integrators for the cluster state
//!
//! Provides explicit Euler and classic 4-stage Runge-Kutta, both driven by a
//! `RateModel` (normally the `DerivedEngine` composed with the derivative table)

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use super::derived::DerivedEngine;
use super::error::{ConfigError, EvolutionError};
use super::rates;
use super::states::{State, StateVector, STATE_DIM};

/// Right-hand side of the state ODE
/// `step` is the number of completed steps, used to index orbit samples
pub trait RateModel {
    fn rates(&self, state: &State, step: usize) -> Result<StateVector, EvolutionError>;
}

impl RateModel for DerivedEngine {
    fn rates(&self, state: &State, step: usize) -> Result<StateVector, EvolutionError> {
        let derived = self.derive(state, step)?;
        Ok(rates::evaluate(&derived))
    }
}

/// Advance `state` by one step using explicit Euler: one evaluation per step
pub fn euler_step<R: RateModel + ?Sized>(state: &mut State, model: &R, dt: f64, step: usize) -> Result<(), EvolutionError> {
    let k = model.rates(state, step)?;
    *state = state.advanced(dt, &k);
    Ok(())
}

/// Advance `state` by one step using classic RK4: four evaluations per step
/// y1 = y0 + dt/6 (k1 + 2 k2 + 2 k3 + k4)
pub fn rk4_step<R: RateModel + ?Sized>(state: &mut State, model: &R, dt: f64, step: usize) -> Result<(), EvolutionError> {
    let half_dt = 0.5 * dt;

    let k1 = model.rates(state, step)?;
    let k2 = model.rates(&state.advanced(half_dt, &k1), step)?;
    let k3 = model.rates(&state.advanced(half_dt, &k2), step)?;
    let k4 = model.rates(&state.advanced(dt, &k3), step)?;

    let mut slope = [0.0; STATE_DIM];
    for i in 0..STATE_DIM {
        slope[i] = (k1[i] + 2.0 * (k2[i] + k3[i]) + k4[i]) / 6.0;
    }
    *state = state.advanced(dt, &slope);
    Ok(())
}

/// Which integrator the evolution loop drives.
/// Parsed case-insensitively from "euler" or "rk4"
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(try_from = "String")]
pub enum IntegrationMethod {
    Euler,
    #[default]
    Rk4,
}

impl IntegrationMethod {
    pub fn step<R: RateModel + ?Sized>(self, state: &mut State, model: &R, dt: f64, step: usize) -> Result<(), EvolutionError> {
        match self {
            IntegrationMethod::Euler => euler_step(state, model, dt, step),
            IntegrationMethod::Rk4 => rk4_step(state, model, dt, step),
        }
    }

    /// Right-hand-side evaluations per step
    pub fn stages(self) -> usize {
        match self {
            IntegrationMethod::Euler => 1,
            IntegrationMethod::Rk4 => 4,
        }
    }
}

impl FromStr for IntegrationMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EULER" => Ok(IntegrationMethod::Euler),
            "RK4" => Ok(IntegrationMethod::Rk4),
            _ => Err(ConfigError::UnknownIntegrationMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for IntegrationMethod {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrationMethod::Euler => write!(f, "Euler"),
            IntegrationMethod::Rk4 => write!(f, "RK4"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// dM/dt = -M / tau with everything else frozen
    struct Decay {
        tau: f64,
    }

    impl RateModel for Decay {
        fn rates(&self, state: &State, _step: usize) -> Result<StateVector, EvolutionError> {
            Ok([1.0, -state.m / self.tau, 0.0, 0.0, 0.0])
        }
    }

    fn start() -> State {
        State { t: 0.0, m: 1.0, rh: 3.0, kappa: 0.2, rc: 1.2 }
    }

    fn local_error(method: IntegrationMethod, dt: f64) -> f64 {
        let mut s = start();
        method.step(&mut s, &Decay { tau: 1.0 }, dt, 0).unwrap();
        (s.m - (-dt).exp()).abs()
    }

    #[test]
    fn rk4_local_error_is_fifth_order() {
        let e1 = local_error(IntegrationMethod::Rk4, 0.1);
        let e2 = local_error(IntegrationMethod::Rk4, 0.05);
        assert!(e1 < 0.1f64.powi(5));
        let ratio = e1 / e2;
        assert!(ratio > 25.0 && ratio < 40.0, "ratio = {ratio}");
    }

    #[test]
    fn euler_local_error_is_second_order() {
        let e1 = local_error(IntegrationMethod::Euler, 0.1);
        let e2 = local_error(IntegrationMethod::Euler, 0.05);
        assert!(e1 < 0.1f64.powi(2));
        assert!(e1 > 0.1f64.powi(5));
        let ratio = e1 / e2;
        assert!(ratio > 3.5 && ratio < 4.5, "ratio = {ratio}");
    }

    #[test]
    fn rk4_tracks_exponential_decay() {
        let model = Decay { tau: 50.0 };
        let mut s = start();
        for step in 0..100 {
            rk4_step(&mut s, &model, 1.0, step).unwrap();
        }
        assert_relative_eq!(s.t, 100.0);
        assert_relative_eq!(s.m, (-2.0f64).exp(), max_relative = 1e-7);
        // untouched fields
        assert_eq!(s.rh, 3.0);
        assert_eq!(s.rc, 1.2);
    }

    /// Counts right-hand-side evaluations
    struct Counting {
        calls: std::cell::Cell<usize>,
    }

    impl RateModel for Counting {
        fn rates(&self, _state: &State, _step: usize) -> Result<StateVector, EvolutionError> {
            self.calls.set(self.calls.get() + 1);
            Ok([1.0, 0.0, 0.0, 0.0, 0.0])
        }
    }

    #[test]
    fn stages_match_evaluations_per_step() {
        for method in [IntegrationMethod::Euler, IntegrationMethod::Rk4] {
            let model = Counting { calls: std::cell::Cell::new(0) };
            let mut s = start();
            method.step(&mut s, &model, 1.0, 0).unwrap();
            assert_eq!(model.calls.get(), method.stages());
        }
    }

    #[test]
    fn method_names_are_case_insensitive() {
        assert_eq!("rk4".parse::<IntegrationMethod>(), Ok(IntegrationMethod::Rk4));
        assert_eq!("EuLeR".parse::<IntegrationMethod>(), Ok(IntegrationMethod::Euler));
        assert_eq!(
            "leapfrog".parse::<IntegrationMethod>(),
            Err(ConfigError::UnknownIntegrationMethod("leapfrog".into()))
        );
        let m: IntegrationMethod = serde_yaml::from_str("\"Euler\"").unwrap();
        assert_eq!(m, IntegrationMethod::Euler);
        assert!(serde_yaml::from_str::<IntegrationMethod>("verlet").is_err());
        assert_eq!(IntegrationMethod::default().to_string(), "RK4");
    }
}
