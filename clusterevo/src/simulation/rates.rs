//! Derivative functions of the five state fields
//!
//! Each is a pure function of a `DerivedParameters`. They are kept in a fixed
//! table indexed by `StateField` so integrators iterate by position.

use super::states::{DerivedParameters, StateField, StateVector, STATE_DIM};

pub type Derivative = fn(&DerivedParameters) -> f64;

pub fn t_dot(_p: &DerivedParameters) -> f64 {
    1.0
}

pub fn m_dot(p: &DerivedParameters) -> f64 {
    -p.state.m * p.rates.xi / p.trh
}

pub fn rh_dot(p: &DerivedParameters) -> f64 {
    p.state.rh * p.rates.mu / p.trh
}

pub fn kappa_dot(p: &DerivedParameters) -> f64 {
    p.state.kappa * p.rates.lambda / p.trh
}

pub fn rc_dot(p: &DerivedParameters) -> f64 {
    p.state.rc * p.rates.delta / p.trh
}

/// (field, d/dt field) in `StateVector` order
pub const DERIVATIVES: [(StateField, Derivative); STATE_DIM] = [
    (StateField::Time, t_dot),
    (StateField::Mass, m_dot),
    (StateField::HalfMassRadius, rh_dot),
    (StateField::Kappa, kappa_dot),
    (StateField::CoreRadius, rc_dot),
];

/// All five time derivatives at once
pub fn evaluate(p: &DerivedParameters) -> StateVector {
    let mut out = [0.0; STATE_DIM];
    for (field, derivative) in DERIVATIVES {
        out[field.index()] = derivative(p);
    }
    out
}
