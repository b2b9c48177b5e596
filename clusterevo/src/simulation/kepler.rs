//! Kepler phase solver
//!
//! Locates a body on a fixed Keplerian ellipse at a given time. Used by the fast
//! analytic mode to place the cluster on its galactic orbit, and by
//! `PointMassGalaxy` to produce orbit samples.

use std::f64::consts::{PI, TAU};

use super::error::EvolutionError;

/// Position in the orbital plane (pericentre along +x) and distance from the focus, in pc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitPosition {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

/// Default iteration bound of the Kepler solver. Starting from `E = M`, Newton's
/// method can wander for a few hundred iterations at e close to 1
pub const KEPLER_MAX_ITERATIONS: usize = 10_000;

/// Newton-Raphson solution of `E - e sin E = M`, starting from `E = M`.
///
/// Returns the eccentric anomaly, or the number of iterations spent if the
/// residual is still above `tolerance` after `max_iterations` updates.
pub fn solve_kepler(
    mean_anomaly: f64,
    eccentricity: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Result<f64, usize> {
    let mut e_anom = mean_anomaly;
    let mut iterations = 0;
    loop {
        let residual = mean_anomaly + eccentricity * e_anom.sin() - e_anom;
        if residual.abs() <= tolerance {
            return Ok(e_anom);
        }
        if iterations == max_iterations {
            return Err(iterations);
        }
        e_anom += residual / (1.0 - eccentricity * e_anom.cos());
        iterations += 1;
    }
}

/// Eccentric anomaly and time offset that put the body at true anomaly `nu0` at t = 0.
/// `nu0` in [0, 2pi]; the returned anomaly is in the same half-turn as `nu0`
pub fn initial_phase(eccentricity: f64, mean_motion: f64, nu0: f64) -> (f64, f64) {
    let mut e0 = 2.0 * (((1.0 - eccentricity) / (1.0 + eccentricity)).sqrt() * (0.5 * nu0).tan()).atan();
    if nu0 > PI {
        e0 += TAU;
    }
    let m0 = e0 - eccentricity * e0.sin();
    (e0, m0 / mean_motion)
}

/// A fixed ellipse traversed with constant mean motion
#[derive(Debug, Clone)]
pub struct KeplerOrbit {
    pub semi_major_axis: f64,       // pc
    pub eccentricity: f64,
    pub mean_motion: f64,           // 1/Myr
    pub initial_anomaly: f64,       // eccentric anomaly at t = 0
    pub time_offset: f64,           // Myr, phase origin shift
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl KeplerOrbit {
    pub fn new(semi_major_axis: f64, eccentricity: f64, mean_motion: f64, initial_true_anomaly: f64) -> Self {
        let (initial_anomaly, time_offset) = initial_phase(eccentricity, mean_motion, initial_true_anomaly);
        Self {
            semi_major_axis,
            eccentricity,
            mean_motion,
            initial_anomaly,
            time_offset,
            tolerance: 1e-10,
            max_iterations: KEPLER_MAX_ITERATIONS,
        }
    }

    /// Override the Newton-Raphson stopping rule
    pub fn with_solver(mut self, tolerance: f64, max_iterations: usize) -> Self {
        self.tolerance = tolerance;
        self.max_iterations = max_iterations;
        self
    }

    /// Orbital period in Myr
    pub fn period(&self) -> f64 {
        TAU / self.mean_motion
    }

    pub fn mean_anomaly(&self, time: f64) -> f64 {
        self.mean_motion * (time + self.time_offset)
    }

    pub fn eccentric_anomaly(&self, time: f64) -> Result<f64, EvolutionError> {
        solve_kepler(self.mean_anomaly(time), self.eccentricity, self.tolerance, self.max_iterations).map_err(
            |iterations| EvolutionError::KeplerNonConvergence {
                time,
                eccentricity: self.eccentricity,
                iterations,
            },
        )
    }

    pub fn position(&self, time: f64) -> Result<OrbitPosition, EvolutionError> {
        let e_anom = self.eccentric_anomaly(time)?;
        let (a, e) = (self.semi_major_axis, self.eccentricity);
        Ok(OrbitPosition {
            x: a * (e_anom.cos() - e),
            y: a * e_anom.sin() * (1.0 - e * e).sqrt(),
            r: a * (1.0 - e * e_anom.cos()),
        })
    }
}
