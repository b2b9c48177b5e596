//! Derived-parameter engine
//!
//! Turns the five integrated scalars into everything the rate laws need: the
//! orbital position, tidal radius, relaxation time, the regime threshold and the
//! four rate coefficients of whichever regime applies.

use std::f64::consts::PI;

use super::constants::Constants;
use super::error::EvolutionError;
use super::orbit::{OrbitModel, OrbitalConstants};
use super::states::{DerivedParameters, OutputParameters, RateCoefficients, Regime, State};

/// Per-cluster values fixed at setup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterConstants {
    pub initial_mass: f64,        // M0 [Msun]
    pub mean_mass: f64,           // mean stellar mass [Msun]
    pub initial_half_mass_radius: f64,
    pub initial_virial_radius: f64,
    pub initial_kappa: f64,
    pub core_density_scale: f64,  // rhoc0: rho_c = rhoc0 * rc^-alpha
}

impl ClusterConstants {
    pub fn new(initial_mass: f64, initial_half_mass_radius: f64, mean_mass: f64, constants: &Constants) -> Self {
        let rv0 = constants.virial_fraction * initial_half_mass_radius;
        Self {
            initial_mass,
            mean_mass,
            initial_half_mass_radius,
            initial_virial_radius: rv0,
            initial_kappa: initial_half_mass_radius / (4.0 * rv0),
            core_density_scale: initial_mass * constants.rhoc00 / rv0.powf(0.8),
        }
    }

    /// Initial state of a Plummer-like cluster at `t0`
    pub fn initial_state(&self, t0: f64, constants: &Constants) -> State {
        State {
            t: t0,
            m: self.initial_mass,
            rh: self.initial_half_mass_radius,
            kappa: self.initial_kappa,
            rc: constants.core_fraction * self.initial_half_mass_radius,
        }
    }
}

/// Inputs shared by both regime rate laws
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeInputs {
    pub n: f64,
    pub rc: f64,
    pub kappa: f64,
    pub rehj: f64,
    pub rech: f64,
    pub rechmin: f64,
    pub trh: f64,
    pub pe: f64,
}

#[derive(Debug, Clone)]
pub struct DerivedEngine {
    pub constants: Constants,
    pub cluster: ClusterConstants,
    pub orbit: OrbitalConstants,
    pub model: OrbitModel,
}

impl DerivedEngine {
    pub fn new(constants: Constants, cluster: ClusterConstants, orbit: OrbitalConstants, model: OrbitModel) -> Self {
        Self { constants, cluster, orbit, model }
    }

    /// Half-mass relaxation time [Myr] of `n` stars within `rh`
    pub fn relaxation_time(&self, n: f64, rh: f64) -> f64 {
        let c = &self.constants;
        0.138 * n.sqrt() * rh.powf(1.5) / ((c.gamma * n).ln() * (c.G * self.cluster.mean_mass).sqrt()) * c.tcon
    }

    /// Core-to-half-mass radius ratio below which the cluster is post-collapse
    pub fn collapse_threshold(&self, n: f64) -> f64 {
        let c = &self.constants;
        (c.N2 / n + c.N2 / c.N3).powf(2.0 / 3.0)
    }

    /// Tidal escape factor corrected for orbital eccentricity
    pub fn escape_factor(&self, n: f64, revj: f64) -> f64 {
        let c = &self.constants;
        let e2 = self.orbit.eccentricity * self.orbit.eccentricity;
        (revj / c.RevJ1).powf(c.z)
            * ((n / c.N1) * (c.gamma * c.N1).ln() / (c.gamma * n).ln()).powf(1.0 - c.x)
            / ((1.0 - e2) * (1.0 - 0.5 * e2))
    }

    /// Full derived set for `state`; `step` indexes the orbit samples in non-fast mode
    pub fn derive(&self, state: &State, step: usize) -> Result<DerivedParameters, EvolutionError> {
        let n = state.m / self.cluster.mean_mass;
        let (pos, rj) = self.model.locate(&self.orbit, state.t, step, state.m)?;

        let rehj = state.rh / rj;
        let rech = state.rc / state.rh;
        let rv = state.virial_radius();
        let revj = rv / rj;
        let trh = self.relaxation_time(n, state.rh);
        let pe = self.escape_factor(n, revj);
        let rechmin = self.collapse_threshold(n);

        let inputs = RegimeInputs { n, rc: state.rc, kappa: state.kappa, rehj, rech, rechmin, trh, pe };
        let (regime, rates) = if rech > rechmin {
            (Regime::Unbalanced, self.unbalanced_rates(&inputs))
        } else {
            (Regime::Balanced, self.balanced_rates(&inputs))
        };

        Ok(DerivedParameters {
            state: *state,
            n,
            x: pos.x,
            y: pos.y,
            r: pos.r,
            rj,
            rv,
            rehj,
            rech,
            revj,
            trh,
            pe,
            rechmin,
            regime,
            rates,
        })
    }

    /// Reporting quantities after an accepted step. Never fed back into the integration
    pub fn output_parameters(&self, state: &State, step: usize) -> Result<OutputParameters, EvolutionError> {
        let (pos, rj) = self.model.locate(&self.orbit, state.t, step, state.m)?;
        Ok(OutputParameters {
            n: state.m / self.cluster.mean_mass,
            rv: state.virial_radius(),
            rj,
            x: pos.x,
            y: pos.y,
        })
    }

    /// Escape rate: tidal part damped by `fe` outside of balanced evolution
    fn escape_rate(&self, fe: f64, pe: f64) -> f64 {
        let c = &self.constants;
        fe * c.xi1 * (1.0 - pe) + (c.f + (1.0 - c.f) * fe) * 3.0 / 5.0 * c.zeta * pe
    }

    /// Pre-collapse rate law, faded into the balanced one just above the threshold
    pub fn unbalanced_rates(&self, p: &RegimeInputs) -> RateCoefficients {
        let raw = self.raw_unbalanced_rates(p);
        let width = self.constants.transition_width;
        if width <= 0.0 || p.rech >= p.rechmin * (1.0 + width) {
            return raw;
        }

        // smoothstep: zero value and slope at the threshold, one at the far edge
        let s = ((p.rech / p.rechmin - 1.0) / width).clamp(0.0, 1.0);
        let w = s * s * (3.0 - 2.0 * s);
        let bal = self.balanced_rates(p);
        RateCoefficients {
            xi: w * raw.xi + (1.0 - w) * bal.xi,
            mu: w * raw.mu + (1.0 - w) * bal.mu,
            delta: w * raw.delta + (1.0 - w) * bal.delta,
            lambda: w * raw.lambda + (1.0 - w) * bal.lambda,
        }
    }

    fn raw_unbalanced_rates(&self, p: &RegimeInputs) -> RateCoefficients {
        let c = &self.constants;
        let shape = c.unbalanced;
        let kappa0 = shape.kappa0.unwrap_or(self.cluster.initial_kappa);
        let fe = p.rechmin / p.rech;
        let ye = p.rech / shape.rech0;

        // core relaxation time from the core density power law
        let rhoc0 = self.cluster.core_density_scale;
        let sigmac = (8.0 / 3.0 * PI * c.G * rhoc0 * p.rc.powf(2.0 - c.alpha)).sqrt();
        let rhoc = rhoc0 * p.rc.powf(-c.alpha);
        let trc = sigmac.powi(3) / (15.4 * c.G * c.G * self.cluster.mean_mass * rhoc * (c.gamma * p.n).ln()) * c.tcon;

        let xi = self.escape_rate(fe, p.pe);
        let delta = c.delta1 + c.delta2 * p.trh / trc;
        let ke = 2.0 * ye * (kappa0 - shape.kappa1) * (-ye * ye).exp() / (PI.sqrt() * p.kappa);
        let mu = ((p.rehj / p.kappa - 2.0) * xi + ke * delta) / (1.0 + ke);
        let lambda = ke * (delta - mu);

        RateCoefficients { xi, mu, delta, lambda }
    }

    /// Post-collapse rate law: energy production in the core balances the flux through rh
    pub fn balanced_rates(&self, p: &RegimeInputs) -> RateCoefficients {
        let c = &self.constants;
        let shape = c.balanced;
        let kappa0 = shape.kappa0.unwrap_or(self.cluster.initial_kappa);
        let ye = p.rech / shape.rech0;

        let xi = self.escape_rate(1.0, p.pe);
        let ke = 2.0 * ye * (kappa0 - shape.kappa1) * (-ye * ye).exp() / (PI.sqrt() * p.kappa);
        let damping = 1.0 + p.n / c.N3;
        let mu = c.zeta + xi * (2.0 / 3.0 * ke / damping - 2.0);
        let delta = mu + 2.0 / 3.0 * xi / damping;
        let kappa_rech = shape.kappa1 + (kappa0 - shape.kappa1) * libm::erf(ye);
        let lambda = ke * (delta - mu) + (kappa_rech - p.kappa) / kappa_rech;

        RateCoefficients { xi, mu, delta, lambda }
    }
}
