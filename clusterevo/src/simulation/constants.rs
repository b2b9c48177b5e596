//! Physical and model constants
//!
//! `Constants` is an immutable value handed to the engine at setup. The defaults
//! are the calibrated values of the prescription; any field can be overridden
//! from the `constants:` section of a scenario file.

use serde::Deserialize;

use super::kepler::KEPLER_MAX_ITERATIONS;

/// Gravitational constant in pc (km/s)^2 / Msun
pub const G_PC_KMS2_PER_MSUN: f64 = 4.3e-3;

/// Kilometres in a parsec over seconds in a Myr: converts pc/(km/s) into Myr
pub const PC_PER_KMS_IN_MYR: f64 = 3.086e13 / (3600.0 * 24.0 * 365.0 * 1_000_000.0);

#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Constants {
    pub G: f64,       // gravitational constant [pc (km/s)^2 / Msun]
    pub tcon: f64,    // time unit conversion pc/(km/s) -> Myr
    pub rhoc00: f64,  // core density normalisation
    pub gamma: f64,   // argument factor of the Coulomb logarithm
    pub alpha: f64,   // core density slope
    pub zeta: f64,    // energy conduction efficiency
    pub xi1: f64,     // isolated escape rate
    pub RevJ1: f64,   // reference filling factor rv/rJ
    pub z: f64,       // filling-factor exponent of Pe
    pub x: f64,       // N-dependence exponent of Pe
    pub N1: f64,
    pub N2: f64,
    pub N3: f64,
    pub f: f64,       // fraction of tidal escape not damped in unbalanced evolution
    pub delta1: f64,
    pub delta2: f64,

    pub core_fraction: f64,   // rc0 / rh0 (Plummer)
    pub virial_fraction: f64, // rv0 / rh0 (Plummer)

    pub unbalanced: RegimeShape,
    pub balanced: RegimeShape,

    /// Relative width above `Rechmin` over which unbalanced rates fade into balanced ones.
    /// Zero gives a hard switch.
    pub transition_width: f64,

    pub kepler_tolerance: f64,
    pub kepler_max_iterations: usize,
}

/// Shape constants of one regime's kappa(Rech) relation.
/// `kappa0 == None` means "use the cluster's initial form factor"
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RegimeShape {
    pub kappa0: Option<f64>,
    pub kappa1: f64,
    pub rech0: f64,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            G: G_PC_KMS2_PER_MSUN,
            tcon: PC_PER_KMS_IN_MYR,
            rhoc00: 0.055,
            gamma: 0.11,
            alpha: 2.2,
            zeta: 0.1,
            xi1: 0.0142,
            RevJ1: 0.145,
            z: 1.61,
            x: 0.75,
            N1: 15000.0,
            N2: 12.0,
            N3: 15000.0,
            f: 0.3,
            delta1: -0.09,
            delta2: -0.002,
            core_fraction: 0.4,
            virial_fraction: 1.3,
            unbalanced: RegimeShape { kappa0: None, kappa1: 0.295, rech0: 0.1 },
            balanced: RegimeShape { kappa0: Some(0.200), kappa1: 0.265, rech0: 0.22 },
            transition_width: 0.05,
            kepler_tolerance: 1e-10,
            kepler_max_iterations: KEPLER_MAX_ITERATIONS,
        }
    }
}
