//! Galactic orbit and tidal field
//!
//! `OrbitProvider` is the seam to whatever integrates the cluster's orbit in a
//! galactic potential. Two providers ship with the crate:
//! - `PointMassGalaxy`: Keplerian orbit around a point mass
//! - `SampledOrbit`: samples produced elsewhere and handed in as-is
//!
//! `OrbitalConstants` and `OrbitModel` are what the engine keeps from a provider.

use std::f64::consts::TAU;

use nalgebra::Vector3;

use super::constants::{Constants, G_PC_KMS2_PER_MSUN};
use super::error::{positive, ConfigError, EvolutionError};
use super::kepler::{KeplerOrbit, OrbitPosition};

pub type NVec3 = Vector3<f64>;

/// Orbit samples index-aligned with a time grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrbitSamples {
    /// Tidal radius of a 1 Msun cluster at each sample [pc]; scale by M^(1/3)
    pub tidal_norm: Vec<f64>,
    /// Galactocentric position at each sample [pc]
    pub positions: Vec<NVec3>,
}

impl OrbitSamples {
    pub fn len(&self) -> usize {
        self.tidal_norm.len().min(self.positions.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position and tidal-radius normalisation of sample `step`
    pub fn get(&self, step: usize) -> Result<(OrbitPosition, f64), EvolutionError> {
        if step >= self.len() {
            return Err(EvolutionError::OrbitSampleOutOfRange { step, available: self.len() });
        }
        let p = self.positions[step];
        let position = OrbitPosition { x: p.x, y: p.y, r: p.norm() };
        Ok((position, self.tidal_norm[step]))
    }
}

/// Source of the cluster's galactic orbit (pc, km/s, Myr)
pub trait OrbitProvider {
    fn apogalacticon(&self) -> f64;

    fn perigalacticon(&self) -> f64;

    /// Galactic potential at apogalacticon [(km/s)^2]
    fn potential_at_apogalacticon(&self) -> f64;

    /// Tidal normalisation and positions at each of `times` [Myr].
    /// `constants` carries the run's unit conversion and Kepler solver bounds
    fn sample(&self, times: &[f64], constants: &Constants) -> Result<OrbitSamples, EvolutionError>;
}

/// Keplerian orbit around a point-mass galaxy
#[derive(Debug, Clone)]
pub struct PointMassGalaxy {
    pub mass: f64,                 // Msun
    pub apogalacticon: f64,        // pc
    pub perigalacticon: f64,       // pc
    pub initial_true_anomaly: f64, // rad, orbit phase at t = 0
}

impl PointMassGalaxy {
    pub fn new(mass: f64, apogalacticon: f64, perigalacticon: f64) -> Self {
        Self { mass, apogalacticon, perigalacticon, initial_true_anomaly: 0.0 }
    }

    pub fn with_true_anomaly(mut self, nu0: f64) -> Self {
        self.initial_true_anomaly = nu0;
        self
    }
}

impl OrbitProvider for PointMassGalaxy {
    fn apogalacticon(&self) -> f64 {
        self.apogalacticon
    }

    fn perigalacticon(&self) -> f64 {
        self.perigalacticon
    }

    fn potential_at_apogalacticon(&self) -> f64 {
        -G_PC_KMS2_PER_MSUN * self.mass / self.apogalacticon
    }

    /// The potential is fixed in physical units; the orbit itself follows the
    /// same `G`, `tcon` and solver bounds as fast mode
    fn sample(&self, times: &[f64], constants: &Constants) -> Result<OrbitSamples, EvolutionError> {
        let geometry = OrbitalConstants::from_provider(self, constants)?;
        let orbit = geometry.kepler_orbit(constants, self.initial_true_anomaly);
        // rJ = r (m / 3 MG)^(1/3) for a unit-mass cluster
        let scale = (1.0 / (3.0 * geometry.point_mass)).cbrt();
        let mut samples = OrbitSamples::default();
        for &t in times {
            let p = orbit.position(t)?;
            samples.positions.push(NVec3::new(p.x, p.y, 0.0));
            samples.tidal_norm.push(scale * p.r);
        }
        Ok(samples)
    }
}

/// Orbit integrated elsewhere, stored as samples on the run's step grid
#[derive(Debug, Clone)]
pub struct SampledOrbit {
    pub apogalacticon: f64,
    pub perigalacticon: f64,
    pub potential_at_apogalacticon: f64,
    pub samples: OrbitSamples,
}

impl OrbitProvider for SampledOrbit {
    fn apogalacticon(&self) -> f64 {
        self.apogalacticon
    }

    fn perigalacticon(&self) -> f64 {
        self.perigalacticon
    }

    fn potential_at_apogalacticon(&self) -> f64 {
        self.potential_at_apogalacticon
    }

    fn sample(&self, times: &[f64], _constants: &Constants) -> Result<OrbitSamples, EvolutionError> {
        let available = self.samples.len();
        if available < times.len() {
            return Err(ConfigError::InsufficientOrbitSamples { required: times.len(), available }.into());
        }
        Ok(OrbitSamples {
            tidal_norm: self.samples.tidal_norm[..times.len()].to_vec(),
            positions: self.samples.positions[..times.len()].to_vec(),
        })
    }
}

/// Fixed orbit geometry for a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalConstants {
    pub apogalacticon: f64,   // ra [pc]
    pub perigalacticon: f64,  // rp [pc]
    pub eccentricity: f64,
    pub semi_major_axis: f64, // pc
    pub point_mass: f64,      // MG: point mass with the galaxy's potential at ra [Msun]
}

impl OrbitalConstants {
    pub fn from_provider(provider: &dyn OrbitProvider, constants: &Constants) -> Result<Self, ConfigError> {
        let ra = positive("apogalacticon", provider.apogalacticon())?;
        let rp = positive("perigalacticon", provider.perigalacticon())?;
        if rp > ra {
            return Err(ConfigError::PericentreBeyondApocentre { apogalacticon: ra, perigalacticon: rp });
        }
        let point_mass = positive("point_mass", -provider.potential_at_apogalacticon() * ra / constants.G)?;

        Ok(Self {
            apogalacticon: ra,
            perigalacticon: rp,
            eccentricity: (ra - rp) / (ra + rp),
            semi_major_axis: 0.5 * (ra + rp),
            point_mass,
        })
    }

    /// Mean angular velocity about the galactic centre [1/Myr]
    pub fn mean_motion(&self, constants: &Constants) -> f64 {
        (constants.G * self.point_mass / self.semi_major_axis.powi(3)).sqrt() * constants.tcon
    }

    /// Kepler ellipse of the equivalent point mass, phased to `initial_true_anomaly` at t = 0
    pub fn kepler_orbit(&self, constants: &Constants, initial_true_anomaly: f64) -> KeplerOrbit {
        KeplerOrbit::new(self.semi_major_axis, self.eccentricity, self.mean_motion(constants), initial_true_anomaly)
            .with_solver(constants.kepler_tolerance, constants.kepler_max_iterations)
    }

    /// Jacobi radius of a cluster of mass `m` at distance `r` on this orbit
    pub fn tidal_radius(&self, m: f64, r: f64) -> f64 {
        let a = self.semi_major_axis;
        (m / self.point_mass).cbrt()
            * (a * r.powi(4) / (self.apogalacticon * self.perigalacticon + 2.0 * a * r)).cbrt()
    }
}

/// How the engine finds the cluster on its orbit
#[derive(Debug, Clone)]
pub enum OrbitModel {
    /// Fast mode: Kepler ellipse with the equivalent point mass
    Analytic(KeplerOrbit),
    /// Precomputed samples indexed by step count
    Sampled(OrbitSamples),
}

impl OrbitModel {
    pub fn analytic(orbit: &OrbitalConstants, constants: &Constants, initial_true_anomaly: f64) -> Self {
        OrbitModel::Analytic(orbit.kepler_orbit(constants, initial_true_anomaly))
    }

    /// Orbital position and tidal radius for a cluster of mass `m`
    pub fn locate(
        &self,
        orbit: &OrbitalConstants,
        time: f64,
        step: usize,
        m: f64,
    ) -> Result<(OrbitPosition, f64), EvolutionError> {
        match self {
            OrbitModel::Analytic(kepler) => {
                let p = kepler.position(time)?;
                Ok((p, orbit.tidal_radius(m, p.r)))
            }
            OrbitModel::Sampled(samples) => {
                let (p, norm) = samples.get(step)?;
                Ok((p, norm * m.cbrt()))
            }
        }
    }

    /// Orbital period in Myr (analytic mode only)
    pub fn period(&self) -> Option<f64> {
        match self {
            OrbitModel::Analytic(kepler) => Some(TAU / kepler.mean_motion),
            OrbitModel::Sampled(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn point_mass_is_recovered_from_potential() {
        let galaxy = PointMassGalaxy::new(1e11, 1000.0, 500.0);
        let orbit = OrbitalConstants::from_provider(&galaxy, &Constants::default()).unwrap();
        assert_relative_eq!(orbit.point_mass, 1e11, max_relative = 1e-12);
        assert_relative_eq!(orbit.eccentricity, 1.0 / 3.0, max_relative = 1e-12);
        assert_relative_eq!(orbit.semi_major_axis, 750.0);
    }

    #[test]
    fn rejects_swapped_apsides() {
        let galaxy = PointMassGalaxy::new(1e11, 500.0, 1000.0);
        let err = OrbitalConstants::from_provider(&galaxy, &Constants::default()).unwrap_err();
        assert!(matches!(err, ConfigError::PericentreBeyondApocentre { .. }));
    }

    #[test]
    fn sampled_tidal_radius_matches_closed_form_on_circular_orbit() {
        let constants = Constants::default();
        let galaxy = PointMassGalaxy::new(1e11, 2000.0, 2000.0);
        let orbit = OrbitalConstants::from_provider(&galaxy, &constants).unwrap();
        let samples = galaxy.sample(&[0.0, 10.0, 20.0], &constants).unwrap();

        let fast = OrbitModel::analytic(&orbit, &constants, 0.0);
        let slow = OrbitModel::Sampled(samples);
        for (step, t) in [0.0, 10.0, 20.0].into_iter().enumerate() {
            let (pf, rj_fast) = fast.locate(&orbit, t, step, 1e5).unwrap();
            let (ps, rj_slow) = slow.locate(&orbit, t, step, 1e5).unwrap();
            assert_relative_eq!(rj_fast, rj_slow, max_relative = 1e-9);
            assert_relative_eq!(pf.x, ps.x, epsilon = 1e-6);
            assert_relative_eq!(ps.r, 2000.0, max_relative = 1e-12);
        }
    }

    #[test]
    fn point_mass_samples_follow_constant_overrides() {
        let constants = Constants { tcon: 2.0, kepler_tolerance: 1e-12, ..Constants::default() };
        let galaxy = PointMassGalaxy::new(1e11, 1000.0, 500.0).with_true_anomaly(1.0);
        let orbit = OrbitalConstants::from_provider(&galaxy, &constants).unwrap();
        let times = [0.0, 3.0, 7.5, 40.0];
        let samples = galaxy.sample(&times, &constants).unwrap();

        let fast = OrbitModel::analytic(&orbit, &constants, 1.0);
        for (step, &t) in times.iter().enumerate() {
            let (pf, _) = fast.locate(&orbit, t, step, 1e5).unwrap();
            assert_relative_eq!(pf.x, samples.positions[step].x, epsilon = 1e-6);
            assert_relative_eq!(pf.y, samples.positions[step].y, epsilon = 1e-6);
        }

        let no_iterations = Constants { kepler_max_iterations: 0, ..Constants::default() };
        assert!(matches!(
            galaxy.sample(&times, &no_iterations),
            Err(EvolutionError::KeplerNonConvergence { .. })
        ));
    }

    #[test]
    fn sampled_orbit_refuses_short_series() {
        let galaxy = PointMassGalaxy::new(1e11, 2000.0, 1000.0);
        let samples = galaxy.sample(&[0.0, 1.0], &Constants::default()).unwrap();
        let sampled = SampledOrbit {
            apogalacticon: 2000.0,
            perigalacticon: 1000.0,
            potential_at_apogalacticon: galaxy.potential_at_apogalacticon(),
            samples,
        };
        assert_eq!(sampled.sample(&[0.0, 1.0], &Constants::default()).unwrap().len(), 2);
        match sampled.sample(&[0.0, 1.0, 2.0], &Constants::default()) {
            Err(EvolutionError::Config(ConfigError::InsufficientOrbitSamples { required, available })) => {
                assert_eq!((required, available), (3, 2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn out_of_range_sample_is_an_error() {
        let model = OrbitModel::Sampled(OrbitSamples {
            tidal_norm: vec![1.0],
            positions: vec![NVec3::new(1000.0, 0.0, 0.0)],
        });
        let orbit = OrbitalConstants {
            apogalacticon: 1000.0,
            perigalacticon: 1000.0,
            eccentricity: 0.0,
            semi_major_axis: 1000.0,
            point_mass: 1e10,
        };
        assert!(model.locate(&orbit, 0.0, 0, 8.0).is_ok());
        assert!(matches!(
            model.locate(&orbit, 1.0, 1, 8.0),
            Err(EvolutionError::OrbitSampleOutOfRange { step: 1, available: 1 })
        ));
    }
}
