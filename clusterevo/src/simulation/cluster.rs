//! Bulk description of the cluster being evolved

use nalgebra::Vector3;
use serde::Deserialize;

use super::error::{positive, ConfigError};

/// A star with mass [Msun] and position [pc]
#[derive(Debug, Clone)]
pub struct Star {
    pub m: f64,
    pub x: Vector3<f64>,
}

/// The three scalars the evolution starts from
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Cluster {
    pub mass: f64,              // total mass [Msun]
    pub half_mass_radius: f64,  // pc
    pub mean_stellar_mass: f64, // Msun
}

impl Cluster {
    pub fn new(mass: f64, half_mass_radius: f64, mean_stellar_mass: f64) -> Result<Self, ConfigError> {
        let cluster = Self { mass, half_mass_radius, mean_stellar_mass };
        cluster.validate()?;
        Ok(cluster)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("mass", self.mass)?;
        positive("half_mass_radius", self.half_mass_radius)?;
        positive("mean_stellar_mass", self.mean_stellar_mass)?;
        Ok(())
    }

    /// Total and mean mass plus the radius about the centre of mass that
    /// encloses half of the total mass
    pub fn from_stars(stars: &[Star]) -> Result<Self, ConfigError> {
        let mass: f64 = stars.iter().map(|s| s.m).sum();
        positive("mass", mass)?;

        let com = stars.iter().fold(Vector3::zeros(), |acc, s| acc + s.m * s.x) / mass;
        let mut shells: Vec<(f64, f64)> = stars.iter().map(|s| ((s.x - com).norm(), s.m)).collect();
        shells.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut enclosed = 0.0;
        let mut half_mass_radius = 0.0;
        for (r, m) in shells {
            enclosed += m;
            if enclosed >= 0.5 * mass {
                half_mass_radius = r;
                break;
            }
        }

        Self::new(mass, half_mass_radius, mass / stars.len() as f64)
    }

    pub fn stars(&self) -> f64 {
        self.mass / self.mean_stellar_mass
    }
}
