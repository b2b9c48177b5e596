//! Core state types for the cluster evolution.
//!
//! - `State`: the five integrated scalars (t, M, rh, kappa, rc)
//! - `DerivedParameters`: everything the right-hand side needs, rebuilt per evaluation
//! - `Regime`: which rate law produced the coefficients
//! - `Snapshot` / `EvolutionTrack`: reported time series

/// Number of integrated state fields
pub const STATE_DIM: usize = 5;

/// One value per state field, in `StateField::ALL` order
pub type StateVector = [f64; STATE_DIM];

/// Index of each integrated field inside a `StateVector`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    Time = 0,
    Mass = 1,
    HalfMassRadius = 2,
    Kappa = 3,
    CoreRadius = 4,
}

impl StateField {
    pub const ALL: [StateField; STATE_DIM] = [
        StateField::Time,
        StateField::Mass,
        StateField::HalfMassRadius,
        StateField::Kappa,
        StateField::CoreRadius,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    pub t: f64,     // elapsed time [Myr]
    pub m: f64,     // total mass [Msun]
    pub rh: f64,    // half-mass radius [pc]
    pub kappa: f64, // form factor rh / (4 rv)
    pub rc: f64,    // core radius [pc]
}

impl State {
    pub fn from_vector(v: StateVector) -> Self {
        Self { t: v[0], m: v[1], rh: v[2], kappa: v[3], rc: v[4] }
    }

    pub fn to_vector(&self) -> StateVector {
        [self.t, self.m, self.rh, self.kappa, self.rc]
    }

    /// `self + h * rates`, field by field
    pub fn advanced(&self, h: f64, rates: &StateVector) -> Self {
        let mut v = self.to_vector();
        for field in StateField::ALL {
            let i = field.index();
            v[i] += h * rates[i];
        }
        Self::from_vector(v)
    }

    /// Virial radius implied by the form factor
    pub fn virial_radius(&self) -> f64 {
        self.rh / (4.0 * self.kappa)
    }
}

/// Pre-collapse (unbalanced) or post-collapse (balanced) rate law.
/// Chosen afresh on every evaluation from `Rech` against `Rechmin`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Unbalanced,
    Balanced,
}

/// Dimensionless rate coefficients fed to the derivative functions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateCoefficients {
    pub xi: f64,     // mass-loss rate per trh
    pub mu: f64,     // half-mass radius expansion rate
    pub delta: f64,  // core radius rate
    pub lambda: f64, // form factor rate
}

/// Full set of auxiliary quantities for one right-hand-side evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedParameters {
    pub state: State,
    pub n: f64,       // number of stars
    pub x: f64,       // orbital position [pc]
    pub y: f64,
    pub r: f64,       // galactocentric distance [pc]
    pub rj: f64,      // tidal (Jacobi) radius [pc]
    pub rv: f64,      // virial radius [pc]
    pub rehj: f64,    // rh / rJ
    pub rech: f64,    // rc / rh
    pub revj: f64,    // rv / rJ
    pub trh: f64,     // half-mass relaxation time [Myr]
    pub pe: f64,      // eccentricity-corrected tidal escape factor
    pub rechmin: f64, // regime threshold on rc/rh
    pub regime: Regime,
    pub rates: RateCoefficients,
}

/// Quantities recomputed after each accepted step for reporting only
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputParameters {
    pub n: f64,
    pub rv: f64,
    pub rj: f64,
    pub x: f64,
    pub y: f64,
}

/// One reported point of the time series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub t: f64,
    pub mass: f64,
    pub half_mass_radius: f64,
    pub core_radius: f64,
}

impl From<&State> for Snapshot {
    fn from(s: &State) -> Self {
        Self { t: s.t, mass: s.m, half_mass_radius: s.rh, core_radius: s.rc }
    }
}

/// Snapshot sink: the initial state plus one snapshot per completed step
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionTrack {
    pub initial: Snapshot,
    pub snapshots: Vec<Snapshot>,
}

impl EvolutionTrack {
    pub fn new(initial: Snapshot) -> Self {
        Self { initial, snapshots: Vec::new() }
    }

    pub fn add_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Latest reported point, or the initial state before the first step
    pub fn last(&self) -> &Snapshot {
        self.snapshots.last().unwrap_or(&self.initial)
    }

    pub fn times(&self) -> Vec<f64> {
        self.snapshots.iter().map(|s| s.t).collect()
    }

    pub fn masses(&self) -> Vec<f64> {
        self.snapshots.iter().map(|s| s.mass).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_order_matches_fields() {
        let s = State { t: 1.0, m: 2.0, rh: 3.0, kappa: 4.0, rc: 5.0 };
        let v = s.to_vector();
        assert_eq!(v[StateField::Mass.index()], 2.0);
        assert_eq!(v[StateField::CoreRadius.index()], 5.0);
        assert_eq!(State::from_vector(v), s);
    }

    #[test]
    fn advanced_is_componentwise() {
        let s = State { t: 0.0, m: 100.0, rh: 2.0, kappa: 0.2, rc: 1.0 };
        let next = s.advanced(0.5, &[1.0, -10.0, 2.0, 0.0, -1.0]);
        assert_eq!(next, State { t: 0.5, m: 95.0, rh: 3.0, kappa: 0.2, rc: 0.5 });
    }

    #[test]
    fn track_last_falls_back_to_initial() {
        let init = Snapshot { t: 0.0, mass: 1.0, half_mass_radius: 1.0, core_radius: 0.4 };
        let mut track = EvolutionTrack::new(init);
        assert!(track.is_empty());
        assert_eq!(*track.last(), init);

        track.add_snapshot(Snapshot { t: 1.0, ..init });
        assert_eq!(track.len(), 1);
        assert_eq!(track.last().t, 1.0);
        assert_eq!(track.times(), vec![1.0]);
    }
}
