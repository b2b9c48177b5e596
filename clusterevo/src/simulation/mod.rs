pub mod states;
pub mod params;
pub mod engine;
pub mod constants;
pub mod error;
pub mod cluster;
pub mod kepler;
pub mod orbit;
pub mod derived;
pub mod rates;
pub mod integrator;
pub mod output;
pub mod evolution;
pub mod scenario;
