use std::time::Instant;

use crate::simulation::cluster::Cluster;
use crate::simulation::engine::EvolutionOptions;
use crate::simulation::evolution::Simulation;
use crate::simulation::integrator::IntegrationMethod;
use crate::simulation::kepler::{solve_kepler, KEPLER_MAX_ITERATIONS};
use crate::simulation::orbit::PointMassGalaxy;

pub fn bench_integrators() {
    // Step sizes to compare, Myr
    let dts = [4.0, 2.0, 1.0, 0.5, 0.25];
    let t_end = 400.0;

    let cluster = match Cluster::new(1.0e5, 3.0, 0.5) {
        Ok(c) => c,
        Err(e) => {
            println!("invalid benchmark cluster: {e}");
            return;
        }
    };
    let galaxy = PointMassGalaxy::new(1.0e11, 1000.0, 500.0);

    for dt in dts {
        let mut line = format!("dt = {dt:5.2}");

        for method in [IntegrationMethod::Euler, IntegrationMethod::Rk4] {
            let mut options = EvolutionOptions::fast(t_end);
            options.method = method;
            options.parameters.time_step = dt;

            let mut sim = match Simulation::new(&cluster, &galaxy, options) {
                Ok(sim) => sim,
                Err(e) => {
                    println!("{line}, {method}: setup failed: {e}");
                    continue;
                }
            };

            let t0 = Instant::now();
            let result = sim.run();
            let elapsed = t0.elapsed().as_secs_f64();

            match result {
                Ok(_) => {
                    let per_step = elapsed / sim.steps().max(1) as f64;
                    let per_eval = per_step / method.stages() as f64;
                    line.push_str(&format!(
                        ", {method:>5} = {:8.2} us/step ({:6.2} us/eval, M = {:.6e})",
                        per_step * 1e6,
                        per_eval * 1e6,
                        sim.state().m
                    ));
                }
                Err(e) => line.push_str(&format!(", {method:>5} failed: {e}")),
            }
        }

        println!("{line}");
    }
}

pub fn bench_kepler() {
    // Eccentricities to test
    let es = [0.0, 0.3, 0.6, 0.9, 0.99];
    let n = 100_000;

    for e in es {
        let mut failures = 0;
        let mut checksum = 0.0;

        let t0 = Instant::now();
        for i in 0..n {
            let mean_anomaly = std::f64::consts::TAU * i as f64 / n as f64;
            match solve_kepler(mean_anomaly, e, 1e-10, KEPLER_MAX_ITERATIONS) {
                Ok(e_anom) => checksum += e_anom,
                Err(_) => failures += 1,
            }
        }
        let dt = t0.elapsed().as_secs_f64();

        println!(
            "e = {e:4.2}, {n} solves = {:8.6} s ({:6.1} ns/solve), failures = {failures}, checksum = {checksum:.3}",
            dt,
            dt / n as f64 * 1e9
        );
    }
}
