// demos/plate_potential.rs

use laplace_engine::{BoundaryValue, GridSpec, LaplaceEngine, LaplaceProblem, Side, SolverSettings};

/// Square 10 x 10 box with the bottom plate held at 5 V and the other sides
/// grounded. Pass a JSON problem file as the first argument to run that
/// instead. The solution is printed as JSON for an external plotter.
///
/// `RUST_LOG=info cargo run --example plate_potential`
fn main() {
    env_logger::init();

    let problem = match std::env::args().nth(1) {
        Some(path) => match LaplaceProblem::from_json_file(&path) {
            Ok(problem) => problem,
            Err(e) => {
                eprintln!("Could not load {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => LaplaceProblem {
            id: "plate_potential".to_string(),
            grid: GridSpec {
                nx: 100,
                ny: 100,
                xmin: 0.0,
                xmax: 10.0,
                ymin: 0.0,
                ymax: 10.0,
            },
            boundaries: vec![BoundaryValue::new(Side::Bottom, 5.0)],
            solver_settings: SolverSettings::default(),
        },
    };

    let mut engine = LaplaceEngine::new();
    match engine.run_simulation(problem) {
        Ok(solution) => {
            if !solution.is_converged() {
                eprintln!(
                    "warning: stopped at the iteration cap ({} iterations, eps = {:.3e})",
                    solution.iterations, solution.residual
                );
            }
            match solution.to_json() {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Error serializing solution: {}", e),
            }
        }
        Err(e) => {
            eprintln!("Error solving: {}", e);
            std::process::exit(1);
        }
    }
}
