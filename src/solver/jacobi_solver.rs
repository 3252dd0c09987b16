// src/solver/jacobi_solver.rs

//! Jacobi relaxation for the 2D Laplace equation.

use super::iteration::{IterationControl, Termination};
use super::operator::{apply_operator, build_jacobi_operator};
use super::{Snapshot, Solver, SolverSolutionData};
use crate::grid::CartesianGrid;
use crate::kernel::Field2;
use crate::{LaplaceError, LaplaceProblem};
use std::time::Instant;

/// Relaxes `field` on `grid` until `control` stops.
///
/// The boundary values already present in `field` are held fixed. Two flat
/// buffers alternate between current and next iterate, so every update in a
/// sweep reads only the previous iterate. When `snapshot_interval` is set the
/// initial field and every `n`-th iterate are captured.
pub fn relax(
    grid: &CartesianGrid,
    field: Field2,
    control: &mut IterationControl,
    snapshot_interval: Option<usize>,
) -> Result<SolverSolutionData, LaplaceError> {
    let snapshot_interval = match snapshot_interval {
        Some(0) => {
            return Err(LaplaceError::Configuration("snapshot_interval must be at least 1".to_string()));
        }
        other => other,
    };

    let mut snapshots = Vec::new();
    if snapshot_interval.is_some() {
        snapshots.push(Snapshot { iteration: 0, field: field.clone() });
    }

    let mut phi = grid.convert_to_1d_array(field)?;
    let mut phi_new = phi.clone();
    let operator = build_jacobi_operator(grid);

    let start = Instant::now();
    while control.advance() {
        apply_operator(&operator, &phi, &mut phi_new)?;
        control.calc_epsilon_between(&phi, &phi_new)?;
        std::mem::swap(&mut phi, &mut phi_new);

        if let Some(every) = snapshot_interval {
            if control.iter() % every == 0 {
                snapshots.push(Snapshot {
                    iteration: control.iter(),
                    field: grid.convert_to_2d_array(phi.clone())?,
                });
            }
        }
    }
    let elapsed = start.elapsed();

    let termination = control.termination().unwrap_or(Termination::IterationLimit);
    log::info!(
        "iter = {}, eps = {:.3e}, elapsed time = {:.3} sec ({:?})",
        control.iter(),
        control.eps(),
        elapsed.as_secs_f64(),
        termination
    );

    Ok(SolverSolutionData {
        field: grid.convert_to_2d_array(phi)?,
        iterations: control.iter(),
        residual: control.eps(),
        termination,
        history: control.history().to_vec(),
        snapshots,
    })
}

/// Validates `problem`, sets up its grid and boundaries, and relaxes to the
/// steady state.
pub fn solve_laplace(problem: &LaplaceProblem) -> Result<SolverSolutionData, LaplaceError> {
    problem.validate()?;

    let settings = &problem.solver_settings;
    let grid = CartesianGrid::from_spec(&problem.grid)?;
    let mut field = grid.create_field();
    grid.apply_boundaries(&mut field, &problem.boundaries)?;

    let mut control = IterationControl::new(settings.max_iterations, settings.info_interval, settings.tolerance)?;
    relax(&grid, field, &mut control, settings.snapshot_interval)
}

/// Iterative solver using the sparse Jacobi operator.
pub struct JacobiSolver;

impl Solver for JacobiSolver {
    fn name(&self) -> &'static str {
        "JacobiSolver"
    }

    fn solve(&self, problem: &LaplaceProblem) -> Result<SolverSolutionData, LaplaceError> {
        log::info!(
            "--- Running JacobiSolver ({}x{} grid) ---",
            problem.grid.nx,
            problem.grid.ny
        );
        solve_laplace(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{BoundaryValue, Side};
    use crate::{GridSpec, SolverSettings};
    use approx::assert_abs_diff_eq;

    fn problem(nx: usize, ny: usize, boundaries: Vec<BoundaryValue>, settings: SolverSettings) -> LaplaceProblem {
        LaplaceProblem {
            id: format!("jacobi_{}x{}", nx, ny),
            grid: GridSpec::unit_spacing(nx, ny),
            boundaries,
            solver_settings: settings,
        }
    }

    fn settings(tolerance: f64, max_iterations: usize) -> SolverSettings {
        SolverSettings {
            tolerance,
            max_iterations,
            ..SolverSettings::default()
        }
    }

    #[test]
    fn test_five_by_five_bottom_plate() {
        let p = problem(5, 5, vec![BoundaryValue::new(Side::Bottom, 5.0)], settings(1e-3, 1000));
        let out = solve_laplace(&p).unwrap();

        assert_eq!(out.termination, Termination::Converged);
        assert!(out.iterations <= 1000);
        assert!(out.residual < 1e-3);
        let center = out.field[[2, 2]];
        assert!(center > 0.0 && center < 5.0, "center = {}", center);
        // Superposing the four rotated problems gives 5.0 at the center.
        assert_abs_diff_eq!(center, 1.25, epsilon = 1e-2);
    }

    #[test]
    fn test_constant_boundaries_give_constant_field() {
        let c = 3.5;
        let boundaries = Side::ALL.iter().map(|&s| BoundaryValue::new(s, c)).collect();
        let p = problem(8, 8, boundaries, settings(1e-10, 10_000));
        let out = solve_laplace(&p).unwrap();

        assert!(out.is_converged());
        for &v in out.field.iter() {
            assert_abs_diff_eq!(v, c, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_zero_max_iter_leaves_initial_field() {
        let p = problem(5, 5, vec![BoundaryValue::new(Side::Bottom, 5.0)], settings(1e-3, 0));
        let out = solve_laplace(&p).unwrap();

        assert_eq!(out.termination, Termination::IterationLimit);
        assert!(!out.is_converged());
        assert_eq!(out.iterations, 0);
        assert!(out.history.is_empty());

        let grid = CartesianGrid::from_spec(&p.grid).unwrap();
        let mut expected = grid.create_field();
        grid.apply_boundaries(&mut expected, &p.boundaries).unwrap();
        assert_eq!(out.field, expected);
    }

    #[test]
    fn test_iteration_cap_reported() {
        let mut s = settings(1e-12, 5);
        s.info_interval = 1;
        let p = problem(30, 30, vec![BoundaryValue::new(Side::Top, 1.0)], s);
        let out = solve_laplace(&p).unwrap();
        assert_eq!(out.termination, Termination::IterationLimit);
        assert_eq!(out.iterations, 5);
        assert_eq!(out.history.len(), 5);
        assert!(out.residual >= 1e-12);
    }

    #[test]
    fn test_history_sampled_at_info_interval() {
        let mut s = settings(1e-12, 25);
        s.info_interval = 10;
        let p = problem(30, 30, vec![BoundaryValue::new(Side::Top, 1.0)], s);
        let out = solve_laplace(&p).unwrap();

        assert_eq!(out.iterations, 25);
        let sampled: Vec<usize> = out.history.iter().map(|h| h.iteration).collect();
        assert_eq!(sampled, vec![10, 20]);
        assert!(out.history[1].residual <= out.history[0].residual);
    }

    #[test]
    fn test_boundaries_invariant_across_iterations() {
        let boundaries = vec![
            BoundaryValue::new(Side::Bottom, 5.0),
            BoundaryValue::new(Side::Right, -2.0),
            BoundaryValue::new(Side::Top, 1.5),
        ];
        let mut s = settings(1e-6, 200);
        s.snapshot_interval = Some(1);
        let p = problem(7, 6, boundaries, s);
        let out = solve_laplace(&p).unwrap();

        assert_eq!(out.snapshots.len(), out.iterations + 1);
        let grid = CartesianGrid::from_spec(&p.grid).unwrap();
        let initial = &out.snapshots[0].field;
        for snap in &out.snapshots {
            for i in 0..grid.nx() {
                for j in 0..grid.ny() {
                    if grid.is_boundary(i, j) {
                        assert_eq!(snap.field[[i, j]], initial[[i, j]], "iteration {}", snap.iteration);
                    }
                }
            }
        }
    }

    #[test]
    fn test_residual_history_is_non_increasing() {
        let mut s = settings(1e-6, 5000);
        s.info_interval = 1;
        let p = problem(12, 9, vec![BoundaryValue::new(Side::Left, 10.0)], s);
        let out = solve_laplace(&p).unwrap();

        assert!(out.is_converged());
        assert_eq!(out.history.len(), out.iterations);
        for pair in out.history.windows(2) {
            assert!(pair[0].residual >= 0.0);
            assert!(pair[1].residual <= pair[0].residual * (1.0 + 1e-12) + 1e-14, "{:?}", pair);
            assert_eq!(pair[1].iteration, pair[0].iteration + 1);
        }
    }

    #[test]
    fn test_snapshot_every_n() {
        let mut s = settings(1e-12, 10);
        s.snapshot_interval = Some(4);
        let p = problem(6, 6, vec![BoundaryValue::new(Side::Bottom, 1.0)], s);
        let out = solve_laplace(&p).unwrap();
        let iterations: Vec<usize> = out.snapshots.iter().map(|s| s.iteration).collect();
        assert_eq!(iterations, vec![0, 4, 8]);
    }

    #[test]
    fn test_non_finite_boundary_is_numeric_anomaly() {
        let grid = CartesianGrid::new(5, 5, 0.0, 4.0, 0.0, 4.0).unwrap();
        let mut field = grid.create_field();
        grid.set_boundary_condition(&mut field, Side::Top, |_, _| f64::INFINITY).unwrap();
        let mut control = IterationControl::new(100, 10, 1e-3).unwrap();

        let err = relax(&grid, field, &mut control, None).unwrap_err();
        assert!(matches!(err, LaplaceError::NumericAnomaly { iteration: 1, .. }));
    }

    #[test]
    fn test_invalid_configuration_rejected_before_iterating() {
        let mut p = problem(5, 5, vec![], settings(0.0, 10));
        assert!(matches!(solve_laplace(&p), Err(LaplaceError::Configuration(_))));

        p.solver_settings.tolerance = 1e-3;
        p.grid.nx = 1;
        assert!(matches!(solve_laplace(&p), Err(LaplaceError::Configuration(_))));

        p.grid.nx = 5;
        p.solver_settings.snapshot_interval = Some(0);
        assert!(matches!(solve_laplace(&p), Err(LaplaceError::Configuration(_))));
    }

    #[test]
    fn test_solver_trait_name() {
        assert_eq!(JacobiSolver.name(), "JacobiSolver");
    }
}
