// src/solver/direct_solver.rs

//! A direct Finite Difference Method (FDM) solver, used as a reference for
//! the iterative solver on small grids.

use super::iteration::Termination;
use super::{Solver, SolverSolutionData};
use crate::grid::CartesianGrid;
use crate::{LaplaceError, LaplaceProblem};
use nalgebra::{DMatrix, DVector};

/// Largest number of unknowns the dense system is assembled for.
pub const DIRECT_SOLVER_MAX_UNKNOWNS: usize = 4096;

/// Solves the 5-point discretization of the Laplace equation with a dense LU
/// factorization.
///
/// Every interior node contributes the equation
/// `phi[i-1,j] + phi[i+1,j] + phi[i,j-1] + phi[i,j+1] - 4 phi[i,j] = 0`;
/// boundary nodes contribute `phi[i,j] = value`.
pub struct DirectSolver;

impl Solver for DirectSolver {
    fn name(&self) -> &'static str {
        "DirectSolver"
    }

    fn solve(&self, problem: &LaplaceProblem) -> Result<SolverSolutionData, LaplaceError> {
        problem.validate()?;
        log::info!("--- Running DirectSolver ({}x{} grid) ---", problem.grid.nx, problem.grid.ny);

        let grid = CartesianGrid::from_spec(&problem.grid)?;
        let num_nodes = grid.ntotal();
        if num_nodes > DIRECT_SOLVER_MAX_UNKNOWNS {
            return Err(LaplaceError::Configuration(format!(
                "DirectSolver handles at most {} unknowns, grid has {}",
                DIRECT_SOLVER_MAX_UNKNOWNS, num_nodes
            )));
        }

        let mut boundary_field = grid.create_field();
        grid.apply_boundaries(&mut boundary_field, &problem.boundaries)?;
        let boundary_values = grid.convert_to_1d_array(boundary_field)?;

        // Initialize global matrix (A) and load vector (B).
        let mut a_global = DMatrix::<f64>::zeros(num_nodes, num_nodes);
        let mut b_global = DVector::<f64>::zeros(num_nodes);

        for i in 0..grid.nx() {
            for j in 0..grid.ny() {
                let k = grid.index(i, j);
                match grid.neighbors(i, j) {
                    None => {
                        a_global[(k, k)] = 1.0;
                        b_global[k] = boundary_values[k];
                    }
                    Some(stencil) => {
                        a_global[(k, k)] = -4.0;
                        for col in stencil {
                            a_global[(k, col)] = 1.0;
                        }
                    }
                }
            }
        }

        let phi = a_global
            .lu()
            .solve(&b_global)
            .ok_or_else(|| LaplaceError::SolverFailed("FDM matrix is singular.".to_string()))?;

        let field = grid.convert_to_2d_array(phi.iter().copied().collect())?;
        log::info!("--- DirectSolver Finished ---");

        Ok(SolverSolutionData {
            field,
            iterations: 0,
            residual: 0.0,
            termination: Termination::Direct,
            history: Vec::new(),
            snapshots: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{BoundaryValue, Side};
    use crate::{GridSpec, SolverSettings};
    use approx::assert_abs_diff_eq;

    fn problem(nx: usize, ny: usize, boundaries: Vec<BoundaryValue>) -> LaplaceProblem {
        LaplaceProblem {
            id: "direct".to_string(),
            grid: GridSpec::unit_spacing(nx, ny),
            boundaries,
            solver_settings: SolverSettings::default(),
        }
    }

    #[test]
    fn test_opposite_plates() {
        let p = problem(
            6,
            5,
            vec![BoundaryValue::new(Side::Left, 10.0), BoundaryValue::new(Side::Right, 0.0)],
        );
        let out = DirectSolver.solve(&p).unwrap();
        assert_eq!(out.termination, Termination::Direct);
        assert_eq!(out.iterations, 0);

        for j in 0..5 {
            assert_abs_diff_eq!(out.field[[0, j]], 10.0, epsilon = 1e-12);
            assert_abs_diff_eq!(out.field[[5, j]], 0.0, epsilon = 1e-12);
        }
        // Potential falls off away from the charged plate and is mirror
        // symmetric about the middle row.
        for i in 1..4 {
            assert!(out.field[[i, 2]] > out.field[[i + 1, 2]]);
            assert_abs_diff_eq!(out.field[[i, 1]], out.field[[i, 3]], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_center_of_five_by_five_plate() {
        let p = problem(5, 5, vec![BoundaryValue::new(Side::Bottom, 5.0)]);
        let out = DirectSolver.solve(&p).unwrap();
        assert_abs_diff_eq!(out.field[[2, 2]], 1.25, epsilon = 1e-12);
        assert!(out.is_converged());
    }

    #[test]
    fn test_rejects_large_grid() {
        let p = problem(100, 100, vec![]);
        assert!(matches!(DirectSolver.solve(&p), Err(LaplaceError::Configuration(_))));
    }
}
