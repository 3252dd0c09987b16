pub mod direct_solver;
pub mod iteration;
pub mod jacobi_solver;
pub mod operator;

// src/solver/mod.rs

/// Defines the solver framework: the `Solver` trait and the data every solver returns.

use crate::kernel::Field2;
use crate::{LaplaceError, LaplaceProblem};
use iteration::{ResidualSample, Termination};

/// A captured iterate, for animation consumers.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub iteration: usize,
    pub field: Field2,
}

/// Represents the raw result of one solve.
#[derive(Debug, Clone)]
pub struct SolverSolutionData {
    /// Final potential, shape `(nx, ny)`.
    pub field: Field2,
    /// Number of sweeps applied to the field.
    pub iterations: usize,
    /// Residual of the last sweep (`+inf` if no sweep ran).
    pub residual: f64,
    pub termination: Termination,
    /// Residuals sampled every `info_interval` sweeps.
    pub history: Vec<ResidualSample>,
    pub snapshots: Vec<Snapshot>,
}

impl SolverSolutionData {
    pub fn is_converged(&self) -> bool {
        matches!(self.termination, Termination::Converged | Termination::Direct)
    }
}

/// The common interface for all Laplace solvers.
///
/// A solver takes a validated problem definition and computes the steady
/// potential on its grid.
pub trait Solver {
    /// Returns the unique name of the solver.
    fn name(&self) -> &'static str;

    /// Solves the given problem.
    fn solve(&self, problem: &LaplaceProblem) -> Result<SolverSolutionData, LaplaceError>;
}
