pub mod grid;
pub mod kernel;
pub mod provenance;
pub mod solver;

// Re-exporting the types most callers need.
pub use grid::{BoundaryValue, CartesianGrid, Side};
pub use kernel::{Field2, FieldVec};
pub use solver::iteration::{IterationControl, ResidualSample, Termination};
pub use solver::jacobi_solver::{relax, solve_laplace};
pub use solver::{Snapshot, SolverSolutionData};

use std::path::Path;
use thiserror::Error;

// --- Errors ---

#[derive(Debug, Error)]
pub enum LaplaceError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Shape mismatch: {0}")]
    Shape(String),

    #[error("Residual became non-finite at iteration {iteration} (eps = {residual})")]
    NumericAnomaly { iteration: usize, residual: f64 },

    #[error("Solver did not converge after {iterations} iterations (residual: {residual:.2e})")]
    NotConverged { iterations: usize, residual: f64 },

    #[error("Solver failed: {0}")]
    SolverFailed(String),

    #[error("Solver not found: {0}")]
    SolverNotFound(String),

    #[error("Provenance failed: {0}")]
    Provenance(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// --- Problem Definition ---

/// Everything needed to run one solve. Deserializes from JSON.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct LaplaceProblem {
    pub id: String,
    pub grid: GridSpec,
    /// Constant potentials, applied in order. Sides not listed stay at zero.
    #[serde(default)]
    pub boundaries: Vec<BoundaryValue>,
    #[serde(default)]
    pub solver_settings: SolverSettings,
}

impl LaplaceProblem {
    pub fn from_json_str(json: &str) -> Result<Self, LaplaceError> {
        let problem: LaplaceProblem =
            serde_json::from_str(json).map_err(|e| LaplaceError::Configuration(e.to_string()))?;
        problem.validate()?;
        Ok(problem)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, LaplaceError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Checks the whole configuration so that nothing invalid is discovered
    /// mid-loop.
    pub fn validate(&self) -> Result<(), LaplaceError> {
        CartesianGrid::from_spec(&self.grid)?;
        for bc in &self.boundaries {
            if !bc.value.is_finite() {
                return Err(LaplaceError::Configuration(format!(
                    "boundary value on side '{}' must be finite, got {}",
                    bc.side, bc.value
                )));
            }
        }
        let s = &self.solver_settings;
        IterationControl::new(s.max_iterations, s.info_interval, s.tolerance)?;
        if s.snapshot_interval == Some(0) {
            return Err(LaplaceError::Configuration("snapshot_interval must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Grid resolution and physical extents.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct GridSpec {
    pub nx: usize,
    pub ny: usize,
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl GridSpec {
    /// Grid with spacing 1 starting at the origin.
    pub fn unit_spacing(nx: usize, ny: usize) -> Self {
        GridSpec {
            nx,
            ny,
            xmin: 0.0,
            xmax: nx.saturating_sub(1) as f64,
            ymin: 0.0,
            ymax: ny.saturating_sub(1) as f64,
        }
    }
}

/// Specifies which solver to use and its parameters.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct SolverSettings {
    pub solver_name: String, // "JacobiSolver" or "DirectSolver"
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Progress is logged every `info_interval` iterations.
    pub info_interval: usize,
    pub snapshot_interval: Option<usize>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            solver_name: "JacobiSolver".to_string(),
            tolerance: 1e-3,
            max_iterations: 1500,
            info_interval: 100,
            snapshot_interval: None,
        }
    }
}

// --- Solution ---

#[derive(Debug, serde::Serialize)]
pub struct Solution {
    pub id: String,
    /// Potential as rows `field[i][j]`, `i` along x and `j` along y.
    pub field: Vec<Vec<f64>>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub iterations: usize,
    pub residual: f64,
    pub termination: Termination,
    pub history: Vec<ResidualSample>,
    pub elapsed_seconds: f64,
    pub provenance_chain: Vec<provenance::ProvenanceRecord>,
    #[serde(skip)]
    pub snapshots: Vec<Snapshot>,
}

impl Solution {
    pub fn is_converged(&self) -> bool {
        matches!(self.termination, Termination::Converged | Termination::Direct)
    }

    /// Treats an iteration-limit exit as an error.
    pub fn into_converged(self) -> Result<Self, LaplaceError> {
        if self.is_converged() {
            Ok(self)
        } else {
            Err(LaplaceError::NotConverged {
                iterations: self.iterations,
                residual: self.residual,
            })
        }
    }

    /// Value at the node nearest the geometric centre of the domain.
    pub fn center_value(&self) -> Option<f64> {
        let row = self.field.get(self.field.len() / 2)?;
        row.get(row.len() / 2).copied()
    }

    pub fn to_json(&self) -> Result<String, LaplaceError> {
        serde_json::to_string(self).map_err(|e| LaplaceError::SolverFailed(e.to_string()))
    }
}

// --- Solver Manager ---

struct SolverManager {
    solvers: Vec<Box<dyn solver::Solver>>,
}

impl SolverManager {
    fn new() -> Self {
        SolverManager {
            solvers: vec![
                Box::new(solver::jacobi_solver::JacobiSolver),
                Box::new(solver::direct_solver::DirectSolver),
            ],
        }
    }

    fn get_solver(&self, name: &str) -> Result<&dyn solver::Solver, LaplaceError> {
        self.solvers
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
            .ok_or_else(|| LaplaceError::SolverNotFound(name.to_string()))
    }
}

// --- Engine Facade ---

pub struct LaplaceEngine {
    solver_manager: SolverManager,
    provenance_chain: provenance::ProvenanceChain,
}

impl Default for LaplaceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LaplaceEngine {
    pub fn new() -> Self {
        LaplaceEngine {
            solver_manager: SolverManager::new(),
            provenance_chain: provenance::ProvenanceChain::new(),
        }
    }

    /// The main entry point for running a solve.
    pub fn run_simulation(&mut self, problem: LaplaceProblem) -> Result<Solution, LaplaceError> {
        log::info!("Received simulation task: {}", problem.id);
        problem.validate()?;

        // Start every run with a fresh chain.
        self.provenance_chain.drain_records();

        // Record the problem definition
        let problem_json = serde_json::to_string(&problem).map_err(|e| LaplaceError::Provenance(e.to_string()))?;
        self.provenance_chain.add_record(
            "problem_definition",
            problem_json.as_bytes(),
            serde_json::json!({"problem_id": problem.id}),
        )?;

        // Select and run solver
        let solver = self.solver_manager.get_solver(&problem.solver_settings.solver_name)?;
        let start = std::time::Instant::now();
        let data = solver.solve(&problem)?;
        let elapsed_seconds = start.elapsed().as_secs_f64();
        let final_residual = if data.residual.is_finite() { Some(data.residual) } else { None };

        self.provenance_chain.add_record(
            "solver_run",
            provenance::hash_field(&data.field).as_bytes(),
            serde_json::json!({
                "solver_name": solver.name(),
                "iterations": data.iterations,
                "residual": final_residual,
                "termination": data.termination,
            }),
        )?;

        self.provenance_chain.verify()?;

        let grid = CartesianGrid::from_spec(&problem.grid)?;
        Ok(Solution {
            id: problem.id,
            field: data.field.outer_iter().map(|row| row.to_vec()).collect(),
            x: grid.x().to_vec(),
            y: grid.y().to_vec(),
            iterations: data.iterations,
            residual: data.residual,
            termination: data.termination,
            history: data.history,
            elapsed_seconds,
            provenance_chain: self.provenance_chain.drain_records(),
            snapshots: data.snapshots,
        })
    }
}
