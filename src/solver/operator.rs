// src/solver/operator.rs

//! Sparse Jacobi iteration matrix for the 5-point Laplacian stencil.

use crate::grid::CartesianGrid;
use crate::kernel::FieldVec;
use crate::LaplaceError;
use sprs::{CsMat, TriMat};

/// Weight of each stencil neighbour in the Jacobi average.
pub const NEIGHBOR_WEIGHT: f64 = 0.25;

/// Builds the `ntotal x ntotal` matrix `A` such that `phi_new = A * phi` is
/// one Jacobi sweep.
///
/// Boundary rows are the identity, so fixed potentials are carried over
/// unchanged. Interior rows hold `0.25` at the four neighbours given by
/// [`CartesianGrid::neighbors`] and nothing on the diagonal.
pub fn build_jacobi_operator(grid: &CartesianGrid) -> CsMat<f64> {
    let n = grid.ntotal();
    let interior = n - grid.boundary_count();
    let mut triplets = TriMat::with_capacity((n, n), grid.boundary_count() + 4 * interior);

    for i in 0..grid.nx() {
        for j in 0..grid.ny() {
            let k = grid.index(i, j);
            match grid.neighbors(i, j) {
                None => triplets.add_triplet(k, k, 1.0),
                Some(stencil) => {
                    for col in stencil {
                        triplets.add_triplet(k, col, NEIGHBOR_WEIGHT);
                    }
                }
            }
        }
    }

    let operator: CsMat<f64> = triplets.to_csr();
    log::debug!(
        "assembled Jacobi operator: {}x{}, {} non-zeros ({} interior rows)",
        operator.rows(),
        operator.cols(),
        operator.nnz(),
        interior
    );
    operator
}

/// Computes `output = operator * input` without allocating.
pub fn apply_operator(operator: &CsMat<f64>, input: &FieldVec, output: &mut FieldVec) -> Result<(), LaplaceError> {
    if !operator.is_csr() {
        return Err(LaplaceError::SolverFailed("operator must be stored in CSR order".to_string()));
    }
    if operator.cols() != input.len() || operator.rows() != output.len() {
        return Err(LaplaceError::Shape(format!(
            "operator is {}x{}, input has {} entries, output has {}",
            operator.rows(),
            operator.cols(),
            input.len(),
            output.len()
        )));
    }

    // sprs 0.11 builds against a newer ndarray than ours, so its dense
    // product traits don't accept `FieldVec`; walk the CSR rows directly.
    for (row, row_vec) in operator.outer_iterator().enumerate() {
        output[row] = row_vec.iter().map(|(col, &w)| w * input[col]).sum::<f64>();
    }
    Ok(())
}
