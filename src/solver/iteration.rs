// src/solver/iteration.rs

//! Iteration control for relaxation loops.

use crate::kernel::{linf_norm, max_abs_diff, FieldVec};
use crate::LaplaceError;
use serde::{Deserialize, Serialize};

/// Why a solve stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The residual dropped below the tolerance.
    Converged,
    /// `max_iter` sweeps ran without meeting the tolerance.
    IterationLimit,
    /// Solved directly, no iteration involved.
    Direct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStatus {
    Running,
    Stopped(Termination),
}

/// One entry of the convergence history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidualSample {
    pub iteration: usize,
    pub residual: f64,
}

/// Drives a relaxation loop: counts sweeps, tracks the residual and decides
/// when to stop.
///
/// ```ignore
/// let mut control = IterationControl::new(1500, 100, 1e-3)?;
/// while control.advance() {
///     // one sweep: old -> new
///     control.calc_epsilon_between(&old, &new)?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct IterationControl {
    max_iter: usize,
    info_interval: usize,
    tolerance: f64,
    eps: f64,
    iter: usize,
    status: ControlStatus,
    history: Vec<ResidualSample>,
}

impl IterationControl {
    pub fn new(max_iter: usize, info_interval: usize, tolerance: f64) -> Result<Self, LaplaceError> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(LaplaceError::Configuration(format!(
                "tolerance must be positive and finite, got {}",
                tolerance
            )));
        }
        if info_interval == 0 {
            return Err(LaplaceError::Configuration("info_interval must be at least 1".to_string()));
        }
        Ok(IterationControl {
            max_iter,
            info_interval,
            tolerance,
            // Nothing has converged before the first sweep.
            eps: f64::INFINITY,
            iter: 0,
            status: ControlStatus::Running,
            history: Vec::new(),
        })
    }

    /// Starts the next iteration if the loop should continue.
    ///
    /// Reports progress every `info_interval` completed sweeps, then checks
    /// the stop predicate. Returns `false` once stopped; the outcome is then
    /// available from [`status`](Self::status) and [`termination`](Self::termination).
    pub fn advance(&mut self) -> bool {
        if let ControlStatus::Stopped(_) = self.status {
            return false;
        }

        self.output_info();

        if self.eps < self.tolerance {
            self.status = ControlStatus::Stopped(Termination::Converged);
            log::debug!("converged after {} iterations, eps = {:.3e}", self.iter, self.eps);
            false
        } else if self.iter >= self.max_iter {
            self.status = ControlStatus::Stopped(Termination::IterationLimit);
            log::warn!(
                "max iteration reached: iter = {}, eps = {:.3e}, tolerance = {:.3e}",
                self.iter,
                self.eps,
                self.tolerance
            );
            false
        } else {
            self.iter += 1;
            true
        }
    }

    /// Sets the residual to the L-infinity norm of a step `new - old`.
    pub fn calc_epsilon(&mut self, delta: &FieldVec) -> Result<f64, LaplaceError> {
        self.record_epsilon(linf_norm(delta))
    }

    /// Same as [`calc_epsilon`](Self::calc_epsilon) without materializing the
    /// difference vector.
    pub fn calc_epsilon_between(&mut self, old: &FieldVec, new: &FieldVec) -> Result<f64, LaplaceError> {
        let eps = max_abs_diff(old, new).ok_or_else(|| {
            LaplaceError::Shape(format!(
                "iterates differ in length: {} vs {}",
                old.len(),
                new.len()
            ))
        })?;
        self.record_epsilon(eps)
    }

    fn record_epsilon(&mut self, eps: f64) -> Result<f64, LaplaceError> {
        self.eps = eps;
        if self.is_info_iteration() {
            self.history.push(ResidualSample { iteration: self.iter, residual: eps });
        }
        if !eps.is_finite() {
            return Err(LaplaceError::NumericAnomaly { iteration: self.iter, residual: eps });
        }
        Ok(eps)
    }

    /// True on every `info_interval`-th sweep. Progress lines and history
    /// samples share this cadence, so the history stays bounded by
    /// `max_iter / info_interval`.
    pub fn is_info_iteration(&self) -> bool {
        self.iter > 0 && self.iter % self.info_interval == 0
    }

    fn output_info(&self) {
        if self.is_info_iteration() {
            log::info!("iter = {}, eps = {:.3e}", self.iter, self.eps);
        }
    }

    /// Number of sweeps started so far.
    pub fn iter(&self) -> usize {
        self.iter
    }

    /// Latest residual; `+inf` before the first sweep completes.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn status(&self) -> ControlStatus {
        self.status
    }

    pub fn termination(&self) -> Option<Termination> {
        match self.status {
            ControlStatus::Running => None,
            ControlStatus::Stopped(t) => Some(t),
        }
    }

    pub fn info_interval(&self) -> usize {
        self.info_interval
    }

    /// Residuals sampled every `info_interval` sweeps.
    pub fn history(&self) -> &[ResidualSample] {
        &self.history
    }

    pub fn into_history(self) -> Vec<ResidualSample> {
        self.history
    }
}
