// src/grid/mod.rs

//! Cartesian grid geometry, field storage and Dirichlet boundary assignment.
//!
//! Every mapping between 2D cell coordinates and flat indices goes through
//! [`CartesianGrid::index`]. Fields are stored with shape `(nx, ny)`: the
//! first axis runs along `x`, the second along `y`, and the flattened form is
//! row-major, `k = i * ny + j`.

use crate::kernel::{Field2, FieldVec};
use crate::{GridSpec, LaplaceError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One edge of the rectangular domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// `y = ymax`, the last column `j = ny - 1`.
    Top,
    /// `y = ymin`, the first column `j = 0`.
    Bottom,
    /// `x = xmin`, the first row `i = 0`.
    Left,
    /// `x = xmax`, the last row `i = nx - 1`.
    Right,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = LaplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Side::Top),
            "bottom" => Ok(Side::Bottom),
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            other => Err(LaplaceError::Configuration(format!(
                "side must be top, bottom, left, or right (got '{}')",
                other
            ))),
        }
    }
}

/// A fixed potential held on one side of the domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryValue {
    pub side: Side,
    pub value: f64,
}

impl BoundaryValue {
    pub fn new(side: Side, value: f64) -> Self {
        BoundaryValue { side, value }
    }
}

/// Discretization of `[xmin, xmax] x [ymin, ymax]` into `nx * ny` nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct CartesianGrid {
    nx: usize,
    ny: usize,
    xmin: f64,
    xmax: f64,
    ymin: f64,
    ymax: f64,
    dx: f64,
    dy: f64,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl CartesianGrid {
    pub fn new(nx: usize, ny: usize, xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Result<Self, LaplaceError> {
        if nx < 2 || ny < 2 {
            return Err(LaplaceError::Configuration(format!(
                "grid needs at least 2 nodes per axis, got nx = {}, ny = {}",
                nx, ny
            )));
        }
        for (name, lo, hi) in [("x", xmin, xmax), ("y", ymin, ymax)] {
            if !lo.is_finite() || !hi.is_finite() || hi <= lo {
                return Err(LaplaceError::Configuration(format!(
                    "{} extent must be finite and increasing, got [{}, {}]",
                    name, lo, hi
                )));
            }
        }

        let dx = (xmax - xmin) / (nx - 1) as f64;
        let dy = (ymax - ymin) / (ny - 1) as f64;

        // Node coordinates are computed from the index rather than by
        // accumulating the spacing, so the last node sits exactly on the extent.
        let x = (0..nx).map(|i| axis_coordinate(xmin, xmax, dx, i, nx)).collect();
        let y = (0..ny).map(|j| axis_coordinate(ymin, ymax, dy, j, ny)).collect();

        Ok(CartesianGrid { nx, ny, xmin, xmax, ymin, ymax, dx, dy, x, y })
    }

    pub fn from_spec(spec: &GridSpec) -> Result<Self, LaplaceError> {
        Self::new(spec.nx, spec.ny, spec.xmin, spec.xmax, spec.ymin, spec.ymax)
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn ntotal(&self) -> usize {
        self.nx * self.ny
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn dy(&self) -> f64 {
        self.dy
    }

    pub fn extents(&self) -> (f64, f64, f64, f64) {
        (self.xmin, self.xmax, self.ymin, self.ymax)
    }

    /// Node coordinates along `x`, one per row `i`.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Node coordinates along `y`, one per column `j`.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Zero potential everywhere.
    pub fn create_field(&self) -> Field2 {
        Field2::zeros(self.shape())
    }

    /// Coordinate arrays with `ij` indexing: `xx[[i, j]] = x[i]`, `yy[[i, j]] = y[j]`.
    /// Only plotting consumers need these.
    pub fn create_meshgrid(&self) -> (Field2, Field2) {
        let xx = Field2::from_shape_fn(self.shape(), |(i, _)| self.x[i]);
        let yy = Field2::from_shape_fn(self.shape(), |(_, j)| self.y[j]);
        (xx, yy)
    }

    /// Flat index of node `(i, j)`.
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        i * self.ny + j
    }

    /// Inverse of [`index`](Self::index).
    #[inline]
    pub fn coords(&self, k: usize) -> (usize, usize) {
        (k / self.ny, k % self.ny)
    }

    #[inline]
    pub fn is_boundary(&self, i: usize, j: usize) -> bool {
        i == 0 || i == self.nx - 1 || j == 0 || j == self.ny - 1
    }

    pub fn boundary_count(&self) -> usize {
        2 * self.nx + 2 * self.ny - 4
    }

    /// Flat indices of the stencil neighbours of an interior node, in the
    /// order `[i - 1, i + 1, j - 1, j + 1]`. `None` for boundary nodes, which
    /// have no complete stencil.
    pub fn neighbors(&self, i: usize, j: usize) -> Option<[usize; 4]> {
        if i >= self.nx || j >= self.ny || self.is_boundary(i, j) {
            return None;
        }
        Some([
            self.index(i - 1, j),
            self.index(i + 1, j),
            self.index(i, j - 1),
            self.index(i, j + 1),
        ])
    }

    fn check_shape(&self, field: &Field2) -> Result<(), LaplaceError> {
        if field.dim() != self.shape() {
            return Err(LaplaceError::Shape(format!(
                "field has shape {:?}, grid expects {:?}",
                field.dim(),
                self.shape()
            )));
        }
        Ok(())
    }

    /// Assigns `f(x, y)` along one edge of `field`.
    pub fn set_boundary_condition<F>(&self, field: &mut Field2, side: Side, f: F) -> Result<(), LaplaceError>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.check_shape(field)?;
        match side {
            Side::Top => {
                for (i, &x) in self.x.iter().enumerate() {
                    field[[i, self.ny - 1]] = f(x, self.ymax);
                }
            }
            Side::Bottom => {
                for (i, &x) in self.x.iter().enumerate() {
                    field[[i, 0]] = f(x, self.ymin);
                }
            }
            Side::Left => {
                for (j, &y) in self.y.iter().enumerate() {
                    field[[0, j]] = f(self.xmin, y);
                }
            }
            Side::Right => {
                for (j, &y) in self.y.iter().enumerate() {
                    field[[self.nx - 1, j]] = f(self.xmax, y);
                }
            }
        }
        Ok(())
    }

    /// Applies constant potentials in order. Corners shared by two sides keep
    /// the value of the later entry.
    pub fn apply_boundaries(&self, field: &mut Field2, boundaries: &[BoundaryValue]) -> Result<(), LaplaceError> {
        for bc in boundaries {
            let value = bc.value;
            self.set_boundary_condition(field, bc.side, |_, _| value)?;
        }
        Ok(())
    }

    /// Reshapes a 2D field into its flat form without reordering data.
    pub fn convert_to_1d_array(&self, field: Field2) -> Result<FieldVec, LaplaceError> {
        self.check_shape(&field)?;
        let field = if field.is_standard_layout() {
            field
        } else {
            field.as_standard_layout().into_owned()
        };
        field
            .into_shape(self.ntotal())
            .map_err(|e| LaplaceError::Shape(e.to_string()))
    }

    /// Inverse of [`convert_to_1d_array`](Self::convert_to_1d_array).
    pub fn convert_to_2d_array(&self, flat: FieldVec) -> Result<Field2, LaplaceError> {
        if flat.len() != self.ntotal() {
            return Err(LaplaceError::Shape(format!(
                "flat field has {} entries, grid expects {}",
                flat.len(),
                self.ntotal()
            )));
        }
        flat.into_shape(self.shape())
            .map_err(|e| LaplaceError::Shape(e.to_string()))
    }
}

fn axis_coordinate(lo: f64, hi: f64, step: f64, n: usize, count: usize) -> f64 {
    if n + 1 == count {
        hi
    } else {
        lo + n as f64 * step
    }
}
