//! In-memory trajectory samples.
//!
//! A [`TrajectoryTable`] is the rectangular numeric array produced by a
//! trajectory source: one row per sample, one column per attribute. The
//! engine only ever reads the three columns named by a [`ColumnMap`].

use crate::error::{GridError, Result};
use serde::{Deserialize, Serialize};

/// Row-major rectangular array of samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrajectoryTable {
    n_cols: usize,
    values: Vec<f64>,
}

impl TrajectoryTable {
    /// Builds a table from rows, rejecting ragged input.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut values = Vec::with_capacity(rows.len() * n_cols);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(GridError::invalid(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n_cols
                )));
            }
            values.extend(row);
        }

        Ok(Self { n_cols, values })
    }

    pub fn n_rows(&self) -> usize {
        if self.n_cols == 0 {
            0
        } else {
            self.values.len() / self.n_cols
        }
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n_cols..(i + 1) * self.n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.n_cols.max(1))
    }
}

/// Which columns hold the vehicle id, the time index and the longitudinal position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub vehicle: usize,
    pub time: usize,
    pub position: usize,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            vehicle: 0,
            time: 1,
            position: 3,
        }
    }
}

/// One sample reduced to the attributes the engine reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    /// Index of the sample in the source array.
    pub row: usize,
    pub vehicle_id: f64,
    pub time: f64,
    pub position: f64,
}

impl ColumnMap {
    /// Projects `table` onto the mapped columns.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidInput`] for an empty table, a column index
    /// outside the table, or a non-finite value in any mapped column.
    pub fn extract(&self, table: &TrajectoryTable) -> Result<Vec<TrajectoryPoint>> {
        if table.is_empty() {
            return Err(GridError::invalid("trajectory array is empty"));
        }

        for (name, idx) in [
            ("vehicle", self.vehicle),
            ("time", self.time),
            ("position", self.position),
        ] {
            if idx >= table.n_cols() {
                return Err(GridError::invalid(format!(
                    "{} column index {} out of range for {} columns",
                    name,
                    idx,
                    table.n_cols()
                )));
            }
        }

        table
            .rows()
            .enumerate()
            .map(|(row, values)| {
                let point = TrajectoryPoint {
                    row,
                    vehicle_id: values[self.vehicle],
                    time: values[self.time],
                    position: values[self.position],
                };
                if !(point.vehicle_id.is_finite()
                    && point.time.is_finite()
                    && point.position.is_finite())
                {
                    return Err(GridError::invalid(format!(
                        "non-numeric value in row {}",
                        row
                    )));
                }
                Ok(point)
            })
            .collect()
    }
}
