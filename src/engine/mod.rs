//! Grid aggregation engine.
//!
//! Maps a trajectory array and a set of [`GridParams`] to an
//! [`AggregateTable`]: one record per (time-window, space-window) cell with
//! average speed, density and flow derived from each vehicle's entry and exit
//! samples inside the cell.
//!
//! Entry and exit are the first and last in-cell samples in the array's row
//! order, not in time order. Unsorted input therefore changes the result;
//! that ordering is part of the output contract.
//!
//! The engine is a pure function of its inputs. Cells are evaluated in
//! parallel and the table is re-sorted into `(start_time, start_space)`
//! order before it is returned.

pub mod cell;
pub mod grid;
pub mod index;
pub mod params;
pub mod types;

pub use grid::GridSpec;
pub use index::VehicleIndex;
pub use params::GridParams;
pub use types::{AggregateRecord, AggregateTable, Metric, Pivot};
pub use tokio_util::sync::CancellationToken;

use crate::error::{GridError, Result};
use crate::trajectory::TrajectoryTable;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Computes the aggregate table without a cancellation signal.
pub fn compute(table: &TrajectoryTable, params: &GridParams) -> Result<AggregateTable> {
    compute_with_cancel(table, params, &CancellationToken::new())
}

/// Computes the aggregate table, checking `cancel` before each cell.
///
/// # Errors
///
/// [`GridError::InvalidInput`] for an empty array, a bad column index, a
/// non-finite value or invalid window parameters, reported before any cell
/// is evaluated. [`GridError::Cancelled`] if `cancel` trips mid-run.
#[tracing::instrument(
    skip_all,
    fields(rows = table.n_rows(), time_step = params.time_step, space_step = params.space_step)
)]
pub fn compute_with_cancel(
    table: &TrajectoryTable,
    params: &GridParams,
    cancel: &CancellationToken,
) -> Result<AggregateTable> {
    params.validate()?;
    let points = params.columns().extract(table)?;
    let grid = GridSpec::derive(&points, params)
        .ok_or_else(|| GridError::invalid("trajectory array is empty"))?;

    debug!(
        time_min = grid.time_min,
        time_max = grid.time_max,
        space_min = grid.space_min,
        space_max = grid.space_max,
        "Derived grid bounds"
    );

    if grid.is_degenerate() {
        warn!(
            time_bins = grid.num_time_bins,
            space_bins = grid.num_space_bins,
            "Window larger than data span, returning empty table"
        );
        return Ok(AggregateTable::default());
    }

    let started = Instant::now();
    let index = VehicleIndex::build(&points);
    debug!(vehicles = index.len(), "Vehicle index built");

    let time_scale = params.time_scale;
    let window_area = params.window_area();

    let mut records = (0..grid.num_cells())
        .into_par_iter()
        .map(|n| {
            if cancel.is_cancelled() {
                return Err(GridError::Cancelled);
            }
            Ok(cell::aggregate_cell(&grid.cell_at(n), &index, time_scale, window_area))
        })
        .collect::<Result<Vec<_>>>()?;

    records.sort_by(|a, b| {
        a.start_time
            .total_cmp(&b.start_time)
            .then(a.start_space.total_cmp(&b.start_space))
    });

    let table = AggregateTable { records };
    info!(
        cells = table.len(),
        populated = table.populated(),
        vehicles = index.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Grid aggregation complete"
    );

    Ok(table)
}
