use crate::engine::grid::Cell;
use crate::engine::index::VehicleIndex;
use crate::engine::types::AggregateRecord;

/// Density is reported per kilometre.
const DENSITY_FACTOR: f64 = 1000.0;
/// Flow is reported per hour.
const FLOW_FACTOR: f64 = 3600.0;

/// Running totals over the vehicles that traversed one cell.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CellAccumulator {
    pub distance: f64,
    pub time_spent: f64,
    pub matched: usize,
}

impl CellAccumulator {
    /// Metrics for the cell, or `None` when nothing qualified.
    pub fn metrics(&self, window_area: f64) -> Option<(f64, f64, f64)> {
        if self.matched == 0 || self.time_spent <= 0.0 {
            return None;
        }
        Some((
            self.distance / self.time_spent,
            self.time_spent * DENSITY_FACTOR / window_area,
            self.distance * FLOW_FACTOR / window_area,
        ))
    }
}

/// Accumulates every vehicle whose first and last in-cell samples (in row
/// order) are strictly increasing in time. Distance is signed.
pub fn accumulate(cell: &Cell, index: &VehicleIndex, time_scale: f64) -> CellAccumulator {
    let t0 = cell.start_time as f64;
    let t1 = cell.end_time as f64;
    let mut acc = CellAccumulator::default();

    for track in index.tracks() {
        let (first, last) = track.time_span();
        if last < t0 || first > t1 {
            continue;
        }
        let Some((entry, exit)) = track.entry_exit(t0, t1, cell.start_space, cell.end_space)
        else {
            continue;
        };

        if exit.time > entry.time {
            acc.distance += exit.position - entry.position;
            acc.time_spent += (exit.time - entry.time) * time_scale;
            acc.matched += 1;
        }
    }

    acc
}

pub fn aggregate_cell(
    cell: &Cell,
    index: &VehicleIndex,
    time_scale: f64,
    window_area: f64,
) -> AggregateRecord {
    let acc = accumulate(cell, index, time_scale);
    let metrics = acc.metrics(window_area);

    AggregateRecord {
        start_time: cell.start_time as f64 * time_scale,
        start_space: cell.start_space,
        avg_speed: metrics.map(|m| m.0),
        density: metrics.map(|m| m.1),
        flow: metrics.map(|m| m.2),
        vehicle_count: acc.matched,
    }
}
