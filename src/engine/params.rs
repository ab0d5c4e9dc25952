use crate::error::{GridError, Result};
use crate::trajectory::ColumnMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_VEHICLE_COLUMN: usize = 0;
pub const DEFAULT_TIME_COLUMN: usize = 1;
pub const DEFAULT_POSITION_COLUMN: usize = 3;
/// Raw time units per window (600 frames at 0.1 s = one minute).
pub const DEFAULT_TIME_STEP: i64 = 600;
pub const DEFAULT_SPACE_STEP: i64 = 100;
/// Seconds per raw time unit.
pub const DEFAULT_TIME_SCALE: f64 = 0.1;

/// Binning parameters for one aggregation run.
///
/// Loaded from JSON, any field may be omitted and falls back to its default:
/// ```json
/// {
///   "time_column": 1,
///   "time_step": 300,
///   "time_scale": 0.1
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridParams {
    pub vehicle_column: usize,
    pub time_column: usize,
    pub position_column: usize,
    pub time_step: i64,
    pub space_step: i64,
    pub time_scale: f64,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            vehicle_column: DEFAULT_VEHICLE_COLUMN,
            time_column: DEFAULT_TIME_COLUMN,
            position_column: DEFAULT_POSITION_COLUMN,
            time_step: DEFAULT_TIME_STEP,
            space_step: DEFAULT_SPACE_STEP,
            time_scale: DEFAULT_TIME_SCALE,
        }
    }
}

impl GridParams {
    /// Loads parameters from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn columns(&self) -> ColumnMap {
        ColumnMap {
            vehicle: self.vehicle_column,
            time: self.time_column,
            position: self.position_column,
        }
    }

    /// Normalization denominator for density and flow.
    pub fn window_area(&self) -> f64 {
        self.time_step as f64 * self.space_step as f64 * self.time_scale
    }

    pub fn validate(&self) -> Result<()> {
        if self.time_step <= 0 {
            return Err(GridError::invalid(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if self.space_step <= 0 {
            return Err(GridError::invalid(format!(
                "space_step must be positive, got {}",
                self.space_step
            )));
        }
        if !(self.time_scale.is_finite() && self.time_scale > 0.0) {
            return Err(GridError::invalid(format!(
                "time_scale must be a positive finite number, got {}",
                self.time_scale
            )));
        }
        Ok(())
    }
}
