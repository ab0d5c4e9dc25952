//! Bounds derivation and cell enumeration.
//!
//! The last window in each dimension must fit fully inside the observed
//! range, so the upper enumeration bound is `max - step`. Time is enumerated
//! on integer raw units; space is enumerated like a floating `arange` with a
//! small tolerance on the upper bound.

use crate::engine::params::GridParams;
use crate::trajectory::TrajectoryPoint;

/// Slack added to the upper space bound before enumeration.
pub const SPACE_TOLERANCE: f64 = 0.01;

/// One (time-window, space-window) cell in raw units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub start_time: i64,
    pub end_time: i64,
    pub start_space: f64,
    pub end_space: f64,
}

/// The enumerated grid for one dataset and parameterization.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    pub time_min: i64,
    pub time_max: i64,
    pub time_step: i64,
    pub space_min: f64,
    pub space_max: f64,
    pub space_step: f64,
    pub num_time_bins: usize,
    pub num_space_bins: usize,
}

impl GridSpec {
    /// Derives the grid from the extents of `points`. Returns `None` for an
    /// empty point set.
    pub fn derive(points: &[TrajectoryPoint], params: &GridParams) -> Option<Self> {
        let first = points.first()?;
        let (mut t_lo, mut t_hi) = (first.time, first.time);
        let (mut s_lo, mut s_hi) = (first.position, first.position);
        for p in points {
            t_lo = t_lo.min(p.time);
            t_hi = t_hi.max(p.time);
            s_lo = s_lo.min(p.position);
            s_hi = s_hi.max(p.position);
        }

        let time_step = params.time_step;
        let space_step = params.space_step as f64;

        let time_min = t_lo.trunc() as i64;
        // a step wider than the representable range leaves no window
        let time_max = (t_hi.trunc() as i64).checked_sub(time_step);
        let space_min = s_lo;
        let space_max = s_hi - space_step;

        let num_time_bins = match time_max {
            Some(max) if max >= time_min => {
                ((max as i128 - time_min as i128) / time_step as i128 + 1) as usize
            }
            _ => 0,
        };
        let time_max = time_max.unwrap_or(i64::MIN);
        let num_space_bins = if space_max < space_min {
            0
        } else {
            ((space_max + SPACE_TOLERANCE - space_min) / space_step).ceil() as usize
        };

        Some(Self {
            time_min,
            time_max,
            time_step,
            space_min,
            space_max,
            space_step,
            num_time_bins,
            num_space_bins,
        })
    }

    pub fn num_cells(&self) -> usize {
        self.num_time_bins * self.num_space_bins
    }

    /// True when the window is larger than the data span in either dimension.
    pub fn is_degenerate(&self) -> bool {
        self.num_cells() == 0
    }

    pub fn start_time(&self, i: usize) -> i64 {
        // bounded by time_max, but the product alone can exceed i64
        (self.time_min as i128 + i as i128 * self.time_step as i128) as i64
    }

    /// `start + k * delta` with `delta` taken from the first two values, the
    /// same fill rule a floating `arange` uses.
    pub fn start_space(&self, k: usize) -> f64 {
        match k {
            0 => self.space_min,
            1 => self.space_min + self.space_step,
            _ => {
                let delta = (self.space_min + self.space_step) - self.space_min;
                self.space_min + k as f64 * delta
            }
        }
    }

    pub fn cell(&self, i: usize, k: usize) -> Cell {
        let start_time = self.start_time(i);
        let start_space = self.start_space(k);
        Cell {
            start_time,
            end_time: start_time + self.time_step,
            start_space,
            end_space: start_space + self.space_step,
        }
    }

    /// The `n`-th cell in output order, `n < num_cells()`.
    pub fn cell_at(&self, n: usize) -> Cell {
        self.cell(n / self.num_space_bins, n % self.num_space_bins)
    }

    /// All cells, time-major then space, i.e. in output order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.num_cells()).map(move |n| self.cell_at(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(row: usize, time: f64, position: f64) -> TrajectoryPoint {
        TrajectoryPoint {
            row,
            vehicle_id: 1.0,
            time,
            position,
        }
    }

    fn params(time_step: i64, space_step: i64) -> GridParams {
        GridParams {
            time_step,
            space_step,
            time_scale: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_derive_empty() {
        assert!(GridSpec::derive(&[], &GridParams::default()).is_none());
    }

    #[test]
    fn test_single_window_fits_exactly() {
        let points = [point(0, 0.0, 0.0), point(1, 10.0, 10.0)];
        let grid = GridSpec::derive(&points, &params(10, 10)).unwrap();

        assert_eq!(grid.time_min, 0);
        assert_eq!(grid.time_max, 0);
        assert_eq!(grid.num_time_bins, 1);
        assert_eq!(grid.num_space_bins, 1);
        assert_eq!(
            grid.cell(0, 0),
            Cell {
                start_time: 0,
                end_time: 10,
                start_space: 0.0,
                end_space: 10.0
            }
        );
    }

    #[test]
    fn test_bin_counts() {
        // time 100..=1000 step 200 -> starts 100, 300, 500, 700
        // space 0..=350 step 100 -> starts 0, 100, 200 (250 + 0.01 bound)
        let points = [point(0, 100.0, 0.0), point(1, 1000.0, 350.0)];
        let grid = GridSpec::derive(&points, &params(200, 100)).unwrap();

        assert_eq!(grid.num_time_bins, 4);
        assert_eq!(grid.num_space_bins, 3);
        assert_eq!(grid.num_cells(), 12);
        assert_eq!(grid.start_time(3), 700);
        assert_eq!(grid.start_space(2), 200.0);
    }

    #[test]
    fn test_space_tolerance_includes_near_boundary() {
        // space_max = 199.995 - 100 = 99.995 which is within tolerance of 100
        let points = [point(0, 0.0, 0.0), point(1, 10.0, 199.995)];
        let grid = GridSpec::derive(&points, &params(10, 100)).unwrap();
        assert_eq!(grid.num_space_bins, 2);
    }

    #[test]
    fn test_time_min_truncates() {
        let points = [point(0, 5.7, 0.0), point(1, 25.9, 10.0)];
        let grid = GridSpec::derive(&points, &params(10, 10)).unwrap();
        assert_eq!(grid.time_min, 5);
        assert_eq!(grid.time_max, 15);
        assert_eq!(grid.num_time_bins, 2);
    }

    #[test]
    fn test_degenerate_window_larger_than_span() {
        let points = [point(0, 0.0, 0.0), point(1, 5.0, 500.0)];
        let grid = GridSpec::derive(&points, &params(10, 100)).unwrap();
        assert_eq!(grid.num_time_bins, 0);
        assert!(grid.is_degenerate());
        assert_eq!(grid.cells().count(), 0);
    }

    #[test]
    fn test_cells_ordered_time_major() {
        let points = [point(0, 0.0, 0.0), point(1, 30.0, 30.0)];
        let grid = GridSpec::derive(&points, &params(10, 10)).unwrap();
        let cells: Vec<_> = grid.cells().collect();

        assert_eq!(cells.len(), grid.num_cells());
        for pair in cells.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert!(
                a.start_time < b.start_time
                    || (a.start_time == b.start_time && a.start_space < b.start_space)
            );
        }
    }

    #[test]
    fn test_huge_time_step_is_degenerate() {
        let points = [point(0, -10.0, 0.0), point(1, -5.0, 50.0)];
        let grid = GridSpec::derive(&points, &params(i64::MAX, 10)).unwrap();
        assert_eq!(grid.num_time_bins, 0);
        assert!(grid.is_degenerate());
    }

    #[test]
    fn test_wide_time_span_counts_bins() {
        // span of nearly the whole i64 range would overflow a plain subtraction
        let points = [point(0, -9.0e18, 0.0), point(1, 9.0e18, 50.0)];
        let grid = GridSpec::derive(&points, &params(3_000_000_000_000_000_000, 10)).unwrap();
        assert_eq!(grid.num_time_bins, 6);
        assert_eq!(grid.start_time(5), 6_000_000_000_000_000_000);
    }

    #[test]
    fn test_cell_at_matches_nested_order() {
        let points = [point(0, 0.0, 0.0), point(1, 30.0, 30.0)];
        let grid = GridSpec::derive(&points, &params(10, 10)).unwrap();
        assert_eq!(grid.cell_at(0), grid.cell(0, 0));
        assert_eq!(grid.cell_at(grid.num_space_bins), grid.cell(1, 0));
        assert_eq!(grid.cell_at(grid.num_cells() - 1), grid.cell(2, 2));
    }
}
