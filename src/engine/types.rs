//! Aggregate table types.

use serde::{Deserialize, Serialize};

/// One row of macrodata: the aggregate of a single space-time cell.
///
/// Field order is the export column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateRecord {
    /// Window start in seconds (`raw start × time_scale`).
    pub start_time: f64,
    pub start_space: f64,
    /// `None` when no vehicle traversed the cell.
    pub avg_speed: Option<f64>,
    pub density: Option<f64>,
    pub flow: Option<f64>,
    pub vehicle_count: usize,
}

impl AggregateRecord {
    pub fn is_populated(&self) -> bool {
        self.vehicle_count > 0 && self.avg_speed.is_some()
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::AvgSpeed => self.avg_speed,
            Metric::Density => self.density,
            Metric::Flow => self.flow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AvgSpeed,
    Density,
    Flow,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::AvgSpeed => "avg_speed",
            Metric::Density => "density",
            Metric::Flow => "flow",
        }
    }
}

/// Rows ordered by `(start_time, start_space)`, one per enumerated cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateTable {
    pub records: Vec<AggregateRecord>,
}

impl AggregateTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AggregateRecord> {
        self.records.iter()
    }

    pub fn populated(&self) -> usize {
        self.records.iter().filter(|r| r.is_populated()).count()
    }

    /// Reshapes one metric into a space × time matrix for heatmaps.
    pub fn pivot(&self, metric: Metric) -> Pivot {
        let start_times = distinct_sorted(self.records.iter().map(|r| r.start_time));
        let start_spaces = distinct_sorted(self.records.iter().map(|r| r.start_space));

        let mut values = vec![vec![None; start_times.len()]; start_spaces.len()];
        for r in &self.records {
            let (Ok(row), Ok(col)) = (
                start_spaces.binary_search_by(|s| s.total_cmp(&r.start_space)),
                start_times.binary_search_by(|t| t.total_cmp(&r.start_time)),
            ) else {
                continue;
            };
            values[row][col] = r.metric(metric);
        }

        Pivot {
            metric,
            start_times,
            start_spaces,
            values,
        }
    }
}

impl<'a> IntoIterator for &'a AggregateTable {
    type Item = &'a AggregateRecord;
    type IntoIter = std::slice::Iter<'a, AggregateRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn distinct_sorted(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.collect();
    v.sort_by(f64::total_cmp);
    v.dedup_by(|a, b| a.total_cmp(b).is_eq());
    v
}

/// A metric laid out with rows = `start_space` ascending and
/// columns = `start_time` ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct Pivot {
    pub metric: Metric,
    pub start_times: Vec<f64>,
    pub start_spaces: Vec<f64>,
    pub values: Vec<Vec<Option<f64>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(start_time: f64, start_space: f64, speed: Option<f64>) -> AggregateRecord {
        AggregateRecord {
            start_time,
            start_space,
            avg_speed: speed,
            density: speed.map(|s| s * 2.0),
            flow: speed.map(|s| s * 3.0),
            vehicle_count: usize::from(speed.is_some()),
        }
    }

    #[test]
    fn test_metric_names() {
        assert_eq!(Metric::AvgSpeed.name(), "avg_speed");
        assert_eq!(Metric::Density.name(), "density");
        assert_eq!(Metric::Flow.name(), "flow");
    }

    #[test]
    fn test_populated_count() {
        let table = AggregateTable {
            records: vec![record(0.0, 0.0, Some(1.0)), record(0.0, 100.0, None)],
        };
        assert_eq!(table.len(), 2);
        assert_eq!(table.populated(), 1);
    }

    #[test]
    fn test_pivot_layout() {
        let table = AggregateTable {
            records: vec![
                record(0.0, 0.0, Some(1.0)),
                record(0.0, 100.0, None),
                record(60.0, 0.0, Some(3.0)),
                record(60.0, 100.0, Some(4.0)),
            ],
        };
        let pivot = table.pivot(Metric::Flow);

        assert_eq!(pivot.start_times, vec![0.0, 60.0]);
        assert_eq!(pivot.start_spaces, vec![0.0, 100.0]);
        assert_eq!(pivot.values[0], vec![Some(3.0), Some(9.0)]);
        assert_eq!(pivot.values[1], vec![None, Some(12.0)]);
    }

    #[test]
    fn test_pivot_empty_table() {
        let pivot = AggregateTable::default().pivot(Metric::Density);
        assert!(pivot.start_times.is_empty());
        assert!(pivot.values.is_empty());
    }
}
