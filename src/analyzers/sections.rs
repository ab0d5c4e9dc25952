use crate::analyzers::utility::{MetricSummary, summarize};
use crate::engine::{AggregateRecord, AggregateTable, GridParams};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Fundamental-diagram summary of one road section (one space window)
/// across every time window.
#[derive(Debug, Clone, Serialize)]
pub struct SectionSummary {
    pub label: String,
    pub start_space: f64,
    pub end_space: f64,
    pub cells: usize,
    pub populated_cells: usize,
    /// Sum of `vehicle_count` over the section's cells.
    pub traversals: usize,
    pub avg_speed: Option<MetricSummary>,
    pub density: Option<MetricSummary>,
    pub flow: Option<MetricSummary>,
}

/// All section summaries for one aggregation run, written as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct SectionReport {
    pub generated_at: DateTime<Utc>,
    pub params: GridParams,
    pub total_cells: usize,
    pub populated_cells: usize,
    pub sections: Vec<SectionSummary>,
}

/// `"{start}-{end} m"` with both ends truncated to whole units.
pub fn section_label(start_space: f64, space_step: f64) -> String {
    format!(
        "{}-{} m",
        start_space.trunc() as i64,
        (start_space + space_step).trunc() as i64
    )
}

/// Groups `table` by `start_space`, in ascending order.
pub fn summarize_sections(table: &AggregateTable, params: &GridParams) -> SectionReport {
    let space_step = params.space_step as f64;

    let mut ordered: Vec<&AggregateRecord> = table.iter().collect();
    ordered.sort_by(|a, b| {
        a.start_space
            .total_cmp(&b.start_space)
            .then(a.start_time.total_cmp(&b.start_time))
    });

    let sections = ordered
        .chunk_by(|a, b| a.start_space.total_cmp(&b.start_space).is_eq())
        .map(|group| {
            let start_space = group[0].start_space;
            SectionSummary {
                label: section_label(start_space, space_step),
                start_space,
                end_space: start_space + space_step,
                cells: group.len(),
                populated_cells: group.iter().filter(|r| r.is_populated()).count(),
                traversals: group.iter().map(|r| r.vehicle_count).sum(),
                avg_speed: summarize(group.iter().map(|r| r.avg_speed)),
                density: summarize(group.iter().map(|r| r.density)),
                flow: summarize(group.iter().map(|r| r.flow)),
            }
        })
        .collect();

    SectionReport {
        generated_at: Utc::now(),
        params: *params,
        total_cells: table.len(),
        populated_cells: table.populated(),
        sections,
    }
}
