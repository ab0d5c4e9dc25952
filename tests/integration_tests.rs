use macroflow::analyzers::sections::summarize_sections;
use macroflow::engine::Metric;
use macroflow::output::write_table_to;
use macroflow::parser::{ParseOptions, parse_trajectories};
use macroflow::{GridError, GridParams, TrajectoryTable, compute};

fn load_fixture() -> TrajectoryTable {
    let bytes = include_bytes!("fixtures/trajectories.csv");
    parse_trajectories(bytes, &ParseOptions::default()).expect("Failed to parse fixture")
}

#[test]
fn test_full_pipeline() {
    let table = load_fixture();
    assert_eq!(table.n_rows(), 373);

    let aggregate = compute(&table, &GridParams::default()).expect("Aggregation failed");

    // frames 0..=1300 -> starts 0, 600; positions 0..=240 -> starts 0, 100
    assert_eq!(aggregate.len(), 4);
    let starts: Vec<(f64, f64)> = aggregate
        .iter()
        .map(|r| (r.start_time, r.start_space))
        .collect();
    assert_eq!(starts, vec![(0.0, 0.0), (0.0, 100.0), (60.0, 0.0), (60.0, 100.0)]);

    // first cell: distances 100, 75, 30 over 50 s, 50 s, 60 s
    let first = aggregate.records[0];
    assert_eq!(first.vehicle_count, 3);
    assert!((first.avg_speed.unwrap() - 205.0 / 160.0).abs() < 1e-9);
    assert!((first.density.unwrap() - 160.0 * 1000.0 / 6000.0).abs() < 1e-9);
    assert!((first.flow.unwrap() - 205.0 * 3600.0 / 6000.0).abs() < 1e-9);
}

#[test]
fn test_export_contract() {
    let aggregate = compute(&load_fixture(), &GridParams::default()).unwrap();

    let mut buf = Vec::new();
    write_table_to(&mut buf, &aggregate).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let mut lines = text.lines();

    assert_eq!(
        lines.next(),
        Some("start_time,start_space,avg_speed,density,flow,vehicle_count")
    );
    assert_eq!(lines.count(), aggregate.len());
}

#[test]
fn test_sections_and_pivot() {
    let params = GridParams::default();
    let aggregate = compute(&load_fixture(), &params).unwrap();

    let report = summarize_sections(&aggregate, &params);
    assert_eq!(report.sections.len(), 2);
    assert_eq!(report.sections[0].label, "0-100 m");
    assert_eq!(report.sections[1].label, "100-200 m");
    assert_eq!(report.total_cells, 4);

    let pivot = aggregate.pivot(Metric::AvgSpeed);
    assert_eq!(pivot.start_times, vec![0.0, 60.0]);
    assert_eq!(pivot.start_spaces, vec![0.0, 100.0]);
    assert_eq!(pivot.values[0][0], aggregate.records[0].avg_speed);
}

#[test]
fn test_window_larger_than_data() {
    let params = GridParams {
        time_step: 5000,
        ..Default::default()
    };
    let aggregate = compute(&load_fixture(), &params).unwrap();
    assert!(aggregate.is_empty());
}

#[test]
fn test_bad_position_column() {
    let params = GridParams {
        position_column: 9,
        ..Default::default()
    };
    let result = compute(&load_fixture(), &params);
    assert!(matches!(result, Err(GridError::InvalidInput(_))));
}

#[test]
fn test_row_order_matters() {
    // reversing a vehicle's rows swaps entry and exit, so forward motion
    // turns into a time-decreasing pair and the vehicle drops out
    let forward = TrajectoryTable::from_rows(vec![
        vec![1.0, 0.0, 0.0, 0.0],
        vec![1.0, 10.0, 0.0, 10.0],
    ])
    .unwrap();
    let reversed = TrajectoryTable::from_rows(vec![
        vec![1.0, 10.0, 0.0, 10.0],
        vec![1.0, 0.0, 0.0, 0.0],
    ])
    .unwrap();
    let params = GridParams {
        time_step: 10,
        space_step: 10,
        time_scale: 1.0,
        ..Default::default()
    };

    let a = compute(&forward, &params).unwrap();
    let b = compute(&reversed, &params).unwrap();
    assert_eq!(a.records[0].vehicle_count, 1);
    assert_eq!(b.records[0].vehicle_count, 0);
    assert!(b.records[0].avg_speed.is_none());
}
