//! Per-vehicle indexed trajectories.
//!
//! Each vehicle keeps its samples in original row order, which decides entry
//! and exit within a cell, plus a permutation sorted by time so the samples
//! falling inside a time window can be found by binary search.

use crate::trajectory::TrajectoryPoint;
use std::cmp::Ordering;

/// A sample inside one vehicle's track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub position: f64,
}

#[derive(Debug, Clone)]
pub struct VehicleTrack {
    pub id: f64,
    /// Samples in original row order.
    samples: Vec<Sample>,
    /// Indices into `samples`, sorted by time.
    by_time: Vec<u32>,
}

impl VehicleTrack {
    fn new(id: f64, samples: Vec<Sample>) -> Self {
        let mut by_time: Vec<u32> = (0..samples.len() as u32).collect();
        by_time.sort_by(|&a, &b| samples[a as usize].time.total_cmp(&samples[b as usize].time));
        Self {
            id,
            samples,
            by_time,
        }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn time_span(&self) -> (f64, f64) {
        // by_time is never empty for an indexed vehicle
        let first = self.samples[self.by_time[0] as usize].time;
        let last = self.samples[self.by_time[self.by_time.len() - 1] as usize].time;
        (first, last)
    }

    /// First and last sample, in row order, with `time` in `[t0, t1]` and
    /// `position` in `[s0, s1]`, both bounds inclusive.
    pub fn entry_exit(&self, t0: f64, t1: f64, s0: f64, s1: f64) -> Option<(Sample, Sample)> {
        let lo = self
            .by_time
            .partition_point(|&i| self.samples[i as usize].time < t0);
        let hi = self
            .by_time
            .partition_point(|&i| self.samples[i as usize].time <= t1);
        if lo >= hi {
            return None;
        }

        let mut first: Option<u32> = None;
        let mut last: Option<u32> = None;
        for &i in &self.by_time[lo..hi] {
            let pos = self.samples[i as usize].position;
            if pos >= s0 && pos <= s1 {
                first = Some(first.map_or(i, |f| f.min(i)));
                last = Some(last.map_or(i, |l| l.max(i)));
            }
        }

        Some((
            self.samples[first? as usize],
            self.samples[last? as usize],
        ))
    }
}

/// All vehicles of a dataset, ordered by ascending id.
#[derive(Debug, Clone, Default)]
pub struct VehicleIndex {
    tracks: Vec<VehicleTrack>,
}

impl VehicleIndex {
    pub fn build(points: &[TrajectoryPoint]) -> Self {
        let mut keyed: Vec<(f64, usize)> = points
            .iter()
            .enumerate()
            // fold -0.0 into 0.0 so both land in one vehicle
            .map(|(i, p)| (p.vehicle_id + 0.0, i))
            .collect();
        keyed.sort_by(|a, b| match a.0.total_cmp(&b.0) {
            Ordering::Equal => points[a.1].row.cmp(&points[b.1].row),
            other => other,
        });

        let mut tracks = Vec::new();
        for group in keyed.chunk_by(|a, b| a.0 == b.0) {
            let samples = group
                .iter()
                .map(|&(_, i)| Sample {
                    time: points[i].time,
                    position: points[i].position,
                })
                .collect();
            tracks.push(VehicleTrack::new(group[0].0, samples));
        }

        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[VehicleTrack] {
        &self.tracks
    }
}
