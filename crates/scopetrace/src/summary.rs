//! Per-region statistics over exported traces.

use std::collections::HashMap;

use crate::events::{Phase, Trace};

/// Aggregated timings of one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionStats {
    /// Region name.
    pub name: String,
    /// Region category.
    pub category: String,
    /// Number of completed Begin/End pairs.
    pub count: u32,
    /// Total duration in microseconds.
    pub total_us: u64,
    /// Minimum duration in microseconds.
    pub min_us: u64,
    /// Maximum duration in microseconds.
    pub max_us: u64,
    /// Average duration in microseconds (computed from total/count).
    pub avg_us: u64,
    /// 95th percentile duration in microseconds.
    pub p95_us: u64,
}

impl RegionStats {
    /// Create new empty stats for a region.
    #[must_use]
    pub fn new(name: &str, category: &str) -> Self {
        Self {
            name: name.to_owned(),
            category: category.to_owned(),
            count: 0,
            total_us: 0,
            min_us: u64::MAX,
            max_us: 0,
            avg_us: 0,
            p95_us: 0,
        }
    }

    /// Record a new duration.
    pub fn record(&mut self, duration_us: u64) {
        self.count += 1;
        self.total_us += duration_us;
        self.min_us = self.min_us.min(duration_us);
        self.max_us = self.max_us.max(duration_us);
        self.avg_us = self.total_us / u64::from(self.count);
    }

    /// Get average in milliseconds.
    #[must_use]
    pub fn avg_ms(&self) -> f64 {
        self.avg_us as f64 / 1_000.0
    }

    /// Get total in milliseconds.
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_us as f64 / 1_000.0
    }
}

/// Summary of an exported trace.
#[derive(Debug, Clone, Default)]
pub struct TraceSummary {
    /// Regions sorted by total time, longest first.
    pub regions: Vec<RegionStats>,
    /// Thread id -> display name, from metadata events.
    pub threads: HashMap<u64, String>,
    /// End events without a Begin plus Begin events never closed.
    pub unterminated: usize,
}

impl TraceSummary {
    /// Pair Begin/End events per thread and aggregate durations.
    ///
    /// An End closes the most recent open Begin on the same thread, as trace
    /// viewers do.
    #[must_use]
    pub fn from_traces(traces: &[Trace]) -> Self {
        let mut open: HashMap<u64, Vec<&Trace>> = HashMap::new();
        let mut samples: HashMap<(&str, &str), Vec<u64>> = HashMap::new();
        let mut threads = HashMap::new();
        let mut unterminated = 0;

        for trace in traces {
            match trace.ph {
                Phase::Begin => open.entry(trace.tid).or_default().push(trace),
                Phase::End => match open.get_mut(&trace.tid).and_then(Vec::pop) {
                    Some(begin) => samples
                        .entry((begin.name.as_str(), begin.cat.as_str()))
                        .or_default()
                        .push(u64::from(trace.ts.saturating_sub(begin.ts))),
                    None => unterminated += 1,
                },
                Phase::Metadata => {
                    if let Some(args) = &trace.args {
                        threads.insert(trace.tid, args.name.clone());
                    }
                }
            }
        }
        unterminated += open.values().map(Vec::len).sum::<usize>();

        let mut regions: Vec<RegionStats> = samples
            .into_iter()
            .map(|((name, category), mut durations)| {
                let mut stats = RegionStats::new(name, category);
                for &duration in &durations {
                    stats.record(duration);
                }
                durations.sort_unstable();
                stats.p95_us = durations[(durations.len() * 95) / 100];
                stats
            })
            .collect();
        regions.sort_by(|a, b| b.total_us.cmp(&a.total_us).then_with(|| a.name.cmp(&b.name)));

        Self {
            regions,
            threads,
            unterminated,
        }
    }

    /// Stats for a region by name.
    #[must_use]
    pub fn region(&self, name: &str) -> Option<&RegionStats> {
        self.regions.iter().find(|stats| stats.name == name)
    }
}
