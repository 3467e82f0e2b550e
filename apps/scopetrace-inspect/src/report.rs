//! Plain-text rendering of a trace summary.

use std::fmt;

use scopetrace::TraceSummary;

/// Table of the `top` longest regions plus thread names.
pub struct Report<'a> {
    summary: &'a TraceSummary,
    top: usize,
}

impl<'a> Report<'a> {
    pub const fn new(summary: &'a TraceSummary, top: usize) -> Self {
        Self { summary, top }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let regions = &self.summary.regions;
        writeln!(
            f,
            "{:<32} {:>8} {:>12} {:>10} {:>10} {:>10}",
            "region", "count", "total ms", "avg ms", "max us", "p95 us"
        )?;
        for stats in regions.iter().take(self.top) {
            writeln!(
                f,
                "{:<32} {:>8} {:>12.3} {:>10.3} {:>10} {:>10}",
                stats.name,
                stats.count,
                stats.total_ms(),
                stats.avg_ms(),
                stats.max_us,
                stats.p95_us
            )?;
        }
        if regions.len() > self.top {
            writeln!(f, "... {} more regions", regions.len() - self.top)?;
        }

        if !self.summary.threads.is_empty() {
            let mut threads: Vec<(&u64, &String)> = self.summary.threads.iter().collect();
            threads.sort_by(|a, b| a.1.cmp(b.1));
            writeln!(f, "\nthreads:")?;
            for (tid, name) in threads {
                writeln!(f, "  {name} (tid {tid})")?;
            }
        }
        if self.summary.unterminated > 0 {
            writeln!(f, "\n{} unterminated events", self.summary.unterminated)?;
        }
        Ok(())
    }
}
