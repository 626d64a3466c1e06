use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::Mutex,
    time::Instant,
};

/// Tunable limits used to flag slow or memory-hungry operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerThresholds {
    pub slow_seconds: f64,
    pub memory_mb: f64,
}

impl Default for ProfilerThresholds {
    fn default() -> Self {
        Self {
            slow_seconds: 1.0,
            memory_mb: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OperationStats {
    count: u64,
    total_secs: f64,
    min_secs: f64,
    max_secs: f64,
    total_mem_delta_mb: f64,
    max_mem_delta_mb: f64,
}

impl OperationStats {
    fn record(&mut self, secs: f64, mem_delta_mb: f64) {
        self.count += 1;
        self.total_secs += secs;
        self.min_secs = self.min_secs.min(secs);
        self.max_secs = self.max_secs.max(secs);
        self.total_mem_delta_mb += mem_delta_mb;
        self.max_mem_delta_mb = self.max_mem_delta_mb.max(mem_delta_mb);
    }

    fn first(secs: f64, mem_delta_mb: f64) -> Self {
        OperationStats {
            count: 1,
            total_secs: secs,
            min_secs: secs,
            max_secs: secs,
            total_mem_delta_mb: mem_delta_mb,
            max_mem_delta_mb: mem_delta_mb,
        }
    }
}

/// Aggregated view of one named operation inside a [`PerformanceReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationReport {
    pub count: u64,
    pub total_time: f64,
    pub avg_time: f64,
    pub min_time: f64,
    pub max_time: f64,
    pub avg_memory_delta_mb: f64,
    pub max_memory_delta_mb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_time: f64,
    pub total_operations: u64,
    pub avg_operation_time: f64,
}

/// Read-only snapshot of the profiler state at the time of the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub summary: ReportSummary,
    pub operations: BTreeMap<String, OperationReport>,
    pub recommendations: Vec<String>,
}

/// Lightweight instrumentation around named operations: wall-clock duration
/// plus process RSS delta, aggregated incrementally per name. One instance
/// per transformer run; nothing is shared across runs. Not a statistically
/// rigorous profiler — no percentiles, no sampling correction.
#[derive(Debug)]
pub struct Profiler {
    thresholds: ProfilerThresholds,
    ops: Mutex<BTreeMap<String, OperationStats>>,
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new(ProfilerThresholds::default())
    }
}

impl Profiler {
    pub fn new(thresholds: ProfilerThresholds) -> Self {
        Profiler {
            thresholds,
            ops: Mutex::new(BTreeMap::new()),
        }
    }

    /// Starts measuring; the measurement is recorded when the returned guard
    /// drops, so it is captured even when the wrapped work fails.
    pub fn start(&self, name: &str) -> OpTimer<'_> {
        OpTimer {
            profiler: self,
            name: name.to_string(),
            started: Instant::now(),
            start_rss_mb: rss_mb(),
        }
    }

    fn record(&self, name: &str, secs: f64, mem_delta_mb: f64) {
        let mut ops = self.ops.lock().expect("profiler poisoned");
        match ops.get_mut(name) {
            Some(stats) => stats.record(secs, mem_delta_mb),
            None => {
                ops.insert(name.to_string(), OperationStats::first(secs, mem_delta_mb));
            }
        }
    }

    pub fn report(&self) -> PerformanceReport {
        let ops = self.ops.lock().expect("profiler poisoned");

        let mut operations = BTreeMap::new();
        let mut total_time = 0.0;
        let mut total_operations = 0;

        for (name, stats) in ops.iter() {
            total_time += stats.total_secs;
            total_operations += stats.count;
            operations.insert(
                name.clone(),
                OperationReport {
                    count: stats.count,
                    total_time: stats.total_secs,
                    avg_time: stats.total_secs / stats.count as f64,
                    min_time: stats.min_secs,
                    max_time: stats.max_secs,
                    avg_memory_delta_mb: stats.total_mem_delta_mb / stats.count as f64,
                    max_memory_delta_mb: stats.max_mem_delta_mb,
                },
            );
        }

        let avg_operation_time = if total_operations > 0 {
            total_time / total_operations as f64
        } else {
            0.0
        };

        let mut report = PerformanceReport {
            summary: ReportSummary {
                total_time,
                total_operations,
                avg_operation_time,
            },
            operations,
            recommendations: Vec::new(),
        };
        report.recommendations = self.suggest_optimizations(&report);
        report
    }

    /// Threshold heuristics over a report. Naive by design; callers needing
    /// precision should reach for external tooling.
    pub fn suggest_optimizations(&self, report: &PerformanceReport) -> Vec<String> {
        let mut suggestions = Vec::new();
        for (name, op) in &report.operations {
            if op.avg_time > self.thresholds.slow_seconds {
                suggestions.push(format!(
                    "Operation '{name}' is slow (avg {:.2}s over {} calls); consider smaller batches or source-side filtering",
                    op.avg_time, op.count
                ));
            }
            if op.max_memory_delta_mb > self.thresholds.memory_mb {
                suggestions.push(format!(
                    "Operation '{name}' allocates heavily (peak delta {:.1}MB); consider reducing the batch size",
                    op.max_memory_delta_mb
                ));
            }
        }
        suggestions
    }
}

/// Guard measuring one operation; records on drop.
pub struct OpTimer<'a> {
    profiler: &'a Profiler,
    name: String,
    started: Instant,
    start_rss_mb: f64,
}

impl Drop for OpTimer<'_> {
    fn drop(&mut self) {
        let secs = self.started.elapsed().as_secs_f64();
        let mem_delta_mb = rss_mb() - self.start_rss_mb;
        self.profiler.record(&self.name, secs, mem_delta_mb);
    }
}

/// Resident set size in MB. Reads /proc on Linux; other platforms report
/// zero, which keeps memory recommendations silent there.
#[cfg(target_os = "linux")]
fn rss_mb() -> f64 {
    std::fs::read_to_string("/proc/self/statm")
        .ok()
        .and_then(|s| {
            s.split_whitespace()
                .nth(1)
                .and_then(|pages| pages.parse::<f64>().ok())
        })
        .map(|pages| pages * 4096.0 / (1024.0 * 1024.0))
        .unwrap_or(0.0)
}

#[cfg(not(target_os = "linux"))]
fn rss_mb() -> f64 {
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn aggregates_are_correct_over_repeated_calls() {
        let profiler = Profiler::default();
        let durations_ms = [5u64, 15, 10];
        for ms in durations_ms {
            let _t = profiler.start("extract");
            std::thread::sleep(Duration::from_millis(ms));
        }

        let report = profiler.report();
        let op = &report.operations["extract"];
        assert_eq!(op.count, 3);
        assert!(op.min_time <= op.avg_time && op.avg_time <= op.max_time);
        assert!((op.avg_time - op.total_time / 3.0).abs() < 1e-9);
        assert!(op.min_time >= 0.005);
        assert_eq!(report.summary.total_operations, 3);
    }

    #[test]
    fn recorded_even_when_work_panics() {
        let profiler = Profiler::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _t = profiler.start("explode");
            panic!("boom");
        }));
        assert!(result.is_err());

        let report = profiler.report();
        assert_eq!(report.operations["explode"].count, 1);
    }

    #[test]
    fn slow_operations_are_flagged() {
        let profiler = Profiler::new(ProfilerThresholds {
            slow_seconds: 0.001,
            memory_mb: 100.0,
        });
        {
            let _t = profiler.start("slow_phase");
            std::thread::sleep(Duration::from_millis(5));
        }

        let report = profiler.report();
        assert!(
            report
                .recommendations
                .iter()
                .any(|r| r.contains("slow_phase"))
        );
    }

    #[test]
    fn empty_profiler_reports_zeroes() {
        let report = Profiler::default().report();
        assert_eq!(report.summary.total_operations, 0);
        assert_eq!(report.summary.avg_operation_time, 0.0);
        assert!(report.recommendations.is_empty());
    }
}
