use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::info;

/// Scoped profiler accumulating wall time and call counts per section.
#[derive(Default)]
pub struct Profiler {
    pub timings: HashMap<&'static str, (Duration, u64)>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        let entry = self.timings.entry(name).or_default();
        entry.0 += elapsed;
        entry.1 += 1;
    }

    pub fn finish(&mut self, guard: &ProfilerGuard) {
        self.record(guard.name, guard.start.elapsed());
    }

    /// Sections ordered by total time, longest first.
    pub fn report_sorted(&self) -> Vec<(&'static str, Duration, u64)> {
        let mut v: Vec<_> = self.timings.iter().map(|(n, (d, c))| (*n, *d, *c)).collect();
        v.sort_by(|a, b| b.1.cmp(&a.1));
        v
    }

    pub fn clear(&mut self) {
        self.timings.clear();
    }

    pub fn log_and_clear(&mut self) {
        for (section, total, calls) in self.report_sorted() {
            let mean = mean_duration(total, calls);
            info!(section, ?total, calls, ?mean, "profile");
        }
        self.clear();
    }
}

/// Mean time per call; zero calls report the total.
fn mean_duration(total: Duration, calls: u64) -> Duration {
    total.div_f64(calls.max(1) as f64)
}

pub struct ProfilerGuard {
    name: &'static str,
    start: Instant,
}

/// Start a profiling section. The returned guard reports to the global
/// profiler when dropped.
pub fn start(name: &'static str) -> ProfilerGuard {
    ProfilerGuard { name, start: Instant::now() }
}

#[cfg(feature = "profiling")]
impl Drop for ProfilerGuard {
    fn drop(&mut self) {
        crate::PROFILER.lock().finish(self);
    }
}

/// Profile the enclosing scope when the `profiling` feature is enabled.
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        #[cfg(feature = "profiling")]
        let _guard = $crate::profiler::start($name);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_orders_by_total_time() {
        let mut p = Profiler::new();
        p.record("fast", Duration::from_millis(1));
        p.record("slow", Duration::from_millis(5));
        p.record("fast", Duration::from_millis(2));
        let report = p.report_sorted();
        assert_eq!(report[0], ("slow", Duration::from_millis(5), 1));
        assert_eq!(report[1], ("fast", Duration::from_millis(3), 2));
        p.clear();
        assert!(p.report_sorted().is_empty());
    }

    #[test]
    fn mean_handles_call_counts_past_u32() {
        let calls = 1u64 << 33;
        let mean = mean_duration(Duration::from_secs(calls), calls);
        assert!((mean.as_secs_f64() - 1.0).abs() < 1e-6);
        assert_eq!(mean_duration(Duration::from_millis(4), 0), Duration::from_millis(4));
    }
}
