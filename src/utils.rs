use std::time::{Duration, Instant};

use tracing::debug;

/// Stopwatch for one stage of a tick
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    started: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn elapsed_us(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1_000_000.0
    }

    /// Elapsed microseconds, restarting the timer
    pub fn lap_us(&mut self) -> f64 {
        let us = self.elapsed_us();
        self.started = Instant::now();
        us
    }
}

/// Timing measurements for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickTiming {
    pub capture_us: f64,
    pub locate_us: f64,
    /// Recognition including the debounce wait
    pub read_us: f64,
    pub total_us: f64,
}

impl TickTiming {
    pub fn total_ms(&self) -> f64 {
        self.total_us / 1000.0
    }
}

/// Rolling latency collector, summarized to the log every `interval` ticks
pub struct LatencyStats {
    timings: Vec<TickTiming>,
    interval: usize,
}

impl LatencyStats {
    pub fn new(interval: u32) -> Self {
        let interval = interval.max(1) as usize;
        Self {
            timings: Vec::with_capacity(interval),
            interval,
        }
    }

    pub fn len(&self) -> usize {
        self.timings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }

    /// Record one tick; logs and clears the window once it is full
    pub fn add(&mut self, timing: TickTiming) {
        self.timings.push(timing);
        if self.timings.len() >= self.interval {
            self.log_report();
            self.timings.clear();
        }
    }

    fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }

        let idx = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
        sorted[idx]
    }

    /// (mean, p50, p95, p99) of one stage
    pub fn stage_stats(&self, extract: impl Fn(&TickTiming) -> f64) -> (f64, f64, f64, f64) {
        if self.timings.is_empty() {
            return (0.0, 0.0, 0.0, 0.0);
        }

        let mut values: Vec<f64> = self.timings.iter().map(&extract).collect();
        values.sort_by(f64::total_cmp);

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let p50 = Self::percentile(&values, 50.0);
        let p95 = Self::percentile(&values, 95.0);
        let p99 = Self::percentile(&values, 99.0);

        (mean, p50, p95, p99)
    }

    pub fn log_report(&self) {
        if self.timings.is_empty() {
            return;
        }

        let stages = [
            ("capture", self.stage_stats(|t| t.capture_us)),
            ("locate", self.stage_stats(|t| t.locate_us)),
            ("read", self.stage_stats(|t| t.read_us)),
            ("total", self.stage_stats(|t| t.total_us)),
        ];
        for (stage, (mean, p50, p95, p99)) in stages {
            debug!(
                ticks = self.timings.len(),
                stage,
                mean_us = mean.round(),
                p50_us = p50.round(),
                p95_us = p95.round(),
                p99_us = p99.round(),
                "Tick latency"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_timer_laps() {
        let mut timer = Timer::start();
        thread::sleep(Duration::from_millis(2));
        let first = timer.lap_us();
        assert!(first >= 2000.0);
        assert!(timer.elapsed_us() < first);
    }

    #[test]
    fn test_tick_timing_total_ms() {
        let timing = TickTiming {
            total_us: 50000.0,
            ..TickTiming::default()
        };
        assert_eq!(timing.total_ms(), 50.0);
    }

    #[test]
    fn test_latency_stats_window_resets() {
        let mut stats = LatencyStats::new(3);
        stats.add(TickTiming::default());
        stats.add(TickTiming::default());
        assert_eq!(stats.len(), 2);

        stats.add(TickTiming::default());
        assert!(stats.is_empty());
    }

    #[test]
    fn test_stage_percentiles() {
        let mut stats = LatencyStats::new(1000);
        for total in 1..=100 {
            stats.add(TickTiming {
                total_us: total as f64,
                ..TickTiming::default()
            });
        }
        let (mean, p50, p95, p99) = stats.stage_stats(|t| t.total_us);
        assert_eq!(mean, 50.5);
        assert_eq!(p50, 51.0);
        assert_eq!(p95, 95.0);
        assert_eq!(p99, 99.0);
    }
}
