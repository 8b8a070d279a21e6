//! Service counters.
//!
//! Plain atomics rendered as Prometheus text exposition by the `/metrics`
//! endpoint. Everything is `Ordering::Relaxed` since the values are only
//! ever read for display.

use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::mode::ClientMode;

/// Monotonic counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, amount: u64) {
        self.value.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Duration tracker: count, sum, and fixed millisecond buckets.
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<(u64, AtomicU64)>,
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    pub fn new() -> Self {
        // Transcodes on slow upstreams routinely take whole seconds.
        Self::with_buckets(&[10, 50, 100, 250, 500, 1000, 2500, 5000, 15000, 60000])
    }

    pub fn with_buckets(bounds: &[u64]) -> Self {
        Self {
            buckets: bounds.iter().map(|&b| (b, AtomicU64::new(0))).collect(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, value: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(value, Ordering::Relaxed);
        for (bound, counter) in &self.buckets {
            if value <= *bound {
                counter.fetch_add(1, Ordering::Relaxed);
                break;
            }
        }
    }

    pub fn observe_duration(&self, duration: Duration) {
        self.observe(duration.as_millis() as u64);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    /// `(upper bound, observations in this bucket)` pairs, ascending.
    /// Per-bucket counts, not cumulative.
    pub fn bucket_counts(&self) -> Vec<(u64, u64)> {
        self.buckets
            .iter()
            .map(|(bound, counter)| (*bound, counter.load(Ordering::Relaxed)))
            .collect()
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Measures one operation into a histogram.
pub struct Timer<'a> {
    start: Instant,
    histogram: &'a Histogram,
}

impl<'a> Timer<'a> {
    pub fn start(histogram: &'a Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }

    pub fn stop(self) -> Duration {
        let elapsed = self.start.elapsed();
        self.histogram.observe_duration(elapsed);
        elapsed
    }
}

/// Every counter the service keeps, one field per series.
#[derive(Debug, Default)]
pub struct ServiceMetrics {
    mode_requests: [Counter; ClientMode::ALL.len()],
    pub pages_rendered: Counter,
    pub render_failures: Counter,
    pub upstream_errors: Counter,
    pub transcodes_started: Counter,
    pub transcodes_completed: Counter,
    pub transcodes_failed: Counter,
    pub transcode_duration: Histogram,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request counter for one client mode.
    pub fn mode_requests(&self, mode: ClientMode) -> &Counter {
        &self.mode_requests[mode as usize]
    }

    /// (mode name, request count) pairs in declaration order.
    pub fn mode_request_counts(&self) -> Vec<(&'static str, u64)> {
        ClientMode::ALL
            .iter()
            .map(|mode| (mode.as_str(), self.mode_requests(*mode).get()))
            .collect()
    }

    /// Renders every series in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(2048);

        let _ = writeln!(out, "# HELP microfiche_requests_total Requests served, by client mode");
        let _ = writeln!(out, "# TYPE microfiche_requests_total counter");
        for (mode, count) in self.mode_request_counts() {
            let _ = writeln!(out, "microfiche_requests_total{{mode=\"{mode}\"}} {count}");
        }

        let counters: [(&str, &str, &Counter); 6] = [
            ("microfiche_pages_rendered_total", "Pages rendered", &self.pages_rendered),
            ("microfiche_render_failures_total", "Template render failures", &self.render_failures),
            ("microfiche_upstream_errors_total", "Archive API failures", &self.upstream_errors),
            ("microfiche_transcodes_started_total", "Transcodes started", &self.transcodes_started),
            (
                "microfiche_transcodes_completed_total",
                "Transcodes streamed to completion",
                &self.transcodes_completed,
            ),
            ("microfiche_transcodes_failed_total", "Transcodes failed", &self.transcodes_failed),
        ];
        for (name, help, counter) in counters {
            let _ = writeln!(out, "# HELP {name} {help}");
            let _ = writeln!(out, "# TYPE {name} counter");
            let _ = writeln!(out, "{name} {}", counter.get());
        }

        let name = "microfiche_transcode_duration_ms";
        let _ = writeln!(out, "# HELP {name} Time to first converted byte, milliseconds");
        let _ = writeln!(out, "# TYPE {name} histogram");
        let mut cumulative = 0;
        for (bound, count) in self.transcode_duration.bucket_counts() {
            cumulative += count;
            let _ = writeln!(out, "{name}_bucket{{le=\"{bound}\"}} {cumulative}");
        }
        let _ = writeln!(out, "{name}_bucket{{le=\"+Inf\"}} {}", self.transcode_duration.count());
        let _ = writeln!(out, "{name}_sum {}", self.transcode_duration.sum());
        let _ = writeln!(out, "{name}_count {}", self.transcode_duration.count());

        out
    }
}

static GLOBAL: OnceLock<ServiceMetrics> = OnceLock::new();

/// The process-wide metrics instance.
pub fn global() -> &'static ServiceMetrics {
    GLOBAL.get_or_init(ServiceMetrics::new)
}
