//! Checker metrics using metrics-rs.
//!
//! The checker records through the `metrics` facade; nothing is collected
//! unless a recorder is installed. The CLI installs [`CliRecorder`] when run
//! with `--metrics` and prints a summary at exit.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit, counter,
    describe_counter, describe_histogram, histogram,
};
use parking_lot::RwLock;

use crate::error::ErrorClass;

/// Register metric descriptions. Call once at startup.
pub fn init() {
    describe_counter!(
        "otbn_rtl_records_total",
        Unit::Count,
        "RTL trace records accepted"
    );
    describe_counter!(
        "otbn_iss_records_total",
        Unit::Count,
        "ISS trace records accepted, excluding stalls"
    );
    describe_counter!(
        "otbn_iss_stalls_total",
        Unit::Count,
        "ISS stall sentinels skipped"
    );
    describe_counter!(
        "otbn_pairs_matched_total",
        Unit::Count,
        "RTL/ISS entry pairs that compared equal"
    );
    describe_counter!(
        "otbn_check_errors_total",
        Unit::Count,
        "Errors latched, by class"
    );
    describe_histogram!(
        "otbn_stall_cycles",
        Unit::Count,
        "Stall records coalesced into each executed instruction"
    );
}

pub(crate) fn record_rtl() {
    counter!("otbn_rtl_records_total").increment(1);
}

pub(crate) fn record_iss() {
    counter!("otbn_iss_records_total").increment(1);
}

pub(crate) fn record_iss_stall() {
    counter!("otbn_iss_stalls_total").increment(1);
}

pub(crate) fn record_match() {
    counter!("otbn_pairs_matched_total").increment(1);
}

pub(crate) fn record_error(class: ErrorClass) {
    let labels = [("class", class.as_str())];
    counter!("otbn_check_errors_total", &labels).increment(1);
}

pub(crate) fn record_stall_cycles(cycles: u32) {
    histogram!("otbn_stall_cycles").record(f64::from(cycles));
}

// ============================================================================
// CLI Recorder for terminal output
// ============================================================================

#[derive(Default)]
struct CounterStorage {
    values: RwLock<HashMap<String, u64>>,
}

#[derive(Default)]
struct HistogramStorage {
    values: RwLock<HashMap<String, Vec<f64>>>,
}

struct CliCounter {
    key: String,
    storage: Arc<CounterStorage>,
}

impl metrics::CounterFn for CliCounter {
    fn increment(&self, value: u64) {
        let mut values = self.storage.values.write();
        *values.entry(self.key.clone()).or_insert(0) += value;
    }

    fn absolute(&self, value: u64) {
        self.storage.values.write().insert(self.key.clone(), value);
    }
}

struct CliHistogram {
    key: String,
    storage: Arc<HistogramStorage>,
}

impl metrics::HistogramFn for CliHistogram {
    fn record(&self, value: f64) {
        let mut values = self.storage.values.write();
        values.entry(self.key.clone()).or_default().push(value);
    }
}

/// Recorder that keeps counters and histograms in memory for a CLI summary.
///
/// Gauges are not used by the checker and are dropped.
#[derive(Default)]
pub struct CliRecorder {
    counters: Arc<CounterStorage>,
    histograms: Arc<HistogramStorage>,
}

impl CliRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install as the global recorder. Returns `None` if one is already set.
    pub fn install(self) -> Option<CliRecorderHandle> {
        let counters = Arc::clone(&self.counters);
        let histograms = Arc::clone(&self.histograms);

        metrics::set_global_recorder(self).ok()?;

        Some(CliRecorderHandle {
            counters,
            histograms,
        })
    }
}

fn key_to_string(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|l| format!("{}={}", l.key(), l.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

impl Recorder for CliRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(Arc::new(CliCounter {
            key: key_to_string(key),
            storage: Arc::clone(&self.counters),
        }))
    }

    fn register_gauge(&self, _key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(Arc::new(CliHistogram {
            key: key_to_string(key),
            storage: Arc::clone(&self.histograms),
        }))
    }
}

/// Access to what a [`CliRecorder`] collected after it was installed.
pub struct CliRecorderHandle {
    counters: Arc<CounterStorage>,
    histograms: Arc<HistogramStorage>,
}

impl CliRecorderHandle {
    pub fn get_counter(&self, key: &str) -> Option<u64> {
        self.counters.values.read().get(key).copied()
    }

    pub fn get_histogram(&self, key: &str) -> Option<Vec<f64>> {
        self.histograms.values.read().get(key).cloned()
    }

    /// Print all collected metrics in a human-readable format.
    pub fn print_summary(&self) {
        let counters = self.counters.values.read();
        let histograms = self.histograms.values.read();

        if counters.is_empty() && histograms.is_empty() {
            println!("No metrics collected.");
            return;
        }

        println!();
        println!("## Metrics Summary");
        println!();

        if !counters.is_empty() {
            println!("### Counters");
            let mut keys: Vec<_> = counters.keys().collect();
            keys.sort();
            for key in keys {
                println!("  {}: {}", key, counters[key]);
            }
            println!();
        }

        if !histograms.is_empty() {
            println!("### Histograms");
            let mut keys: Vec<_> = histograms.keys().collect();
            keys.sort();
            for key in keys {
                let values = &histograms[key];
                if values.is_empty() {
                    continue;
                }
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                #[allow(clippy::cast_precision_loss)]
                let avg = values.iter().sum::<f64>() / values.len() as f64;
                println!(
                    "  {}: count={}, min={:.0}, max={:.0}, avg={:.2}",
                    key,
                    values.len(),
                    min,
                    max,
                    avg
                );
            }
            println!();
        }
    }
}
