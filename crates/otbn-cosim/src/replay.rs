//! Offline lock-step replay of recorded RTL and ISS traces.
//!
//! Both trace files hold one record per simulated cycle: the RTL side prints
//! a stall or execute record each cycle, the ISS side prints either a record
//! or `STALL`. Replay walks the two in step, delivering the RTL record for a
//! cycle and then the ISS record for the same cycle, the way a simulation
//! harness would call the listeners.

use std::path::{Path, PathBuf};

use otbn_trace::split_records;
use tracing::{debug, info, warn};

use crate::checker::TraceChecker;
use crate::error::{CheckError, ReplayError, Result};
use crate::source::TraceSource;

/// Configuration for a replay.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Cycle number reported with the first RTL record.
    pub first_cycle: u32,
    /// Stop delivering records as soon as the checker has failed.
    pub stop_on_error: bool,
    /// End the session after the last record. Turn off for a capture that was
    /// cut short, where an unmatched trailing entry is expected.
    pub finish: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            first_cycle: 0,
            stop_on_error: true,
            finish: true,
        }
    }
}

/// Records loaded from a pair of trace files.
#[derive(Debug, Clone, Default)]
pub struct Replay {
    rtl: Vec<String>,
    iss: Vec<Vec<String>>,
}

/// Result of a replay.
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    /// Cycles delivered (the longer of the two streams unless stopped early).
    pub cycles: u32,
    /// True if every entry matched and nothing was left over.
    pub passed: bool,
    /// The error that failed the session, if any.
    pub error: Option<CheckError>,
    /// Whether the session was closed when the checker was dropped.
    pub quiescent: bool,
}

impl Replay {
    /// Build a replay from the text of an RTL trace and an ISS trace.
    pub fn from_text(rtl: &str, iss: &str) -> Self {
        Self {
            rtl: split_records(rtl)
                .into_iter()
                .map(|lines| lines.join("\n"))
                .collect(),
            iss: split_records(iss),
        }
    }

    /// Load both trace files.
    pub fn load(rtl_path: &Path, iss_path: &Path) -> Result<Self> {
        let rtl = read_trace(rtl_path)?;
        let iss = read_trace(iss_path)?;
        let replay = Self::from_text(&rtl, &iss);

        if replay.rtl.is_empty() {
            return Err(ReplayError::NoRecords {
                path: rtl_path.to_path_buf(),
            });
        }
        if replay.iss.is_empty() {
            return Err(ReplayError::NoRecords {
                path: iss_path.to_path_buf(),
            });
        }

        info!(
            rtl_records = replay.rtl.len(),
            iss_records = replay.iss.len(),
            "loaded traces"
        );
        Ok(replay)
    }

    pub fn rtl_records(&self) -> &[String] {
        &self.rtl
    }

    pub fn iss_records(&self) -> &[Vec<String>] {
        &self.iss
    }

    /// Replay into a fresh checker, finishing the session unless
    /// [`ReplayConfig::finish`] is off.
    pub fn check(&self, config: &ReplayConfig) -> ReplayOutcome {
        let mut checker = TraceChecker::new();
        let (cycles, passed) = {
            let mut source = TraceSource::new();
            source.add_listener(&mut checker);
            self.deliver(&mut source, config)
        };

        let quiescent = checker.is_quiescent();
        if !quiescent {
            warn!(
                cycles,
                rtl_pending = checker.rtl_pending(),
                iss_pending = checker.iss_pending(),
                stalling = checker.is_stalling(),
                "trace checker dropped with an unfinished session"
            );
        }

        ReplayOutcome {
            cycles,
            passed: passed && !checker.is_errored(),
            error: checker.error().cloned(),
            quiescent,
        }
    }

    /// Deliver every record to `source` in lock-step, then finish it if
    /// [`ReplayConfig::finish`] is set.
    ///
    /// Returns the number of cycles delivered and the combined result. A
    /// failed checker rejects every later ISS step, so with `stop_on_error`
    /// delivery ends at the first cycle whose ISS step fails.
    pub fn deliver(&self, source: &mut TraceSource<'_>, config: &ReplayConfig) -> (u32, bool) {
        let total = self.rtl.len().max(self.iss.len());
        let mut ok = true;
        let mut cycles = 0u32;

        for index in 0..total {
            let cycle = config.first_cycle.wrapping_add(cycles);
            if let Some(record) = self.rtl.get(index) {
                source.broadcast_rtl(record, cycle);
            }
            if let Some(lines) = self.iss.get(index) {
                ok &= source.broadcast_iss(lines);
            }
            cycles += 1;

            if config.stop_on_error && !ok {
                debug!(cycle, "stopping replay after failure");
                break;
            }
        }

        if config.finish {
            ok &= source.finish();
        }
        (cycles, ok)
    }
}

fn read_trace(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
        path: PathBuf::from(path),
        source,
    })
}
