//! Lock-step RTL/ISS trace checker.
//!
//! The RTL trace shows a multi-cycle instruction as zero or more stall
//! records followed by one execute record. The ISS has no notion of stall
//! cycles and prints one record per instruction. The checker folds the stall
//! records into the execute record, then pairs each completed RTL entry with
//! the next ISS entry and compares them.
//!
//! Errors latch: the first one is kept and every later call is a no-op (RTL)
//! or returns `false` (ISS, finish). A fresh [`TraceChecker`] is needed to
//! check anything else.

use otbn_trace::{TraceEntry, is_iss_stall};
use tracing::{debug, error};

use crate::error::CheckError;
use crate::metrics;


/// Which side, if any, is waiting for its counterpart.
///
/// Only one side can ever be waiting: as soon as the second side arrives the
/// pair is compared and both are consumed.
#[derive(Debug, Clone, Default)]
enum Pending {
    #[default]
    Idle,
    /// A completed RTL entry waiting for the ISS.
    AwaitingIss(TraceEntry),
    /// An ISS entry waiting for the RTL.
    AwaitingRtl(TraceEntry),
}

/// Stall records seen so far for the instruction currently executing.
#[derive(Debug, Clone)]
struct StallAccumulator {
    entry: TraceEntry,
    cycles: u32,
}

#[derive(Debug, Clone)]
enum Session {
    Active {
        pending: Pending,
        stall: Option<StallAccumulator>,
    },
    Errored(CheckError),
}

/// Counts of what a session has processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckerStats {
    /// RTL records accepted, stalls included.
    pub rtl_records: u64,
    /// ISS records accepted, stall sentinels excluded.
    pub iss_records: u64,
    /// ISS stall sentinels skipped.
    pub iss_stalls: u64,
    /// Pairs that compared equal.
    pub matched: u64,
    /// Stall records folded into execute records.
    pub stall_cycles: u64,
}

/// Checks that an RTL trace and an ISS trace describe the same execution.
#[derive(Debug, Clone)]
pub struct TraceChecker {
    session: Session,
    quiescent: bool,
    stats: CheckerStats,
}

impl Default for TraceChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceChecker {
    pub const fn new() -> Self {
        Self {
            session: Session::Active {
                pending: Pending::Idle,
                stall: None,
            },
            quiescent: true,
            stats: CheckerStats {
                rtl_records: 0,
                iss_records: 0,
                iss_stalls: 0,
                matched: 0,
                stall_cycles: 0,
            },
        }
    }

    /// Accept one RTL trace record seen at `cycle`.
    ///
    /// Problems are reported through the latched error, see [`Self::error`].
    pub fn accept_rtl(&mut self, record: &str, cycle: u32) {
        let Session::Active { pending, stall } = &mut self.session else {
            return;
        };

        self.quiescent = false;
        self.stats.rtl_records += 1;
        metrics::record_rtl();

        let entry = TraceEntry::from_rtl_trace(record);
        debug!(cycle, kind = %entry.kind(), identity = %entry.identity(), "RTL trace entry");

        if entry.is_empty() {
            self.latch(CheckError::EmptyRtlHeader {
                entry: Box::new(entry),
                cycle,
            });
            return;
        }

        if entry.is_stall() {
            match stall.take() {
                None => {
                    *stall = Some(StallAccumulator { entry, cycles: 1 });
                }
                Some(acc) if acc.entry.is_compatible(&entry) => {
                    *stall = Some(StallAccumulator {
                        entry: entry.merge_writes_from(&acc.entry),
                        cycles: acc.cycles + 1,
                    });
                }
                Some(acc) => {
                    self.latch(CheckError::StallMismatch {
                        existing: Box::new(acc.entry),
                        new: Box::new(entry),
                        cycle,
                    });
                }
            }
            return;
        }

        if !entry.is_execute() {
            self.latch(CheckError::MalformedRtlHeader {
                entry: Box::new(entry),
                cycle,
            });
            return;
        }

        let (entry, stall_cycles) = match stall.take() {
            None => (entry, 0),
            Some(acc) if acc.entry.is_compatible(&entry) => {
                (entry.merge_writes_from(&acc.entry), acc.cycles)
            }
            Some(acc) => {
                self.latch(CheckError::ExecuteMismatchesStall {
                    stall: Box::new(acc.entry),
                    execute: Box::new(entry),
                    cycle,
                });
                return;
            }
        };
        self.stats.stall_cycles += u64::from(stall_cycles);
        metrics::record_stall_cycles(stall_cycles);

        match std::mem::take(pending) {
            Pending::AwaitingIss(first) => {
                self.latch(CheckError::BackToBackRtl {
                    first: Box::new(first),
                    second: Box::new(entry),
                    cycle,
                });
            }
            Pending::Idle => {
                *pending = Pending::AwaitingIss(entry);
            }
            Pending::AwaitingRtl(iss) => {
                self.match_pair(entry, iss);
            }
        }
    }

    /// Accept the lines the ISS printed for one step.
    ///
    /// A lone `STALL` line is skipped. Returns `false` if the session has
    /// failed, either now or earlier.
    pub fn accept_iss<S: AsRef<str>>(&mut self, lines: &[S]) -> bool {
        let Session::Active { pending, .. } = &mut self.session else {
            return false;
        };

        if is_iss_stall(lines) {
            self.stats.iss_stalls += 1;
            metrics::record_iss_stall();
            return true;
        }

        self.quiescent = false;
        self.stats.iss_records += 1;
        metrics::record_iss();

        let entry = TraceEntry::from_iss_trace(lines);
        debug!(kind = %entry.kind(), identity = %entry.identity(), "ISS trace entry");

        if !(entry.is_stall() || entry.is_execute()) {
            self.latch(CheckError::MalformedIssEntry {
                entry: Box::new(entry),
            });
            return false;
        }

        match std::mem::take(pending) {
            Pending::AwaitingRtl(first) => {
                self.latch(CheckError::BackToBackIss {
                    first: Box::new(first),
                    second: Box::new(entry),
                });
                false
            }
            Pending::Idle => {
                *pending = Pending::AwaitingRtl(entry);
                true
            }
            Pending::AwaitingIss(rtl) => self.match_pair(rtl, entry),
        }
    }

    /// End the session. Every accepted entry must have been matched.
    pub fn finish(&mut self) -> bool {
        self.quiescent = true;
        let Session::Active { pending, .. } = &mut self.session else {
            return false;
        };

        match std::mem::take(pending) {
            Pending::Idle => true,
            Pending::AwaitingRtl(iss) => {
                self.latch(CheckError::StrandedIss { iss: Box::new(iss) });
                false
            }
            Pending::AwaitingIss(rtl) => {
                self.latch(CheckError::StrandedRtl { rtl: Box::new(rtl) });
                false
            }
        }
    }

    /// Whether an error has been latched.
    pub const fn is_errored(&self) -> bool {
        matches!(self.session, Session::Errored(_))
    }

    /// The latched error, if any.
    pub const fn error(&self) -> Option<&CheckError> {
        match &self.session {
            Session::Errored(err) => Some(err),
            Session::Active { .. } => None,
        }
    }

    /// True when no operation is open: nothing accepted yet, or [`Self::finish`]
    /// was the last call. Harnesses check this at shutdown.
    pub const fn is_quiescent(&self) -> bool {
        self.quiescent
    }

    /// Whether a completed RTL entry is waiting for the ISS.
    pub const fn rtl_pending(&self) -> bool {
        matches!(
            self.session,
            Session::Active {
                pending: Pending::AwaitingIss(_),
                ..
            }
        )
    }

    /// Whether an ISS entry is waiting for the RTL.
    pub const fn iss_pending(&self) -> bool {
        matches!(
            self.session,
            Session::Active {
                pending: Pending::AwaitingRtl(_),
                ..
            }
        )
    }

    /// Whether stall records are being accumulated for an instruction.
    pub const fn is_stalling(&self) -> bool {
        matches!(
            self.session,
            Session::Active { stall: Some(_), .. }
        )
    }

    pub const fn stats(&self) -> CheckerStats {
        self.stats
    }

    /// Compare a completed RTL entry with its ISS counterpart. Both have
    /// already been taken out of the pending slot.
    fn match_pair(&mut self, rtl: TraceEntry, iss: TraceEntry) -> bool {
        if rtl == iss {
            self.stats.matched += 1;
            metrics::record_match();
            true
        } else {
            self.latch(CheckError::Mismatch {
                rtl: Box::new(rtl),
                iss: Box::new(iss),
            });
            false
        }
    }

    fn latch(&mut self, err: CheckError) {
        debug_assert!(!self.is_errored(), "error latched twice");
        metrics::record_error(err.class());
        error!(class = %err.class(), "{err}");
        self.session = Session::Errored(err);
    }
}
