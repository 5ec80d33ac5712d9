//! OTBN co-simulation trace checking.
//!
//! Verifies, instruction by instruction, that the RTL trace of the design
//! under test and the trace of the reference ISS describe the same
//! architectural effects.
//!
//! # Example
//!
//! ```
//! use otbn_cosim::TraceChecker;
//!
//! let mut checker = TraceChecker::new();
//! checker.accept_rtl("S PC: 0x00000008, insn: 0x0000100b\n> w1: 0x5", 10);
//! checker.accept_rtl("E PC: 0x00000008, insn: 0x0000100b", 11);
//! assert!(checker.accept_iss(&["E PC: 0x00000008, insn: 0x0000100b", "> w1: 0x5"]));
//! assert!(checker.finish());
//! ```

pub mod checker;
pub mod error;
pub mod metrics;
pub mod replay;
pub mod source;

pub use checker::{CheckerStats, TraceChecker};
pub use error::{CheckError, ErrorClass, ReplayError, Result};
pub use replay::{Replay, ReplayConfig, ReplayOutcome};
pub use source::{ListenerId, TraceListener, TraceSource};

pub use otbn_trace::{EntryKind, Identity, Location, TraceEntry, Value};
