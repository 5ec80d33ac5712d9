//! OTBN trace entries.
//!
//! A [`TraceEntry`] captures the architectural effects of one instruction as
//! observed at one point in time: which instruction it belongs to and the
//! writes seen so far. Entries come from two places:
//!
//! - the RTL trace, where a multi-cycle instruction shows up as zero or more
//!   stall (`S`) records followed by one execute (`E`) record;
//! - the ISS trace, which emits exactly one record per instruction.
//!
//! ```
//! use otbn_trace::TraceEntry;
//!
//! let rtl = TraceEntry::from_rtl_trace("E PC: 0x00000004, insn: 0x00000513\n> x10: 0x00000000");
//! let iss = TraceEntry::from_iss_trace(&["E PC: 0x00000004, insn: 0x00000513", "> x10: 0x0"]);
//! assert!(rtl.is_execute());
//! assert_eq!(rtl, iss);
//! ```

mod entry;
mod parse;

pub use entry::{EntryKind, Identity, Location, TraceEntry, Value};
pub use parse::{ISS_STALL, is_iss_stall, split_records};
