//! Checker and replay error types.

use std::path::PathBuf;

use otbn_trace::TraceEntry;
use thiserror::Error;

/// Broad category of a checker failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// A record could not be classified as stall or execute.
    Malformed,
    /// Stall and execute records for one instruction disagree on its identity.
    IncompatibleCoalescing,
    /// Entries arrived out of order, or a session ended with one unmatched.
    Protocol,
    /// RTL and ISS disagree about what an instruction did.
    Mismatch,
}

impl ErrorClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::IncompatibleCoalescing => "incompatible_coalescing",
            Self::Protocol => "protocol",
            Self::Mismatch => "mismatch",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error that latched a checking session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("invalid RTL trace entry with empty header (cycle {cycle}):\n{}", .entry.render("  "))]
    EmptyRtlHeader { entry: Box<TraceEntry>, cycle: u32 },

    #[error("invalid RTL trace entry, neither S nor E (cycle {cycle}):\n{}", .entry.render("  "))]
    MalformedRtlHeader { entry: Box<TraceEntry>, cycle: u32 },

    #[error("invalid ISS trace entry, neither S nor E:\n{}", .entry.render("  "))]
    MalformedIssEntry { entry: Box<TraceEntry> },

    #[error(
        "stall trace entry followed by mis-matching stall (cycle {cycle}).\n  Existing stall entry was:\n{}  New stall entry was:\n{}",
        .existing.render("    "),
        .new.render("    ")
    )]
    StallMismatch {
        existing: Box<TraceEntry>,
        new: Box<TraceEntry>,
        cycle: u32,
    },

    #[error(
        "execution trace entry doesn't match stall (cycle {cycle}).\n  Stall entry was:\n{}  Execution entry was:\n{}",
        .stall.render("    "),
        .execute.render("    ")
    )]
    ExecuteMismatchesStall {
        stall: Box<TraceEntry>,
        execute: Box<TraceEntry>,
        cycle: u32,
    },

    #[error(
        "two back-to-back RTL trace entries with no ISS entry (cycle {cycle}).\n  First RTL entry was:\n{}  Second RTL entry was:\n{}",
        .first.render("    "),
        .second.render("    ")
    )]
    BackToBackRtl {
        first: Box<TraceEntry>,
        second: Box<TraceEntry>,
        cycle: u32,
    },

    #[error(
        "two back-to-back ISS trace entries with no RTL entry.\n  First ISS entry was:\n{}  Second ISS entry was:\n{}",
        .first.render("    "),
        .second.render("    ")
    )]
    BackToBackIss {
        first: Box<TraceEntry>,
        second: Box<TraceEntry>,
    },

    #[error(
        "got to end of RTL operation, but there is no RTL trace entry to match the pending ISS one:\n{}",
        .iss.render("    ")
    )]
    StrandedIss { iss: Box<TraceEntry> },

    #[error(
        "got to end of ISS operation, but there is no ISS trace entry to match the pending RTL one:\n{}",
        .rtl.render("    ")
    )]
    StrandedRtl { rtl: Box<TraceEntry> },

    #[error(
        "mismatch between RTL and ISS trace entries.\n  RTL entry is:\n{}  ISS entry is:\n{}",
        .rtl.render("    "),
        .iss.render("    ")
    )]
    Mismatch {
        rtl: Box<TraceEntry>,
        iss: Box<TraceEntry>,
    },
}

impl CheckError {
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::EmptyRtlHeader { .. }
            | Self::MalformedRtlHeader { .. }
            | Self::MalformedIssEntry { .. } => ErrorClass::Malformed,
            Self::StallMismatch { .. } | Self::ExecuteMismatchesStall { .. } => {
                ErrorClass::IncompatibleCoalescing
            }
            Self::BackToBackRtl { .. }
            | Self::BackToBackIss { .. }
            | Self::StrandedIss { .. }
            | Self::StrandedRtl { .. } => ErrorClass::Protocol,
            Self::Mismatch { .. } => ErrorClass::Mismatch,
        }
    }
}

/// Errors loading traces for a replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read trace file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("trace file {} contains no records", .path.display())]
    NoRecords { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, ReplayError>;
