use std::path::Path;

use otbn_cosim::{EntryKind, TraceEntry};
use otbn_trace::{ISS_STALL, is_iss_stall, split_records};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS, SideArg};
use crate::terminal;

/// Print every record of a trace file as the checker sees it.
pub fn cmd_dump(path: &Path, side: SideArg) -> i32 {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            terminal::error(&format!("failed to read {}: {e}", path.display()));
            return EXIT_FAILURE;
        }
    };

    let mut invalid = 0usize;
    for (index, lines) in split_records(&text).iter().enumerate() {
        if matches!(side, SideArg::Iss) && is_iss_stall(lines) {
            println!("[{index}] {ISS_STALL}");
            continue;
        }

        let entry = match side {
            SideArg::Rtl => TraceEntry::from_rtl_trace(&lines.join("\n")),
            SideArg::Iss => TraceEntry::from_iss_trace(lines),
        };
        if entry.kind() == EntryKind::Invalid {
            invalid += 1;
        }
        let identity = entry.identity();
        match (identity.pc(), identity.insn()) {
            (Some(pc), Some(insn)) => {
                println!("[{index}] {} pc={pc:#010x} insn={insn:#010x}", entry.kind());
            }
            _ => println!("[{index}] {}", entry.kind()),
        }
        print!("{}", entry.render("    "));
    }

    if invalid > 0 {
        terminal::error(&format!("{invalid} invalid records"));
        return EXIT_FAILURE;
    }
    EXIT_SUCCESS
}
