use tracing::trace;

use crate::entry::{EntryKind, Identity, Location, TraceEntry, Value};

/// ISS output for a cycle in which no instruction completed.
pub const ISS_STALL: &str = "STALL";

impl TraceEntry {
    /// Parse one RTL trace record.
    ///
    /// The first line is the header (`S <identity>` for a stall cycle,
    /// `E <identity>` for the final cycle of an instruction). Following lines
    /// of the form `> <location>: <value>` are writes; `<` lines are reads and
    /// carry nothing to compare.
    ///
    /// Never fails: an empty header gives [`TraceEntry::empty`], an
    /// unrecognised one gives an entry of kind [`EntryKind::Invalid`].
    pub fn from_rtl_trace(record: &str) -> Self {
        Self::from_lines(record.lines())
    }

    /// Parse the lines the ISS printed for one instruction.
    ///
    /// Uses the same grammar as the RTL trace so the two can be compared.
    /// Callers filter the [`ISS_STALL`] sentinel before getting here.
    pub fn from_iss_trace<S: AsRef<str>>(lines: &[S]) -> Self {
        Self::from_lines(lines.iter().map(AsRef::as_ref))
    }

    fn from_lines<'a>(mut lines: impl Iterator<Item = &'a str>) -> Self {
        let header = lines.next().map(str::trim_end).unwrap_or_default();
        if header.trim().is_empty() {
            return Self::empty();
        }

        let (kind, identity) = parse_header(header);
        let mut entry = Self {
            kind,
            header: header.to_string(),
            identity,
            ..Self::empty()
        };
        for line in lines {
            if let Some((location, value)) = parse_write(line) {
                entry.add_write(location, value);
            } else {
                trace!(line, "skipping non-write trace line");
            }
        }
        entry
    }
}

/// Returns true if `lines` is exactly the ISS stall sentinel.
pub fn is_iss_stall<S: AsRef<str>>(lines: &[S]) -> bool {
    matches!(lines, [only] if only.as_ref() == ISS_STALL)
}

/// Split the text of a trace file into records.
///
/// A record starts at every non-blank line that does not begin with `<` or
/// `>`; the `<`/`>` lines after it belong to it. Blank lines are skipped.
/// `>`/`<` lines before the first header are dropped.
pub fn split_records(text: &str) -> Vec<Vec<String>> {
    let mut records: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        let trimmed = line.trim_start();
        if trimmed.starts_with('<') || trimmed.starts_with('>') {
            if let Some(current) = records.last_mut() {
                current.push(trimmed.to_string());
            } else {
                trace!(line, "dropping detail line with no header");
            }
        } else {
            records.push(vec![trimmed.to_string()]);
        }
    }

    records
}

fn parse_header(header: &str) -> (EntryKind, Identity) {
    let header = header.trim();
    let (token, rest) = header
        .split_once(char::is_whitespace)
        .unwrap_or((header, ""));

    let kind = match token {
        "S" => EntryKind::Stall,
        "E" => EntryKind::Execute,
        _ => EntryKind::Invalid,
    };
    (kind, Identity::new(rest.trim()))
}

fn parse_write(line: &str) -> Option<(Location, Value)> {
    let body = line.trim_start().strip_prefix('>')?.trim();
    Some(match body.split_once(':') {
        Some((location, value)) => (Location::parse(location), Value::parse(value)),
        None => (Location::Special(body.to_string()), Value::default()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_execute() {
        let entry = TraceEntry::from_rtl_trace(
            "E PC: 0x00000010, insn: 0x00000513\n< x0: 0x00000000\n> x10: 0x00000000",
        );
        assert!(entry.is_execute());
        assert_eq!(entry.identity().pc(), Some(0x10));
        assert_eq!(entry.write_count(), 1);
        assert_eq!(entry.values_at(&Location::Gpr(10)), [Value::parse("0x0")]);
    }

    #[test]
    fn test_parse_stall() {
        let entry = TraceEntry::from_rtl_trace("S PC: 0x00000010, insn: 0x00000513");
        assert!(entry.is_stall());
        assert!(entry.writes().is_empty());
    }

    #[test]
    fn test_parse_empty_header() {
        let entry = TraceEntry::from_rtl_trace("");
        assert!(entry.is_empty());
        assert_eq!(entry.kind(), EntryKind::Invalid);

        let entry = TraceEntry::from_rtl_trace("   \n> x1: 0x1");
        assert!(entry.is_empty());
    }

    #[test]
    fn test_parse_unknown_header() {
        let entry = TraceEntry::from_rtl_trace("X PC: 0x00000010, insn: 0x00000513");
        assert!(!entry.is_empty());
        assert_eq!(entry.kind(), EntryKind::Invalid);

        // The kind is a whole token, not just a leading character.
        let entry = TraceEntry::from_rtl_trace("STALL");
        assert_eq!(entry.kind(), EntryKind::Invalid);
        let entry = TraceEntry::from_rtl_trace("SX PC: 0x00000010, insn: 0x00000513");
        assert_eq!(entry.kind(), EntryKind::Invalid);
    }

    #[test]
    fn test_parse_write_without_separator() {
        let entry = TraceEntry::from_rtl_trace("E PC: 0x0, insn: 0x0\n> mystery");
        assert_eq!(
            entry.values_at(&Location::Special("mystery".to_string())),
            [Value::default()]
        );
    }

    #[test]
    fn test_parse_wide_register_write() {
        let entry = TraceEntry::from_rtl_trace(
            "E PC: 0x00000020, insn: 0x0000100b\n> w3: 0x00000000_00000000_00000000_0000002a",
        );
        assert_eq!(entry.values_at(&Location::Wdr(3)), [Value::parse("0x2a")]);
    }

    #[test]
    fn test_parse_iss_matches_rtl() {
        let rtl = TraceEntry::from_rtl_trace("E PC: 0x00000004, insn: 0x00100093\n> x1: 0x00000001");
        let iss = TraceEntry::from_iss_trace(&["E PC: 0x00000004, insn: 0x00100093", "> x1: 0x1"]);
        assert_eq!(rtl, iss);
    }

    #[test]
    fn test_is_iss_stall() {
        assert!(is_iss_stall(&["STALL"]));
        assert!(!is_iss_stall(&["STALL", "> x1: 0x1"]));
        assert!(!is_iss_stall(&["E PC: 0x0, insn: 0x0"]));
        assert!(!is_iss_stall::<&str>(&[]));
        // The sentinel is literal; padded text is a malformed record.
        assert!(!is_iss_stall(&[" STALL "]));
        assert!(!is_iss_stall(&["STALL "]));
    }

    #[test]
    fn test_split_records() {
        let text = "\
E PC: 0x00000000, insn: 0x00000013
S PC: 0x00000004, insn: 0x0000100b
> w1: 0x1

E PC: 0x00000004, insn: 0x0000100b
< x2: 0x0
> w1: 0x2
STALL
";
        let records = split_records(text);
        assert_eq!(records.len(), 4);
        assert_eq!(records[0], vec!["E PC: 0x00000000, insn: 0x00000013"]);
        assert_eq!(records[1].len(), 2);
        assert_eq!(records[2].len(), 3);
        assert_eq!(records[3], vec!["STALL"]);
    }

    #[test]
    fn test_split_records_drops_orphan_details() {
        let records = split_records("> x1: 0x1\nE PC: 0x0, insn: 0x0\n");
        assert_eq!(records, vec![vec!["E PC: 0x0, insn: 0x0".to_string()]]);
    }
}
