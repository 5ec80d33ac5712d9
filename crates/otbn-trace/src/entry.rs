use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// What a trace record says about its instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// The instruction is still executing; writes seen so far.
    Stall,
    /// Final record for the instruction; all of its effects are known.
    Execute,
    /// Header was empty or not recognised.
    Invalid,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stall => write!(f, "stall"),
            Self::Execute => write!(f, "execute"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// Which instruction a record belongs to.
///
/// This is the header text after the kind token, e.g.
/// `PC: 0x00000010, insn: 0x00000513`. Repeated observations of the same
/// instruction (stall cycles, the execute cycle, the ISS record) carry the
/// same identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Program counter, if the identity follows the `PC: 0x...` layout.
    pub fn pc(&self) -> Option<u32> {
        let pattern = PC_PATTERN.get_or_init(|| Regex::new(r"PC:\s*0x([0-9a-fA-F]+)").unwrap());
        let caps = pattern.captures(&self.0)?;
        u32::from_str_radix(caps.get(1)?.as_str(), 16).ok()
    }

    /// Instruction word, if the identity follows the `insn: 0x...` layout.
    pub fn insn(&self) -> Option<u32> {
        let pattern =
            INSN_PATTERN.get_or_init(|| Regex::new(r"insn:\s*0x([0-9a-fA-F]+)").unwrap());
        let caps = pattern.captures(&self.0)?;
        u32::from_str_radix(caps.get(1)?.as_str(), 16).ok()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Destination of a write.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Location {
    /// General purpose register `x<n>`.
    Gpr(u8),
    /// Wide data register `w<n>`.
    Wdr(u8),
    /// Data memory word at a byte address.
    Dmem(u32),
    /// Anything else: CSRs, WSRs, flag groups.
    Special(String),
}

impl Location {
    /// Parse a location as written in a trace line.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let reg_pattern = REG_PATTERN.get_or_init(|| Regex::new(r"^([xw])(\d+)$").unwrap());
        if let Some(caps) = reg_pattern.captures(text) {
            if let Ok(index) = caps[2].parse::<u8>() {
                return if &caps[1] == "x" {
                    Self::Gpr(index)
                } else {
                    Self::Wdr(index)
                };
            }
        }

        let dmem_pattern = DMEM_PATTERN
            .get_or_init(|| Regex::new(r"^dmem\[0x([0-9a-fA-F_]+)\]$").unwrap());
        if let Some(caps) = dmem_pattern.captures(text) {
            let digits = caps[1].replace('_', "");
            if let Ok(addr) = u32::from_str_radix(&digits, 16) {
                return Self::Dmem(addr);
            }
        }

        Self::Special(text.to_string())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpr(index) => write!(f, "x{index}"),
            Self::Wdr(index) => write!(f, "w{index}"),
            Self::Dmem(addr) => write!(f, "dmem[0x{addr:08x}]"),
            Self::Special(name) => f.write_str(name),
        }
    }
}

/// A written value.
///
/// Hex values are normalised (lowercase, no `_` separators, no leading
/// zeros) so that the RTL and ISS spellings of the same number compare equal.
/// Anything that is not a hex literal is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Value(String);

impl Value {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .map(|rest| rest.replace('_', ""));

        match digits {
            Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()) => {
                let trimmed = digits.trim_start_matches('0').to_ascii_lowercase();
                if trimmed.is_empty() {
                    Self("0x0".to_string())
                } else {
                    Self(format!("0x{trimmed}"))
                }
            }
            _ => Self(text.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Observed effects of one instruction at one point in time.
///
/// Equality is structural and ignores the kind: an RTL execute record and an
/// ISS record are equal when they name the same instruction and report the
/// same writes. Every write is kept, so a location written twice only
/// matches an entry that also wrote it twice with the same values.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    pub(crate) kind: EntryKind,
    pub(crate) header: String,
    pub(crate) identity: Identity,
    /// Values per location, sorted.
    pub(crate) writes: BTreeMap<Location, Vec<Value>>,
}

impl TraceEntry {
    /// The designated empty entry: no header, no writes.
    pub const fn empty() -> Self {
        Self {
            kind: EntryKind::Invalid,
            header: String::new(),
            identity: Identity(String::new()),
            writes: BTreeMap::new(),
        }
    }

    pub const fn kind(&self) -> EntryKind {
        self.kind
    }

    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    pub const fn writes(&self) -> &BTreeMap<Location, Vec<Value>> {
        &self.writes
    }

    /// Values written to `location`, in sorted order.
    pub fn values_at(&self, location: &Location) -> &[Value] {
        self.writes.get(location).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total number of writes, counting repeats to the same location.
    pub fn write_count(&self) -> usize {
        self.writes.values().map(Vec::len).sum()
    }

    pub(crate) fn add_write(&mut self, location: Location, value: Value) {
        let values = self.writes.entry(location).or_default();
        let at = values.partition_point(|v| *v <= value);
        values.insert(at, value);
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    pub fn is_stall(&self) -> bool {
        self.kind == EntryKind::Stall
    }

    pub fn is_execute(&self) -> bool {
        self.kind == EntryKind::Execute
    }

    /// Whether both entries describe the same instruction and may be merged.
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.identity == other.identity
    }

    /// Build a new entry from this one with `other`'s writes folded in.
    ///
    /// The result keeps this entry's kind, header and identity and carries
    /// the writes of both. A location written by both entries keeps both
    /// values.
    #[must_use]
    pub fn merge_writes_from(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (location, values) in &other.writes {
            for value in values {
                merged.add_write(location.clone(), value.clone());
            }
        }
        merged
    }

    /// Render the entry for diagnostics, one line per item, each prefixed by
    /// `indent`.
    pub fn render(&self, indent: &str) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        if self.header.is_empty() {
            let _ = writeln!(out, "{indent}(empty header)");
        } else {
            let _ = writeln!(out, "{indent}{}", self.header);
        }
        for (location, values) in &self.writes {
            for value in values {
                let _ = writeln!(out, "{indent}> {location}: {value}");
            }
        }
        out
    }
}

impl Default for TraceEntry {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for TraceEntry {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity && self.writes == other.writes
    }
}

impl Eq for TraceEntry {}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.render("").trim_end())
    }
}

static PC_PATTERN: OnceLock<Regex> = OnceLock::new();
static INSN_PATTERN: OnceLock<Regex> = OnceLock::new();
static REG_PATTERN: OnceLock<Regex> = OnceLock::new();
static DMEM_PATTERN: OnceLock<Regex> = OnceLock::new();

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str) -> TraceEntry {
        TraceEntry::from_rtl_trace(text)
    }

    #[test]
    fn test_location_parse() {
        assert_eq!(Location::parse("x5"), Location::Gpr(5));
        assert_eq!(Location::parse(" w31 "), Location::Wdr(31));
        assert_eq!(Location::parse("dmem[0x00000010]"), Location::Dmem(0x10));
        assert_eq!(
            Location::parse("FLAGS0"),
            Location::Special("FLAGS0".to_string())
        );
        // Out of range register index falls back to a named location.
        assert_eq!(
            Location::parse("x300"),
            Location::Special("x300".to_string())
        );
    }

    #[test]
    fn test_location_display() {
        assert_eq!(Location::Gpr(1).to_string(), "x1");
        assert_eq!(Location::Dmem(0x20).to_string(), "dmem[0x00000020]");
    }

    #[test]
    fn test_value_normalisation() {
        assert_eq!(Value::parse("0x0000_0001"), Value::parse("0x1"));
        assert_eq!(Value::parse("0xDEADbeef").as_str(), "0xdeadbeef");
        assert_eq!(Value::parse("0x0000").as_str(), "0x0");
        assert_eq!(Value::parse("garbage").as_str(), "garbage");
        assert_ne!(Value::parse("0x1"), Value::parse("0x2"));
    }

    #[test]
    fn test_identity_fields() {
        let id = Identity::new("PC: 0x00000010, insn: 0x00000513");
        assert_eq!(id.pc(), Some(0x10));
        assert_eq!(id.insn(), Some(0x513));
        assert_eq!(Identity::new("opaque").pc(), None);
    }

    #[test]
    fn test_equality_ignores_kind() {
        let stall = entry("S PC: 0x00000004, insn: 0x00000001\n> x1: 0x5");
        let exec = entry("E PC: 0x00000004, insn: 0x00000001\n> x1: 0x5");
        assert_eq!(stall, exec);
    }

    #[test]
    fn test_equality_compares_writes() {
        let a = entry("E PC: 0x00000004, insn: 0x00000001\n> x1: 0x5");
        let b = entry("E PC: 0x00000004, insn: 0x00000001\n> x1: 0x6");
        let c = entry("E PC: 0x00000004, insn: 0x00000001");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_compatibility() {
        let a = entry("S PC: 0x00000004, insn: 0x00000001");
        let b = entry("E PC: 0x00000004, insn: 0x00000001\n> x2: 0x1");
        let c = entry("E PC: 0x00000008, insn: 0x00000001");
        assert!(a.is_compatible(&b));
        assert!(!a.is_compatible(&c));
    }

    #[test]
    fn test_merge_writes_from() {
        let older = entry("S PC: 0x00000004, insn: 0x00000001\n> x1: 0x1\n> x2: 0x2");
        let newer = entry("E PC: 0x00000004, insn: 0x00000001\n> x2: 0x3");

        let merged = newer.merge_writes_from(&older);
        assert!(merged.is_execute());
        assert_eq!(merged.write_count(), 3);
        assert_eq!(merged.values_at(&Location::Gpr(1)), [Value::parse("0x1")]);
        // Both writes to x2 are kept.
        assert_eq!(
            merged.values_at(&Location::Gpr(2)),
            [Value::parse("0x2"), Value::parse("0x3")]
        );

        // Inputs are untouched.
        assert_eq!(newer.write_count(), 1);
        assert_eq!(older.write_count(), 2);
    }

    #[test]
    fn test_repeated_write_is_not_masked() {
        let twice = entry("E PC: 0x00000004, insn: 0x00000001\n> x2: 0xbad\n> x2: 0x5");
        let once = entry("E PC: 0x00000004, insn: 0x00000001\n> x2: 0x5");
        assert_eq!(twice.values_at(&Location::Gpr(2)).len(), 2);
        assert_ne!(twice, once);

        let stall = entry("S PC: 0x00000004, insn: 0x00000001\n> x2: 0xbad");
        assert_ne!(once.merge_writes_from(&stall), once);
    }

    #[test]
    fn test_write_order_does_not_matter() {
        let a = entry("E PC: 0x00000004, insn: 0x00000001\n> x2: 0x1\n> x2: 0x2");
        let b = entry("E PC: 0x00000004, insn: 0x00000001\n> x2: 0x2\n> x2: 0x1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_render() {
        let e = entry("E PC: 0x00000004, insn: 0x00000001\n> x1: 0x00000001");
        assert_eq!(
            e.render("  "),
            "  E PC: 0x00000004, insn: 0x00000001\n  > x1: 0x1\n"
        );
        assert_eq!(TraceEntry::empty().render(""), "(empty header)\n");
    }
}
