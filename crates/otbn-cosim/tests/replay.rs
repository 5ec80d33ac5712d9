//! End-to-end replay of trace files written to disk.

use std::fs;
use std::path::PathBuf;

use otbn_cosim::{CheckError, ErrorClass, Replay, ReplayConfig, ReplayError};

/// A short program: `addi x1, x0, 1`, a two-cycle `bn.add`, then a store.
const RTL_TRACE: &str = "\
E PC: 0x00000000, insn: 0x00100093
< x0: 0x00000000
> x1: 0x00000001

S PC: 0x00000004, insn: 0x0020818b
< w2: 0x00000000_00000000_00000000_00000002
S PC: 0x00000004, insn: 0x0020818b
> FLAGS0: 0x0
E PC: 0x00000004, insn: 0x0020818b
> w3: 0x00000000_00000000_00000000_00000003

E PC: 0x00000008, insn: 0x00112023
> dmem[0x00000000]: 0x00000001
";

const ISS_TRACE: &str = "\
E PC: 0x00000000, insn: 0x00100093
> x1: 0x1
STALL
STALL
E PC: 0x00000004, insn: 0x0020818b
> FLAGS0: 0x0
> w3: 0x3
E PC: 0x00000008, insn: 0x00112023
> dmem[0x00000000]: 0x1
";

fn write_traces(dir: &tempfile::TempDir, rtl: &str, iss: &str) -> (PathBuf, PathBuf) {
    let rtl_path = dir.path().join("rtl.log");
    let iss_path = dir.path().join("iss.log");
    fs::write(&rtl_path, rtl).expect("failed to write RTL trace");
    fs::write(&iss_path, iss).expect("failed to write ISS trace");
    (rtl_path, iss_path)
}

#[test]
fn test_matching_traces_pass() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let (rtl, iss) = write_traces(&dir, RTL_TRACE, ISS_TRACE);

    let replay = Replay::load(&rtl, &iss).expect("failed to load traces");
    assert_eq!(replay.rtl_records().len(), 5);
    assert_eq!(replay.iss_records().len(), 5);

    let outcome = replay.check(&ReplayConfig::default());
    assert!(outcome.passed, "unexpected failure: {:?}", outcome.error);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.cycles, 5);
}

#[test]
fn test_store_value_mismatch_fails() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let iss = ISS_TRACE.replace("> dmem[0x00000000]: 0x1", "> dmem[0x00000000]: 0x2");
    let (rtl, iss) = write_traces(&dir, RTL_TRACE, &iss);

    let outcome = Replay::load(&rtl, &iss)
        .expect("failed to load traces")
        .check(&ReplayConfig::default());
    assert!(!outcome.passed);
    let err = outcome.error.expect("mismatch should be reported");
    assert_eq!(err.class(), ErrorClass::Mismatch);
    assert!(err.to_string().contains("dmem[0x00000000]"));
}

#[test]
fn test_write_only_seen_during_stall_must_reach_iss() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let iss = ISS_TRACE.replace("> FLAGS0: 0x0\n", "");
    let (rtl, iss) = write_traces(&dir, RTL_TRACE, &iss);

    let outcome = Replay::load(&rtl, &iss)
        .expect("failed to load traces")
        .check(&ReplayConfig::default());
    assert!(matches!(outcome.error, Some(CheckError::Mismatch { .. })));
    assert_eq!(outcome.cycles, 4);
}

#[test]
fn test_missing_iss_instruction_is_protocol_error() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let iss = ISS_TRACE.replace(
        "E PC: 0x00000008, insn: 0x00112023\n> dmem[0x00000000]: 0x1\n",
        "",
    );
    let (rtl, iss) = write_traces(&dir, RTL_TRACE, &iss);

    let outcome = Replay::load(&rtl, &iss)
        .expect("failed to load traces")
        .check(&ReplayConfig::default());
    assert!(!outcome.passed);
    let err = outcome.error.expect("stranded entry should be reported");
    assert!(matches!(err, CheckError::StrandedRtl { .. }));
    assert_eq!(err.class(), ErrorClass::Protocol);
}

#[test]
fn test_missing_file_is_reported() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let missing = dir.path().join("missing.log");
    let (_, iss) = write_traces(&dir, RTL_TRACE, ISS_TRACE);

    match Replay::load(&missing, &iss) {
        Err(ReplayError::Read { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected read error, got {other:?}"),
    }
}

#[test]
fn test_empty_file_is_reported() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let (rtl, iss) = write_traces(&dir, RTL_TRACE, "\n\n");

    match Replay::load(&rtl, &iss) {
        Err(ReplayError::NoRecords { path }) => assert_eq!(path, iss),
        other => panic!("expected no-records error, got {other:?}"),
    }
}
