#![cfg(feature = "cli")]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

const DATA_INVALID: i32 = 60;
const USAGE: i32 = 64;
const NOT_FOUND: i32 = 66;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "sockfmt-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn sockfmt(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_sockfmt"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("sockfmt should start");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(stdin)
        .expect("stdin should accept input");

    child.wait_with_output().expect("sockfmt should finish")
}

#[test]
fn malformed_text_frame_returns_60() {
    let output = sockfmt(&["decode", "--wire", "text"], b"5:Thello");

    assert_eq!(output.status.code(), Some(DATA_INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing delimiter after type"));
}

#[test]
fn messages_before_a_malformed_frame_are_printed() {
    let output = sockfmt(
        &["--format", "json", "decode", "--wire", "text"],
        b"2:T:hi;5:Thello",
    );

    assert_eq!(output.status.code(), Some(DATA_INVALID));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);
    let first: serde_json::Value = serde_json::from_str(lines[0]).expect("json line");
    assert_eq!(first["payload"], "hi");
}

#[test]
fn sse_comments_pass_under_a_small_cap() {
    let output = sockfmt(
        &["--format", "raw", "decode", "--wire", "sse", "--max-message-size", "1"],
        b": keep-alive\r\ndata: T\r\ndata: a\r\n\r\n",
    );

    assert!(output.status.success());
    assert_eq!(output.stdout, b"a");
}

#[test]
fn truncated_binary_frame_returns_60() {
    let output = sockfmt(&["decode", "--wire", "binary"], &[0, 0, 0, 0, 0, 0, 0, 9, 0, b'x']);

    assert_eq!(output.status.code(), Some(DATA_INVALID));
}

#[test]
fn oversized_frame_respects_max_message_size() {
    let output = sockfmt(
        &["decode", "--wire", "text", "--max-message-size", "4"],
        b"5:T:hello;",
    );

    assert_eq!(output.status.code(), Some(DATA_INVALID));
}

#[test]
fn bare_newline_in_sse_returns_60() {
    let output = sockfmt(&["decode", "--wire", "sse"], b"data: T\n");

    assert_eq!(output.status.code(), Some(DATA_INVALID));
}

#[test]
fn unknown_indicator_returns_60() {
    let output = sockfmt(&["negotiate", "--indicator", "X"], b"");

    assert_eq!(output.status.code(), Some(DATA_INVALID));
}

#[test]
fn unknown_wire_format_is_a_usage_error() {
    let output = sockfmt(&["decode", "--wire", "morse"], b"");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn zero_max_message_size_returns_64() {
    let output = sockfmt(&["decode", "--max-message-size", "0"], b"");

    assert_eq!(output.status.code(), Some(USAGE));
}

#[test]
fn missing_input_file_returns_66() {
    let dir = unique_temp_dir("missing");
    let missing = dir.join("frames.bin");

    let output = sockfmt(&["decode", missing.to_str().expect("utf-8 path")], b"");

    assert_eq!(output.status.code(), Some(NOT_FOUND));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn encode_to_file_then_decode_file() {
    let dir = unique_temp_dir("file");
    let path = dir.join("frames.txt");
    let path_str = path.to_str().expect("utf-8 path");

    let encoded = sockfmt(
        &["encode", "--wire", "text", "--data", "persisted", "--output", path_str],
        b"",
    );
    assert!(encoded.status.success());
    assert!(encoded.stdout.is_empty());
    assert_eq!(
        std::fs::read(&path).expect("frame file should exist"),
        b"9:T:persisted;"
    );

    let decoded = sockfmt(&["--format", "raw", "decode", "--wire", "text", path_str], b"");
    assert!(decoded.status.success());
    assert_eq!(decoded.stdout, b"persisted");

    let _ = std::fs::remove_dir_all(&dir);
}
