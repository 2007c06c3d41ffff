#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use linkytic::frame::{encode_dataset, encode_frame, TicMode};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/linkytic-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn standard_frame(power: &str, current: &str, voltage: &str) -> Vec<u8> {
    encode_frame([
        encode_dataset("SINSTS", None, power, TicMode::Standard).unwrap(),
        encode_dataset("IRMS1", None, current, TicMode::Standard).unwrap(),
        encode_dataset("URMS1", None, voltage, TicMode::Standard).unwrap(),
        encode_dataset("SMAXSN", Some("E240315143000"), "05120", TicMode::Standard).unwrap(),
    ])
}

fn write_capture(dir: &Path) -> PathBuf {
    let mut bytes = b"\x11line noise".to_vec();
    bytes.extend(standard_frame("02300", "010", "230"));
    bytes.extend(standard_frame("01150", "005", "230"));
    // Corrupt one checksum in the third frame.
    let mut third = standard_frame("00000", "003", "230");
    let cr = third.iter().position(|&b| b == b'\r').expect("frame has a dataset");
    third[cr - 1] ^= 0x01;
    bytes.extend(third);

    let path = dir.join("capture.tic");
    std::fs::write(&path, bytes).expect("capture should be writable");
    path
}

fn linkytic(args: &[&str], capture: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_linkytic"))
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .arg(capture)
        .args(["--replay", "--mode", "standard"])
        .output()
        .expect("linkytic should run")
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is a JSON object"))
        .collect()
}

#[test]
fn decode_replay_prints_one_json_line_per_frame() {
    let dir = unique_temp_dir("decode");
    let capture = write_capture(&dir);

    let output = linkytic(&["decode"], &capture);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let frames = json_lines(&output);
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0]["index"], 1);
    assert_eq!(frames[0]["mode"], "standard");
    assert_eq!(frames[0]["readings"]["SINSTS"], "02300");
    assert_eq!(frames[0]["readings"]["SMAXSN"]["date"], "E240315143000");
    assert_eq!(frames[0]["rejected"], 0);

    assert!(frames[2]["readings"].get("SINSTS").is_none());
    assert_eq!(frames[2]["readings"]["URMS1"], "230");
    assert_eq!(frames[2]["rejected"], 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_count_stops_early() {
    let dir = unique_temp_dir("count");
    let capture = write_capture(&dir);

    let output = linkytic(&["decode", "--count", "1"], &capture);
    assert!(output.status.success());
    assert_eq!(json_lines(&output).len(), 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn monitor_replay_renders_last_display_frame() {
    let dir = unique_temp_dir("monitor");
    let capture = write_capture(&dir);

    let output = linkytic(&["monitor", "--width", "6", "--history", "3"], &capture);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let displays = json_lines(&output);
    let last = displays.last().expect("at least the final frame is rendered");
    assert_eq!(last["read_error"], true);
    assert_eq!(last["displayed_power"], 1150);
    assert_eq!(last["bars_max"], 2300);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_capture_exits_66() {
    let dir = unique_temp_dir("missing");
    let output = linkytic(&["decode"], &dir.join("nope.tic"));
    assert_eq!(output.status.code(), Some(66));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to open"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_config_exits_78() {
    let dir = unique_temp_dir("config");
    let capture = write_capture(&dir);
    let config = dir.join("linkytic.toml");
    std::fs::write(&config, "[display]\nwidth = 0\n").expect("config should be writable");

    let output = Command::new(env!("CARGO_BIN_EXE_linkytic"))
        .arg("--config")
        .arg(&config)
        .arg("decode")
        .arg(&capture)
        .arg("--replay")
        .output()
        .expect("linkytic should run");
    assert_eq!(output.status.code(), Some(78));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_linkytic"))
        .arg("version")
        .output()
        .expect("version should run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("linkytic {}", env!("CARGO_PKG_VERSION"))
    );
}
