// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

// NOP; CBNZ X0, -4; RET
const LOOP: [u32; 3] = [0xD503_201F, 0xB5FF_FFE0, 0xD65F_03C0];

fn write_temp_file(prefix: &str, ext: &str, contents: &[u8]) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push("armature-tests");
    let _ = std::fs::create_dir_all(&dir);

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = dir.join(format!("{}-{}.{}", prefix, nonce, ext));
    std::fs::write(&path, contents).expect("Failed to write temp file");
    path
}

fn raw_image(words: &[u32]) -> PathBuf {
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    write_temp_file("image", "bin", &bytes)
}

fn armature(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_armature"))
        .args(args)
        .output()
        .expect("Failed to execute armature")
}

#[test]
fn test_decode_raw_function_json() {
    let image = raw_image(&LOOP);
    let output = armature(&[
        "decode",
        "--image",
        image.to_str().unwrap(),
        "--raw-base",
        "0x1000",
        "--mode",
        "a64",
        "--json",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON");
    let report = &json[0];
    assert_eq!(report["entry"], 0x1000);
    assert_eq!(report["mode"], "aarch64");
    assert_eq!(report["strategy"], "function");
    assert_eq!(report["blocks"].as_array().unwrap().len(), 2);
    assert_eq!(report["blocks"][0]["branch"], 0x1000);
    assert_eq!(report["blocks"][1]["instructions"][0]["name"], "Ret");
}

#[test]
fn test_decode_raw_block_text() {
    let image = raw_image(&LOOP);
    let output = armature(&[
        "decode",
        "-i",
        image.to_str().unwrap(),
        "--raw-base",
        "0x1000",
        "-m",
        "aarch64",
        "--block",
        "--stats",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("0x1000 (a64, Block)"), "{}", stdout);
    assert!(stdout.contains("block 0x1000..0x1008 branch=0x1000"), "{}", stdout);
    assert!(!stdout.contains("Ret"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Total Instructions: 2"), "{}", stderr);
}

#[test]
fn test_raw_image_without_mode_is_config_error() {
    let image = raw_image(&LOOP);
    let output = armature(&[
        "decode",
        "--image",
        image.to_str().unwrap(),
        "--raw-base",
        "0x1000",
    ]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_missing_image_is_config_error() {
    let output = armature(&["decode", "--image", "/nonexistent/app.elf"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unmapped_entry_is_decode_error() {
    let image = raw_image(&LOOP);
    let output = armature(&[
        "decode",
        "--image",
        image.to_str().unwrap(),
        "--raw-base",
        "0x1000",
        "--mode",
        "a64",
        "--entry",
        "0x2000",
    ]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_run_manifest() {
    let image = raw_image(&LOOP);
    let manifest = format!(
        r#"
schema_version: "1.0"
image:
  path: "{}"
  format: raw
  load_address: 0x1000
  max_size: "1KiB"
mode: a64
targets:
  - entry: 0x1000
  - entry: 0x1008
    strategy: block
output:
  format: json
"#,
        image.display()
    );
    let manifest_path = write_temp_file("manifest", "yaml", manifest.as_bytes());

    let output = armature(&["run", "--manifest", manifest_path.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let reports = json.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["blocks"].as_array().unwrap().len(), 2);
    assert_eq!(reports[1]["strategy"], "block");
    assert_eq!(reports[1]["blocks"][0]["address"], 0x1008);
}

#[test]
fn test_run_invalid_manifest() {
    let manifest_path = write_temp_file(
        "manifest",
        "yaml",
        b"schema_version: \"1.0\"\nimage: { path: \"app.elf\" }\ntargets: []\n",
    );
    let output = armature(&["run", "--manifest", manifest_path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
}
