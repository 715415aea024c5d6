use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use first_match::io::read_match_pairs_ipc;

/// Helper to get the path to a job fixture.
fn job_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../jobs")
        .join(name)
}

/// Helper to get the fm binary path.
fn fm_bin() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_BIN_EXE_fm"));
    // Fallback for test environments
    if !path.exists() {
        path = PathBuf::from("target/debug/fm");
    }
    path
}

fn fm(args: &[&str]) -> Output {
    Command::new(fm_bin())
        .args(args)
        .output()
        .expect("failed to run fm")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Generate a small stream pair into `dir`.
fn generate(dir: &Path, extra: &[&str]) -> (PathBuf, PathBuf) {
    let a = dir.join("a.arrow");
    let b = dir.join("b.arrow");
    let mut args = vec![
        "generate",
        "--rows-a",
        "400",
        "--rows-b",
        "300",
        "--keys",
        "25",
        "--seed",
        "11",
        "--chunk-size",
        "100",
        "--out-a",
        a.to_str().unwrap(),
        "--out-b",
        b.to_str().unwrap(),
    ];
    args.extend_from_slice(extra);
    let output = fm(&args);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    (a, b)
}

include!("includes/cli_binary.rs");
