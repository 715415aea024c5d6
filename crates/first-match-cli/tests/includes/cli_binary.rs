// ================================================================
// generate / correlate
// ================================================================

#[test]
fn fm_generate_writes_both_streams() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = generate(dir.path(), &[]);
    assert!(a.exists());
    assert!(b.exists());
}

#[test]
fn fm_generate_reports_unordered_b() {
    let dir = tempfile::tempdir().unwrap();
    let output = fm(&[
        "generate",
        "--rows-a",
        "10",
        "--rows-b",
        "300",
        "--chunk-size",
        "50",
        "--chunk-sorted",
        "--out-a",
        dir.path().join("a.arrow").to_str().unwrap(),
        "--out-b",
        dir.path().join("b.arrow").to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("not time-ordered"));
}

#[test]
fn fm_correlate_writes_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = generate(dir.path(), &[]);
    let out = dir.path().join("out.arrow");
    let output = fm(&[
        "correlate",
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "--backend",
        "scalar",
        "-o",
        out.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("A-events matched"));
    let pairs = read_match_pairs_ipc(&out).unwrap();
    assert!(pairs.iter().all(|&(a_idx, b_idx)| a_idx < 400 && b_idx < 300));
}

#[test]
fn fm_correlate_validated_refuses_unordered_b() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = generate(dir.path(), &["--chunk-sorted"]);
    let output = fm(&["correlate", a.to_str().unwrap(), b.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"));
}

#[test]
fn fm_correlate_scan_accepts_unordered_b() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = generate(dir.path(), &["--chunk-sorted"]);
    let output = fm(&[
        "correlate",
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "--ordering",
        "scan",
    ]);
    assert!(output.status.success());
}

#[test]
fn fm_correlate_custom_column_names() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = generate(dir.path(), &["--key-column", "user", "--time-column", "ts"]);
    let plain = fm(&["correlate", a.to_str().unwrap(), b.to_str().unwrap()]);
    assert!(!plain.status.success());
    let named = fm(&[
        "correlate",
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "--key-column",
        "user",
        "--time-column",
        "ts",
    ]);
    assert!(named.status.success());
}

// ================================================================
// verify / explain
// ================================================================

#[test]
fn fm_verify_certifies_backends() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = generate(dir.path(), &[]);
    let output = fm(&[
        "verify",
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "--chunk-size",
        "64",
    ]);
    assert!(output.status.success());
    let out = stdout(&output);
    for name in ["kernel/validated", "eager", "lazy", "streaming", "asof (unverified)"] {
        assert!(out.contains(name), "missing {name} in:\n{out}");
    }
}

#[test]
fn fm_verify_respects_oracle_cap() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = generate(dir.path(), &[]);
    let output = fm(&[
        "verify",
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "--max-pairs",
        "1000",
    ]);
    assert!(!output.status.success());
}

#[test]
fn fm_explain_shows_both_plans() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = generate(dir.path(), &[]);
    let naive = stdout(&fm(&["explain", a.to_str().unwrap(), b.to_str().unwrap()]));
    assert!(naive.contains("JOIN ON key"));
    assert!(naive.contains("GROUP BY a_idx"));

    let optimized = stdout(&fm(&[
        "explain",
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "--optimized",
    ]));
    assert!(optimized.contains("FIRST MATCH PROBE"));
    assert!(!optimized.contains("JOIN ON key"));
}

// ================================================================
// validate / run / ptx
// ================================================================

#[test]
fn fm_validate_demo_job() {
    let output = fm(&["validate", job_path("demo.yaml").to_str().unwrap()]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Job is valid"));
    assert!(out.contains("CFG-006"));
}

#[test]
fn fm_validate_invalid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    std::fs::write(&path, "{{invalid").unwrap();
    let output = fm(&["validate", path.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn fm_validate_reports_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("job.yaml");
    std::fs::write(&path, "inputs:\n  a: x.arrow\n  b: x.arrow\noutput: x.arrow\n").unwrap();
    let output = fm(&["validate", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("CFG-010"));
}

#[test]
fn fm_run_job_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = generate(dir.path(), &[]);
    let out = dir.path().join("matches.arrow");
    let job = dir.path().join("job.yaml");
    std::fs::write(
        &job,
        format!(
            "inputs:\n  a: {}\n  b: {}\nbackends: [eager, lazy, streaming, asof]\nstreaming:\n  chunk_size: 50\nverify:\n  oracle: true\noutput: {}\n",
            a.display(),
            b.display(),
            out.display()
        ),
    )
    .unwrap();
    let output = fm(&["run", job.to_str().unwrap(), "--report", "json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["a_rows"], 400);
    assert_eq!(report["backends"].as_array().unwrap().len(), 4);
    assert!(report["oracle"]["mismatch"].is_null());
    assert!(out.exists());
}

#[test]
fn fm_ptx_prints_kernel() {
    let output = fm(&["ptx"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains(".entry"));
}

#[test]
fn fm_unknown_subcommand_fails() {
    assert!(!fm(&["frobnicate"]).status.success());
}
