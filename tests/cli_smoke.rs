use std::{path::PathBuf, process::Command};

#[test]
fn cli_frame_writes_png() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    let out_path = dir.join("frame.png");
    let _ = std::fs::remove_file(&out_path);

    let status = Command::new(env!("CARGO_BIN_EXE_glowfield"))
        .args([
            "frame",
            "--width",
            "64",
            "--height",
            "48",
            "--time-ms",
            "200",
            "--seed",
            "3",
            "--out",
        ])
        .arg(&out_path)
        .status()
        .unwrap();
    assert!(status.success());

    let img = image::open(&out_path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (64, 48));
    assert!(img.pixels().any(|p| p.0[3] != 0));
}

#[test]
fn cli_rejects_bad_config() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    let cfg_path = dir.join("bad.json");
    std::fs::write(&cfg_path, r#"{"population": 0}"#).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_glowfield"))
        .args(["frame", "--config"])
        .arg(&cfg_path)
        .args(["--out"])
        .arg(dir.join("never.png"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("population"), "{stderr}");
}

#[test]
fn cli_run_exits_after_budget() {
    let output = Command::new(env!("CARGO_BIN_EXE_glowfield"))
        .args([
            "run", "--width", "32", "--height", "32", "--seconds", "0.1", "--fps", "30",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ran 3 ticks"), "{stderr}");
}
