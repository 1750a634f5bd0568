use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{TempDir, tempdir};

const ONCE: &str = "\
[info]
Name=Once
Tick=10
Use=prg
[end]
[prg]
>70
>80
[end]
";

const LOOP: &str = "\
[info]
Name=Loop
Tick=5
Looping=true
Use=prg
[end]
[setup]
>96..12
[end]
[prg]
>90..12
>100..12
[end]
";

const FLAT: &str = "\
[info]
Name=Flat
Use=prg
[end]
[prg]
>93..12:40
[end]
";

const NO_USE: &str = "\
[info]
Name=Broken
[end]
[prg]
>93
[end]
";

// Config pointing the walk directory into `dir`, with no serial device.
fn write_config(dir: &TempDir) -> PathBuf {
    let walk_dir = dir.path().join("walks");
    fs::create_dir_all(&walk_dir).unwrap();
    let toml = format!(
        "[walker]\nwalk_dir = \"{}\"\nguard_us = 0\nidle_poll_ms = 1\n",
        walk_dir.display().to_string().replace('\\', "/")
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_walk(dir: &TempDir, file: &str, text: &str) -> PathBuf {
    let path = dir.path().join("walks").join(file);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, text).unwrap();
    path
}

fn walker(cfg: &Path) -> Command {
    let mut cmd = Command::cargo_bin("walker").unwrap();
    cmd.arg("--config").arg(cfg);
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["check"], 2, "required", "stderr")]
#[case(&["run"], 2, "required", "stderr")]
#[case(&["list"], 0, "", "stdout")]
#[case(&["run", "Nope", "--dry-run"], 3, "walker list", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);

    let assert = walker(&cfg).args(args).assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn check_accepts_good_files() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);
    let once = write_walk(&dir, "once.walk", ONCE);
    let looping = write_walk(&dir, "loop.walk", LOOP);

    walker(&cfg)
        .arg("check")
        .arg(&once)
        .arg(&looping)
        .assert()
        .success()
        .stdout(predicate::str::contains("'Once' (prg) init=0 prg=2"))
        .stdout(predicate::str::contains("'Loop' (prg) init=1 prg=2"));
}

#[test]
fn check_fails_on_invalid_file_with_validation_code() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);
    let good = write_walk(&dir, "once.walk", ONCE);
    let bad = write_walk(&dir, "broken.walk", NO_USE);

    walker(&cfg)
        .arg("check")
        .arg(&good)
        .arg(&bad)
        .assert()
        .code(4)
        .stdout(predicate::str::contains("FAIL"))
        .stdout(predicate::str::contains("ok"));
}

#[test]
fn check_reports_skipped_lines() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);
    let text = ONCE.replace(">80", ">80\n>x1");
    let file = write_walk(&dir, "skip.walk", &text);

    walker(&cfg)
        .arg("check")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped: parse error on line 9"));
}

#[test]
fn check_missing_file_fails() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);

    walker(&cfg)
        .arg("check")
        .arg(dir.path().join("nope.walk"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL"));
}

#[test]
fn list_shows_registered_programs_sorted() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);
    write_walk(&dir, "b.walk", ONCE);
    write_walk(&dir, "a.walk", LOOP);
    write_walk(&dir, "c.walk", NO_USE);
    write_walk(&dir, "notes.txt", ONCE.replace("Once", "Hidden").as_str());

    let out = walker(&cfg).arg("list").assert().success().get_output().clone();
    let stdout = String::from_utf8(out.stdout).unwrap();
    let names: Vec<&str> = stdout
        .lines()
        .filter_map(|l| l.split_whitespace().next())
        .collect();
    assert_eq!(names, vec!["Loop", "Once"]);
}

#[test]
fn frames_prints_twelve_frames_per_step() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);
    let file = write_walk(&dir, "flat.walk", FLAT);

    let out = walker(&cfg)
        .arg("frames")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("servo  0: 0xa0 0x5d"))
        .stdout(predicate::str::contains("servo 11: 0xf8 0x5d"))
        .get_output()
        .clone();
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout.lines().filter(|l| l.contains("servo")).count(), 12);
}

#[test]
fn frames_json_lists_hex_pairs() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);
    let file = write_walk(&dir, "flat.walk", FLAT);

    let out = walker(&cfg)
        .arg("--json")
        .arg("frames")
        .arg(&file)
        .assert()
        .success()
        .get_output()
        .clone();
    let stdout = String::from_utf8(out.stdout).unwrap();
    let line = stdout.lines().next().unwrap();
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["delay_ms"], 40);
    assert_eq!(v["frames"].as_array().unwrap().len(), 12);
    assert_eq!(v["frames"][4], "c05d");
}

#[test]
fn dry_run_plays_a_non_looping_program_to_the_end() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);
    write_walk(&dir, "once.walk", ONCE);

    walker(&cfg)
        .args(["run", "Once", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("'Once' finished: 2 steps, 0 faults"));
}

#[test]
fn step_limit_stops_a_looping_program() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);
    write_walk(&dir, "loop.walk", LOOP);

    let out = walker(&cfg)
        .args(["--json", "run", "Loop", "--dry-run", "--steps", "3"])
        .assert()
        .success()
        .get_output()
        .clone();
    let stdout = String::from_utf8(out.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(v["program"], "Loop");
    // setup, 90, 100; the stop lands at the end of that pass
    assert_eq!(v["steps"], 3);
    assert_eq!(v["stop_requested"], true);
    assert_eq!(v["is_stop"], true);
}

#[test]
fn json_errors_carry_a_reason() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);

    let out = walker(&cfg)
        .args(["--json", "run", "Missing", "--dry-run"])
        .assert()
        .code(3)
        .get_output()
        .clone();
    let stderr = String::from_utf8(out.stderr).unwrap();
    let err_line = stderr
        .lines()
        .rev()
        .find(|l| l.contains("\"reason\""))
        .unwrap();
    let v: serde_json::Value = serde_json::from_str(err_line).unwrap();
    assert_eq!(v["reason"], "Selection");
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[walker]\nidle_poll_ms = 0\n").unwrap();

    walker(&path)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("idle_poll_ms"));
}
