use rstest::rstest;
use walker_config::{load_file, load_toml};

#[rstest]
#[case("[serial]\nbaud = 0\n", "serial.baud must be > 0")]
#[case("[serial]\ndevice = \"  \"\n", "serial.device must not be empty")]
#[case("[walker]\nextension = \".walk\"\n", "walker.extension")]
#[case("[walker]\nguard_us = 20000\n", "walker.guard_us")]
#[case("[walker]\nidle_poll_ms = 0\n", "walker.idle_poll_ms must be >= 1")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
fn rejects_bad_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(format!("{err}").contains(needle), "{err}");
}

#[test]
fn accepts_full_config() {
    let toml = r#"
[serial]
device = "/dev/ttyUSB0"
baud = 115200
timeout_ms = 5

[walker]
walk_dir = "/srv/walk"
extension = "walk"
guard_us = 60
idle_poll_ms = 2
select_policy = "reject-while-running"

[logging]
level = "debug"
rotation = "daily"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.serial.device.as_deref(), Some("/dev/ttyUSB0"));
    assert_eq!(cfg.walker.walk_dir.to_str(), Some("/srv/walk"));
}

#[test]
fn unknown_keys_in_known_sections_are_ignored() {
    let cfg = load_toml("[walker]\ncolour = \"blue\"\n").expect("parse TOML");
    cfg.validate().expect("valid");
}

#[test]
fn load_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("walker.toml");
    std::fs::write(&path, "[serial]\nbaud = \"fast\"\n").unwrap();
    let err = load_file(&path).unwrap_err();
    assert!(format!("{err}").contains("walker.toml"), "{err}");

    std::fs::write(&path, "[walker]\nidle_poll_ms = 3\n").unwrap();
    assert_eq!(load_file(&path).unwrap().walker.idle_poll_ms, 3);
}
