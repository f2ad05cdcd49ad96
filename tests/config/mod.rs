use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;
use warehouse_dash::config::{self, Config, Settings};

fn write(text: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("warehouse.yml");
    fs::write(&path, text).expect("write config");
    (dir, path)
}

fn fields(text: &str) -> Vec<String> {
    let (_dir, path) = write(text);
    let cfg = config::parse(&path).expect("parse");
    match config::validate(&cfg) {
        Ok(()) => Vec::new(),
        Err(err) => err.issues.into_iter().map(|issue| issue.field).collect(),
    }
}

#[test]
fn full_config_resolves() {
    let (_dir, path) = write(
        r#"version: 1
database:
  path: "data/logs.db"
generator:
  machines: ["dock-1", "dock-2"]
  batch_size: 120
  seed: 7
refresh:
  interval: "500ms"
  every_ticks: 3
  batch_size: 25
  dedupe: true
table:
  page_size: 20
"#,
    );

    let settings = config::load(&path)
        .expect("load")
        .resolve()
        .expect("resolve");

    assert_eq!(settings.database_path, PathBuf::from("data/logs.db"));
    assert_eq!(settings.machines, vec!["dock-1", "dock-2"]);
    assert_eq!(settings.batch_size, 120);
    assert_eq!(settings.seed, Some(7));
    assert_eq!(settings.refresh.interval, Duration::from_millis(500));
    assert_eq!(settings.refresh.every_ticks, 3);
    assert_eq!(settings.refresh.batch_size, 25);
    assert!(settings.refresh.dedupe);
    assert_eq!(settings.page_size, 20);
}

#[test]
fn minimal_config_uses_defaults() {
    let (_dir, path) = write("version: 1\n");
    let settings = config::load(&path)
        .expect("load")
        .resolve()
        .expect("resolve");
    assert_eq!(settings, Settings::default());
}

#[test]
fn default_config_matches_documented_defaults() {
    let settings = Config {
        version: 1,
        ..Config::default()
    }
    .resolve()
    .expect("resolve");

    assert_eq!(settings.database_path, PathBuf::from("warehouse.db"));
    assert_eq!(settings.machines.len(), 5);
    assert_eq!(settings.batch_size, 500);
    assert_eq!(settings.refresh.interval, Duration::from_secs(2));
    assert_eq!(settings.refresh.every_ticks, 5);
    assert_eq!(settings.refresh.batch_size, 50);
    assert!(!settings.refresh.dedupe);
    assert_eq!(settings.page_size, 10);
}

#[test]
fn missing_version_is_reported() {
    assert_eq!(fields("table:\n  page_size: 5\n"), vec!["version"]);
}

#[test]
fn every_bad_field_is_reported() {
    let issues = fields(
        r#"version: 1
generator:
  machines: ["M-1", "M-1", "bad id!"]
  batch_size: 0
refresh:
  interval: "soon"
  every_ticks: 0
  batch_size: 0
table:
  page_size: 0
"#,
    );

    for expected in [
        "generator.machines[1]",
        "generator.machines[2]",
        "generator.batch_size",
        "refresh.interval",
        "refresh.every_ticks",
        "refresh.batch_size",
        "table.page_size",
    ] {
        assert!(
            issues.iter().any(|field| field == expected),
            "missing {expected} in {issues:?}"
        );
    }
}

#[test]
fn zero_interval_is_rejected() {
    let issues = fields("version: 1\nrefresh:\n  interval: \"0s\"\n");
    assert_eq!(issues, vec!["refresh.interval"]);
}

#[test]
fn unknown_keys_fail_to_parse() {
    let (_dir, path) = write("version: 1\nrefresh:\n  every: 3\n");
    let err = config::parse(&path).expect_err("unknown field");
    assert!(err.contains("parse config yaml"), "{err}");
}

#[test]
fn validation_message_names_first_issue() {
    let (_dir, path) = write("version: 2\ntable:\n  page_size: 0\n");
    let err = config::load(&path).expect_err("invalid");
    assert!(err.contains("version: must be 1"), "{err}");
    assert!(err.contains("and 1 more"), "{err}");
}
