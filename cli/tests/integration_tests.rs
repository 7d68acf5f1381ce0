use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const EVENTS_SCHEMA: &str = r#"
name: event_file
description: A DL3 event file
extensions:
  - name: EVENTS
    description: Event list
    version: 1
    class_hierarchy: [OGIP, EVENTS]
    headers:
      - header:
          name: obs_id
          fits_key: OBS_ID
          description: Observation identifier
          dtype: int64
    columns:
      - column:
          name: event_id
          description: Event identifier
          dtype: int64
      - column:
          name: energy
          description: Reconstructed energy
          dtype: float32
          unit: TeV
          ucd: phys.energy
  - name: GTI
    description: Good time intervals
    columns:
      - column:
          name: start
          description: Interval start
          dtype: float64
"#;

fn fits_schema() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fits-schema"))
}

fn write_schema(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("schema.yaml");
    fs::write(&path, text).unwrap();
    path
}

fn run(args: &[&str], schema: &Path) -> Output {
    fits_schema()
        .args(args)
        .arg("--schema")
        .arg(schema)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ---------------------------------------------------------------------------
// template
// ---------------------------------------------------------------------------

#[test]
fn test_template_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(&dir, EVENTS_SCHEMA);

    let output = run(&["template"], &schema);
    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    assert_eq!(text.lines().last(), Some("END"));
    assert!(text.lines().any(|l| l.starts_with("TTYPE#  = 'energy'")));
    assert!(text.lines().any(|l| l.starts_with("HDUCLAS1= 'EVENTS'")));
}

#[test]
fn test_template_number_columns() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(&dir, EVENTS_SCHEMA);

    let output = run(&["template", "--number-columns"], &schema);
    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    let ttype: Vec<&str> = text
        .lines()
        .filter(|l| l.starts_with("TTYPE"))
        .map(|l| &l[..6])
        .collect();
    assert_eq!(ttype, vec!["TTYPE1", "TTYPE2", "TTYPE1"]);
}

#[test]
fn test_template_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(&dir, EVENTS_SCHEMA);
    let out = dir.path().join("events.tpl");

    let output = fits_schema()
        .args(["template", "--schema"])
        .arg(&schema)
        .arg("--output")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    assert!(stdout(&output).starts_with("Wrote "));
    let text = fs::read_to_string(&out).unwrap();
    assert!(text.ends_with("END\n"));
}

#[test]
fn test_config_datamodel_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(&dir, EVENTS_SCHEMA);
    let config = dir.path().join("render.yaml");
    fs::write(&config, "datamodel: VODF-9.9\n").unwrap();

    let output = fits_schema()
        .args(["diagram", "--verbose", "--schema"])
        .arg(&schema)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    assert!(stdout(&output).contains("VODF-9.9"));
}

// ---------------------------------------------------------------------------
// diagram
// ---------------------------------------------------------------------------

#[test]
fn test_diagram_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(&dir, EVENTS_SCHEMA);

    let output = run(&["diagram"], &schema);
    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    assert_eq!(text.lines().next(), Some("@startuml"));
    assert_eq!(text.lines().last(), Some("@enduml"));
    assert!(text.lines().any(|l| l == "event_file o-- EVENTS"));
    assert!(text.lines().any(|l| l == "EVENTS *-- energy"));
}

// ---------------------------------------------------------------------------
// validate / init-config
// ---------------------------------------------------------------------------

#[test]
fn test_validate_reports_counts() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(&dir, EVENTS_SCHEMA);

    let output = run(&["validate"], &schema);
    assert!(output.status.success(), "{output:?}");
    assert!(stdout(&output).contains("2 extension(s), 1 header(s), 3 column(s)"));
}

#[test]
fn test_invalid_schema_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(&dir, &EVENTS_SCHEMA.replace("phys.energy", "not.a.ucd"));
    let out = dir.path().join("events.tpl");

    let output = fits_schema()
        .args(["template", "--schema"])
        .arg(&schema)
        .arg("--output")
        .arg(&out)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: Invalid schema"), "{stderr}");
    assert!(stderr.contains("invalid UCD \"not.a.ucd\""), "{stderr}");
    assert!(!out.exists());
}

#[test]
fn test_missing_schema_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(&["validate"], &dir.path().join("absent.yaml"));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read"));
}

#[test]
fn test_init_config_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("render.yaml");

    let output = fits_schema()
        .arg("init-config")
        .arg("--output")
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    let text = fs::read_to_string(&config).unwrap();
    assert!(text.contains("column_index_base: 1"));

    let schema = write_schema(&dir, EVENTS_SCHEMA);
    let output = fits_schema()
        .args(["validate", "--schema"])
        .arg(&schema)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
}
