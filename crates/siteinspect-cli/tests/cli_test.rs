//! Integration tests for the siteinspect binary
//!
//! Each test runs the built binary inside a scratch directory so no stray
//! `siteinspect.toml` is picked up.

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SQUARE: &str = r#"{
    "type": "Feature",
    "properties": {"name": "lot 7"},
    "geometry": {
        "type": "Polygon",
        "coordinates": [[[0.0, 0.0], [0.001, 0.0], [0.001, 0.001], [0.0, 0.001], [0.0, 0.0]]]
    }
}"#;

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_siteinspect"))
        .args(args)
        .current_dir(dir)
        .env_remove("SITEINSPECT_API_BASE_URL")
        .env_remove("SITEINSPECT_REQUEST_TIMEOUT_SECS")
        .env_remove("SITEINSPECT_TERRAIN_BUFFER_M")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute command")
}

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("site.geojson"), SQUARE).unwrap();
    dir
}

fn json_data(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: Value = serde_json::from_str(&stdout).expect("Output should be valid JSON");
    assert_eq!(parsed["status"], "success");
    parsed["data"].clone()
}

#[test]
fn test_measure_json() {
    let dir = workspace();
    let output = run(dir.path(), &["measure", "site.geojson", "--json"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let data = json_data(&output);
    assert_eq!(data["vertex_count"], 4);
    assert_eq!(data["edges"].as_array().unwrap().len(), 4);

    // ~111 m × ~111 m
    let area = data["area_m2"].as_f64().unwrap();
    assert!(area > 12_000.0 && area < 12_800.0, "area {}", area);
    let perimeter = data["perimeter_m"].as_f64().unwrap();
    assert!(perimeter > 440.0 && perimeter < 450.0, "perimeter {}", perimeter);
}

#[test]
fn test_measure_human_lists_edges() {
    let dir = workspace();
    let output = run(dir.path(), &["measure", "site.geojson"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Perimeter"));
    assert!(stdout.contains("Edge"));
}

#[test]
fn test_bounds_uses_buffer_flag() {
    let dir = workspace();
    let output = run(dir.path(), &["bounds", "site.geojson", "--buffer", "0", "--json"]);
    assert!(output.status.success());

    let data = json_data(&output);
    assert_eq!(data["buffer_m"], 0.0);
    let southwest = data["bounds"]["southwest"].as_array().unwrap();
    assert!(southwest[0].as_f64().unwrap().abs() < 1e-9);
    assert!(southwest[1].as_f64().unwrap().abs() < 1e-9);
}

#[test]
fn test_setbacks_local_service() {
    let dir = workspace();
    let output = run(
        dir.path(),
        &[
            "setbacks",
            "site.geojson",
            "--front",
            "10",
            "--back",
            "10",
            "--front-edge",
            "0",
            "--back-edge",
            "2",
            "--json",
        ],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let data = json_data(&output);
    assert_eq!(data["service"], "local_offset");
    let site = data["site_area_m2"].as_f64().unwrap();
    let buildable = data["buildable_area_m2"].as_f64().unwrap();
    assert!(buildable > 0.0 && buildable < site);

    let roles: Vec<&str> = data["edge_classifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["front", "side", "back", "side"]);
}

#[test]
fn test_setbacks_rejects_unknown_edge() {
    let dir = workspace();
    let output = run(
        dir.path(),
        &["setbacks", "site.geojson", "--front-edge", "0", "--back-edge", "9"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Edge 9 does not exist"));
}

#[test]
fn test_config_reports_sources() {
    let dir = workspace();
    std::fs::write(dir.path().join("siteinspect.toml"), "terrain_buffer_m = 75.0\n").unwrap();

    let output = run(dir.path(), &["config", "--timeout", "30", "--json"]);
    assert!(output.status.success());

    let data = json_data(&output);
    let entries = data["entries"].as_array().unwrap();
    let source_of = |key: &str| {
        entries
            .iter()
            .find(|e| e["key"] == key)
            .map(|e| e["source"].as_str().unwrap().to_string())
            .unwrap()
    };
    assert_eq!(source_of("request_timeout_secs"), "Cli");
    assert_eq!(source_of("terrain_buffer_m"), "File");
    assert_eq!(source_of("debounce_ms"), "Default");
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = workspace();
    let output = run(dir.path(), &["measure", "nowhere.geojson", "--json"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let parsed: Value = serde_json::from_str(stderr.trim()).expect("Error should be valid JSON");
    assert_eq!(parsed["status"], "error");
}

#[test]
fn test_geocode_unreachable_service() {
    let dir = workspace();
    let output = run(
        dir.path(),
        &["geocode", "Jl. Sudirman 1", "--api-url", "http://127.0.0.1:9", "--timeout", "2"],
    );
    assert!(!output.status.success());
}
