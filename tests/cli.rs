use std::io::Write;
use std::process::{Command, Output, Stdio};

use serde_json::Value;

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fortune-voronoi"))
}

fn run_with_stdin(args: &[&str], input: &str) -> Output {
    let mut child = binary()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run binary");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn assert_approx(name: &str, actual: f64, expected: f64, tolerance: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{name}: expected {expected}, got {actual} (diff {diff} > {tolerance})"
    );
}

const TRIANGLE: &str = "0 0\n4 0\n2 4\n";

#[test]
fn test_triangle_from_stdin() {
    let output = run_with_stdin(&["--bounds", "-10", "-10", "10", "10", "-q"], TRIANGLE);
    assert!(output.status.success());

    let diagram: Value = serde_json::from_slice(&output.stdout).unwrap();
    let vertices = diagram["vertices"].as_array().unwrap();
    assert_eq!(vertices.len(), 1);
    assert_approx("x", vertices[0]["x"].as_f64().unwrap(), 2.0, 1e-12);
    assert_approx("y", vertices[0]["y"].as_f64().unwrap(), 1.5, 1e-12);

    assert_eq!(diagram["edges"].as_array().unwrap().len(), 3);
    let cells = diagram["cells"].as_array().unwrap();
    assert_eq!(cells.len(), 3);
    for cell in cells {
        assert_eq!(cell["edges"].as_array().unwrap().len(), 2);
    }
    assert_eq!(diagram["stats"]["site_events"], 3);
    assert_eq!(diagram["stats"]["circle_events_fired"], 1);
}

#[test]
fn test_json_input_default_bounds() {
    let input = r#"[
        { "id": 10, "x": 0.0, "y": 0.0 },
        { "id": 20, "x": 1.0, "y": 0.0 }
    ]"#;
    let output = run_with_stdin(&["-q", "--margin", "2"], input);
    assert!(output.status.success());

    let diagram: Value = serde_json::from_slice(&output.stdout).unwrap();
    let bounds = &diagram["bounds"];
    assert_eq!(bounds["xmin"], -2.0);
    assert_eq!(bounds["ymin"], -2.0);
    assert_eq!(bounds["xmax"], 3.0);
    assert_eq!(bounds["ymax"], 2.0);

    assert!(diagram["vertices"].as_array().unwrap().is_empty());
    let edges = diagram["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["sites"], serde_json::json!([10, 20]));

    let cells = diagram["cells"].as_array().unwrap();
    assert_eq!(cells[0]["site"], 10);
    assert_eq!(cells[1]["site"], 20);
}

#[test]
fn test_duplicate_sites_fail() {
    let output = run_with_stdin(&["--bounds", "0", "0", "5", "5", "-q"], "1 1\n2 2\n1 1\n");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("share the coordinates"), "{stderr}");
}

#[test]
fn test_site_outside_bounds_fails() {
    let output = run_with_stdin(&["--bounds", "0", "0", "1", "1", "-q"], "0.5 0.5\n2 0.5\n");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("outside the bounding rectangle"), "{stderr}");
}

#[test]
fn test_malformed_input_fails() {
    let output = run_with_stdin(&["-q"], "1 2\nnot a site\n");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"), "{stderr}");
}

#[test]
fn test_config_and_output_files() {
    let dir = std::env::temp_dir().join(format!("fortune-voronoi-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let input = dir.join("sites.txt");
    let config = dir.join("config.json");
    let out = dir.join("diagram.json");

    std::fs::write(&input, "").unwrap();
    std::fs::write(&config, r#"{ "require_sites": true }"#).unwrap();

    let output = binary()
        .args(["-i", input.to_str().unwrap(), "--bounds", "0", "0", "1", "1", "-q"])
        .args(["--config", config.to_str().unwrap()])
        .output()
        .expect("failed to run binary");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no sites were supplied"), "{stderr}");

    std::fs::write(&input, TRIANGLE).unwrap();
    let output = binary()
        .args(["-i", input.to_str().unwrap(), "-o", out.to_str().unwrap()])
        .args(["--bounds", "-10", "-10", "10", "10", "--pretty", "-q"])
        .args(["--config", config.to_str().unwrap()])
        .output()
        .expect("failed to run binary");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains('\n'));
    let diagram: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(diagram["vertices"].as_array().unwrap().len(), 1);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_empty_input_without_bounds_fails() {
    let output = run_with_stdin(&["-q"], "# nothing here\n");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--bounds"), "{stderr}");
}

#[test]
fn test_running_time_survives_quiet() {
    let output = run_with_stdin(&["-q", "--measure-running-time"], TRIANGLE);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Sweep time:"), "{stderr}");
    assert!(!stderr.contains("Read 3 sites"), "{stderr}");
}
