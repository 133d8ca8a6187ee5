use std::path::Path;
use std::process::{Command, Output};

const DOCUMENT: &str = r##"{
    "format": {"format_version": 8},
    "animation": {
        "__type__": "MainComposition",
        "name": "Scene",
        "animation": {"__type__": "AnimationContainer", "first_frame": 0, "last_frame": 20},
        "shapes": [{
            "__type__": "Layer",
            "name": "layer",
            "shapes": [
                {"__type__": "Fill", "name": "paint", "color": {"value": "#ff0000"}},
                {
                    "__type__": "Ellipse",
                    "name": "ball",
                    "size": {"value": {"width": 10, "height": 10}},
                    "position": {"keyframes": [
                        {"time": 0, "value": {"x": 0, "y": 0}, "before": {"x": 0, "y": 0}, "after": {"x": 1, "y": 1}},
                        {"time": 20, "value": {"x": 40, "y": 0}}
                    ]}
                }
            ]
        }]
    }
}"##;

fn vecta(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vecta"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run vecta")
}

fn write_document(dir: &Path) -> String {
    let path = dir.join("scene.json");
    std::fs::write(&path, DOCUMENT).unwrap();
    path.to_str().unwrap().to_owned()
}

#[test]
fn inspect_prints_the_tree() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_document(dir.path());

    let output = vecta(&["inspect", &file]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("MainComposition \"Scene\""));
    assert!(stdout.contains("  Layer \"layer\""));
    assert!(stdout.contains("    Ellipse \"ball\""));
}

#[test]
fn inspect_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_document(dir.path());

    let output = vecta(&["inspect", "--json", &file]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["format"], "glaxnimate");
    assert_eq!(report["main"]["name"], "Scene");
    assert_eq!(report["main"]["children"][0]["children"].as_array().unwrap().len(), 2);
}

#[test]
fn sample_interpolates_keyframes() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_document(dir.path());

    let output = vecta(&["sample", &file, "--node", "ball", "--property", "position", "--frame", "10"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "(20, 0)");
}

#[test]
fn sample_reports_missing_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_document(dir.path());

    let output = vecta(&["sample", &file, "--node", "nothing", "--property", "position"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no node named 'nothing'"));
}

#[test]
fn convert_writes_loadable_json() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_document(dir.path());
    let out = dir.path().join("out.json");

    let output = vecta(&["convert", &file, out.to_str().unwrap(), "--pretty"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["format"]["generator"], "vecta");
    assert_eq!(written["animation"]["name"], "Scene");

    let again = vecta(&["sample", out.to_str().unwrap(), "-n", "ball", "-p", "position", "-f", "20"]);
    assert!(again.status.success(), "{}", String::from_utf8_lossy(&again.stderr));
    assert_eq!(String::from_utf8_lossy(&again.stdout).trim(), "(40, 0)");
}

#[test]
fn unknown_formats_fail() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.bin");
    std::fs::write(&path, [0u8, 1, 2, 3]).unwrap();

    let output = vecta(&["inspect", path.to_str().unwrap()]);
    assert!(!output.status.success());
}
