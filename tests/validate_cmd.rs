use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::json;
use tempfile::TempDir;

fn write_case(dir: &Path, dose_modality: &str) {
    let values = vec![42.0f32; 32];
    let doc = json!({
        "dose": {
            "modality": dose_modality,
            "dims": [4, 4, 2],
            "spacing": [1.0, 1.0, 2.0],
            "origin": [0.0, 0.0, 0.0],
            "values": values
        },
        "structure_set": {
            "modality": "RTSTRUCT",
            "rois": [
                { "number": 1, "name": "Box",
                  "contours": [{ "z": 0.0, "points": [[0.5, 0.5], [2.5, 0.5], [2.5, 2.5], [0.5, 2.5]] }] }
            ]
        }
    });
    fs::write(dir.join("case.json"), doc.to_string()).unwrap();
}

#[test]
fn validate_command_ok() {
    let tmp = TempDir::new().unwrap();
    write_case(tmp.path(), "RTDOSE");

    let mut cmd = Command::cargo_bin("kira-doseresp").unwrap();
    cmd.arg("validate").arg("--case").arg(tmp.path().join("case.json"));
    let out = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("kira-doseresp validate ok"));
    assert!(text.contains("Box\t4 voxels"));
}

#[test]
fn validate_rejects_wrong_modality() {
    let tmp = TempDir::new().unwrap();
    write_case(tmp.path(), "CT");

    let mut cmd = Command::cargo_bin("kira-doseresp").unwrap();
    cmd.arg("validate").arg("--case").arg(tmp.path().join("case.json"));
    cmd.assert().failure();
}
