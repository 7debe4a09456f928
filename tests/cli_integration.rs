//! Integration tests for the `cip` binary.
//!
//! These tests run the compiled binary against manifest fixtures written
//! to temporary directories.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

// =============================================================================
// Test Fixtures
// =============================================================================

const REGISTRIES: &str = r#"
[[registries]]
name = "gcr.io/bar"
service_account = "robot"

[[registries]]
name = "gcr.io/foo"
service_account = "robot"
src = true
"#;

/// Manifest TOML promoting one image/digest with tag `0.9`.
fn manifest_toml(image: &str, digest: &str) -> String {
    format!(
        "{REGISTRIES}\n[[images]]\nname = \"{image}\"\n[images.dmap]\n\"{digest}\" = [\"0.9\"]\n"
    )
}

/// Isolated workspace with no user config leaking in.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn write(&self, path: &str, contents: &str) -> &Self {
        self.dir.child(path).write_str(contents).unwrap();
        self
    }

    fn path(&self, rel: &str) -> String {
        self.dir.child(rel).path().display().to_string()
    }

    fn cip(&self) -> Command {
        let mut cmd = Command::cargo_bin("cip").unwrap();
        cmd.current_dir(self.dir.path())
            .env_remove("CIP_CONFIG")
            .env("XDG_CONFIG_HOME", self.dir.child("xdg").path())
            .env("HOME", self.dir.child("home").path());
        cmd
    }
}

// =============================================================================
// edges
// =============================================================================

#[test]
fn edges_prints_each_copy_once() {
    let ws = Workspace::new();
    ws.write("m/one.toml", &manifest_toml("a", "sha256:000"))
        .write("m/two.toml", &manifest_toml("a", "sha256:000"));

    ws.cip()
        .args(["edges", &ws.path("m")])
        .assert()
        .success()
        .stdout("gcr.io/foo/a@sha256:000 -> gcr.io/bar/a:0.9 [0.9]\n");
}

#[test]
fn edges_json_is_machine_readable() {
    let ws = Workspace::new();
    ws.write("m.json", r#"{
        "registries": [{"name": "gcr.io/foo", "src": true}, {"name": "gcr.io/bar"}],
        "images": [{"name": "a", "dmap": {"sha256:000": []}}]
    }"#);

    let output = ws.cip().args(["edges", "--json", &ws.path("m.json")]).output().unwrap();
    assert!(output.status.success());

    let edges: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(edges.as_array().unwrap().len(), 1);
    assert_eq!(edges[0]["image_name"], "a");
    assert_eq!(edges[0]["tag"], serde_json::Value::Null);
    assert_eq!(edges[0]["dst_registry"]["name"], "gcr.io/bar");
}

#[test]
fn edges_rejects_manifest_without_source() {
    let ws = Workspace::new();
    ws.write(
        "m.toml",
        "[[registries]]\nname = \"gcr.io/bar\"\n\n[[images]]\nname = \"a\"\n",
    );

    ws.cip()
        .args(["edges", &ws.path("m.toml")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no registry is flagged as source"));
}

// =============================================================================
// check
// =============================================================================

#[test]
fn check_passes_for_identical_manifests() {
    let ws = Workspace::new();
    ws.write("main.toml", &manifest_toml("a", "sha256:000"))
        .write("pr.toml", &manifest_toml("a", "sha256:000"));

    ws.cip()
        .args(["check", "--baseline", &ws.path("main.toml")])
        .args(["--proposed", &ws.path("pr.toml")])
        .assert()
        .success()
        .stdout(predicate::str::contains("All checks passed"));
}

#[test]
fn check_reports_removed_image() {
    let ws = Workspace::new();
    ws.write("main.toml", &manifest_toml("a", "sha256:000"))
        .write("pr.toml", &manifest_toml("b", "sha256:000"));

    ws.cip()
        .args(["check", "--baseline", &ws.path("main.toml")])
        .args(["--proposed", &ws.path("pr.toml")])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "The following images were removed in this pull request: a",
        ))
        .stderr(predicate::str::contains("1 check(s) failed"));
}

#[test]
fn check_accepts_empty_baseline_directory() {
    let ws = Workspace::new();
    ws.write("pr.toml", &manifest_toml("a", "sha256:000"));
    std::fs::create_dir_all(ws.dir.child("main").path()).unwrap();

    ws.cip()
        .args(["check", "--baseline", &ws.path("main")])
        .args(["--proposed", &ws.path("pr.toml")])
        .assert()
        .success()
        .stdout(predicate::str::contains("All checks passed"));
}

#[test]
fn check_removal_can_be_disabled() {
    let ws = Workspace::new();
    ws.write("main.toml", &manifest_toml("a", "sha256:000"))
        .write("pr.toml", &manifest_toml("b", "sha256:000"));

    ws.cip()
        .args(["check", "--no-removal-check", "--baseline", &ws.path("main.toml")])
        .args(["--proposed", &ws.path("pr.toml")])
        .assert()
        .success();
}

#[test]
fn check_size_from_file() {
    let ws = Workspace::new();
    ws.write("pr.toml", &manifest_toml("foo", "sha256:000"))
        .write("sizes.json", r#"{"sha256:000": 5000000}"#);

    ws.cip()
        .args(["check", "--proposed", &ws.path("pr.toml")])
        .args(["--max-image-size", "1", "--sizes", &ws.path("sizes.json")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("over the max file size of 1MB"))
        .stderr(predicate::str::contains("foo (5 MB)"));
}

#[test]
fn check_size_at_limit_passes() {
    let ws = Workspace::new();
    ws.write("pr.toml", &manifest_toml("foo", "sha256:000"))
        .write("sizes.json", r#"{"sha256:000": 1000000}"#);

    ws.cip()
        .args(["check", "--proposed", &ws.path("pr.toml")])
        .args(["--max-image-size", "1", "--sizes", &ws.path("sizes.json")])
        .assert()
        .success();
}

#[test]
fn check_size_limit_from_config() {
    let ws = Workspace::new();
    ws.write("pr.toml", &manifest_toml("foo", "sha256:000"))
        .write("sizes.json", r#"{"sha256:000": 3000000}"#)
        .write("cip.toml", "[checks]\nmax_image_size_mb = 2\n");

    ws.cip()
        .args(["--config", &ws.path("cip.toml")])
        .args(["check", "--proposed", &ws.path("pr.toml")])
        .args(["--sizes", &ws.path("sizes.json")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("over the max file size of 2MB"));
}

#[test]
fn check_json_report() {
    let ws = Workspace::new();
    ws.write("main.toml", &manifest_toml("a", "sha256:000"))
        .write("pr.toml", &manifest_toml("a", "sha256:111"));

    let output = ws
        .cip()
        .args(["check", "--json", "--baseline", &ws.path("main.toml")])
        .args(["--proposed", &ws.path("pr.toml")])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["passed"], false);
    assert_eq!(report["ran"][0], "image-removal");
    assert_eq!(report["failures"][0]["check"], "image-removal");
    assert_eq!(report["failures"][0]["error"]["removed"][0], "a");
}

#[test]
fn check_missing_config_file_fails() {
    let ws = Workspace::new();
    ws.write("pr.toml", &manifest_toml("a", "sha256:000"));

    ws.cip()
        .args(["--config", &ws.path("missing.toml")])
        .args(["check", "--proposed", &ws.path("pr.toml")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

// =============================================================================
// hash-files / completion
// =============================================================================

#[test]
fn hash_files_prints_toml_manifest() {
    let ws = Workspace::new();
    ws.write("artifacts/hello.txt", "hello\n");

    ws.cip()
        .args(["hash-files", &ws.path("artifacts")])
        .assert()
        .success()
        .stdout(predicate::str::contains("name = \"hello.txt\""))
        .stdout(predicate::str::contains(
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03",
        ));
}

#[test]
fn completion_generates_script() {
    Command::cargo_bin("cip")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cip"));
}
