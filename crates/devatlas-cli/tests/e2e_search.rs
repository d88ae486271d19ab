//! E2E CLI tests covering:
//! - `atlas search` hierarchy-preserving matches and selection re-pointing
//! - `atlas select` by track and by lesson
//! - Custom catalogs via `--catalog` and catalog validation errors
//! - User config (`output`, malformed files) and shell completions

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

fn atlas_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("atlas"));
    cmd.current_dir(dir);
    cmd.env("DEVATLAS_LOG", "error");
    cmd.env("HOME", dir);
    cmd.env("XDG_CONFIG_HOME", dir.join("config"));
    cmd.env_remove("FORMAT");
    cmd.env_remove("DEVATLAS_STATE_DIR");
    cmd.env_remove("DEVATLAS_CATALOG");
    cmd.arg("--state-dir").arg(dir.join("state"));
    cmd
}

fn json(dir: &Path, args: &[&str]) -> Value {
    let output = atlas_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("atlas should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--json should produce valid JSON")
}

fn active_track(dir: &Path) -> Option<String> {
    let tracks = json(dir, &["tracks"]);
    tracks["tracks"]
        .as_array()
        .expect("tracks array")
        .iter()
        .find(|row| row["active"] == true)
        .and_then(|row| row["id"].as_str().map(str::to_string))
}

fn lesson_ids(view: &Value) -> Vec<String> {
    let mut ids = Vec::new();
    for track in view["tracks"].as_array().expect("tracks") {
        for module in track["modules"].as_array().expect("modules") {
            for lesson in module["lessons"].as_array().expect("lessons") {
                ids.push(lesson["id"].as_str().expect("id").to_string());
            }
        }
    }
    ids
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[test]
fn lesson_match_keeps_only_its_ancestors() {
    let dir = TempDir::new().expect("tempdir");
    let result = json(dir.path(), &["search", "raft"]);

    assert_eq!(result["stats"]["tracks"], 1);
    assert_eq!(result["stats"]["modules"], 1);
    assert_eq!(result["stats"]["lessons"], 1);
    assert_eq!(lesson_ids(&result["view"]), ["dist-raft"]);
    assert_eq!(result["view"]["tracks"][0]["id"], "distributed");
    assert_eq!(result["view"]["tracks"][0]["modules"][0]["id"], "consensus");
}

#[test]
fn module_match_keeps_all_its_lessons() {
    let dir = TempDir::new().expect("tempdir");
    let result = json(dir.path(), &["search", "  HOOKS "]);

    assert_eq!(result["query"], "HOOKS");
    assert_eq!(
        lesson_ids(&result["view"]),
        ["react-use-state", "react-use-effect"]
    );
}

#[test]
fn track_match_keeps_whole_tracks_in_order() {
    let dir = TempDir::new().expect("tempdir");
    let result = json(dir.path(), &["search", "systems"]);

    let tracks: Vec<_> = result["view"]["tracks"]
        .as_array()
        .expect("tracks")
        .iter()
        .map(|track| track["id"].as_str().expect("id").to_string())
        .collect();
    assert_eq!(tracks, ["systems", "distributed"]);
    assert_eq!(result["stats"]["lessons"], 8);
}

#[test]
fn search_repoints_and_persists_active_track() {
    let dir = TempDir::new().expect("tempdir");
    assert_eq!(active_track(dir.path()).as_deref(), Some("react"));

    let result = json(dir.path(), &["search", "raft"]);
    assert_eq!(result["selection"]["track_id"], "distributed");
    assert_eq!(result["selection"]["lesson_id"], "dist-raft");

    assert_eq!(active_track(dir.path()).as_deref(), Some("distributed"));
}

#[test]
fn empty_result_clears_selection_but_keeps_stored_track() {
    let dir = TempDir::new().expect("tempdir");
    json(dir.path(), &["select", "systems"]);

    let result = json(dir.path(), &["search", "zzz-no-match"]);
    assert_eq!(result["stats"]["tracks"], 0);
    assert_eq!(result["selection"]["track_id"], Value::Null);
    assert!(lesson_ids(&result["view"]).is_empty());

    assert_eq!(active_track(dir.path()).as_deref(), Some("systems"));
}

#[test]
fn pretty_search_reports_no_matches() {
    let dir = TempDir::new().expect("tempdir");
    atlas_cmd(dir.path())
        .args(["search", "zzz", "--format", "pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches."));
}

// ---------------------------------------------------------------------------
// Select
// ---------------------------------------------------------------------------

#[test]
fn select_track_focuses_first_lesson() {
    let dir = TempDir::new().expect("tempdir");
    let selection = json(dir.path(), &["select", "systems"]);
    assert_eq!(selection["track_id"], "systems");
    assert_eq!(selection["lesson_id"], "sys-stack-heap");
}

#[test]
fn select_lesson_activates_its_track() {
    let dir = TempDir::new().expect("tempdir");
    let selection = json(dir.path(), &["select", "--lesson", "dist-lww"]);
    assert_eq!(selection["track_id"], "distributed");
    assert_eq!(selection["lesson_id"], "dist-lww");
    assert_eq!(active_track(dir.path()).as_deref(), Some("distributed"));
}

#[test]
fn select_requires_a_target() {
    let dir = TempDir::new().expect("tempdir");
    atlas_cmd(dir.path()).args(["select"]).assert().failure();
}

// ---------------------------------------------------------------------------
// Catalogs and config
// ---------------------------------------------------------------------------

const CUSTOM_CATALOG: &str = r"
tracks:
  - id: docs
    title: Documentation
    modules:
      - id: guides
        title: Guides
        lessons:
          - id: docs-install
            title: Installing
            metadata:
              minutes: 5
          - id: docs-config
            title: Configuration
";

#[test]
fn custom_yaml_catalog_replaces_builtin() {
    let dir = TempDir::new().expect("tempdir");
    let catalog = dir.path().join("catalog.yaml");
    std::fs::write(&catalog, CUSTOM_CATALOG).expect("write catalog");
    let catalog = catalog.to_str().expect("utf8 path");

    let tracks = json(dir.path(), &["--catalog", catalog, "tracks"]);
    assert_eq!(tracks["tracks"].as_array().expect("tracks").len(), 1);
    assert_eq!(tracks["tracks"][0]["id"], "docs");

    let toggled = json(
        dir.path(),
        &["--catalog", catalog, "toggle", "docs-install", "--today", "2024-01-12"],
    );
    assert_eq!(toggled["track_id"], "docs");

    let progress = json(dir.path(), &["--catalog", catalog, "progress", "docs"]);
    assert_eq!(progress["track"]["percent"], 50);
}

#[test]
fn duplicate_lesson_id_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let catalog = dir.path().join("dup.json");
    std::fs::write(
        &catalog,
        r#"{"tracks":[{"id":"t","title":"T","modules":[
            {"id":"a","title":"A","lessons":[{"id":"x","title":"X"}]},
            {"id":"b","title":"B","lessons":[{"id":"x","title":"X again"}]}
        ]}]}"#,
    )
    .expect("write catalog");

    let output = atlas_cmd(dir.path())
        .arg("--catalog")
        .arg(&catalog)
        .args(["tracks", "--json"])
        .output()
        .expect("atlas should not crash");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("error JSON");
    assert_eq!(err["error"]["error_code"], "E1003");
}

#[test]
fn config_output_mode_applies_without_flags() {
    let dir = TempDir::new().expect("tempdir");
    let config_dir = dir.path().join("config/devatlas");
    std::fs::create_dir_all(&config_dir).expect("mkdir");
    std::fs::write(config_dir.join("config.toml"), "output = \"json\"\n").expect("write");

    let output = atlas_cmd(dir.path())
        .args(["select", "systems"])
        .output()
        .expect("atlas should not crash");
    assert!(output.status.success());
    let selection: Value = serde_json::from_slice(&output.stdout).expect("config selects JSON");
    assert_eq!(selection["track_id"], "systems");
}

#[test]
fn malformed_config_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    let config_dir = dir.path().join("config/devatlas");
    std::fs::create_dir_all(&config_dir).expect("mkdir");
    std::fs::write(config_dir.join("config.toml"), "output = ").expect("write");

    let output = atlas_cmd(dir.path())
        .args(["tracks", "--json"])
        .output()
        .expect("atlas should not crash");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("error JSON");
    assert_eq!(err["error"]["error_code"], "E1001");
}

#[test]
fn completions_emit_script_for_atlas() {
    let dir = TempDir::new().expect("tempdir");
    atlas_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_atlas"));
}
