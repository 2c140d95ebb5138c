//! End-to-end tests for the `lineage` binary against a snapshot copy.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn snapshot() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    for name in ["monarchs.json", "persons.json"] {
        std::fs::copy(data.join(name), dir.path().join(name)).expect("copy snapshot");
    }
    dir
}

fn lineage(data: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lineage"))
        .arg("--data")
        .arg(data)
        .args(["--as-of", "2024-01-01"])
        .args(args)
        .env("RUST_LOG", "lineage=warn")
        .output()
        .expect("run lineage")
}

fn stdout_json(out: &Output) -> serde_json::Value {
    assert!(
        out.status.success(),
        "lineage failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("stdout is JSON")
}

fn persons_file(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("persons.json")
}

#[test]
fn tree_renders_root_and_detached_records() {
    let dir = snapshot();
    let out = lineage(dir.path(), &["tree"]);
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.starts_with("Nils Eriksson [0] (1520–1582)"));
    assert!(text.contains("├─ Erik Nilsson [0.1]"));
    assert!(text.contains("└─ Karl Nilsson [0.2]"));
    assert!(text.contains("Detached records"));
    assert!(text.contains("Okänd Svensson [3]"));
}

#[test]
fn tree_json_exposes_orphans() {
    let dir = snapshot();
    let json = stdout_json(&lineage(dir.path(), &["tree", "--json"]));
    assert_eq!(json["root"]["externalId"], "0");
    assert_eq!(json["root"]["children"].as_array().unwrap().len(), 2);
    assert_eq!(json["orphans"][0]["externalId"], "3");
}

#[test]
fn reigns_for_long_life() {
    let dir = snapshot();
    let json = stdout_json(&lineage(dir.path(), &["reigns", "0.1"]));
    let ids: Vec<&str> = json["monarchs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec![
            "gustav-i-vasa",
            "erik-xiv",
            "johan-iii",
            "sigismund",
            "karl-ix",
            "gustav-ii-adolf"
        ]
    );
    assert_eq!(json["generation"], 2);
}

#[test]
fn generations_are_ascending() {
    let dir = snapshot();
    let json = stdout_json(&lineage(dir.path(), &["generations"]));
    let gens: Vec<u64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["generation"].as_u64().unwrap())
        .collect();
    assert_eq!(gens, vec![1, 2, 3, 4]);
}

#[test]
fn migrate_dry_run_then_apply() {
    let dir = snapshot();
    let before = std::fs::read_to_string(persons_file(&dir)).unwrap();

    let dry = stdout_json(&lineage(dir.path(), &["migrate"]));
    assert_eq!(dry["applied"], false);
    assert_eq!(dry["report"]["needsMigration"], 3);
    assert_eq!(dry["report"]["unresolvedNames"], 1);
    assert_eq!(std::fs::read_to_string(persons_file(&dir)).unwrap(), before);

    let applied = stdout_json(&lineage(dir.path(), &["migrate", "--apply"]));
    assert_eq!(applied["updated"], 3);

    let again = stdout_json(&lineage(dir.path(), &["migrate", "--apply"]));
    assert_eq!(again["updated"], 0);
    assert_eq!(again["report"]["needsMigration"], 0);
}

#[test]
fn validate_fails_on_dangling_reference() {
    let dir = snapshot();
    assert!(lineage(dir.path(), &["validate"]).status.success());

    let text = std::fs::read_to_string(persons_file(&dir)).unwrap();
    std::fs::write(persons_file(&dir), text.replace("\"karl-xi\"", "\"karl-xii\"")).unwrap();
    let out = lineage(dir.path(), &["validate"]);
    assert!(!out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["references"]["persons"][0]["missingIds"][0], "karl-xii");
}

#[test]
fn resolve_reports_strategy() {
    let dir = snapshot();
    let json = stdout_json(&lineage(
        dir.path(),
        &["resolve", "Gustav Vasa (1523–1560)", "Hertig Karl (1599–1611)"],
    ));
    assert_eq!(json[0]["resolution"]["monarchId"], "gustav-i-vasa");
    assert_eq!(json[0]["resolution"]["strategy"], "WordSet");
    assert!(json[1].get("resolution").is_none());
}

#[test]
fn missing_snapshot_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = lineage(dir.path(), &["tree"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("loading snapshot"));
}
