use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn vocab_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("vocab");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[archive]
dir = "{}/vocabs"

[log]
level = "warn"
"#,
        root.display()
    );

    let config_path = config_dir.join("vocab.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_vocab(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = vocab_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run vocab binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Builds `wcrp:cmip6:{realm,ensemble}` with two realm terms.
fn seed(config: &Path) {
    let steps: &[&[&str]] = &[
        &["create", "authority", "WCRP"],
        &["create", "scope", "CMIP6", "--parent", "wcrp"],
        &["create", "collection", "realm", "--parent", "wcrp:cmip6"],
        &[
            "create",
            "collection",
            "ensemble",
            "--parent",
            "wcrp:cmip6",
            "--term-regex",
            "r[0-9]+i[0-9]+p[0-9]+f[0-9]+",
        ],
        &[
            "create",
            "term",
            "ocnBgchem",
            "--parent",
            "wcrp:cmip6:realm",
            "--synonym",
            "ocean-bgc",
        ],
        &["create", "term", "atmos", "--parent", "wcrp:cmip6:realm"],
    ];
    for args in steps {
        let (_, stderr, success) = run_vocab(config, args);
        assert!(success, "{:?} failed: {}", args, stderr);
    }
}

#[test]
fn test_create_prints_namespace() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, success) = run_vocab(&config, &["create", "authority", "WCRP"]);
    assert!(success);
    assert_eq!(stdout.trim(), "wcrp");
}

#[test]
fn test_create_duplicate_fails() {
    let (_tmp, config) = setup_test_env();
    seed(&config);
    let (_, stderr, success) = run_vocab(&config, &["create", "authority", "wcrp"]);
    assert!(!success);
    assert!(stderr.contains("wcrp"));
}

#[test]
fn test_load_by_namespace_and_path() {
    let (_tmp, config) = setup_test_env();
    seed(&config);

    let (stdout, _, success) = run_vocab(&config, &["load", "wcrp:cmip6:realm:ocnbgchem"]);
    assert!(success);
    assert!(stdout.contains("ocnBgchem"));

    let (stdout, _, success) = run_vocab(&config, &["load", "WCRP", "CMIP6", "realm", "ocean-bgc"]);
    assert!(success);
    assert!(stdout.contains("wcrp:cmip6:realm:ocnbgchem"));
}

#[test]
fn test_load_json_by_uid() {
    let (_tmp, config) = setup_test_env();
    seed(&config);

    let (stdout, _, success) = run_vocab(&config, &["load", "wcrp:cmip6:realm:atmos", "--json"]);
    assert!(success);
    let node: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(node["kind"], "term");
    assert_eq!(node["idx"], 2);
    let uid = node["uid"].as_str().unwrap().to_string();

    let (stdout, _, success) = run_vocab(&config, &["load", &uid, "--json"]);
    assert!(success);
    let by_uid: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(by_uid["namespace"], "wcrp:cmip6:realm:atmos");
}

#[test]
fn test_load_virtual_term() {
    let (_tmp, config) = setup_test_env();
    seed(&config);

    let (stdout, _, success) = run_vocab(
        &config,
        &["load", "wcrp", "cmip6", "ensemble", "r1i1p1f1", "--json"],
    );
    assert!(success);
    let node: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(node["is_virtual"], true);
    assert_eq!(node["idx"], 0);
}

#[test]
fn test_load_missing_fails() {
    let (_tmp, config) = setup_test_env();
    seed(&config);

    let (_, stderr, success) = run_vocab(&config, &["load", "wcrp:cmip6:realm:nope"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_load_too_many_segments_fails() {
    let (_tmp, config) = setup_test_env();
    seed(&config);

    let (_, _, success) = run_vocab(
        &config,
        &["load", "wcrp", "cmip6", "realm", "atmos", "extra"],
    );
    assert!(!success);
}

#[test]
fn test_parse_strict_and_lenient() {
    let (_tmp, config) = setup_test_env();
    seed(&config);

    let (stdout, _, success) = run_vocab(&config, &["parse", "wcrp", "cmip6", "realm", "ocean-bgc"]);
    assert!(success);
    assert_eq!(stdout.trim(), "ocnbgchem");

    let (_, _, success) = run_vocab(
        &config,
        &["parse", "--strict", "wcrp", "cmip6", "realm", "ocean-bgc"],
    );
    assert!(!success);

    let (stdout, _, success) = run_vocab(
        &config,
        &["parse", "--strict", "wcrp", "cmip6", "realm", "ocnbgchem"],
    );
    assert!(success);
    assert_eq!(stdout.trim(), "ocnbgchem");
}

#[test]
fn test_random_term() {
    let (_tmp, config) = setup_test_env();
    seed(&config);

    let (stdout, _, success) = run_vocab(&config, &["random", "wcrp:cmip6:realm"]);
    assert!(success);
    assert!(["ocnbgchem", "atmos"].contains(&stdout.trim()));

    let (_, _, success) = run_vocab(&config, &["random", "wcrp:cmip6:missing"]);
    assert!(!success);
}

#[test]
fn test_list() {
    let (_tmp, config) = setup_test_env();
    seed(&config);

    let (stdout, _, success) = run_vocab(&config, &["list"]);
    assert!(success);
    assert!(stdout.contains("NAMESPACE"));
    assert!(stdout.contains("wcrp"));

    let (stdout, _, success) = run_vocab(&config, &["list", "wcrp:cmip6"]);
    assert!(success);
    assert!(stdout.contains("wcrp:cmip6:realm"));
    assert!(stdout.contains("wcrp:cmip6:ensemble"));

    let (stdout, _, success) = run_vocab(&config, &["list", "wcrp:cmip6:realm", "--json"]);
    assert!(success);
    let terms: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let names: Vec<&str> = terms
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["canonical_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["ocnbgchem", "atmos"]);
}

#[test]
fn test_status_and_synonym_persist() {
    let (_tmp, config) = setup_test_env();
    seed(&config);

    let (_, _, success) = run_vocab(&config, &["status", "wcrp:cmip6:realm:atmos", "accept"]);
    assert!(success);
    let (_, _, success) = run_vocab(&config, &["synonym", "wcrp:cmip6:realm:atmos", "Atmosphere"]);
    assert!(success);

    let (stdout, _, success) = run_vocab(
        &config,
        &["load", "wcrp:cmip6:realm:atmosphere", "--json"],
    );
    assert!(success);
    let node: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(node["status"], "accepted");
    assert_eq!(node["canonical_name"], "atmos");
}

#[test]
fn test_associate_terms() {
    let (_tmp, config) = setup_test_env();
    seed(&config);

    let (stdout, _, success) = run_vocab(
        &config,
        &["associate", "wcrp:cmip6:realm:atmos", "wcrp:cmip6:realm:ocnbgchem"],
    );
    assert!(success);
    assert!(stdout.contains("Associated"));

    let (stdout, _, success) = run_vocab(
        &config,
        &["associate", "wcrp:cmip6:realm:atmos", "wcrp:cmip6:realm:ocnbgchem"],
    );
    assert!(success);
    assert!(stdout.contains("already"));
}

#[test]
fn test_term_outside_regex_rejected() {
    let (_tmp, config) = setup_test_env();
    seed(&config);

    let (_, _, success) = run_vocab(
        &config,
        &["create", "term", "bogus", "--parent", "wcrp:cmip6:ensemble"],
    );
    assert!(!success);
}

#[test]
fn test_missing_config_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("absent.toml");
    let dir = tmp.path().join("vocabs");
    let (stdout, _, success) = run_vocab(
        &missing,
        &["--dir", dir.to_str().unwrap(), "list"],
    );
    assert!(success);
    assert!(stdout.contains("NAMESPACE"));
}

#[test]
fn test_reserved_names_rejected() {
    let (_tmp, config) = setup_test_env();
    seed(&config);

    let (_, stderr, success) = run_vocab(
        &config,
        &["create", "term", "a:b", "--parent", "wcrp:cmip6:realm"],
    );
    assert!(!success);
    assert!(stderr.contains("reserved"));

    let (_, _, success) = run_vocab(&config, &["synonym", "wcrp:cmip6:realm:atmos", "x/y"]);
    assert!(!success);

    let (stdout, _, success) = run_vocab(&config, &["list", "wcrp:cmip6:realm"]);
    assert!(success);
    assert!(!stdout.contains("a:b"));
}
