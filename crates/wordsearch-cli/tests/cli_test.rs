use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn missing_terms_file_exits_with_failure() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("wordsearch")
        .unwrap()
        .current_dir(dir.path())
        .args(["scan", "--path", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("terms file"));
}

#[test]
fn empty_pattern_lists_exit_with_failure() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".terms_list"), "# only comments\n\n").unwrap();
    Command::cargo_bin("wordsearch")
        .unwrap()
        .current_dir(dir.path())
        .args(["scan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no search terms or regex patterns loaded"));
}

#[test]
fn scan_prints_summary_and_preview() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    fs::create_dir_all(&tree).unwrap();
    fs::write(tree.join("config.txt"), "a\nb\nmy password is secret_xyz\n").unwrap();
    fs::write(tree.join("TODO_list.md"), "").unwrap();
    fs::write(dir.path().join(".terms_list"), "password\nTODO\n").unwrap();
    fs::write(dir.path().join(".regex_list"), "\\bsecret_\\w+\n").unwrap();

    Command::cargo_bin("wordsearch")
        .unwrap()
        .current_dir(dir.path())
        .args(["scan", "-p", "tree", "-j", "1", "--summary-json", "summary.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total matches:      3"))
        .stdout(predicate::str::contains("SearchType,FilePath,FileName,LineNumber,MatchedTerm,MatchedText"));

    let csv = fs::read_to_string(dir.path().join("search_results.csv")).unwrap();
    assert!(csv.contains(r#""FileName","TODO_list.md","TODO_list.md","","TODO","TODO_list.md""#));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("summary.json")).unwrap()).unwrap();
    assert_eq!(json["counters"]["total"], 3);
    assert_eq!(json["term_counts"][0]["text"], "password");
}

#[test]
fn zero_matches_is_success() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("tree")).unwrap();
    fs::write(dir.path().join(".terms_list"), "nothing-matches-this\n").unwrap();
    fs::write(dir.path().join("tree/plain.txt"), "hello\n").unwrap();
    Command::cargo_bin("wordsearch")
        .unwrap()
        .current_dir(dir.path())
        .args(["scan", "-p", "tree", "-o", "out.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total matches:      0"));
}

#[test]
fn run_config_file_supplies_defaults() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/Readme.TXT"), "Needle\n").unwrap();
    fs::write(dir.path().join("words"), "needle\n").unwrap();
    fs::write(
        dir.path().join("wordsearch.toml"),
        "root = \"src\"\nterms_file = \"words\"\ncase_sensitive = true\noutput = \"r.csv\"\n",
    )
    .unwrap();

    Command::cargo_bin("wordsearch")
        .unwrap()
        .current_dir(dir.path())
        .args(["scan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total matches:      0"));
    assert!(dir.path().join("r.csv").exists());
}

#[test]
fn ignore_case_overrides_config_file() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/readme.txt"), "Needle\n").unwrap();
    fs::write(dir.path().join("words"), "needle\n").unwrap();
    fs::write(
        dir.path().join("wordsearch.toml"),
        "root = \"src\"\nterms_file = \"words\"\ncase_sensitive = true\n",
    )
    .unwrap();

    Command::cargo_bin("wordsearch")
        .unwrap()
        .current_dir(dir.path())
        .args(["scan", "--ignore-case"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total matches:      1"));
}

#[test]
fn invalid_thread_count_is_logged() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("tree")).unwrap();
    fs::write(dir.path().join(".terms_list"), "x\n").unwrap();
    Command::cargo_bin("wordsearch")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .args(["scan", "-p", "tree", "-j", "zero"])
        .assert()
        .success()
        .stderr(predicate::str::contains("invalid thread count"));
}
