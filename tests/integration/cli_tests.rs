//! CLI integration tests
//!
//! These tests drive the compiled binary over temp projects.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn deadsharp() -> Command {
    Command::cargo_bin("deadsharp").expect("binary")
}

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).expect("write");
}

#[test]
fn clean_project_exits_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        dir.path(),
        "Library.cs",
        "internal class Widget { public void Spin() { } }\npublic class Api { public void Run() { new Widget().Spin(); } }\n",
    );

    deadsharp()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No dead symbols found"));
}

#[test]
fn findings_do_not_fail_by_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "Library.cs", "internal class Orphan { }\n");

    deadsharp().arg(dir.path()).assert().success();
}

#[test]
fn fail_on_findings_exits_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "Library.cs", "internal class Orphan { }\n");

    deadsharp()
        .arg(dir.path())
        .arg("--fail-on-findings")
        .assert()
        .code(1);
}

#[test]
fn json_format_emits_rule_codes() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "Library.cs", "internal class Orphan { }\n");

    deadsharp()
        .arg(dir.path())
        .args(["--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DS001"))
        .stdout(predicate::str::contains("Orphan"))
        .stdout(predicate::str::contains("unused-internal-type"));
}

#[test]
fn sarif_format_emits_sarif_version() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "Library.cs", "internal class Orphan { }\n");

    deadsharp()
        .arg(dir.path())
        .args(["--format", "sarif"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"version\": \"2.1.0\""))
        .stdout(predicate::str::contains("deadsharp"));
}

#[test]
fn output_file_is_written() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "Library.cs", "internal class Orphan { }\n");
    let report = dir.path().join("report.json");

    deadsharp()
        .arg(dir.path())
        .args(["--format", "json"])
        .arg("--output")
        .arg(&report)
        .assert()
        .success();

    let contents = std::fs::read_to_string(&report).expect("report file");
    assert!(contents.contains("DS001"));
}

#[test]
fn rules_filter_limits_detection() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        dir.path(),
        "Library.cs",
        r#"
internal class Orphan { }
internal class Widget { private void Helper() { } }
public class Api { public object K() { return new Widget(); } }
"#,
    );

    deadsharp()
        .arg(dir.path())
        .args(["--format", "json", "--rules", "DS001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Orphan"))
        .stdout(predicate::str::contains("Helper").not());
}

#[test]
fn malformed_config_reports_ds900_and_continues() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "Library.cs", "internal class Orphan { }\n");
    write(dir.path(), ".deadsharp.toml", "[rules.DS999]\nenabled = true\n");

    deadsharp()
        .arg(dir.path())
        .args(["--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DS900"))
        .stdout(predicate::str::contains("DS999"))
        // Analysis still ran
        .stdout(predicate::str::contains("Orphan"));
}

#[test]
fn config_file_disables_rules() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "Library.cs", "internal class Orphan { }\n");
    write(dir.path(), ".deadsharp.toml", "[rules.DS001]\nenabled = false\n");

    deadsharp()
        .arg(dir.path())
        .args(["--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Orphan").not());
}

#[test]
fn explicit_config_path_is_used() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "Library.cs", "internal class KeepMe { }\n");
    write(dir.path(), "custom.toml", "retain_patterns = [\"Keep*\"]\n");

    deadsharp()
        .arg(dir.path())
        .args(["--format", "json"])
        .arg("--config")
        .arg(dir.path().join("custom.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("KeepMe").not());
}

#[test]
fn exclude_flag_skips_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("Legacy")).expect("mkdir");
    write(dir.path(), "Library.cs", "public class Api { }\n");
    std::fs::write(
        dir.path().join("Legacy/Old.cs"),
        "internal class Forgotten { }\n",
    )
    .expect("write");

    deadsharp()
        .arg(dir.path())
        .args(["--format", "json", "--exclude", "**/Legacy/**"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Forgotten").not());
}

#[test]
fn retain_flag_suppresses_findings() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "Library.cs", "internal class ClickHandler { }\n");

    deadsharp()
        .arg(dir.path())
        .args(["--format", "json", "--retain", "*Handler"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ClickHandler").not());
}

#[test]
fn parallel_flag_produces_same_findings() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "Library.cs", "internal class Orphan { }\n");

    deadsharp()
        .arg(dir.path())
        .args(["--format", "json", "--parallel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Orphan"));
}
