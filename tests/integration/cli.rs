#[path = "common/mod.rs"]
mod common;

use std::fs;

use assert_cmd::Command;
use common::ProjectFixture;
use predicates::prelude::*;
use predicates::str::contains;

fn mbuild(project: &ProjectFixture) -> Command {
    let mut command = Command::new(assert_cmd::cargo::cargo_bin!("mbuild"));
    command
        .current_dir(project.path())
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(project.config_path());
    command
}

#[test]
fn version_prints_package_version() {
    let project = ProjectFixture::new(false);
    mbuild(&project)
        .arg("--version")
        .assert()
        .success()
        .stdout(contains(format!("v{}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn help_lists_every_target_and_runs_nothing() {
    let project = ProjectFixture::new(false);
    let output = mbuild(&project)
        .args(["docs", "-h"])
        .output()
        .expect("failed to run mbuild");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("usage: "));
    for name in [
        "clean",
        "build_dev_alpha",
        "build_rel_beta",
        "build_dev_all",
        "lint_rel_all",
        "docs",
        "run_all",
    ] {
        assert!(
            stdout.contains(&format!("\n    {name}\n")),
            "usage is missing {name}:\n{stdout}"
        );
    }
    assert!(project.log_lines("docs.log").is_empty());
}

#[test]
fn no_targets_prints_usage_to_stderr() {
    let project = ProjectFixture::new(false);
    mbuild(&project)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("usage: ").and(contains("no targets were provided")));
}

#[test]
fn unknown_target_aborts_before_running_anything() {
    let project = ProjectFixture::new(false);
    fs::create_dir_all(project.path().join("build")).unwrap();

    mbuild(&project)
        .args(["clean", "nonexistent"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("`nonexistent`").and(contains("targets:")));

    assert!(project.path().join("build").exists());
}

#[test]
fn build_then_run_all_components() {
    let project = ProjectFixture::new(false);

    mbuild(&project)
        .args(["build_dev_all", "run_dev_all"])
        .assert()
        .success()
        .stdout(contains("proc: mkdir -p ./build."));

    assert_eq!(
        project.log_lines("compiled.log"),
        ["./build/demo_dev_alpha", "./build/demo_dev_beta"]
    );
    assert_eq!(
        project.log_lines("ran.log"),
        ["./build/demo_dev_alpha", "./build/demo_dev_beta"]
    );
}

#[test]
fn failing_component_stops_the_run() {
    let project = ProjectFixture::new(true);

    mbuild(&project)
        .args(["build_rel_all", "docs"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("build target `build_rel_all` failed"));

    assert_eq!(project.log_lines("compiled.log"), ["./build/demo_rel_alpha"]);
    assert!(project.log_lines("docs.log").is_empty());
}

#[test]
fn repeated_targets_run_each_time() {
    let project = ProjectFixture::new(false);

    mbuild(&project).args(["docs", "docs"]).assert().success();

    assert_eq!(project.log_lines("docs.log"), ["docs", "docs"]);
}

#[test]
fn clean_removes_build_directory() {
    let project = ProjectFixture::new(false);
    mbuild(&project).arg("build_dev_alpha").assert().success();
    assert!(project.path().join("build/demo_dev_alpha").exists());

    mbuild(&project).arg("clean").assert().success();
    assert!(!project.path().join("build").exists());
}

#[test]
fn unknown_target_before_help_fails() {
    let project = ProjectFixture::new(false);
    mbuild(&project)
        .args(["nonexistent", "-h"])
        .assert()
        .failure()
        .code(1)
        .stdout(contains("usage: ").not())
        .stderr(contains("usage: "));
}

#[test]
fn version_before_help_prints_version() {
    let project = ProjectFixture::new(false);
    mbuild(&project)
        .args(["-v", "-h"])
        .assert()
        .success()
        .stdout(
            contains(format!("v{}", env!("CARGO_PKG_VERSION")))
                .and(contains("usage: ").not()),
        );
}

#[test]
fn unknown_option_is_an_unknown_target() {
    let project = ProjectFixture::new(false);
    mbuild(&project)
        .args(["--no-rebuild", "-x"])
        .assert()
        .failure()
        .code(1)
        .stderr(
            contains("`-x`")
                .and(contains("usage: "))
                .and(contains("targets:")),
        );
}

#[test]
fn previews_survive_quiet_log_levels() {
    let project = ProjectFixture::new(false);
    mbuild(&project)
        .args(["--log-level", "warn", "docs"])
        .assert()
        .success()
        .stdout(contains("proc: sh -c echo docs >> docs.log."));

    Command::new(assert_cmd::cargo::cargo_bin!("mbuild"))
        .current_dir(project.path())
        .env("RUST_LOG", "off")
        .arg("--config")
        .arg(project.config_path())
        .arg("docs")
        .assert()
        .success()
        .stdout(contains("proc: sh -c"));

    assert_eq!(project.log_lines("docs.log"), ["docs", "docs"]);
}

#[test]
fn missing_manifest_fails() {
    let project = ProjectFixture::new(false);
    Command::new(assert_cmd::cargo::cargo_bin!("mbuild"))
        .current_dir(project.path())
        .args(["--config", "absent.yaml", "docs"])
        .assert()
        .failure()
        .stderr(contains("failed to load configuration"));
}
