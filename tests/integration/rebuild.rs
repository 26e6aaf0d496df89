#[path = "common/mod.rs"]
mod common;

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use common::write_executable;
use mbuild::{
    error::RebuildError,
    process::ForkRunner,
    rebuild::{Bootstrapper, RebuildOutcome, backup_path, needs_rebuild},
};
use tempfile::{TempDir, tempdir};

struct Scripts {
    dir: TempDir,
    binary: PathBuf,
    source: PathBuf,
}

impl Scripts {
    /// An "old" binary and a newer "source" that records its arguments and
    /// exits with `exit_code` once copied into place.
    fn new(exit_code: i32) -> Self {
        let dir = tempdir().unwrap();
        let binary = dir.path().join("tool");
        let source = dir.path().join("tool.src");
        let args_log = dir.path().join("args.log");

        write_executable(&binary, "#!/bin/sh\nexit 0\n");
        write_executable(
            &source,
            &format!(
                "#!/bin/sh\necho \"$@\" > {}\nexit {exit_code}\n",
                args_log.display()
            ),
        );
        set_age(&binary, 120);
        set_age(&source, 60);

        Self {
            dir,
            binary,
            source,
        }
    }

    fn args_log(&self) -> Option<String> {
        fs::read_to_string(self.dir.path().join("args.log")).ok()
    }
}

fn set_age(path: &Path, seconds_ago: u64) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(seconds_ago))
        .unwrap();
}

fn copy_command() -> Vec<String> {
    ["cp", "{source}", "{binary}"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn args() -> Vec<String> {
    vec!["build_all".to_string(), "--no-rebuild".to_string()]
}

#[test]
fn stale_binary_is_replaced_and_relaunched() {
    let scripts = Scripts::new(0);
    let runner = ForkRunner;

    assert!(needs_rebuild(&scripts.binary, &scripts.source).unwrap());
    let outcome =
        Bootstrapper::new(&scripts.binary, &scripts.source, copy_command(), args(), &runner)
            .run()
            .unwrap();

    assert_eq!(outcome, RebuildOutcome::Relaunched { success: true });
    assert_eq!(scripts.args_log().as_deref(), Some("build_all --no-rebuild\n"));
    assert!(backup_path(&scripts.binary).exists());
    assert!(!needs_rebuild(&scripts.binary, &scripts.source).unwrap());
}

#[test]
fn relaunched_failure_maps_to_exit_one() {
    let scripts = Scripts::new(3);
    let runner = ForkRunner;

    let outcome =
        Bootstrapper::new(&scripts.binary, &scripts.source, copy_command(), args(), &runner)
            .run()
            .unwrap();

    assert_eq!(outcome.exit_code(), Some(1));
}

#[test]
fn second_pass_is_up_to_date() {
    let scripts = Scripts::new(0);
    let runner = ForkRunner;
    let bootstrapper =
        Bootstrapper::new(&scripts.binary, &scripts.source, copy_command(), args(), &runner);

    bootstrapper.run().unwrap();
    fs::remove_file(scripts.dir.path().join("args.log")).unwrap();

    assert_eq!(bootstrapper.run().unwrap(), RebuildOutcome::UpToDate);
    assert!(scripts.args_log().is_none());
}

#[test]
fn failed_compile_restores_backup() {
    let scripts = Scripts::new(0);
    let runner = ForkRunner;
    let original = fs::read_to_string(&scripts.binary).unwrap();

    let err = Bootstrapper::new(
        &scripts.binary,
        &scripts.source,
        vec!["false".to_string()],
        args(),
        &runner,
    )
    .run()
    .unwrap_err();

    assert!(matches!(
        err,
        RebuildError::CompileFailed { restored: true, .. }
    ));
    assert_eq!(fs::read_to_string(&scripts.binary).unwrap(), original);
    assert!(!backup_path(&scripts.binary).exists());
    assert!(scripts.args_log().is_none());
}
