#![allow(dead_code)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use tempfile::{TempDir, tempdir};

/// Stand-in compiler: records the `-o` output in `compiled.log`, fails on any
/// input named `broken.c`, and writes an executable that appends its own path
/// to `ran.log`.
const FAKE_COMPILER: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift ;;
    *broken.c) exit 1 ;;
  esac
  shift
done
echo "$out" >> compiled.log
printf '#!/bin/sh\necho "$0" >> ran.log\n' > "$out"
chmod +x "$out"
"#;

/// A throwaway project directory with an `mbuild.yaml` manifest.
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    /// Two components, `alpha` and `beta`. `beta` fails to compile when
    /// `broken` is set.
    pub fn new(broken: bool) -> Self {
        let dir = tempdir().expect("failed to create tempdir");
        let compiler = dir.path().join("fakecc");
        write_executable(&compiler, FAKE_COMPILER);

        let beta_source = if broken { "./beta/broken.c" } else { "./beta/main.c" };
        let manifest = format!(
            r#"version: "1"
project: demo
build_dir: ./build
clean: ["rm", "-fr", "./build"]
compiler:
  program: {compiler}
  flags: ["-Wall"]
linter:
  program: "true"
docs: ["sh", "-c", "echo docs >> docs.log"]
defines: ["version_major=1"]
profiles:
  dev:
    compiler_flags: ["-O0"]
  rel:
    compiler_flags: ["-O3"]
    linter_flags: ["-DNDEBUG"]
components:
  - name: alpha
    sources: ["./alpha/main.c"]
    includes: ["./alpha/include"]
  - name: beta
    sources: ["{beta_source}"]
"#,
            compiler = compiler.display(),
        );
        fs::write(dir.path().join("mbuild.yaml"), manifest).expect("failed to write manifest");

        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("mbuild.yaml")
    }

    /// Lines of a log file in the project directory, empty if it is absent.
    pub fn log_lines(&self, name: &str) -> Vec<String> {
        fs::read_to_string(self.dir.path().join(name))
            .map(|content| content.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

pub fn write_executable(path: &Path, content: &str) {
    fs::write(path, content).expect("failed to write script");
    let mut permissions = fs::metadata(path).expect("missing script").permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).expect("failed to chmod script");
}
