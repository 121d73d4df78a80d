// Common test utilities shared across acceptance tests
//
// Every test works in its own temp directory holding the store root, the
// config file and any copied fixtures, so tests can run in parallel.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const METAFILE: &str = ".metaversion";

pub struct TestWorkspace {
    temp_dir: TempDir,
    fixtures_dir: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let fixtures_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures");

        // Shadows any user or global config during discovery
        fs::write(
            temp_dir.path().join("versionize.toml"),
            "[store]\nroot_dir = \"results\"\n\n[observability]\nlog_level = \"info\"\nlog_format = \"compact\"\n",
        )
        .unwrap();

        Self {
            temp_dir,
            fixtures_dir,
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Store root used by the CLI in this workspace
    pub fn root(&self) -> PathBuf {
        self.path().join("results")
    }

    pub fn versionize(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_versionize"));
        cmd.current_dir(self.path())
            .env_remove("VERSIONIZE_CONFIG")
            .env_remove("VERSIONIZE_ROOT_DIR")
            .env_remove("VERSIONIZE_LOG_FORMAT")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn copy_fixture(&self, fixture: &str) -> PathBuf {
        let src = self.fixtures_dir.join(fixture);
        let dest = self.path().join(Path::new(fixture).file_name().unwrap());
        fs::copy(&src, &dest).unwrap();
        dest
    }

    pub fn create_file(&self, path: &str, content: &str) {
        let file_path = self.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(file_path, content).unwrap();
    }

    pub fn read_file(&self, path: &str) -> String {
        fs::read_to_string(self.path().join(path)).unwrap()
    }

    pub fn assert_file_exists(&self, path: &str) {
        let file_path = self.path().join(path);
        assert!(file_path.exists(), "File should exist: {}", path);
    }

    pub fn assert_file_missing(&self, path: &str) {
        let file_path = self.path().join(path);
        assert!(!file_path.exists(), "File should not exist: {}", path);
    }
}
