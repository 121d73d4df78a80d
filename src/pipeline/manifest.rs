/// Pipeline manifest (TOML)
///
/// ```toml
/// version = "1.0.0"
/// root_dir = "results"
///
/// [[task]]
/// name = "task1"
/// code_version = "1.0.1"
/// dir = "task1"
/// tag = "filesave.txt"
/// command = ["sh", "-c", "echo 'This is Task 1' > \"$VERSIONIZE_OUTPUT\""]
/// ```
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::version::Version;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineManifest {
    /// Seed of the pipeline's flow version
    pub version: Version,

    /// Root directory, relative to the manifest's directory
    #[serde(default)]
    pub root_dir: Option<String>,

    #[serde(default, rename = "task")]
    pub tasks: Vec<TaskSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,

    /// Version of the task's own code
    pub code_version: Version,

    /// Sub-directory of the task's outputs inside each version directory
    pub dir: String,

    /// Output file name, recorded in metadata
    pub tag: String,

    #[serde(default = "default_true")]
    pub skip: bool,

    /// Program and arguments
    pub command: Vec<String>,

    /// Working directory, relative to the manifest's directory
    #[serde(default)]
    pub cwd: Option<String>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl TaskSpec {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl PipelineManifest {
    /// Load and validate a manifest file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline manifest: {}", path.display()))?;

        let manifest: PipelineManifest = toml::from_str(&content)
            .with_context(|| format!("Failed to parse pipeline manifest: {}", path.display()))?;

        manifest
            .validate()
            .with_context(|| format!("Invalid pipeline manifest: {}", path.display()))?;

        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tasks.is_empty() {
            anyhow::bail!("pipeline must declare at least one [[task]]");
        }

        if let Some(root_dir) = &self.root_dir {
            if root_dir.trim().is_empty() {
                anyhow::bail!("root_dir must not be empty");
            }
        }

        let mut names = HashSet::new();
        for task in &self.tasks {
            if task.name.trim().is_empty() {
                anyhow::bail!("task name must not be empty");
            }
            if !names.insert(task.name.as_str()) {
                anyhow::bail!("duplicate task name: {}", task.name);
            }
            if task.dir.trim().is_empty() {
                anyhow::bail!("task '{}': dir must not be empty", task.name);
            }
            if task.tag.trim().is_empty() {
                anyhow::bail!("task '{}': tag must not be empty", task.name);
            }
            if task.command.is_empty() || task.command[0].trim().is_empty() {
                anyhow::bail!("task '{}': command must not be empty", task.name);
            }
            if task.timeout_secs == Some(0) {
                anyhow::bail!("task '{}': timeout_secs must be positive", task.name);
            }
        }

        Ok(())
    }

    /// Resolve a manifest-relative path against `base_dir`
    pub fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TWO_TASKS: &str = r#"
version = "1.0.0"

[[task]]
name = "task1"
code_version = "1.0.1"
dir = "task1"
tag = "filesave.txt"
command = ["sh", "-c", "true"]

[[task]]
name = "task2"
code_version = "1.0.2"
dir = "task2"
tag = "parameter.txt"
skip = false
command = ["sh", "-c", "true"]
timeout_secs = 5
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest: PipelineManifest = toml::from_str(TWO_TASKS).unwrap();
        manifest.validate().unwrap();

        assert_eq!(manifest.version, Version::new(1, 0, 0));
        assert_eq!(manifest.root_dir, None);
        assert_eq!(manifest.tasks.len(), 2);
        assert!(manifest.tasks[0].skip);
        assert!(!manifest.tasks[1].skip);
        assert_eq!(manifest.tasks[1].code_version, Version::new(1, 0, 2));
        assert_eq!(manifest.tasks[1].timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_malformed_version_is_rejected() {
        let content = TWO_TASKS.replace("code_version = \"1.0.1\"", "code_version = \"one\"");
        assert!(toml::from_str::<PipelineManifest>(&content).is_err());
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let content = TWO_TASKS.replace("name = \"task2\"", "name = \"task1\"");
        let manifest: PipelineManifest = toml::from_str(&content).unwrap();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate task name"));
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let content = TWO_TASKS.replace("command = [\"sh\", \"-c\", \"true\"]\n\n", "command = []\n\n");
        let manifest: PipelineManifest = toml::from_str(&content).unwrap();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_no_tasks_is_rejected() {
        let manifest: PipelineManifest = toml::from_str("version = \"1.0.0\"").unwrap();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_from_file_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pipeline.toml");
        fs::write(&path, "version = \"1.0.0\"").unwrap();

        let err = PipelineManifest::from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("pipeline.toml"));
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/work/pipeline");
        assert_eq!(
            PipelineManifest::resolve_path(base, "results"),
            PathBuf::from("/work/pipeline/results")
        );
        assert_eq!(
            PipelineManifest::resolve_path(base, "/abs/results"),
            PathBuf::from("/abs/results")
        );
    }
}
