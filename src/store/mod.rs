//! Version store
//!
//! One [`VersionStore`] is bound to one task's output sub-directory. It
//! decides whether a task output is up to date, resolves the directory an
//! output version lives in, and records versions after a successful run.
//!
//! Layout under the root directory (default `results`):
//!
//! ```text
//! results/.metaversion                    {"results": "1.0.2"}
//! results/v1/task1/.metaversion           {"filesave.txt": "1.0.1"}
//! results/v1/task1/filesave.txt
//! ```
//!
//! Every minor/patch release of a major version shares `v<major>`.

pub mod gate;
pub mod metadata;

pub use gate::{Decision, Gate, Outcome};
pub use metadata::{MetaFile, METAFILE_NAME};

use indexmap::IndexMap;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, Span};

use crate::error::{Result, VersionizeError};
use crate::logging::{operations, services, status};
use crate::version::{Version, INITIAL_VERSION};

/// Root directory used when none is given
pub const DEFAULT_ROOT_DIR: &str = "results";

pub struct VersionStore {
    code_version: Version,
    root_dir: PathBuf,
    sub_dir: PathBuf,
    root_key: String,
    root_meta: MetaFile,
    /// Metadata of each version directory, keyed by major version
    dir_meta: HashMap<u64, MetaFile>,
    span: Span,
}

impl VersionStore {
    /// Create a store under the default `results` root
    pub fn new(code_version: Version, sub_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_root(code_version, sub_dir, DEFAULT_ROOT_DIR)
    }

    /// Create a store under `root_dir`
    ///
    /// A missing root is created, but not its parents.
    pub fn with_root(
        code_version: Version,
        sub_dir: impl Into<PathBuf>,
        root_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let root_dir = root_dir.into();
        let sub_dir = sub_dir.into();

        // Only the root itself; a missing parent is an error
        if let Err(e) = fs::create_dir(&root_dir) {
            if e.kind() != io::ErrorKind::AlreadyExists {
                return Err(VersionizeError::io(&root_dir, e));
            }
        }

        let root_key = root_key_for(&root_dir);
        let root_meta = MetaFile::load(&root_dir)?;
        let span = info_span!(
            "version_store",
            dir = %sub_dir.display(),
            code_version = %code_version
        );

        Ok(Self {
            code_version,
            root_dir,
            sub_dir,
            root_key,
            root_meta,
            dir_meta: HashMap::new(),
            span,
        })
    }

    pub fn code_version(&self) -> Version {
        self.code_version
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn sub_dir(&self) -> &Path {
        &self.sub_dir
    }

    /// Key of the root metadata record (the root directory's own name)
    pub fn root_key(&self) -> &str {
        &self.root_key
    }

    /// `root/v<major>/<sub_dir>` for `version`
    pub fn version_directory(&self, version: &Version) -> PathBuf {
        self.root_dir.join(version.dirname()).join(&self.sub_dir)
    }

    /// The version a call would write: `max(flow, code_version)`
    pub fn resolve(&self, flow: Option<Version>) -> Version {
        flow.map_or(self.code_version, |flow| flow.max(self.code_version))
    }

    /// Load the metadata of `version`'s directory unless it is cached
    pub fn ensure_loaded(&mut self, version: &Version) -> Result<&MetaFile> {
        let dir = self.version_directory(version);
        let meta = match self.dir_meta.entry(version.major) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(MetaFile::load(&dir)?),
        };
        Ok(meta)
    }

    /// Version recorded for `tag` in `version`'s directory, `0.0.0` if unset
    pub fn recorded_version(&mut self, tag: &str, version: &Version) -> Result<Version> {
        Ok(self
            .ensure_loaded(version)?
            .version_of(tag)?
            .unwrap_or(INITIAL_VERSION))
    }

    /// All records of `version`'s directory
    pub fn records(&mut self, version: &Version) -> Result<IndexMap<String, String>> {
        Ok(self.ensure_loaded(version)?.records().clone())
    }

    /// Version most recently recorded anywhere under this root
    ///
    /// `None` when the root metadata holds no entry for the root key, i.e.
    /// nothing was ever recorded through a store on this root.
    pub fn current_version(&self) -> Result<Option<Version>> {
        self.root_meta.version_of(&self.root_key)
    }

    /// Version directory of [`current_version`](Self::current_version)
    pub fn current_directory(&self) -> Result<Option<PathBuf>> {
        Ok(self
            .current_version()?
            .map(|version| self.version_directory(&version)))
    }

    /// Version recorded for `tag` in the current directory
    pub fn version_of(&mut self, tag: &str) -> Result<Option<Version>> {
        match self.current_version()? {
            Some(current) => self.ensure_loaded(&current)?.version_of(tag),
            None => Ok(None),
        }
    }

    /// First phase of a gated call: decide whether to run
    ///
    /// On [`Decision::Execute`] the version directory exists and the caller
    /// must write the output to the returned path, then call
    /// [`commit`](Self::commit).
    pub fn prepare(&mut self, tag: &str, flow: Option<Version>, skip: bool) -> Result<Decision> {
        let _span = self.span.clone().entered();

        let requested = self.resolve(flow);
        let recorded = self.recorded_version(tag, &requested)?;

        debug!(
            tag,
            version_record = %recorded,
            version_code = %self.code_version,
            version_flow = %flow.unwrap_or(self.code_version),
            "resolved versions"
        );

        if recorded >= requested && skip {
            info!(
                service = services::STORE,
                operation = operations::PREPARE,
                status = status::SKIP,
                tag,
                version = %recorded,
                "The version {} of {} is the latest, skipping",
                recorded,
                tag
            );
            return Ok(Decision::Skip {
                recorded,
                requested,
            });
        }

        let dir = self.version_directory(&requested);
        fs::create_dir_all(&dir).map_err(|e| VersionizeError::io(&dir, e))?;

        debug!(
            service = services::STORE,
            operation = operations::PREPARE,
            status = status::EXECUTE,
            tag,
            version = %requested,
            output = %dir.join(tag).display(),
            "task is due"
        );

        Ok(Decision::Execute {
            output: dir.join(tag),
            version: requested,
            recorded,
        })
    }

    /// Second phase of a gated call: record `tag` as produced at `version`
    pub fn commit(&mut self, tag: &str, version: &Version) -> Result<()> {
        self.update(tag, version)
    }

    /// Record `tag -> version` in the root and version-directory metadata
    ///
    /// The root record is rewritten first, then the version directory's.
    pub fn update(&mut self, tag: &str, version: &Version) -> Result<()> {
        let _span = self.span.clone().entered();

        // Cached copies only change once their file was written
        let mut root_meta = self.root_meta.clone();
        root_meta.set(&self.root_key, version);
        root_meta.save()?;
        self.root_meta = root_meta;

        let mut meta = self.ensure_loaded(version)?.clone();
        meta.set(tag, version);
        meta.save()?;
        self.dir_meta.insert(version.major, meta);

        info!(
            service = services::STORE,
            operation = operations::COMMIT,
            status = status::SUCCESS,
            tag,
            version = %version,
            "Version updated: {} = {}",
            tag,
            version
        );
        Ok(())
    }

    /// Drop cached metadata and re-read the root record from disk
    pub fn reload(&mut self) -> Result<()> {
        self.dir_meta.clear();
        self.root_meta = MetaFile::load(&self.root_dir)?;
        Ok(())
    }

    /// Start a gated call for `tag` (skip enabled, flow = code version)
    pub fn gate(&mut self, tag: impl Into<String>) -> Gate<'_> {
        Gate::new(self, tag.into())
    }
}

/// Last component of the root, `""` for roots like `.` that have none
fn root_key_for(root_dir: &Path) -> String {
    root_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
