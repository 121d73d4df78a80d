/// Per-directory version metadata (`.metaversion`)
///
/// Each directory of a store tree carries one JSON object mapping a key
/// (an output tag, or the root directory's name) to a version string.
/// Files are always rewritten whole. The byte layout matches the files
/// produced by Python's `json.dump`, so existing trees stay readable by
/// both sides.
use indexmap::IndexMap;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, VersionizeError};
use crate::version::Version;

/// File name of the metadata record inside each directory
pub const METAFILE_NAME: &str = ".metaversion";

/// In-memory copy of one directory's metadata file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaFile {
    dir: PathBuf,
    records: IndexMap<String, String>,
}

impl MetaFile {
    /// Load the metadata of `dir`
    ///
    /// A missing directory is created together with an empty metadata file.
    /// An existing directory without a metadata file yields an empty record
    /// set and nothing is written.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| VersionizeError::io(dir, e))?;
            let meta = Self::empty(dir);
            meta.save()?;
            debug!(
                operation = "load",
                status = "initialized",
                dir = %dir.display(),
                "created empty metadata"
            );
            return Ok(meta);
        }

        let path = dir.join(METAFILE_NAME);
        if !path.exists() {
            return Ok(Self::empty(dir));
        }

        let content = fs::read_to_string(&path).map_err(|e| VersionizeError::io(&path, e))?;
        let records: IndexMap<String, String> = serde_json::from_str(&content)
            .map_err(|source| VersionizeError::CorruptMetadata {
                path: path.clone(),
                source,
            })?;

        debug!(
            operation = "load",
            status = "success",
            path = %path.display(),
            entry_count = records.len(),
            "loaded metadata"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            records,
        })
    }

    pub fn empty(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            records: IndexMap::new(),
        }
    }

    /// Replace the metadata file with the current records
    pub fn save(&self) -> Result<()> {
        let path = self.path();
        let bytes = encode(&self.records).map_err(|source| VersionizeError::Encode {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, bytes).map_err(|e| VersionizeError::io(&path, e))?;

        debug!(
            operation = "save",
            status = "success",
            path = %path.display(),
            entry_count = self.records.len(),
            "wrote metadata"
        );
        Ok(())
    }

    /// Version recorded under `key`, if any
    pub fn version_of(&self, key: &str) -> Result<Option<Version>> {
        match self.records.get(key) {
            None => Ok(None),
            Some(raw) => Version::parse(raw)
                .map(Some)
                .map_err(|e| VersionizeError::CorruptRecord {
                    path: self.path(),
                    key: key.to_string(),
                    source: Box::new(e),
                }),
        }
    }

    pub fn set(&mut self, key: &str, version: &Version) {
        self.records.insert(key.to_string(), version.to_string());
    }

    pub fn records(&self) -> &IndexMap<String, String> {
        &self.records
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(METAFILE_NAME)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn encode(records: &IndexMap<String, String>) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PythonCompatFormatter);
    records.serialize(&mut ser)?;
    Ok(buf)
}

/// `json.dump` defaults: `", "` and `": "` separators, ASCII-only output
struct PythonCompatFormatter;

impl serde_json::ser::Formatter for PythonCompatFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(fragment[start..idx].as_bytes())?;
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_dir_creates_empty_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("results/v1/task1");

        let meta = MetaFile::load(&dir).unwrap();

        assert!(meta.is_empty());
        assert!(dir.is_dir());
        assert_eq!(fs::read_to_string(dir.join(METAFILE_NAME)).unwrap(), "{}");
    }

    #[test]
    fn test_load_existing_dir_without_file_writes_nothing() {
        let temp = TempDir::new().unwrap();

        let meta = MetaFile::load(temp.path()).unwrap();

        assert!(meta.is_empty());
        assert!(!temp.path().join(METAFILE_NAME).exists());
    }

    #[test]
    fn test_save_failure_is_io_error() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(METAFILE_NAME)).unwrap();
        let mut meta = MetaFile::empty(temp.path());
        meta.set("out.txt", &Version::new(1, 0, 0));

        let err = meta.save().unwrap_err();

        assert!(matches!(err, VersionizeError::Io { .. }));
    }

    #[test]
    fn test_save_matches_python_layout() {
        let temp = TempDir::new().unwrap();
        let mut meta = MetaFile::empty(temp.path());
        meta.set("filesave.txt", &Version::new(1, 0, 1));
        meta.set("parameter.txt", &Version::new(1, 0, 2));
        meta.save().unwrap();

        let written = fs::read_to_string(temp.path().join(METAFILE_NAME)).unwrap();
        assert_eq!(
            written,
            r#"{"filesave.txt": "1.0.1", "parameter.txt": "1.0.2"}"#
        );
    }

    #[test]
    fn test_save_escapes_non_ascii_like_python() {
        let temp = TempDir::new().unwrap();
        let mut meta = MetaFile::empty(temp.path());
        meta.set("résumé.txt", &Version::new(1, 0, 0));
        meta.set("😀", &Version::new(2, 0, 0));
        meta.save().unwrap();

        let written = fs::read_to_string(temp.path().join(METAFILE_NAME)).unwrap();
        assert_eq!(
            written,
            r#"{"r\u00e9sum\u00e9.txt": "1.0.0", "\ud83d\ude00": "2.0.0"}"#
        );

        let reloaded = MetaFile::load(temp.path()).unwrap();
        assert_eq!(reloaded, meta);
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let temp = TempDir::new().unwrap();
        let mut meta = MetaFile::empty(temp.path());
        meta.set("zeta", &Version::new(0, 1, 0));
        meta.set("alpha", &Version::new(0, 2, 0));
        meta.save().unwrap();

        let reloaded = MetaFile::load(temp.path()).unwrap();
        let keys: Vec<&String> = reloaded.records().keys().collect();
        assert_eq!(keys, ["zeta", "alpha"]);
        assert_eq!(reloaded, meta);
    }

    #[test]
    fn test_corrupt_json_is_fatal() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(METAFILE_NAME), "{not json").unwrap();

        let err = MetaFile::load(temp.path()).unwrap_err();
        assert!(matches!(err, VersionizeError::CorruptMetadata { .. }));
    }

    #[test]
    fn test_non_string_values_are_fatal() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(METAFILE_NAME), r#"{"out.txt": 1}"#).unwrap();

        let err = MetaFile::load(temp.path()).unwrap_err();
        assert!(matches!(err, VersionizeError::CorruptMetadata { .. }));
    }

    #[test]
    fn test_malformed_version_value_is_reported_on_lookup() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(METAFILE_NAME), r#"{"out.txt": "one"}"#).unwrap();

        let meta = MetaFile::load(temp.path()).unwrap();
        let err = meta.version_of("out.txt").unwrap_err();
        assert!(matches!(err, VersionizeError::CorruptRecord { .. }));
        assert!(meta.version_of("other.txt").unwrap().is_none());
    }
}
