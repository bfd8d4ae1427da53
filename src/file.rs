//! Filesystem access and config file discovery.
//!
//! All reads and writes go through a [`FileSystem`] so the loader and
//! [`dump_config`](crate::dump_config) can run against [`MemFs`] in tests.
//!
//! # Discovery
//!
//! A config *name* (e.g. `config`) is looked up in each search directory in
//! order. Within a directory the extensions in
//! [`Format::SEARCH_EXTENSIONS`] are tried in turn and the first existing file
//! wins. Missing files are skipped; only real I/O errors surface.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{ConfigError, Result};
use crate::types::Format;
use crate::value::Mapping;

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    fn is_file(&self, path: &Path) -> bool;

    /// Create `path` with `contents`, failing if it already exists.
    fn create_new(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl FileSystem for OsFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn create_new(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }
        let mut file = options.open(path)?;
        file.write_all(contents)?;
        file.sync_all()
    }
}

/// An in-memory filesystem. Clones share the same files.
#[derive(Debug, Clone, Default)]
pub struct MemFs {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write (or overwrite) a file.
    pub fn insert(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        self.lock().insert(normalize(path.as_ref()), contents.into());
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.lock()
            .get(&normalize(path.as_ref()))
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Vec<u8>>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

impl FileSystem for MemFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let files = self.lock();
        let bytes = files
            .get(&normalize(path))
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        String::from_utf8(bytes.clone()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.lock().contains_key(&normalize(path))
    }

    fn create_new(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut files = self.lock();
        let key = normalize(path);
        if files.contains_key(&key) {
            return Err(io::Error::from(io::ErrorKind::AlreadyExists));
        }
        files.insert(key, contents.to_vec());
        Ok(())
    }
}

/// Find the first `{dir}/{name}.{ext}` that exists, searching `dirs` in order.
pub fn find_config_file(fs: &dyn FileSystem, dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
    dirs.iter().find_map(|dir| {
        Format::SEARCH_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{name}.{ext}")))
            .find(|candidate| fs.is_file(candidate))
    })
}

/// Read and parse one config file, picking the format from its extension.
pub fn load_document(fs: &dyn FileSystem, path: &Path) -> Result<Mapping> {
    let format = Format::from_path(path)?;
    let content = fs.read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    format.parse(&content, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn finds_first_extension_in_order() {
        let fs = MemFs::new();
        fs.insert("/etc/app/config.yaml", "a: 1");
        fs.insert("/etc/app/config.json", r#"{"a": 2}"#);
        let found = find_config_file(&fs, &[PathBuf::from("/etc/app")], "config");
        assert_eq!(found, Some(PathBuf::from("/etc/app/config.json")));
    }

    #[test]
    fn earlier_directory_wins() {
        let fs = MemFs::new();
        fs.insert("/a/config.toml", "");
        fs.insert("/b/config.json", "{}");
        let dirs = [PathBuf::from("/a"), PathBuf::from("/b")];
        assert_eq!(
            find_config_file(&fs, &dirs, "config"),
            Some(PathBuf::from("/a/config.toml"))
        );
    }

    #[test]
    fn missing_name_is_none() {
        let fs = MemFs::new();
        assert_eq!(find_config_file(&fs, &[PathBuf::from(".")], "config"), None);
    }

    #[test]
    fn memfs_ignores_current_dir_components() {
        let fs = MemFs::new();
        fs.insert("config.yml", "k: v");
        assert!(fs.is_file(Path::new("./config.yml")));
        let doc = load_document(&fs, Path::new("./config.yml")).unwrap();
        assert_eq!(doc["k"], Value::from("v"));
    }

    #[test]
    fn memfs_create_new_refuses_existing() {
        let fs = MemFs::new();
        fs.create_new(Path::new("/out.json"), b"{}").unwrap();
        let err = fs.create_new(Path::new("/out.json"), b"{}").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn load_document_reports_missing_file() {
        let fs = MemFs::new();
        let err = load_document(&fs, Path::new("/nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }

    #[test]
    fn osfs_reads_and_creates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "port = 3000\n").unwrap();
        let doc = load_document(&OsFs, &path).unwrap();
        assert_eq!(doc["port"], Value::Integer(3000));

        let out = dir.path().join("out.json");
        OsFs.create_new(&out, b"{}").unwrap();
        assert!(OsFs.create_new(&out, b"{}").is_err());
        assert_eq!(fs::read_to_string(&out).unwrap(), "{}");
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_returns_io_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

        // Root can read anything; only assert when the permission bit bites.
        if fs::read_to_string(&path).is_err() {
            assert!(matches!(
                load_document(&OsFs, &path),
                Err(ConfigError::IoError { .. })
            ));
        }

        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
    }
}
