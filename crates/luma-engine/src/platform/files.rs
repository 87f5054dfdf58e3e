//! File system seam.
//!
//! The engine never touches the disk directly. Hosts hand it a [`FileSystem`]
//! and every asset/config read goes through it. Paths are `/`-separated and
//! relative to the root of the given [`FileLocation`]; the empty string is the
//! root directory itself.

use std::collections::{BTreeMap, BTreeSet};

/// Root a path is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileLocation {
    /// Read-only game assets shipped with the application.
    Assets,
    /// Writable per-application storage (cached generated textures).
    AppData,
}

/// Synchronous, infallible-by-contract file access.
///
/// Failures are reported as `false`/`None`/empty, never as panics.
pub trait FileSystem {
    fn is_file(&self, path: &str, location: FileLocation) -> bool;

    fn is_directory(&self, path: &str, location: FileLocation) -> bool;

    /// Names (not full paths) of the files and folders directly inside `dir`.
    fn file_list(&self, dir: &str, location: FileLocation) -> Vec<String>;

    fn read_file(&self, path: &str, location: FileLocation) -> Option<Vec<u8>>;

    fn write_file(&mut self, path: &str, data: &[u8], location: FileLocation) -> bool;

    /// Read a file and interpret it as UTF-8.
    fn read_to_string(&self, path: &str, location: FileLocation) -> Option<String> {
        self.read_file(path, location)
            .and_then(|bytes| String::from_utf8(bytes).ok())
    }
}

/// Strip leading and trailing separators so `"ui/"`, `"/ui"` and `"ui"` agree.
pub fn trim_dir(dir: &str) -> &str {
    dir.trim_matches('/')
}

/// Join a directory and an entry name with exactly one separator.
pub fn join(dir: &str, name: &str) -> String {
    let dir = trim_dir(dir);
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// In-memory file tree. Used by embedders that pack assets into the binary
/// and by tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryFileSystem {
    files: BTreeMap<(FileLocation, String), Vec<u8>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert into [`FileLocation::Assets`].
    pub fn with_file(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data, FileLocation::Assets);
        self
    }

    pub fn insert(&mut self, path: &str, data: impl Into<Vec<u8>>, location: FileLocation) {
        self.files
            .insert((location, trim_dir(path).to_string()), data.into());
    }

    pub fn remove(&mut self, path: &str, location: FileLocation) -> bool {
        self.files
            .remove(&(location, trim_dir(path).to_string()))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn paths(&self, location: FileLocation) -> impl Iterator<Item = &str> {
        self.files
            .keys()
            .filter(move |(loc, _)| *loc == location)
            .map(|(_, path)| path.as_str())
    }
}

impl FileSystem for MemoryFileSystem {
    fn is_file(&self, path: &str, location: FileLocation) -> bool {
        self.files
            .contains_key(&(location, trim_dir(path).to_string()))
    }

    fn is_directory(&self, path: &str, location: FileLocation) -> bool {
        let dir = trim_dir(path);
        if dir.is_empty() {
            return true;
        }
        let prefix = format!("{dir}/");
        self.paths(location).any(|p| p.starts_with(&prefix))
    }

    fn file_list(&self, dir: &str, location: FileLocation) -> Vec<String> {
        let dir = trim_dir(dir);
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        let names: BTreeSet<&str> = self
            .paths(location)
            .filter_map(|p| p.strip_prefix(prefix.as_str()))
            .map(|rest| rest.split('/').next().unwrap_or(rest))
            .collect();
        names.into_iter().map(str::to_string).collect()
    }

    fn read_file(&self, path: &str, location: FileLocation) -> Option<Vec<u8>> {
        self.files
            .get(&(location, trim_dir(path).to_string()))
            .cloned()
    }

    fn write_file(&mut self, path: &str, data: &[u8], location: FileLocation) -> bool {
        self.insert(path, data, location);
        true
    }
}
