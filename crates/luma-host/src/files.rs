use std::fs;
use std::path::{Path, PathBuf};

use luma_engine::platform::files::{trim_dir, FileLocation, FileSystem};

/// [`FileSystem`] over two directories on disk: the read-only asset root and
/// the writable app-data root.
#[derive(Debug, Clone)]
pub struct DiskFileSystem {
    assets: PathBuf,
    app_data: PathBuf,
}

impl DiskFileSystem {
    pub fn new(assets: impl Into<PathBuf>, app_data: impl Into<PathBuf>) -> Self {
        Self {
            assets: assets.into(),
            app_data: app_data.into(),
        }
    }

    fn root(&self, location: FileLocation) -> &Path {
        match location {
            FileLocation::Assets => &self.assets,
            FileLocation::AppData => &self.app_data,
        }
    }

    fn resolve(&self, path: &str, location: FileLocation) -> PathBuf {
        let mut full = self.root(location).to_path_buf();
        full.extend(trim_dir(path).split('/').filter(|part| !part.is_empty()));
        full
    }
}

impl FileSystem for DiskFileSystem {
    fn is_file(&self, path: &str, location: FileLocation) -> bool {
        self.resolve(path, location).is_file()
    }

    fn is_directory(&self, path: &str, location: FileLocation) -> bool {
        self.resolve(path, location).is_dir()
    }

    fn file_list(&self, dir: &str, location: FileLocation) -> Vec<String> {
        let full = self.resolve(dir, location);
        let entries = match fs::read_dir(&full) {
            Ok(entries) => entries,
            Err(err) => {
                log::debug!("Cannot list {}: {err}", full.display());
                return Vec::new();
            }
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        names
    }

    fn read_file(&self, path: &str, location: FileLocation) -> Option<Vec<u8>> {
        let full = self.resolve(path, location);
        match fs::read(&full) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                log::debug!("Cannot read {}: {err}", full.display());
                None
            }
        }
    }

    fn write_file(&mut self, path: &str, data: &[u8], location: FileLocation) -> bool {
        if location == FileLocation::Assets {
            log::error!("Attempt to write \"{path}\" into the read-only asset root");
            return false;
        }
        let full = self.resolve(path, location);
        if let Some(parent) = full.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                log::error!("Cannot create {}: {err}", parent.display());
                return false;
            }
        }
        match fs::write(&full, data) {
            Ok(()) => true,
            Err(err) => {
                log::error!("Cannot write {}: {err}", full.display());
                false
            }
        }
    }
}
