use directories::ProjectDirs;
use std::path::PathBuf;

/// Default storage root under the platform data directory.
pub fn default_storage_root() -> PathBuf {
    ProjectDirs::from("", "", "hondana")
        .map(|dirs| dirs.data_dir().join("library"))
        .unwrap_or_else(|| PathBuf::from("./hondana-library"))
}
