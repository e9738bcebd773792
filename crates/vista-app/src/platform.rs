//! Platform directory resolution.

use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur during platform operations.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The OS did not provide a configuration directory.
    #[error("could not determine OS configuration directory")]
    NoConfigDir,
    /// Directory creation failed.
    #[error("platform I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Where the `vista` binary keeps its files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformDirs {
    /// Holds `config.ron`.
    pub config_dir: PathBuf,
    /// Holds `vista.log`.
    pub log_dir: PathBuf,
}

const APP_NAME: &str = "vista";

impl PlatformDirs {
    /// Resolve directories without creating them. An explicit `config_dir`
    /// (the `--config` flag) replaces the OS location.
    pub fn resolve(config_dir: Option<&Path>) -> Result<Self, PlatformError> {
        match config_dir {
            Some(dir) => Ok(Self::rooted_at(dir.to_path_buf())),
            None => {
                let base = dirs::config_dir().ok_or(PlatformError::NoConfigDir)?;
                Ok(Self::rooted_at(base.join(APP_NAME)))
            }
        }
    }

    fn rooted_at(config_dir: PathBuf) -> Self {
        Self {
            log_dir: config_dir.join("logs"),
            config_dir,
        }
    }

    /// Create all directories on disk.
    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_dir_overrides_os_location() {
        let dirs = PlatformDirs::resolve(Some(Path::new("/tmp/vista-custom"))).unwrap();
        assert_eq!(dirs.config_dir, PathBuf::from("/tmp/vista-custom"));
        assert_eq!(dirs.log_dir, PathBuf::from("/tmp/vista-custom/logs"));
    }

    #[test]
    fn test_os_location_ends_with_app_name() {
        if let Ok(dirs) = PlatformDirs::resolve(None) {
            assert!(dirs.config_dir.ends_with(APP_NAME));
            assert!(dirs.log_dir.starts_with(&dirs.config_dir));
        }
    }

    #[test]
    fn test_create_dirs() {
        let root = tempfile::tempdir().unwrap();
        let dirs = PlatformDirs::resolve(Some(&root.path().join("nested"))).unwrap();
        dirs.create_dirs().unwrap();
        assert!(dirs.config_dir.is_dir());
        assert!(dirs.log_dir.is_dir());
    }
}
