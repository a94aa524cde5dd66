//! Runtime directory management.
//!
//! Provides the on-disk layout of a managed Python installation, ensuring the
//! same paths are used by the installer, the executor, and the CLI.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Directory layout of a managed Python runtime.
///
/// ```text
/// <root>/
/// ├── bin/python3    # interpreter executable (Unix)
/// └── python.exe     # interpreter executable (Windows)
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeDirs {
    /// Absolute install root for the runtime.
    pub root: PathBuf,
}

impl RuntimeDirs {
    /// Open the layout rooted at `root`, creating the directory if absent.
    ///
    /// Creation is recursive and idempotent. The root is canonicalized so the
    /// build `--prefix` and the executor's working directory are absolute.
    pub fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        let root = fs::canonicalize(root)?;
        Ok(Self { root })
    }

    /// Path of the interpreter executable inside the install root.
    pub fn python_path(&self) -> PathBuf {
        if cfg!(windows) {
            self.root.join("python.exe")
        } else {
            self.root.join("bin").join("python3")
        }
    }

    /// Whether the interpreter executable is present.
    pub fn is_installed(&self) -> bool {
        self.python_path().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_is_idempotent() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = temp.path().join("runtime");

        let first = RuntimeDirs::create(&root).expect("Failed to create dirs");
        assert!(first.root.exists());

        let second = RuntimeDirs::create(&root).expect("Second create failed");
        assert_eq!(first.root, second.root);
    }

    #[test]
    fn test_python_path_layout() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let dirs = RuntimeDirs::create(temp.path()).expect("Failed to create dirs");

        let python = dirs.python_path();
        if cfg!(windows) {
            assert!(python.ends_with("python.exe"));
        } else {
            assert!(python.ends_with("bin/python3"));
        }
    }

    #[test]
    fn test_is_installed() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let dirs = RuntimeDirs::create(temp.path()).expect("Failed to create dirs");
        assert!(!dirs.is_installed());

        let python = dirs.python_path();
        fs::create_dir_all(python.parent().expect("no parent")).expect("Failed to create bin dir");
        fs::write(&python, "").expect("Failed to write stub");
        assert!(dirs.is_installed());
    }
}
