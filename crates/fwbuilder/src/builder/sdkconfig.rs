//! Scoped overrides of the shared `sdkconfig.defaults` file.
//!
//! Every variant builds against the same config file, so the override is
//! a critical section: snapshot, append, build, restore. The guard's
//! `Drop` restores the original bytes whether the build succeeded, failed,
//! or panicked.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Config file read by the build tool from the project directory.
pub const FILE_NAME: &str = "sdkconfig.defaults";

/// Guard over the shared config file.
///
/// While alive, the file carries the variant's version and greeting lines.
/// Dropping the guard puts the exact original content back, deleting the
/// file if it did not exist before the snapshot.
pub struct ConfigOverride {
    path: PathBuf,
    original: Option<Vec<u8>>,
}

impl ConfigOverride {
    /// Snapshot the current state of `sdkconfig.defaults` in `project_dir`,
    /// before any mutation.
    pub fn snapshot(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(FILE_NAME);
        let original = match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        Ok(Self { path, original })
    }

    /// Append the variant's override lines, creating the file if absent.
    pub fn apply(&self, text: &str, version: i64) -> Result<()> {
        let mut contents = self.original.clone().unwrap_or_default();
        contents.extend_from_slice(
            format!("\nCONFIG_SLAVE_FW_VERSION={version}\nCONFIG_SLAVE_GREETING=\"{text}\"\n")
                .as_bytes(),
        );
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

impl Drop for ConfigOverride {
    fn drop(&mut self) {
        let result = match self.original.take() {
            Some(bytes) => fs::write(&self.path, bytes),
            None => match fs::remove_file(&self.path) {
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        if let Err(err) = result {
            eprintln!("  Warning: failed to restore {}: {}", self.path.display(), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use tempfile::TempDir;

    #[test]
    fn test_appends_override_lines_while_alive() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(FILE_NAME), "CONFIG_BASE=y\n").unwrap();

        let overrides = ConfigOverride::snapshot(tmp.path()).unwrap();
        overrides.apply("Good morning", 7).unwrap();

        let contents = fs::read_to_string(tmp.path().join(FILE_NAME)).unwrap();
        assert!(contents.starts_with("CONFIG_BASE=y\n"));
        assert!(contents.contains("CONFIG_SLAVE_FW_VERSION=7"));
        assert!(contents.contains("CONFIG_SLAVE_GREETING=\"Good morning\""));
    }

    #[test]
    fn test_restores_existing_content_on_drop() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(FILE_NAME);
        fs::write(&path, "CONFIG_BASE=y\nCONFIG_OTHER=\"x\"\n").unwrap();

        {
            let overrides = ConfigOverride::snapshot(tmp.path()).unwrap();
            overrides.apply("hi", 2).unwrap();
        }

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "CONFIG_BASE=y\nCONFIG_OTHER=\"x\"\n"
        );
    }

    #[test]
    fn test_removes_created_file_on_drop() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(FILE_NAME);
        assert!(!path.exists());

        {
            let overrides = ConfigOverride::snapshot(tmp.path()).unwrap();
            overrides.apply("hi", 1).unwrap();
            assert!(path.exists());
        }

        assert!(!path.exists());
    }

    #[test]
    fn test_restores_on_panic() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(FILE_NAME);
        fs::write(&path, "CONFIG_BASE=y\n").unwrap();

        let result = catch_unwind(AssertUnwindSafe(|| {
            let overrides = ConfigOverride::snapshot(tmp.path()).unwrap();
            overrides.apply("hi", 3).unwrap();
            panic!("simulated build interruption");
        }));
        assert!(result.is_err());

        assert_eq!(fs::read_to_string(&path).unwrap(), "CONFIG_BASE=y\n");
    }

    #[test]
    fn test_snapshot_alone_does_not_touch_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(FILE_NAME);
        fs::write(&path, "CONFIG_BASE=y\n").unwrap();

        let overrides = ConfigOverride::snapshot(tmp.path()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "CONFIG_BASE=y\n");
        drop(overrides);
        assert_eq!(fs::read_to_string(&path).unwrap(), "CONFIG_BASE=y\n");
    }
}
