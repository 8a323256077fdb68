//! Variant build directory lifecycle.
//!
//! Each variant builds in `build-<name>` next to the project sources. The
//! CMake cache inside records which project root the directory was
//! configured against; a directory configured for another checkout is
//! useless for an incremental build and gets dropped. A matching cache is
//! left alone so incremental builds stay fast.

#![allow(clippy::cast_precision_loss)] // Directory sizes are display-only

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Cache marker written by the build tool when it configures a directory.
pub const CACHE_FILE: &str = "CMakeCache.txt";

const DIR_PREFIX: &str = "build-";

/// Build directory path for a variant name.
pub fn variant_dir(project_dir: &Path, name: &str) -> PathBuf {
    project_dir.join(format!("{DIR_PREFIX}{name}"))
}

/// Reuse eligibility of an existing build directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reuse {
    /// No readable cache marker; nothing to invalidate.
    Fresh,
    /// Cache matches the current project location.
    Reusable,
    /// Cache was written for a different checkout.
    Stale,
}

/// Classify a build directory against the canonical project path.
///
/// An unreadable cache counts as `Fresh`: it cannot be attributed to any
/// checkout, so the directory is left untouched.
pub fn classify(build_dir: &Path, canonical_project: &str) -> Reuse {
    let Ok(raw) = fs::read(build_dir.join(CACHE_FILE)) else {
        return Reuse::Fresh;
    };
    if String::from_utf8_lossy(&raw).contains(canonical_project) {
        Reuse::Reusable
    } else {
        Reuse::Stale
    }
}

/// Remove an existing build directory if it belongs to another checkout.
pub fn ensure_fresh(build_dir: &Path, project_dir: &Path) -> Result<()> {
    if !build_dir.join(CACHE_FILE).exists() {
        return Ok(());
    }

    let current_project = canonical_project(project_dir)?;
    if classify(build_dir, &current_project) != Reuse::Stale {
        return Ok(());
    }

    println!(
        "  Removing stale build directory {} (cache for a different project location)",
        build_dir.display()
    );
    // Individual entries that refuse to go are not fatal; the build tool
    // reconfigures whatever is left.
    let _ = fs::remove_dir_all(build_dir);
    Ok(())
}

/// Show every variant build directory with its reuse classification.
pub fn status(project_dir: &Path) -> Result<()> {
    println!("Variant build directories:\n");

    let current_project = canonical_project(project_dir)?;
    let dirs = list_variant_dirs(project_dir)?;

    if dirs.is_empty() {
        println!("  (none)");
        return Ok(());
    }

    for dir in dirs {
        let label = match classify(&dir, &current_project) {
            Reuse::Fresh => "fresh",
            Reuse::Reusable => "reusable",
            Reuse::Stale => "stale",
        };
        let size = dir_size(&dir);
        println!(
            "  {:16} [{}] {:.1} MB",
            dir.file_name().and_then(|n| n.to_str()).unwrap_or("?"),
            label,
            size as f64 / 1_000_000.0
        );
    }

    Ok(())
}

/// Remove one variant's build directory, or all of them.
pub fn clean(project_dir: &Path, name: Option<&str>) -> Result<()> {
    if let Some(name) = name {
        let dir = variant_dir(project_dir, name);
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to remove {}", dir.display()))?;
            println!("Cleaned: {name}");
        } else {
            println!("{name} has no build directory");
        }
        return Ok(());
    }

    let dirs = list_variant_dirs(project_dir)?;
    if dirs.is_empty() {
        println!("No variant build directories to clean");
        return Ok(());
    }
    for dir in dirs {
        fs::remove_dir_all(&dir)
            .with_context(|| format!("Failed to remove {}", dir.display()))?;
        println!("Cleaned: {}", dir.display());
    }
    Ok(())
}

/// All `build-*` directories under the project, sorted by name.
fn list_variant_dirs(project_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let entries = match fs::read_dir(project_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(dirs),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Failed to list {}", project_dir.display()))
        }
    };
    for entry in entries {
        let entry = entry?;
        let is_variant = entry.file_name().to_str().is_some_and(|n| n.starts_with(DIR_PREFIX));
        if is_variant && entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn canonical_project(project_dir: &Path) -> Result<String> {
    let canonical = fs::canonicalize(project_dir).with_context(|| {
        format!("Failed to resolve project directory {}", project_dir.display())
    })?;
    Ok(canonical.to_string_lossy().into_owned())
}

/// Directory size in bytes; display-only, 0 when `du` is unavailable.
fn dir_size(path: &Path) -> u64 {
    let Some(path_str) = path.to_str() else {
        return 0;
    };
    let Ok(output) = Command::new("du").args(["-sb", path_str]).output() else {
        return 0;
    };
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project_with_build_dir(name: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let build_dir = variant_dir(tmp.path(), name);
        fs::create_dir_all(&build_dir).unwrap();
        (tmp, build_dir)
    }

    #[test]
    fn test_variant_dir_naming() {
        let dir = variant_dir(Path::new("/proj"), "hello");
        assert_eq!(dir, PathBuf::from("/proj/build-hello"));
    }

    #[test]
    fn test_missing_cache_is_fresh() {
        let (_tmp, build_dir) = project_with_build_dir("a");
        assert_eq!(classify(&build_dir, "/proj"), Reuse::Fresh);
    }

    #[test]
    fn test_matching_cache_is_reusable() {
        let (tmp, build_dir) = project_with_build_dir("a");
        let canonical = fs::canonicalize(tmp.path()).unwrap();
        fs::write(
            build_dir.join(CACHE_FILE),
            format!("CMAKE_HOME_DIRECTORY:INTERNAL={}\n", canonical.display()),
        )
        .unwrap();

        assert_eq!(
            classify(&build_dir, &canonical.to_string_lossy()),
            Reuse::Reusable
        );
    }

    #[test]
    fn test_foreign_cache_is_stale() {
        let (_tmp, build_dir) = project_with_build_dir("a");
        fs::write(
            build_dir.join(CACHE_FILE),
            "CMAKE_HOME_DIRECTORY:INTERNAL=/somewhere/else/project\n",
        )
        .unwrap();

        assert_eq!(classify(&build_dir, "/b/project"), Reuse::Stale);
    }

    #[test]
    fn test_ensure_fresh_removes_stale_directory() {
        let (tmp, build_dir) = project_with_build_dir("a");
        fs::write(
            build_dir.join(CACHE_FILE),
            "CMAKE_HOME_DIRECTORY:INTERNAL=/a/project\n",
        )
        .unwrap();
        fs::write(build_dir.join("leftover.o"), "x").unwrap();

        ensure_fresh(&build_dir, tmp.path()).unwrap();
        assert!(!build_dir.exists());
    }

    #[test]
    fn test_ensure_fresh_keeps_matching_directory() {
        let (tmp, build_dir) = project_with_build_dir("a");
        let canonical = fs::canonicalize(tmp.path()).unwrap();
        fs::write(
            build_dir.join(CACHE_FILE),
            format!("CMAKE_HOME_DIRECTORY:INTERNAL={}\n", canonical.display()),
        )
        .unwrap();
        fs::write(build_dir.join("leftover.o"), "x").unwrap();

        ensure_fresh(&build_dir, tmp.path()).unwrap();
        assert!(build_dir.join("leftover.o").exists());
    }

    #[test]
    fn test_ensure_fresh_ignores_directory_without_cache() {
        let (tmp, build_dir) = project_with_build_dir("a");
        fs::write(build_dir.join("partial.o"), "x").unwrap();

        ensure_fresh(&build_dir, tmp.path()).unwrap();
        assert!(build_dir.join("partial.o").exists());
    }

    #[test]
    fn test_clean_removes_named_directory_only() {
        let (tmp, build_a) = project_with_build_dir("a");
        let build_b = variant_dir(tmp.path(), "b");
        fs::create_dir_all(&build_b).unwrap();

        clean(tmp.path(), Some("a")).unwrap();
        assert!(!build_a.exists());
        assert!(build_b.exists());
    }

    #[test]
    fn test_clean_all_removes_every_variant_directory() {
        let (tmp, build_a) = project_with_build_dir("a");
        let build_b = variant_dir(tmp.path(), "b");
        fs::create_dir_all(&build_b).unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();

        clean(tmp.path(), None).unwrap();
        assert!(!build_a.exists());
        assert!(!build_b.exists());
        assert!(tmp.path().join("src").exists());
    }
}
