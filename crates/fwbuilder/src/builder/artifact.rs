//! Built image lookup inside a finished build directory.
//!
//! The build tool does not guarantee where its primary output lands across
//! configurations, so two independent metadata sources are consulted in
//! priority order. Each strategy is a pure function from build-directory
//! state to an optional path.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PROJECT_NAME_FILE: &str = "project_name.txt";
const DESCRIPTION_FILE: &str = "project_description.json";

/// No metadata source yielded an existing image file.
#[derive(Debug, Error)]
#[error(
    "project_name.txt or project_description.json did not yield a firmware image in {}. \
     Run 'idf.py reconfigure' there and retry",
    .build_dir.display()
)]
pub struct ArtifactNotFound {
    build_dir: PathBuf,
}

/// Flat view of `project_description.json`; only the fields used for image
/// lookup are kept, everything else is ignored.
#[derive(Deserialize)]
struct ProjectDescription {
    app_bin: Option<String>,
    project_name: Option<String>,
}

type Strategy = fn(&Path) -> Option<PathBuf>;

/// Lookup strategies in priority order; the first hit wins.
const STRATEGIES: &[Strategy] = &[from_project_name, from_description];

/// Resolve the built image for a finished build directory.
pub fn locate(build_dir: &Path) -> Result<PathBuf, ArtifactNotFound> {
    STRATEGIES
        .iter()
        .find_map(|strategy| strategy(build_dir))
        .ok_or_else(|| ArtifactNotFound {
            build_dir: build_dir.to_path_buf(),
        })
}

/// Resolve the linked executable, for app image conversion.
pub fn locate_elf(build_dir: &Path) -> Result<PathBuf, ArtifactNotFound> {
    project_name(build_dir)
        .and_then(|name| existing(build_dir.join(format!("{name}.elf"))))
        .ok_or_else(|| ArtifactNotFound {
            build_dir: build_dir.to_path_buf(),
        })
}

/// `project_name.txt` holds the bare project name; the image sits next to
/// it as `<project>.bin`.
fn from_project_name(build_dir: &Path) -> Option<PathBuf> {
    let raw = fs::read_to_string(build_dir.join(PROJECT_NAME_FILE)).ok()?;
    let name = raw.trim();
    if name.is_empty() {
        return None;
    }
    existing(build_dir.join(format!("{name}.bin")))
}

/// `project_description.json` names the image directly (`app_bin`) or via
/// the project name. Unparseable JSON yields nothing rather than failing.
fn from_description(build_dir: &Path) -> Option<PathBuf> {
    let raw = fs::read(build_dir.join(DESCRIPTION_FILE)).ok()?;
    let desc: ProjectDescription = serde_json::from_slice(&raw).ok()?;

    if let Some(app_bin) = desc.app_bin {
        if let Some(path) = existing(build_dir.join(app_bin)) {
            return Some(path);
        }
    }
    let name = desc.project_name?;
    existing(build_dir.join(format!("{name}.bin")))
}

fn project_name(build_dir: &Path) -> Option<String> {
    if let Ok(raw) = fs::read_to_string(build_dir.join(PROJECT_NAME_FILE)) {
        let name = raw.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    let raw = fs::read(build_dir.join(DESCRIPTION_FILE)).ok()?;
    let desc: ProjectDescription = serde_json::from_slice(&raw).ok()?;
    desc.project_name
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.exists().then_some(path)
}
