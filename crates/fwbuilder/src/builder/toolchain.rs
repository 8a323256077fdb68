//! External toolchain invocation.
//!
//! The build tool and the image converter are opaque collaborators: this
//! module locates them, runs them with explicit per-invocation environment,
//! and reports their exit status. A hung tool hangs the batch; there is no
//! timeout or retry at this layer.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment variable read by the firmware build scripts to override the
/// compiled-in greeting.
pub const GREETING_ENV: &str = "SLAVE_GREETING_OVERRIDE";
/// Environment variable selecting the target chip for the build tool.
pub const TARGET_ENV: &str = "IDF_TARGET";

const BUILD_TOOL: &str = "idf.py";
const IMAGE_TOOL: &str = "esptool.py";

/// Resolved external tools.
pub struct Toolchain {
    idf: PathBuf,
    esptool: Option<PathBuf>,
}

impl Toolchain {
    /// Locate the build tool on `PATH`, and the image converter when
    /// `app_image` is requested. Fails before any variant is attempted.
    pub fn detect(app_image: bool) -> Result<Self> {
        let idf = which::which(BUILD_TOOL).context(
            "idf.py not found in PATH. Run the ESP-IDF export script first",
        )?;
        let esptool = if app_image {
            Some(which::which(IMAGE_TOOL).context(
                "esptool.py not found in PATH but --app-image was requested",
            )?)
        } else {
            None
        };
        Ok(Self { idf, esptool })
    }

    /// Toolchain with explicit tool paths.
    pub fn new(idf: PathBuf, esptool: Option<PathBuf>) -> Self {
        Self { idf, esptool }
    }

    /// Run the build for one variant.
    ///
    /// The target chip and greeting override are set on this invocation
    /// only; the orchestrator's own environment is never mutated.
    pub fn build(
        &self,
        project_dir: &Path,
        build_dir: &Path,
        target: &str,
        greeting: &str,
    ) -> Result<()> {
        let status = Command::new(&self.idf)
            .arg("-C")
            .arg(project_dir)
            .arg("-B")
            .arg(build_dir)
            .arg("build")
            .env(TARGET_ENV, target)
            .env(GREETING_ENV, greeting)
            .status()
            .with_context(|| format!("Failed to run {}", self.idf.display()))?;

        if !status.success() {
            bail!("Build failed in {}", build_dir.display());
        }
        Ok(())
    }

    /// Convert the linked executable into a flashable app image.
    pub fn elf2image(&self, chip: &str, elf: &Path, output: &Path) -> Result<()> {
        let Some(esptool) = &self.esptool else {
            bail!("image converter was not located; app image generation is unavailable");
        };

        let status = Command::new(esptool)
            .arg("--chip")
            .arg(chip)
            .arg("elf2image")
            .args(["--flash_mode", "dio", "--flash_freq", "40m", "--flash_size", "4MB"])
            .arg("-o")
            .arg(output)
            .arg(elf)
            .status()
            .with_context(|| format!("Failed to run {}", esptool.display()))?;

        if !status.success() {
            bail!("App image conversion failed for {}", elf.display());
        }
        Ok(())
    }
}
