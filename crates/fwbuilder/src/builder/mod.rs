//! Variant build orchestration.
//!
//! Structure:
//! - `spec` - variant specification parsing
//! - `builddir` - build directory staleness and cleanup
//! - `sdkconfig` - scoped overrides of the shared config file
//! - `toolchain` - external build and image-conversion tools
//! - `artifact` - built image lookup
//! - `batch` - sequential orchestration and reporting

pub mod artifact;
pub mod batch;
pub mod builddir;
pub mod sdkconfig;
pub mod spec;
pub mod toolchain;

use anyhow::{bail, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::builder::batch::{Batch, FailurePolicy};
use crate::builder::spec::VariantSpec;
use crate::builder::toolchain::Toolchain;

/// Build commands for the CLI.
#[derive(Subcommand)]
pub enum BuildCommands {
    /// Build firmware variants
    Build {
        /// Variant spec in the form NAME:TEXT or NAME:TEXT:VERSION (can be repeated)
        #[arg(long = "variant", value_name = "SPEC")]
        variants: Vec<VariantSpec>,
        /// Target chip, passed to the build tool via IDF_TARGET
        #[arg(long, default_value = "esp32")]
        idf_target: String,
        /// Directory where the resulting .bin files are copied
        #[arg(long, default_value = "artifacts")]
        output_dir: PathBuf,
        /// Project directory containing the firmware sources
        #[arg(long, default_value = "firmware")]
        project_dir: PathBuf,
        /// Attempt every variant even after one fails
        #[arg(long)]
        keep_going: bool,
        /// Also produce an OTA app image via the image-conversion tool
        #[arg(long)]
        app_image: bool,
    },
    /// Show variant build directories
    Status {
        /// Project directory containing the firmware sources
        #[arg(long, default_value = "firmware")]
        project_dir: PathBuf,
    },
    /// Remove variant build directories
    Clean {
        /// Variant name (omit for all)
        name: Option<String>,
        /// Project directory containing the firmware sources
        #[arg(long, default_value = "firmware")]
        project_dir: PathBuf,
    },
}

/// Options for a `build` run.
pub struct BuildOptions {
    pub variants: Vec<VariantSpec>,
    pub idf_target: String,
    pub output_dir: PathBuf,
    pub project_dir: PathBuf,
    pub keep_going: bool,
    pub app_image: bool,
}

/// Build every requested variant and report the produced binaries.
pub fn build(opts: BuildOptions) -> Result<()> {
    let variants = if opts.variants.is_empty() {
        spec::default_set()
    } else {
        opts.variants
    };

    let toolchain = Toolchain::detect(opts.app_image)?;

    println!("Project directory: {}", opts.project_dir.display());
    println!("Building {} firmware variant(s)...", variants.len());

    let policy = if opts.keep_going {
        FailurePolicy::KeepGoing
    } else {
        FailurePolicy::FailFast
    };

    let batch = Batch {
        toolchain: &toolchain,
        project_dir: &opts.project_dir,
        output_dir: &opts.output_dir,
        target: &opts.idf_target,
        app_image: opts.app_image,
        policy,
    };
    let report = batch.run(&variants)?;

    let produced: Vec<&Path> = report.results().map(|(_, dest)| dest).collect();
    if !produced.is_empty() {
        println!("\nBinaries in {}:", opts.output_dir.display());
        for dest in &produced {
            println!(" - {}", dest.display());
        }
    }

    let failed: Vec<&str> = report.failures().map(|(name, _)| name).collect();
    if !failed.is_empty() {
        bail!("build failed for variant(s): {}", failed.join(", "));
    }

    println!("\n=== All variant builds completed ===");
    Ok(())
}

/// Show each variant build directory and whether it can be reused.
pub fn status(project_dir: &Path) -> Result<()> {
    builddir::status(project_dir)
}

/// Remove one variant's build directory, or all of them.
pub fn clean(project_dir: &Path, name: Option<&str>) -> Result<()> {
    builddir::clean(project_dir, name)
}
