//! Sequential variant batch.
//!
//! Variants share one config file and one project working directory, so
//! they are built strictly one at a time. Each variant moves through
//! `Pending -> Building -> Succeeded | Failed`; what happens to the rest
//! of the batch after a failure is a policy, not a hardcoded abort.

use crate::builder::sdkconfig::ConfigOverride;
use crate::builder::spec::VariantSpec;
use crate::builder::toolchain::Toolchain;
use crate::builder::{artifact, builddir};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// What to do with the rest of the batch after a variant fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the run on the first failure (default).
    FailFast,
    /// Attempt every variant and report all outcomes.
    KeepGoing,
}

/// Progress state of one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantState {
    Pending,
    Building,
    Succeeded(PathBuf),
    Failed(String),
}

/// Terminal record for one variant.
#[derive(Debug)]
pub struct VariantOutcome {
    pub name: String,
    pub state: VariantState,
}

/// Ordered outcomes of a finished (or aborted) batch.
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<VariantOutcome>,
}

impl BatchReport {
    /// Produced artifacts, in build order.
    pub fn results(&self) -> impl Iterator<Item = (&str, &Path)> + '_ {
        self.outcomes.iter().filter_map(|outcome| match &outcome.state {
            VariantState::Succeeded(dest) => Some((outcome.name.as_str(), dest.as_path())),
            _ => None,
        })
    }

    /// Failed variants with their reasons, in build order.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.outcomes.iter().filter_map(|outcome| match &outcome.state {
            VariantState::Failed(reason) => Some((outcome.name.as_str(), reason.as_str())),
            _ => None,
        })
    }
}

/// Batch configuration shared by every variant.
pub struct Batch<'a> {
    pub toolchain: &'a Toolchain,
    pub project_dir: &'a Path,
    pub output_dir: &'a Path,
    pub target: &'a str,
    pub app_image: bool,
    pub policy: FailurePolicy,
}

impl Batch<'_> {
    /// Build every variant in order.
    ///
    /// With `FailFast` the first failure leaves the remaining variants
    /// `Pending`; with `KeepGoing` all of them are attempted. Either way
    /// the caller decides the final exit status from the report.
    pub fn run(&self, variants: &[VariantSpec]) -> Result<BatchReport> {
        fs::create_dir_all(self.output_dir).with_context(|| {
            format!("Failed to create output directory {}", self.output_dir.display())
        })?;

        let mut outcomes: Vec<VariantOutcome> = variants
            .iter()
            .map(|variant| VariantOutcome {
                name: variant.name.clone(),
                state: VariantState::Pending,
            })
            .collect();

        for (i, variant) in variants.iter().enumerate() {
            outcomes[i].state = VariantState::Building;
            println!(
                "\n=== Building variant '{}' (version {}) ===",
                variant.name, variant.version
            );
            println!("  Greeting: {}", variant.text);

            match self.build_one(variant) {
                Ok(dest) => {
                    println!("  Created: {}", dest.display());
                    outcomes[i].state = VariantState::Succeeded(dest);
                }
                Err(err) => {
                    let reason = format!("{err:#}");
                    eprintln!("  Variant '{}' failed: {reason}", variant.name);
                    outcomes[i].state = VariantState::Failed(reason);
                    if self.policy == FailurePolicy::FailFast {
                        break;
                    }
                }
            }
        }

        Ok(BatchReport { outcomes })
    }

    /// Lifecycle check, scoped config override, build, locate, copy.
    fn build_one(&self, variant: &VariantSpec) -> Result<PathBuf> {
        let build_dir = builddir::variant_dir(self.project_dir, &variant.name);
        builddir::ensure_fresh(&build_dir, self.project_dir)?;

        // The override lives only for the toolchain invocation; the guard
        // restores the config file even when the build errors out.
        {
            let overrides = ConfigOverride::snapshot(self.project_dir)?;
            overrides.apply(&variant.text, variant.version)?;
            self.toolchain
                .build(self.project_dir, &build_dir, self.target, &variant.text)?;
        }

        let image = if self.app_image {
            let elf = artifact::locate_elf(&build_dir)?;
            let app_bin = build_dir.join(format!("{}-app.bin", variant.name));
            self.toolchain.elf2image(self.target, &elf, &app_bin)?;
            app_bin
        } else {
            artifact::locate(&build_dir)?
        };

        let dest = self.output_dir.join(format!("{}.bin", variant.name));
        fs::copy(&image, &dest).with_context(|| {
            format!("Failed to copy {} to {}", image.display(), dest.display())
        })?;
        Ok(dest)
    }
}
