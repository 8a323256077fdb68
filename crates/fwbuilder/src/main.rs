//! # fwbuilder
//!
//! Build greeting-variant firmware binaries from a single ESP-IDF project.
//!
//! ## Usage
//!
//! ```bash
//! fwbuilder build                                    # build the default variants
//! fwbuilder build --variant night:"Good night":3     # one labeled variant
//! fwbuilder build --keep-going --app-image           # attempt all, emit OTA images
//! fwbuilder status                                   # show variant build directories
//! fwbuilder clean bye                                # drop one build directory
//! ```
//!
//! Each variant rebuilds the same project with its own greeting text and
//! firmware version, then copies the resulting image to `<output>/<name>.bin`.

use anyhow::Result;
use clap::Parser;

mod builder;

#[derive(Parser)]
#[command(name = "fwbuilder", about = "Firmware variant build orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: builder::BuildCommands,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        builder::BuildCommands::Build {
            variants,
            idf_target,
            output_dir,
            project_dir,
            keep_going,
            app_image,
        } => builder::build(builder::BuildOptions {
            variants,
            idf_target,
            output_dir,
            project_dir,
            keep_going,
            app_image,
        })?,
        builder::BuildCommands::Status { project_dir } => builder::status(&project_dir)?,
        builder::BuildCommands::Clean { name, project_dir } => {
            builder::clean(&project_dir, name.as_deref())?;
        }
    }

    Ok(())
}
