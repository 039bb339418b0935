//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `build`: manifest, production and development variants, external stages
//! - `patch`: a single copy-and-patch run
//! - `manifest`: write `dependencies.json`
//! - `exports`: print what the export extractor sees in one file
//! - `init`: write a default `.flatstackrc.json`

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Build(cmd)) => cmd.common.verbose,
            Some(Command::Patch(cmd)) => cmd.common.verbose,
            Some(Command::Manifest(cmd)) => cmd.common.verbose,
            Some(Command::Exports(_)) | Some(Command::Init) | None => false,
        }
    }
}

/// Common arguments shared by the commands that touch the source tree.
#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// Directory containing the repository checkouts (overrides config file)
    #[arg(long, env = "FLATSTACK_SOURCE_ROOT")]
    pub source_root: Option<PathBuf>,

    /// Directory the flattened tree is written into (overrides config file)
    #[arg(long, env = "FLATSTACK_DEST_ROOT")]
    pub dest_root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct BuildCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Only write the trees and the manifest; do not run external stages
    #[arg(long)]
    pub skip_stages: bool,
}

#[derive(Debug, Args)]
pub struct PatchCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Keep debug guards (assertions and logging)
    #[arg(long)]
    pub keep_assertions: bool,

    /// Keep namespace registrations
    #[arg(long)]
    pub keep_namespaces: bool,
}

#[derive(Debug, Args)]
pub struct ManifestCommand {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct ExportsCommand {
    /// Source file to inspect
    pub file: PathBuf,

    /// Print JSON instead of a listing
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write the manifest, both output variants, and run the configured stages
    Build(BuildCommand),
    /// Copy and patch every repository once
    Patch(PatchCommand),
    /// Record the revision and branch of every repository
    Manifest(ManifestCommand),
    /// Show the exports of one source file
    Exports(ExportsCommand),
    /// Initialize a new .flatstackrc.json configuration file
    Init,
}
