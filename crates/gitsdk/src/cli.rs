//! Command-line interface definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use gitsdk_core::progress::Verbosity;
use gitsdk_core::sdk::{Arch, Flavor};

/// Fetch pre-built Git SDK artifacts from the CI build service.
#[derive(Debug, Parser)]
#[command(name = "gitsdk", version, about)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve the latest matching build and print the artifact id.
    Resolve {
        /// SDK flavor (minimal, makepkg-git, full, build-installers).
        #[arg(long)]
        flavor: Flavor,

        /// Target architecture (x86_64 or i686).
        #[arg(long, default_value = "x86_64")]
        arch: Arch,

        /// Build-listing endpoint override.
        #[arg(long, env = "GITSDK_BASE_URL")]
        base_url: Option<String>,
    },

    /// Resolve, download, and extract the artifact.
    Download {
        /// SDK flavor (minimal, makepkg-git, full, build-installers).
        #[arg(long)]
        flavor: Flavor,

        /// Target architecture (x86_64 or i686).
        #[arg(long, default_value = "x86_64")]
        arch: Arch,

        /// Directory to extract into; created if missing.
        #[arg(long)]
        output_dir: PathBuf,

        /// Build-listing endpoint override.
        #[arg(long, env = "GITSDK_BASE_URL")]
        base_url: Option<String>,

        /// Tool used to unpack inner archives.
        #[arg(long, value_name = "PATH", default_value = "tar")]
        tar: PathBuf,

        /// Report every extracted entry.
        #[arg(short, long, conflicts_with = "progress_every")]
        verbose: bool,

        /// Report a running count every N entries.
        #[arg(long, value_name = "N")]
        progress_every: Option<u64>,
    },
}

/// Map the download flags onto an extraction verbosity.
#[must_use]
pub fn verbosity(verbose: bool, progress_every: Option<u64>) -> Verbosity {
    match (verbose, progress_every) {
        (_, Some(n)) => Verbosity::Every(n),
        (true, None) => Verbosity::PerEntry,
        (false, None) => Verbosity::Quiet,
    }
}
