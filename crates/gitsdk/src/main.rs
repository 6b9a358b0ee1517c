//! gitsdk CLI binary.
//!
//! Two-phase surface mirroring the library: `resolve` prints the stable
//! artifact id (cheap, one listing query), `download` resolves and then
//! fetches and extracts the archive.

// The CLI prints its results to stdout by design.
#![allow(clippy::print_stdout)]

mod cli;

use clap::Parser;
use miette::IntoDiagnostic;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use gitsdk_azure::SdkResolver;

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Resolve {
            flavor,
            arch,
            base_url,
        } => {
            let resolved = resolver(base_url, None)
                .resolve(flavor, arch)
                .await
                .into_diagnostic()?;
            println!("{}", resolved.id);
        }
        Command::Download {
            flavor,
            arch,
            output_dir,
            base_url,
            tar,
            verbose,
            progress_every,
        } => {
            let resolved = resolver(base_url, Some(tar))
                .resolve(flavor, arch)
                .await
                .into_diagnostic()?;

            info!(id = %resolved.id, output_dir = %output_dir.display(), "Fetching SDK");

            resolved
                .download(&output_dir, cli::verbosity(verbose, progress_every))
                .await
                .into_diagnostic()?;

            println!("{}", resolved.id);
        }
    }

    Ok(())
}

fn resolver(base_url: Option<String>, unpack_tool: Option<PathBuf>) -> SdkResolver {
    let resolver = match base_url {
        Some(url) => SdkResolver::with_base_url(url),
        None => SdkResolver::new(),
    };
    match unpack_tool {
        Some(tool) => resolver.with_unpack_tool(tool),
        None => resolver,
    }
}
