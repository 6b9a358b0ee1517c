//! Artifact resolution against the Azure Pipelines build-listing service.
//!
//! Resolution is two chained JSON lookups: the most recent completed and
//! succeeded build of a definition, then that build's artifact listing. The
//! result is a [`ResolvedArtifact`] - a cheap, stable identity that can
//! later download and extract the actual archive.

mod client;
mod resolver;

pub use client::{default_client, fetch_json};
pub use resolver::{DEFAULT_BASE_URL, ResolvedArtifact, SdkResolver};
