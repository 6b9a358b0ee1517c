//! Two-phase artifact resolution: identity now, download on demand.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use gitsdk_core::progress::Verbosity;
use gitsdk_core::sdk::{Arch, Flavor, SdkVariant};
use gitsdk_core::{Error, Result};
use gitsdk_extract::{EntryHandler, InnerArchiveHandler, extract};

use crate::client::{default_client, fetch_json};

/// Default build-listing endpoint.
pub const DEFAULT_BASE_URL: &str = "https://dev.azure.com/git-for-windows/git/_apis/build/builds";

/// Default tool for unpacking inner archives.
const DEFAULT_UNPACK_TOOL: &str = "tar";

#[derive(Debug, Deserialize)]
struct BuildsResponse {
    count: u64,
    value: Vec<Build>,
}

/// One build record; only the id is consumed.
#[derive(Debug, Deserialize)]
struct Build {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ArtifactsResponse {
    count: u64,
    value: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    name: String,
    resource: ArtifactResource,
}

#[derive(Debug, Deserialize)]
struct ArtifactResource {
    #[serde(rename = "downloadUrl")]
    download_url: String,
}

/// Resolves SDK artifacts against the build-listing service.
#[derive(Debug, Clone)]
pub struct SdkResolver {
    client: reqwest::Client,
    base_url: String,
    unpack_tool: PathBuf,
}

impl Default for SdkResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SdkResolver {
    /// Create a resolver against the Git for Windows build service.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a resolver against a custom build-listing endpoint.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: default_client(),
            base_url: base_url.into(),
            unpack_tool: PathBuf::from(DEFAULT_UNPACK_TOOL),
        }
    }

    /// Override the tool used to unpack inner archives.
    #[must_use]
    pub fn with_unpack_tool(mut self, tool: impl Into<PathBuf>) -> Self {
        self.unpack_tool = tool.into();
        self
    }

    /// Resolve the most recent completed, succeeded build for
    /// `(flavor, arch)`.
    ///
    /// This is the cheap half of the two-phase contract: one listing query,
    /// no artifact download. The returned id is stable until a newer build
    /// lands, which makes it usable for cache and dedup decisions.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedVariant`] for combinations CI does not build
    /// (checked before any network access); [`Error::BuildCount`] when the
    /// service does not report exactly one matching build.
    pub async fn resolve(&self, flavor: Flavor, arch: Arch) -> Result<ResolvedArtifact> {
        let variant = SdkVariant::lookup(flavor, arch)?;

        info!(%flavor, %arch, definition = variant.definition_id, "Resolving SDK artifact");

        let url = format!(
            "{}?definitions={}&statusFilter=completed&resultFilter=succeeded&$top=1",
            self.base_url, variant.definition_id
        );
        let builds: BuildsResponse = fetch_json(&self.client, &url).await?;
        if builds.count != 1 {
            return Err(Error::build_count(variant.definition_id, builds.count));
        }
        let Some(build) = builds.value.into_iter().next() else {
            return Err(Error::build_count(variant.definition_id, 0));
        };

        let id = format!("{}-{}", variant.artifact_name, build.id);
        debug!(%id, "Resolved build");

        Ok(ResolvedArtifact {
            id,
            build_id: build.id,
            variant,
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            unpack_tool: self.unpack_tool.clone(),
        })
    }
}

/// A resolved artifact: a stable identity plus a deferred download.
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    /// Composite identity, `{artifact_name}-{build_id}`.
    pub id: String,
    build_id: String,
    variant: SdkVariant,
    client: reqwest::Client,
    base_url: String,
    unpack_tool: PathBuf,
}

impl ResolvedArtifact {
    /// Name of the artifact within the build.
    #[must_use]
    pub fn artifact_name(&self) -> &'static str {
        self.variant.artifact_name
    }

    /// Id of the build that published the artifact.
    #[must_use]
    pub fn build_id(&self) -> &str {
        &self.build_id
    }

    /// Download the artifact archive and extract it under `output_dir`.
    ///
    /// Queries the build's artifact listing, requires exactly one artifact
    /// with the expected name, and streams its archive into the extraction
    /// pipeline with the artifact-name root prefix stripped. Variants whose
    /// members are themselves archives go through the secondary
    /// decompression handler instead.
    ///
    /// # Errors
    ///
    /// [`Error::ArtifactListing`] (carrying the full listing) when the name
    /// match is not unique, plus everything the extraction pipeline can
    /// fail with.
    pub async fn download(&self, output_dir: &Path, verbosity: Verbosity) -> Result<()> {
        let url = format!("{}/{}/artifacts", self.base_url, self.build_id);
        let artifacts: ArtifactsResponse = fetch_json(&self.client, &url).await?;

        debug!(count = artifacts.count, "Fetched artifact listing");

        let matching: Vec<&Artifact> = artifacts
            .value
            .iter()
            .filter(|a| a.name == self.variant.artifact_name)
            .collect();
        let [artifact] = matching.as_slice() else {
            return Err(Error::artifact_listing(
                self.variant.artifact_name,
                matching.len(),
                format!("{:?}", artifacts.value),
            ));
        };

        info!(
            id = %self.id,
            url = %artifact.resource.download_url,
            "Downloading artifact"
        );

        let handler: Option<Box<dyn EntryHandler>> = self.variant.inner_archives.then(|| {
            Box::new(InnerArchiveHandler::new(
                self.unpack_tool.clone(),
                verbosity.is_enabled(),
            )) as Box<dyn EntryHandler>
        });

        extract(
            &self.client,
            &artifact.resource.download_url,
            &self.variant.strip_prefix(),
            output_dir,
            verbosity,
            handler,
        )
        .await
    }
}
