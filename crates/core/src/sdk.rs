//! SDK flavors, target architectures, and the static CI build definition map.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{Error, Result};

/// A named build configuration profile of the Git SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flavor {
    /// Just enough to run `git` and the test suite.
    Minimal,
    /// Minimal plus the toolchain needed to `makepkg` git packages.
    MakepkgGit,
    /// The complete SDK.
    Full,
    /// The subset used to build the installers.
    BuildInstallers,
}

impl Flavor {
    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "minimal" => Some(Self::Minimal),
            "makepkg-git" => Some(Self::MakepkgGit),
            "full" => Some(Self::Full),
            "build-installers" => Some(Self::BuildInstallers),
            _ => None,
        }
    }
}

impl std::fmt::Display for Flavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minimal => write!(f, "minimal"),
            Self::MakepkgGit => write!(f, "makepkg-git"),
            Self::Full => write!(f, "full"),
            Self::BuildInstallers => write!(f, "build-installers"),
        }
    }
}

impl FromStr for Flavor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            Error::unsupported_variant(format!(
                "unknown flavor '{s}' (expected one of: minimal, makepkg-git, full, build-installers)"
            ))
        })
    }
}

/// Target CPU architecture of the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 64-bit SDK.
    X86_64,
    /// 32-bit SDK.
    I686,
}

impl Arch {
    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Some(Self::X86_64),
            "i686" | "x86" => Some(Self::I686),
            _ => None,
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X86_64 => write!(f, "x86_64"),
            Self::I686 => write!(f, "i686"),
        }
    }
}

impl FromStr for Arch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            Error::unsupported_variant(format!(
                "unknown architecture '{s}' (expected x86_64 or i686)"
            ))
        })
    }
}

/// The CI build definition producing a given (flavor, architecture) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdkVariant {
    /// Build definition id in the build-listing service.
    pub definition_id: u32,
    /// Name of the artifact published by that definition.
    pub artifact_name: &'static str,
    /// Whether the artifact's members are themselves compressed archives
    /// that need the secondary decompression pipeline.
    pub inner_archives: bool,
}

impl SdkVariant {
    /// Map a (flavor, architecture) pair to its build definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVariant`] for combinations CI does not
    /// build. No network access is involved.
    pub fn lookup(flavor: Flavor, arch: Arch) -> Result<Self> {
        let variant = match (flavor, arch) {
            (Flavor::Minimal, Arch::X86_64) => Self {
                definition_id: 22,
                artifact_name: "git-sdk-64-minimal",
                inner_archives: false,
            },
            (Flavor::MakepkgGit, Arch::X86_64) => Self {
                definition_id: 29,
                artifact_name: "git-sdk-64-makepkg-git",
                inner_archives: false,
            },
            (Flavor::Full, Arch::X86_64) => Self {
                definition_id: 29,
                artifact_name: "git-sdk-64-full-sdk",
                inner_archives: true,
            },
            (Flavor::Full, Arch::I686) => Self {
                definition_id: 30,
                artifact_name: "git-sdk-32-full-sdk",
                inner_archives: true,
            },
            (Flavor::BuildInstallers, Arch::X86_64) => Self {
                definition_id: 29,
                artifact_name: "git-sdk-64-build-installers",
                inner_archives: false,
            },
            (Flavor::BuildInstallers, Arch::I686) => Self {
                definition_id: 30,
                artifact_name: "git-sdk-32-build-installers",
                inner_archives: false,
            },
            (Flavor::Minimal | Flavor::MakepkgGit, Arch::I686) => {
                return Err(Error::unsupported_variant(format!(
                    "the {flavor} flavor is only built for x86_64"
                )));
            }
        };

        Ok(variant)
    }

    /// Root prefix shared by every entry of the artifact archive.
    #[must_use]
    pub fn strip_prefix(&self) -> String {
        format!("{}/", self.artifact_name)
    }
}
