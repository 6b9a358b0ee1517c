//! Per-entry dispatch strategies for the extraction pipeline.

use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tracing::{debug, warn};

use gitsdk_core::paths::ensure_dir;
use gitsdk_core::{Error, Result};

/// Suffix of archive members handled by the secondary decompression
/// pipeline.
const INNER_ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Strategy applied to each archive entry.
///
/// Selected once at extraction start; the pipeline feeds it every entry in
/// stream order and calls [`EntryHandler::finish`] after the last one.
pub trait EntryHandler: Send {
    /// Process one entry. Returns the resolved path to report as progress.
    ///
    /// `path` is the archive-relative entry path; a trailing `/` marks a
    /// directory. `entry` yields the raw entry content exactly once.
    fn handle(&mut self, path: &str, entry: &mut dyn Read, output_dir: &Path) -> Result<PathBuf>;

    /// Called once after the entry sequence is exhausted.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Default strategy: mirror entries under the output directory with the
/// archive's root prefix stripped.
///
/// Entries outside the expected root are warned about but extracted anyway,
/// under their unstripped path.
#[derive(Debug)]
pub struct MirrorHandler {
    strip_prefix: String,
}

impl MirrorHandler {
    /// Create a handler stripping `strip_prefix` from entry paths.
    #[must_use]
    pub fn new(strip_prefix: impl Into<String>) -> Self {
        Self {
            strip_prefix: strip_prefix.into(),
        }
    }
}

impl EntryHandler for MirrorHandler {
    fn handle(&mut self, path: &str, entry: &mut dyn Read, output_dir: &Path) -> Result<PathBuf> {
        let relative = match path.strip_prefix(&self.strip_prefix) {
            Some(stripped) => stripped,
            None => {
                warn!(%path, prefix = %self.strip_prefix, "entry outside the expected archive root");
                path
            }
        };
        let dest = output_dir.join(relative);

        if path.ends_with('/') {
            // Directory marker: content, if any, is discarded.
            ensure_dir(&dest)?;
            return Ok(dest);
        }

        if let Some(parent) = dest.parent() {
            ensure_dir(parent)?;
        }
        let mut file = File::create(&dest)?;
        io::copy(entry, &mut file)?;
        Ok(dest)
    }
}

/// Secondary decompression strategy for artifacts whose members are
/// themselves gzip-compressed tarballs.
///
/// Matching members are piped raw into the stdin of a freshly spawned
/// unpacker running in the output directory; the unpacker's own stdio is
/// inherited so its native progress output stays visible. Spawned children
/// are reaped in [`EntryHandler::finish`], and extraction only succeeds once
/// every one of them exited cleanly.
pub struct InnerArchiveHandler {
    tool: PathBuf,
    verbose: bool,
    children: Vec<Child>,
}

impl InnerArchiveHandler {
    /// Create a handler unpacking inner archives with `tool`.
    #[must_use]
    pub fn new(tool: impl Into<PathBuf>, verbose: bool) -> Self {
        Self {
            tool: tool.into(),
            verbose,
            children: Vec::new(),
        }
    }

    fn spawn_unpacker(&self, output_dir: &Path) -> Result<Child> {
        let mut cmd = Command::new(&self.tool);
        cmd.arg(if self.verbose { "-xzvf" } else { "-xzf" })
            .arg("-")
            .current_dir(output_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Let the unpacker find binaries living next to it.
        if let Some(dir) = self.tool.parent().filter(|d| !d.as_os_str().is_empty()) {
            if let Some(path) = path_with(dir) {
                cmd.env("PATH", path);
            }
        }

        cmd.spawn()
            .map_err(|e| Error::extraction(format!("failed to spawn {}: {e}", self.tool.display())))
    }
}

impl EntryHandler for InnerArchiveHandler {
    fn handle(&mut self, path: &str, entry: &mut dyn Read, output_dir: &Path) -> Result<PathBuf> {
        if path.ends_with('/') {
            return Ok(PathBuf::from(path));
        }
        if !path.ends_with(INNER_ARCHIVE_SUFFIX) {
            warn!(%path, "ignoring archive member without {INNER_ARCHIVE_SUFFIX} suffix");
            return Ok(PathBuf::from(path));
        }

        debug!(%path, output_dir = %output_dir.display(), "Unpacking inner archive");

        let mut child = self.spawn_unpacker(output_dir)?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::extraction("inner archive unpacker has no stdin"))?;
        io::copy(entry, &mut stdin)?;
        drop(stdin);

        self.children.push(child);
        Ok(PathBuf::from(path))
    }

    fn finish(&mut self) -> Result<()> {
        for mut child in self.children.drain(..) {
            let status = child.wait()?;
            if !status.success() {
                return Err(Error::extraction(format!(
                    "inner archive unpacker exited with {status}"
                )));
            }
        }
        Ok(())
    }
}

/// Current `PATH` with `dir` prepended.
fn path_with(dir: &Path) -> Option<OsString> {
    let current = env::var_os("PATH").unwrap_or_default();
    let parts = std::iter::once(dir.to_path_buf()).chain(env::split_paths(&current));
    env::join_paths(parts).ok()
}
