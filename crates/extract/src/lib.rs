//! Streaming archive extraction for gitsdk.
//!
//! The pipeline pulls a (potentially very large) gzip-compressed tar archive
//! over HTTP or through an external download helper, parses entries as the
//! bytes arrive, and dispatches each entry to an [`EntryHandler`] strategy:
//! either mirroring files into an output directory with the archive's root
//! prefix stripped, or piping inner archives into an external decompression
//! process.

mod handler;
mod pipeline;
mod source;

pub use handler::{EntryHandler, InnerArchiveHandler, MirrorHandler};
pub use pipeline::extract;
