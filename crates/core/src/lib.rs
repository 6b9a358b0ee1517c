//! Core types shared by the gitsdk workspace.
//!
//! This crate holds everything the resolver and the extraction pipeline have
//! in common:
//!
//! - [`Error`] / [`Result`] - the workspace-wide error type
//! - [`sdk`] - SDK flavors, target architectures, and the static mapping to
//!   CI build definitions
//! - [`paths`] - filesystem helpers
//! - [`progress`] - per-entry progress reporting for extraction

mod error;
pub mod paths;
pub mod progress;
pub mod sdk;

pub use error::{Error, Result};
