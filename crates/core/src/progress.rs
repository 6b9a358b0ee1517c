//! Per-entry progress reporting for archive extraction.
//!
//! Reporting is a side effect only: it never influences the extraction
//! itself, and write failures on the sink are discarded.

use std::io::{self, Write};
use std::path::Path;

/// How much extraction progress to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// No output.
    #[default]
    Quiet,
    /// One line per extracted entry.
    PerEntry,
    /// A running count every `n` entries, plus a final summary.
    Every(u64),
}

impl Verbosity {
    /// Whether any output is emitted at all.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        self != Self::Quiet
    }
}

/// Emits progress for a single extraction run.
pub struct ProgressReporter {
    verbosity: Verbosity,
    processed: u64,
    sink: Box<dyn Write + Send>,
}

impl ProgressReporter {
    /// Create a reporter writing to stderr.
    #[must_use]
    pub fn new(verbosity: Verbosity) -> Self {
        Self::with_sink(verbosity, Box::new(io::stderr()))
    }

    /// Create a reporter writing to the given sink.
    #[must_use]
    pub fn with_sink(verbosity: Verbosity, sink: Box<dyn Write + Send>) -> Self {
        Self {
            verbosity,
            processed: 0,
            sink,
        }
    }

    /// Record one processed entry.
    pub fn entry(&mut self, path: &Path) {
        self.processed += 1;
        match self.verbosity {
            Verbosity::Quiet => {}
            Verbosity::PerEntry => {
                let _ = writeln!(self.sink, "{}", path.display());
            }
            Verbosity::Every(n) => {
                if n > 0 && self.processed % n == 0 {
                    let _ = writeln!(self.sink, "{} entries", self.processed);
                }
            }
        }
    }

    /// Emit the final summary once the entry sequence is exhausted.
    pub fn finish(&mut self) {
        if self.verbosity.is_enabled() {
            let _ = writeln!(self.sink, "{} entries, done", self.processed);
            let _ = self.sink.flush();
        }
    }

    /// Number of entries seen so far.
    #[must_use]
    pub fn processed(&self) -> u64 {
        self.processed
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("verbosity", &self.verbosity)
            .field("processed", &self.processed)
            .finish_non_exhaustive()
    }
}
