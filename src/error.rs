//! Error types for the tailing engine.
//!
//! Fatal conditions (a startup source that cannot be opened, a viewport too
//! narrow for a single glyph, conflicting options) surface as [`EngineError`]
//! from constructors. Runtime source failures are recoverable: they are
//! reported via `tracing` and retried on later poll cycles, never propagated
//! into the displayed scrollback.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by engine construction and layout.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A source named in the configuration could not be opened at startup.
    ///
    /// Reopen failures at runtime are not errors; only the initial open of a
    /// configured file is fatal.
    #[error("cannot open source {path:?}: {source}")]
    SourceOpen {
        /// The path that failed to open.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The viewport cannot fit a single glyph (plus the continuation marker
    /// on continued rows). No layout is possible at this width.
    #[error("viewport too narrow: glyph {grapheme:?} needs {needed}px but only {viewport}px are available")]
    ViewportTooNarrow {
        /// The grapheme that did not fit.
        grapheme: String,
        /// Pixels required to place the grapheme.
        needed: u32,
        /// Configured viewport width in pixels.
        viewport: u32,
    },

    /// Mutually exclusive options were enabled together.
    #[error("conflicting options: {0}")]
    ConflictingOptions(&'static str),

    /// The configuration names no sources to tail.
    #[error("no sources configured")]
    NoSources,

    /// The configured viewport has zero rows or zero width.
    #[error("viewport dimensions must be non-zero")]
    EmptyViewport,

    /// Generic I/O failure outside the per-source recovery paths.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_open_display_includes_path() {
        let err = EngineError::SourceOpen {
            path: PathBuf::from("/var/log/missing"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/var/log/missing"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_viewport_too_narrow_display() {
        let err = EngineError::ViewportTooNarrow {
            grapheme: "W".to_string(),
            needed: 9,
            viewport: 8,
        };
        let msg = err.to_string();
        assert!(msg.contains("9px"));
        assert!(msg.contains("8px"));
    }

    #[test]
    fn test_io_error_converts() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: EngineError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }
}
