//! Engine configuration.
//!
//! All tunables live in one [`EngineConfig`] value handed to the engine at
//! construction; there is no global state. Option validation happens once,
//! up front: mutually exclusive flag combinations are a fatal configuration
//! error, never a silent override.

use crate::error::EngineError;
use crate::segment::Rgb;
use std::path::PathBuf;
use std::time::Duration;

/// One entry in the ordered source list: a file path or the stdin sentinel,
/// with its display color and label.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    /// File to tail, or `None` for stdin.
    pub path: Option<PathBuf>,
    /// Color for rows produced by this source.
    pub color: Rgb,
    /// Display label; defaults to the path string (or `"stdin"`).
    pub label: Option<String>,
}

impl SourceSpec {
    /// Tail a file at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            color: Rgb::DEFAULT,
            label: None,
        }
    }

    /// Tail standard input. The host must put the descriptor into
    /// non-blocking mode; the read pass treats `WouldBlock` as "no data yet".
    pub const fn stdin() -> Self {
        Self {
            path: None,
            color: Rgb::DEFAULT,
            label: None,
        }
    }

    /// Set the display color.
    #[must_use]
    pub const fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    /// Set the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Effective label: explicit label, path string, or `"stdin"`.
    pub fn effective_label(&self) -> String {
        if let Some(label) = &self.label {
            label.clone()
        } else if let Some(path) = &self.path {
            path.display().to_string()
        } else {
            "stdin".to_string()
        }
    }
}

/// Periodic reload: run a shell command every `every`, then reopen all
/// sources.
#[derive(Debug, Clone)]
pub struct ReloadConfig {
    /// Interval between reloads.
    pub every: Duration,
    /// Shell command executed via `sh -c` before the reopen, if any.
    pub command: Option<String>,
}

/// Regex substitution applied to each logical line before layout.
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// Pattern to match. A pattern that fails to compile disables the
    /// transform with one diagnostic; it is not fatal.
    pub pattern: String,
    /// Replacement text (capture groups via `$1` etc.).
    pub replacement: String,
}

/// Configuration for the tailing engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Ordered list of sources to tail.
    pub sources: Vec<SourceSpec>,
    /// Viewport capacity in rows.
    pub rows: usize,
    /// Viewport width in pixels.
    pub width: u32,
    /// Estimated bytes per row, used only for the startup backlog seek.
    pub avg_row_bytes: u64,
    /// Never yield unterminated lines; wait for the newline.
    pub whole_lines_only: bool,
    /// Yield unterminated lines as partial rows.
    pub allow_partial: bool,
    /// When more bytes arrive for a partial line, rewrap it in place
    /// instead of appending a continuation row. Requires `allow_partial`.
    pub update_in_place: bool,
    /// Break at word boundaries instead of arbitrary character boundaries.
    pub word_wrap: bool,
    /// Distribute trailing slack across inter-word gaps. Implies `word_wrap`.
    pub justify: bool,
    /// Minimum trailing slack, in pixels, before justification applies.
    pub justify_threshold: u32,
    /// Newest rows at the top instead of the bottom.
    pub reverse_order: bool,
    /// Suppress `[label]` rows when the emitting source changes.
    pub hide_labels: bool,
    /// Skip existing file content at startup; show only new lines.
    pub no_initial_backlog: bool,
    /// Marker prefixed to rows that continue a previous row.
    pub cont_marker: String,
    /// Color of the continuation marker.
    pub cont_color: Rgb,
    /// Color for placeholder rows.
    pub default_color: Rgb,
    /// Maximum in-memory bytes for one logical line; reaching it forces a
    /// partial boundary rather than dropping data.
    pub max_line_bytes: usize,
    /// Poll interval: the sole blocking wait when no source produced data.
    pub poll_interval: Duration,
    /// Delay before retrying a missing file.
    pub retry_delay: Duration,
    /// Optional periodic reload.
    pub reload: Option<ReloadConfig>,
    /// Optional line transform.
    pub transform: Option<TransformConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            rows: 25,
            width: 640,
            avg_row_bytes: 80,
            whole_lines_only: false,
            allow_partial: false,
            update_in_place: false,
            word_wrap: false,
            justify: false,
            justify_threshold: 8,
            reverse_order: false,
            hide_labels: false,
            no_initial_backlog: false,
            cont_marker: "|| ".to_string(),
            cont_color: Rgb::DEFAULT,
            default_color: Rgb::DEFAULT,
            max_line_bytes: 16 * 1024,
            // see Knuth
            poll_interval: Duration::new(2, 400_000_000),
            retry_delay: Duration::from_secs(1),
            reload: None,
            transform: None,
        }
    }
}

impl EngineConfig {
    /// Whether word wrapping is in effect (`justify` implies it).
    pub const fn effective_word_wrap(&self) -> bool {
        self.word_wrap || self.justify
    }

    /// Validate option combinations.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ConflictingOptions`] for mutually exclusive
    /// flags, [`EngineError::NoSources`] for an empty source list, and
    /// [`EngineError::EmptyViewport`] for a zero-sized viewport.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.sources.is_empty() {
            return Err(EngineError::NoSources);
        }
        if self.rows == 0 || self.width == 0 {
            return Err(EngineError::EmptyViewport);
        }
        if self.whole_lines_only && self.allow_partial {
            return Err(EngineError::ConflictingOptions(
                "whole_lines_only and allow_partial",
            ));
        }
        if self.update_in_place && self.whole_lines_only {
            return Err(EngineError::ConflictingOptions(
                "update_in_place and whole_lines_only",
            ));
        }
        if self.update_in_place && !self.allow_partial {
            return Err(EngineError::ConflictingOptions(
                "update_in_place requires allow_partial",
            ));
        }
        Ok(())
    }
}
