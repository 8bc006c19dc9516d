//! # Tailpane
//!
//! A display-agnostic log tailing engine.
//!
//! Tailpane follows multiple log files (plus FIFOs and stdin) and maintains
//! a fixed-size buffer of wrapped display rows, reporting exactly which
//! rows changed each poll so hosts can redraw without flicker.
//!
//! ## Core Concepts
//!
//! - **Logical lines**: bytes arrive in arbitrary chunks; lines are
//!   reconstructed across reads, with partial lines shown and grown in place
//! - **Pixel-width wrapping**: layout measures grapheme clusters against a
//!   [`FontMetrics`], so proportional fonts wrap correctly
//! - **Fixed scroll region**: exactly `rows` display rows at all times,
//!   placeholder-filled until content arrives
//! - **Row diffing**: each poll yields the indices of rows that changed
//! - **Self-healing sources**: rotation, truncation, and deletion are
//!   detected and repaired without losing the tail
//!
//! ## Example
//!
//! ```rust,ignore
//! use tailpane::{Engine, EngineConfig, MonospaceMetrics, SourceSpec};
//!
//! let config = EngineConfig {
//!     sources: vec![SourceSpec::file("/var/log/messages")],
//!     rows: 40,
//!     width: 800,
//!     ..EngineConfig::default()
//! };
//!
//! let mut engine = Engine::new(config, MonospaceMetrics::new(8))?;
//! let tick = engine.poll()?;
//! for row in &tick.changed {
//!     println!("{}", engine.buffer().get(*row).unwrap().text);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod scroll;
pub mod segment;
pub mod source;
pub mod transform;
pub mod wrap;

// Re-exports for convenience
pub use config::{EngineConfig, ReloadConfig, SourceSpec, TransformConfig};
pub use diff::DiffEngine;
pub use engine::{ControlHandle, ControlSignal, Engine, Renderer, Tick};
pub use error::EngineError;
pub use metrics::{FontMetrics, MonospaceMetrics};
pub use scroll::ScrollBuffer;
pub use segment::{DisplaySegment, JustifyInfo, Rgb, SegmentFlags, SegmentId, WordBreak};
pub use source::{LogSource, SourceId, SourceRegistry};
pub use wrap::LineWrapper;
