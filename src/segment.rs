//! Display segments: the wrapped, screen-ready unit of output.
//!
//! A [`DisplaySegment`] is one visual row: a viewport-width-bounded fragment
//! of a logical line, carrying its color, owning source, and wrap state.
//! Segments are identified by stable [`SegmentId`] handles rather than
//! references; a source's back-pointer to its most recent segment is a
//! handle that is explicitly invalidated on eviction and never dereferenced
//! after.

use crate::source::SourceId;
use bitflags::bitflags;
use std::sync::atomic::{AtomicU64, Ordering};

/// True-color RGB representation.
///
/// 3 bytes for 24-bit color depth; the engine never interprets colors, it
/// only carries them from source configuration to the renderer.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// White (255, 255, 255)
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// Default row color used for placeholders and unconfigured sources.
    pub const DEFAULT: Self = Self::new(0, 255, 0);

    /// Create from a 24-bit hex color (e.g., 0xFF5500).
    #[inline]
    pub const fn from_u32(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }
}

impl std::fmt::Debug for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    #[inline]
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

/// Stable handle identifying a [`DisplaySegment`] for the lifetime of the
/// process. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId(u64);

static NEXT_SEGMENT_ID: AtomicU64 = AtomicU64::new(1);

impl SegmentId {
    fn next() -> Self {
        Self(NEXT_SEGMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

bitflags! {
    /// Per-segment wrap and content state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SegmentFlags: u8 {
        /// This segment continues a previous segment (renders with the
        /// continuation marker prefix).
        const WRAPPED_LEFT = 0b0000_0001;
        /// The logical line continues onto a following segment.
        const WRAPPED_RIGHT = 0b0000_0010;
        /// The logical line behind this segment has not been terminated yet.
        const PARTIAL = 0b0000_0100;
        /// A bracketed source-label row, not log content.
        const LABEL = 0b0000_1000;
        /// The `"~"` filler for rows no content has reached yet.
        const PLACEHOLDER = 0b0001_0000;
    }
}

/// One word boundary inside a justified segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordBreak {
    /// Byte offset of the word start within the segment text.
    pub offset: usize,
    /// Cumulative pixel width up to the word start (marker width included
    /// on continued segments).
    pub width_before: u32,
    /// Byte length of the word.
    pub len: usize,
}

/// Justification metadata: computed at wrap time, applied at draw time.
///
/// The stored text is never expanded; the renderer distributes
/// `free_pixels` evenly across the inter-word gaps described by `breaks`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JustifyInfo {
    /// Word boundaries, in text order.
    pub breaks: Vec<WordBreak>,
    /// Unused trailing pixels to distribute across gaps.
    pub free_pixels: u32,
}

/// The wrapped, screen-ready unit: one visual row.
#[derive(Debug, Clone)]
pub struct DisplaySegment {
    /// Stable identity of this segment.
    pub id: SegmentId,
    /// Row text. Tabs are already expanded and `\r` stripped.
    pub text: String,
    /// Rendering color.
    pub color: Rgb,
    /// Owning source, if any.
    pub source: Option<SourceId>,
    /// Wrap and content state.
    pub flags: SegmentFlags,
    /// Byte length of the inline continuation-marker prefix, 0 when none.
    /// Renderers may style `text[..marker_len]` with the marker color.
    pub marker_len: usize,
    /// Present only when justification applies to this row.
    pub justify: Option<JustifyInfo>,
}

impl DisplaySegment {
    /// Text shown on rows no content has reached.
    pub const PLACEHOLDER_TEXT: &'static str = "~";

    /// Create a content segment owned by a source.
    pub fn new(text: String, color: Rgb, source: SourceId, flags: SegmentFlags) -> Self {
        Self {
            id: SegmentId::next(),
            text,
            color,
            source: Some(source),
            flags,
            marker_len: 0,
            justify: None,
        }
    }

    /// Create the `"~"` filler row.
    pub fn placeholder(color: Rgb) -> Self {
        Self {
            id: SegmentId::next(),
            text: Self::PLACEHOLDER_TEXT.to_string(),
            color,
            source: None,
            flags: SegmentFlags::PLACEHOLDER,
            marker_len: 0,
            justify: None,
        }
    }

    /// Create a `[label]` row attributed to a source.
    pub fn label(label: &str, color: Rgb, source: SourceId) -> Self {
        Self::new(format!("[{label}]"), color, source, SegmentFlags::LABEL)
    }

    /// Byte length of the row text.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the row text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether this segment continues a previous one.
    pub const fn wrapped_left(&self) -> bool {
        self.flags.contains(SegmentFlags::WRAPPED_LEFT)
    }

    /// Whether the logical line continues past this segment.
    pub const fn wrapped_right(&self) -> bool {
        self.flags.contains(SegmentFlags::WRAPPED_RIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_ids_unique() {
        let a = DisplaySegment::placeholder(Rgb::DEFAULT);
        let b = DisplaySegment::placeholder(Rgb::DEFAULT);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_placeholder_is_tilde() {
        let p = DisplaySegment::placeholder(Rgb::DEFAULT);
        assert_eq!(p.text, "~");
        assert!(p.flags.contains(SegmentFlags::PLACEHOLDER));
        assert!(p.source.is_none());
    }

    #[test]
    fn test_label_brackets() {
        let l = DisplaySegment::label("syslog", Rgb::WHITE, SourceId(0));
        assert_eq!(l.text, "[syslog]");
        assert!(l.flags.contains(SegmentFlags::LABEL));
        assert_eq!(l.source, Some(SourceId(0)));
    }

    #[test]
    fn test_rgb_from_u32() {
        let c = Rgb::from_u32(0xFF5500);
        assert_eq!(c, Rgb::new(255, 85, 0));
    }

    #[test]
    fn test_wrap_flags() {
        let s = DisplaySegment::new(
            "abc".to_string(),
            Rgb::WHITE,
            SourceId(0),
            SegmentFlags::WRAPPED_LEFT | SegmentFlags::WRAPPED_RIGHT,
        );
        assert!(s.wrapped_left());
        assert!(s.wrapped_right());
    }
}
