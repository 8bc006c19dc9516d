//! Font metrics seam.
//!
//! The wrapper needs pixel widths to decide break points, but font loading
//! and glyph queries belong to the host. [`FontMetrics`] is the capability
//! the host provides; [`MonospaceMetrics`] is the reference implementation
//! used by tests and by hosts with fixed-cell fonts.

use unicode_width::UnicodeWidthStr;

/// Measures the rendered pixel width of a text run.
///
/// Implementations must be consistent: measuring a concatenation may not
/// exceed the sum of the parts by more than normal kerning slack, and a
/// zero-length run measures zero.
pub trait FontMetrics {
    /// Pixel width of `text` when rendered.
    fn measure(&self, text: &str) -> u32;
}

/// Fixed-cell metrics: every column is `glyph_width` pixels wide.
///
/// Wide graphemes (CJK, emoji) count as two columns per `unicode-width`.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMetrics {
    /// Pixel width of one terminal column.
    pub glyph_width: u32,
}

impl MonospaceMetrics {
    /// Create metrics with the given column width in pixels.
    pub const fn new(glyph_width: u32) -> Self {
        Self { glyph_width }
    }
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self::new(8)
    }
}

impl FontMetrics for MonospaceMetrics {
    #[allow(clippy::cast_possible_truncation)]
    fn measure(&self, text: &str) -> u32 {
        UnicodeWidthStr::width(text) as u32 * self.glyph_width
    }
}

impl<M: FontMetrics + ?Sized> FontMetrics for &M {
    fn measure(&self, text: &str) -> u32 {
        (**self).measure(text)
    }
}
