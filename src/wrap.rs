//! Pixel-width line layout.
//!
//! The [`LineWrapper`] splits one logical line into viewport-sized
//! [`DisplaySegment`]s, measuring grapheme clusters against a
//! [`FontMetrics`] so proportional fonts work as well as monospace ones.
//! Breaks happen at the last glyph that fits, or at the last space when
//! word-wrap is on; spaces consumed at a word break are never re-emitted.
//!
//! When a line resumes after another source interleaved output, the
//! continuation marker is inlined at the front of the first segment (its
//! byte length recorded in `marker_len`) so width accounting and
//! justification see it like any other text.
//!
//! Justification never mutates text: wrapped segments that qualify carry
//! [`JustifyInfo`] and the renderer distributes the slack across word gaps
//! at draw time.

use crate::error::EngineError;
use crate::metrics::FontMetrics;
use crate::segment::{DisplaySegment, JustifyInfo, Rgb, SegmentFlags, WordBreak};
use crate::source::SourceId;
use unicode_segmentation::UnicodeSegmentation;

/// Layout of a single segment: how much text it takes, where the next
/// segment resumes, and the word boundaries seen along the way.
#[derive(Debug)]
struct Layout {
    take: usize,
    resume: usize,
    used: u32,
    at_word_boundary: bool,
    breaks: Vec<WordBreak>,
}

/// Splits logical lines into viewport-width display segments.
#[derive(Debug)]
pub struct LineWrapper<M> {
    metrics: M,
    viewport_width: u32,
    word_wrap: bool,
    justify: bool,
    justify_threshold: u32,
    cont_marker: String,
}

impl<M: FontMetrics> LineWrapper<M> {
    /// Create a wrapper for the given viewport and layout options.
    pub fn new(
        metrics: M,
        viewport_width: u32,
        cont_marker: impl Into<String>,
        word_wrap: bool,
        justify: bool,
        justify_threshold: u32,
    ) -> Self {
        Self {
            metrics,
            viewport_width,
            word_wrap,
            justify,
            justify_threshold,
            cont_marker: cont_marker.into(),
        }
    }

    /// Pixel width of `text` under this wrapper's metrics.
    pub fn measure(&self, text: &str) -> u32 {
        self.metrics.measure(text)
    }

    /// The viewport width segments are laid out against.
    pub const fn viewport_width(&self) -> u32 {
        self.viewport_width
    }

    /// Wrap one logical line into display segments.
    ///
    /// `continued` marks a line that resumes an interrupted partial line:
    /// the first segment is prefixed with the continuation marker and
    /// flagged `WRAPPED_LEFT`. Every produced segment fits the viewport;
    /// the only fatal outcome is a single glyph wider than the viewport
    /// itself.
    pub fn wrap(
        &self,
        text: &str,
        color: Rgb,
        source: SourceId,
        continued: bool,
    ) -> Result<Vec<DisplaySegment>, EngineError> {
        let owned;
        let (full, marker_len) = if continued && !self.cont_marker.is_empty() {
            owned = format!("{}{text}", self.cont_marker);
            (owned.as_str(), self.cont_marker.len())
        } else {
            (text, 0)
        };

        let mut segments = Vec::new();
        let mut rest = full;
        let mut first = true;
        loop {
            let layout = self.layout_one(rest)?;
            let more = layout.resume < rest.len();

            let mut flags = SegmentFlags::empty();
            if !first || continued {
                flags |= SegmentFlags::WRAPPED_LEFT;
            }
            if more {
                flags |= SegmentFlags::WRAPPED_RIGHT;
            }

            let mut seg =
                DisplaySegment::new(rest[..layout.take].to_string(), color, source, flags);
            if first {
                seg.marker_len = marker_len.min(layout.take);
            }
            if more && self.justify && layout.at_word_boundary && layout.breaks.len() >= 2 {
                let free = self.viewport_width - layout.used;
                if free >= self.justify_threshold {
                    seg.justify = Some(JustifyInfo {
                        breaks: layout.breaks,
                        free_pixels: free,
                    });
                }
            }
            segments.push(seg);

            if !more {
                break;
            }
            rest = &rest[layout.resume..];
            first = false;
        }
        Ok(segments)
    }

    /// Lay out the longest prefix of `text` that fits the viewport.
    ///
    /// Word boundaries are tracked as layout proceeds so a word-wrap break
    /// costs nothing extra and justification metadata falls out for free.
    fn layout_one(&self, text: &str) -> Result<Layout, EngineError> {
        let mut used: u32 = 0;
        let mut breaks: Vec<WordBreak> = Vec::new();
        let mut word_start: Option<usize> = None;
        // Last space run: byte end of text before it, width there, and the
        // offset where content resumes after it.
        let mut break_at: Option<(usize, u32, usize)> = None;
        let mut prev_space = false;

        for (idx, g) in text.grapheme_indices(true) {
            let gw = self.metrics.measure(g);
            if used + gw > self.viewport_width {
                if idx == 0 {
                    return Err(EngineError::ViewportTooNarrow {
                        grapheme: g.to_string(),
                        needed: gw,
                        viewport: self.viewport_width,
                    });
                }
                if self.word_wrap {
                    if let Some((end, width, resume)) = break_at {
                        if end > 0 {
                            return Ok(Layout {
                                take: end,
                                resume,
                                used: width,
                                at_word_boundary: true,
                                breaks: close_breaks(breaks, end),
                            });
                        }
                    }
                }
                return Ok(Layout {
                    take: idx,
                    resume: idx,
                    used,
                    at_word_boundary: false,
                    breaks: close_breaks(breaks, idx),
                });
            }

            if g == " " {
                if let Some(start) = word_start.take() {
                    if let Some(last) = breaks.last_mut() {
                        last.len = idx - start;
                    }
                }
                if prev_space {
                    if let Some(b) = &mut break_at {
                        b.2 = idx + g.len();
                    }
                } else {
                    break_at = Some((idx, used, idx + g.len()));
                }
                prev_space = true;
            } else {
                if word_start.is_none() {
                    word_start = Some(idx);
                    breaks.push(WordBreak {
                        offset: idx,
                        width_before: used,
                        len: 0,
                    });
                }
                prev_space = false;
            }
            used += gw;
        }

        if let Some(start) = word_start {
            if let Some(last) = breaks.last_mut() {
                last.len = text.len() - start;
            }
        }
        Ok(Layout {
            take: text.len(),
            resume: text.len(),
            used,
            at_word_boundary: false,
            breaks,
        })
    }
}

/// Drop word entries past the break point and close the trailing word.
fn close_breaks(mut breaks: Vec<WordBreak>, take: usize) -> Vec<WordBreak> {
    breaks.retain(|b| b.offset < take);
    if let Some(last) = breaks.last_mut() {
        if last.len == 0 || last.offset + last.len > take {
            last.len = take - last.offset;
        }
    }
    breaks
}
