//! The fixed-size display buffer.
//!
//! A [`ScrollBuffer`] always holds exactly `rows` segments: rows no content
//! has reached yet show the `"~"` placeholder, and every appended segment
//! evicts one from the opposite end. Eviction hands back the evicted
//! [`SegmentId`] so source back-references can be invalidated before the
//! segment is dropped.
//!
//! Index 0 is the top row. Normal orientation appends at the bottom and
//! evicts the top; reverse orientation puts the newest line at the top and
//! evicts the bottom.

use crate::segment::{DisplaySegment, Rgb, SegmentId};
use std::collections::VecDeque;

/// Fixed-row scroll region holding the wrapped display state.
#[derive(Debug)]
pub struct ScrollBuffer {
    rows: VecDeque<DisplaySegment>,
    capacity: usize,
    reverse: bool,
}

impl ScrollBuffer {
    /// Create a buffer of `rows` placeholder rows.
    pub fn new(rows: usize, reverse: bool, placeholder_color: Rgb) -> Self {
        let mut buf = VecDeque::with_capacity(rows);
        for _ in 0..rows {
            buf.push_back(DisplaySegment::placeholder(placeholder_color));
        }
        Self {
            rows: buf,
            capacity: rows,
            reverse,
        }
    }

    /// Number of rows; constant for the lifetime of the buffer.
    pub fn rows(&self) -> usize {
        self.capacity
    }

    /// Whether the newest line sits at the top.
    pub const fn is_reversed(&self) -> bool {
        self.reverse
    }

    /// The segment at display row `idx` (0 = top).
    pub fn get(&self, idx: usize) -> Option<&DisplaySegment> {
        self.rows.get(idx)
    }

    /// Rows in display order, top to bottom.
    pub fn iter(&self) -> impl Iterator<Item = &DisplaySegment> {
        self.rows.iter()
    }

    /// Display row currently holding segment `id`.
    pub fn find(&self, id: SegmentId) -> Option<usize> {
        self.rows.iter().position(|s| s.id == id)
    }

    /// Append one segment, returning the id it evicted.
    pub fn push(&mut self, segment: DisplaySegment) -> SegmentId {
        let mut evicted = self.append_segments(vec![segment]);
        // One in, one out: the buffer length never changes.
        evicted.remove(0)
    }

    /// Append the segments of one wrapped line in reading order, returning
    /// the ids evicted to make room.
    pub fn append_segments(&mut self, segments: Vec<DisplaySegment>) -> Vec<SegmentId> {
        let mut evicted = Vec::with_capacity(segments.len());
        if self.reverse {
            for (i, seg) in segments.into_iter().enumerate() {
                self.rows.insert(i, seg);
            }
        } else {
            self.rows.extend(segments);
        }
        while self.rows.len() > self.capacity {
            if let Some(old) = self.evict_oldest() {
                evicted.push(old.id);
            }
        }
        evicted
    }

    /// Replace the row holding `id` with `replacement`, in place.
    ///
    /// Used for in-place partial-line updates: the replaced row keeps its
    /// display position, extra rows shift the rest and evict from the
    /// oldest end. Returns `None` when `id` has already scrolled away.
    pub fn replace_segment(
        &mut self,
        id: SegmentId,
        replacement: Vec<DisplaySegment>,
    ) -> Option<Vec<SegmentId>> {
        let idx = self.find(id)?;
        let mut evicted = Vec::new();
        if let Some(old) = self.rows.remove(idx) {
            evicted.push(old.id);
        }
        for (i, seg) in replacement.into_iter().enumerate() {
            self.rows.insert(idx + i, seg);
        }
        while self.rows.len() > self.capacity {
            if let Some(old) = self.evict_oldest() {
                evicted.push(old.id);
            }
        }
        Some(evicted)
    }

    fn evict_oldest(&mut self) -> Option<DisplaySegment> {
        if self.reverse {
            self.rows.pop_back()
        } else {
            self.rows.pop_front()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentFlags;
    use crate::source::SourceId;

    fn seg(text: &str) -> DisplaySegment {
        DisplaySegment::new(text.to_string(), Rgb::WHITE, SourceId(0), SegmentFlags::empty())
    }

    fn texts(buf: &ScrollBuffer) -> Vec<&str> {
        buf.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_starts_full_of_placeholders() {
        let buf = ScrollBuffer::new(3, false, Rgb::DEFAULT);
        assert_eq!(buf.rows(), 3);
        assert_eq!(texts(&buf), vec!["~", "~", "~"]);
    }

    #[test]
    fn test_push_keeps_length_and_evicts_top() {
        let mut buf = ScrollBuffer::new(3, false, Rgb::DEFAULT);
        let first = seg("one");
        let first_id = first.id;
        buf.push(first);
        buf.push(seg("two"));
        assert_eq!(texts(&buf), vec!["~", "one", "two"]);

        buf.push(seg("three"));
        let evicted = buf.push(seg("four"));
        assert_eq!(texts(&buf), vec!["two", "three", "four"]);
        assert_eq!(evicted, first_id);
    }

    #[test]
    fn test_append_batch_reports_all_evictions() {
        let mut buf = ScrollBuffer::new(2, false, Rgb::DEFAULT);
        let evicted = buf.append_segments(vec![seg("a"), seg("b"), seg("c")]);
        // Two placeholders and one content row had to go.
        assert_eq!(evicted.len(), 3);
        assert_eq!(texts(&buf), vec!["b", "c"]);
    }

    #[test]
    fn test_reverse_puts_newest_on_top() {
        let mut buf = ScrollBuffer::new(3, true, Rgb::DEFAULT);
        buf.push(seg("one"));
        buf.push(seg("two"));
        assert_eq!(texts(&buf), vec!["two", "one", "~"]);

        // A wrapped line stays in reading order at the top.
        buf.append_segments(vec![seg("first half"), seg("second half")]);
        assert_eq!(texts(&buf), vec!["first half", "second half", "two"]);
    }

    #[test]
    fn test_replace_in_place() {
        let mut buf = ScrollBuffer::new(3, false, Rgb::DEFAULT);
        buf.push(seg("one"));
        let target = seg("par");
        let target_id = target.id;
        buf.push(target);

        let evicted = buf.replace_segment(target_id, vec![seg("partial")]).unwrap();
        assert_eq!(texts(&buf), vec!["~", "one", "partial"]);
        assert_eq!(evicted, vec![target_id]);
    }

    #[test]
    fn test_replace_that_grows_evicts_oldest() {
        let mut buf = ScrollBuffer::new(3, false, Rgb::DEFAULT);
        buf.push(seg("one"));
        buf.push(seg("two"));
        let target = seg("par");
        let target_id = target.id;
        buf.push(target);

        buf.replace_segment(target_id, vec![seg("part one"), seg("part two")])
            .unwrap();
        assert_eq!(texts(&buf), vec!["two", "part one", "part two"]);
    }

    #[test]
    fn test_replace_missing_id_is_none() {
        let mut buf = ScrollBuffer::new(2, false, Rgb::DEFAULT);
        let gone = seg("gone");
        let gone_id = gone.id;
        buf.push(gone);
        buf.append_segments(vec![seg("a"), seg("b")]);
        assert!(buf.find(gone_id).is_none());
        assert!(buf.replace_segment(gone_id, vec![seg("x")]).is_none());
    }
}
