//! Row-level display diffing.
//!
//! The engine redraws only rows whose content actually changed between
//! polls. [`DiffEngine`] keeps a snapshot of what each row looked like the
//! last time it was reported and compares the live [`ScrollBuffer`] against
//! it, cheapest checks first. A forced pass (first frame, exposure, font or
//! geometry change upstream) marks every row changed and resets the
//! snapshot.

use crate::scroll::ScrollBuffer;
use crate::segment::Rgb;

/// What the diff compares per row: text and color, never identity or
/// flags. A segment replaced by an identical-looking one is unchanged, and
/// a flag transition with identical pixels (a partial line gaining its
/// terminator) costs no redraw.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RowSnapshot {
    text: String,
    color: Rgb,
}

/// Detects which display rows changed since the previous poll.
#[derive(Debug, Default)]
pub struct DiffEngine {
    previous: Vec<RowSnapshot>,
}

impl DiffEngine {
    /// Create a diff engine with no history: the first pass reports every
    /// row changed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare the buffer against the last snapshot, returning the indices
    /// of changed rows and updating the snapshot to match.
    pub fn diff(&mut self, buffer: &ScrollBuffer, force_all: bool) -> Vec<usize> {
        let mut changed = Vec::new();
        for (idx, seg) in buffer.iter().enumerate() {
            let row_changed = force_all
                || match self.previous.get(idx) {
                    Some(prev) => {
                        prev.text.len() != seg.text.len()
                            || prev.color != seg.color
                            || prev.text != seg.text
                    }
                    None => true,
                };
            if row_changed {
                changed.push(idx);
            }

            let snapshot = RowSnapshot {
                text: seg.text.clone(),
                color: seg.color,
            };
            if let Some(prev) = self.previous.get_mut(idx) {
                if row_changed {
                    *prev = snapshot;
                }
            } else {
                self.previous.push(snapshot);
            }
        }
        self.previous.truncate(buffer.rows());
        changed
    }

    /// Drop all history so the next diff reports every row.
    pub fn invalidate(&mut self) {
        self.previous.clear();
    }
}
