//! Logical line reconstruction.
//!
//! Sources deliver bytes in arbitrary chunks: a line may arrive over many
//! reads, split mid-UTF-8-sequence, or never terminate at all. The
//! [`LineAssembler`] turns that stream into [`LogicalLine`]s, carrying the
//! partial/continuation bookkeeping the display layer needs. Newly read
//! bytes always append to the pending buffer, so multi-read reconstruction
//! is invisible downstream.
//!
//! Normalization happens here, once per byte: `\r` is stripped and tabs are
//! expanded to 8-column stops, with the column tracked across partial reads
//! so a tab arriving later still lands on the correct stop.

/// Tab stops every 8 columns.
const TAB_STOP: usize = 8;

/// Options controlling line assembly, derived from the engine config.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// Hold unterminated lines until their newline arrives.
    pub whole_lines_only: bool,
    /// Forced partial boundary: maximum in-memory bytes for one line.
    pub max_line_bytes: usize,
}

/// A reconstructed line, the unit handed to transform and layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// Line text, tab-expanded, without `\r` or the terminator.
    pub text: String,
    /// Terminated by end-of-data or the length limit rather than `\n`.
    pub partial: bool,
    /// The previous line emitted for this source was partial; this text
    /// extends the same logical line.
    pub continues: bool,
}

/// Per-source line reconstruction state.
///
/// `raw` stages undecoded bytes (a read may end inside a UTF-8 sequence);
/// `pending` holds the normalized text of the line under construction.
#[derive(Debug, Default)]
pub struct LineAssembler {
    raw: Vec<u8>,
    pending: String,
    col: usize,
    partial: bool,
}

impl LineAssembler {
    /// Create an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the previously emitted line was partial.
    pub const fn last_was_partial(&self) -> bool {
        self.partial
    }

    /// Discard all buffered state (used after truncation or reopen).
    pub fn reset(&mut self) {
        self.raw.clear();
        self.pending.clear();
        self.col = 0;
        self.partial = false;
    }

    /// Feed newly read bytes, yielding every line completed by them.
    pub fn push_bytes(&mut self, bytes: &[u8], opts: &ReadOptions) -> Vec<LogicalLine> {
        self.raw.extend_from_slice(bytes);
        let text = self.decode_available();

        let mut out = Vec::new();
        for ch in text.chars() {
            match ch {
                '\n' => out.push(self.emit(false)),
                '\r' => {}
                '\t' => loop {
                    self.pending.push(' ');
                    self.col += 1;
                    if self.col % TAB_STOP == 0 {
                        break;
                    }
                },
                _ => {
                    self.pending.push(ch);
                    self.col += 1;
                }
            }
            // Forced boundary: bound memory without dropping data. Emitted
            // even in whole-lines mode; the partial flag classifies it.
            if self.pending.len() >= opts.max_line_bytes {
                out.push(self.emit(true));
            }
        }
        out
    }

    /// End-of-data for this pass: yield the accumulated tail as a partial
    /// line, unless whole-lines mode holds it for the next poll.
    pub fn end_of_data(&mut self, opts: &ReadOptions) -> Option<LogicalLine> {
        if opts.whole_lines_only || self.pending.is_empty() {
            return None;
        }
        // A partial tail that was already emitted last pass and gained no
        // new bytes lands in the is_empty arm above: nothing new.
        Some(self.emit(true))
    }

    /// Take the pending text as a line, recording the previous partial
    /// state as the continuation flag before overwriting it.
    fn emit(&mut self, is_partial: bool) -> LogicalLine {
        let continues = self.partial;
        self.partial = is_partial;
        if !is_partial {
            self.col = 0;
        }
        LogicalLine {
            text: std::mem::take(&mut self.pending),
            partial: is_partial,
            continues,
        }
    }

    /// Decode the complete UTF-8 prefix of `raw`, leaving a split trailing
    /// sequence staged for the next read. Invalid bytes become U+FFFD.
    fn decode_available(&mut self) -> String {
        let mut text = String::new();
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.raw[start..]) {
                Ok(s) => {
                    text.push_str(s);
                    start = self.raw.len();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(s) = std::str::from_utf8(&self.raw[start..start + valid]) {
                        text.push_str(s);
                    }
                    start += valid;
                    match e.error_len() {
                        Some(bad) => {
                            text.push('\u{FFFD}');
                            start += bad;
                        }
                        None => break,
                    }
                }
            }
        }
        self.raw.drain(..start);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ReadOptions {
        ReadOptions {
            whole_lines_only: false,
            max_line_bytes: 16 * 1024,
        }
    }

    #[test]
    fn test_single_complete_line() {
        let mut asm = LineAssembler::new();
        let lines = asm.push_bytes(b"hello\n", &opts());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "hello");
        assert!(!lines[0].partial);
        assert!(!lines[0].continues);
    }

    #[test]
    fn test_line_split_across_reads() {
        let mut asm = LineAssembler::new();
        assert!(asm.push_bytes(b"hel", &opts()).is_empty());
        assert!(asm.push_bytes(b"lo wor", &opts()).is_empty());
        let lines = asm.push_bytes(b"ld\n", &opts());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "hello world");
    }

    #[test]
    fn test_partial_tail_emitted_at_end_of_data() {
        let mut asm = LineAssembler::new();
        let lines = asm.push_bytes(b"abc\ndef", &opts());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "abc");
        let tail = asm.end_of_data(&opts()).unwrap();
        assert_eq!(tail.text, "def");
        assert!(tail.partial);
        assert!(!tail.continues);
        // Nothing new on the next pass
        assert!(asm.end_of_data(&opts()).is_none());
    }

    #[test]
    fn test_continuation_flag_after_partial() {
        let mut asm = LineAssembler::new();
        asm.push_bytes(b"par", &opts());
        let first = asm.end_of_data(&opts()).unwrap();
        assert!(first.partial);

        let lines = asm.push_bytes(b"tial\n", &opts());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "tial");
        assert!(lines[0].continues);
        assert!(!lines[0].partial);
    }

    #[test]
    fn test_whole_lines_mode_holds_tail() {
        let whole = ReadOptions {
            whole_lines_only: true,
            max_line_bytes: 16 * 1024,
        };
        let mut asm = LineAssembler::new();
        assert!(asm.push_bytes(b"waiting", &whole).is_empty());
        assert!(asm.end_of_data(&whole).is_none());
        let lines = asm.push_bytes(b" done\n", &whole);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "waiting done");
    }

    #[test]
    fn test_carriage_returns_stripped() {
        let mut asm = LineAssembler::new();
        let lines = asm.push_bytes(b"dos line\r\nnext\r\n", &opts());
        assert_eq!(lines[0].text, "dos line");
        assert_eq!(lines[1].text, "next");
    }

    #[test]
    fn test_tabs_expand_to_eight_column_stops() {
        let mut asm = LineAssembler::new();
        let lines = asm.push_bytes(b"ab\tc\n", &opts());
        assert_eq!(lines[0].text, "ab      c");

        let lines = asm.push_bytes(b"\tx\n", &opts());
        assert_eq!(lines[0].text, "        x");
    }

    #[test]
    fn test_tab_stop_tracked_across_partial_reads() {
        let mut asm = LineAssembler::new();
        asm.push_bytes(b"abc", &opts());
        asm.end_of_data(&opts()).unwrap();
        // Column is 3 within the logical line; tab pads to column 8.
        let lines = asm.push_bytes(b"\tz\n", &opts());
        assert_eq!(lines[0].text, "     z");
        assert!(lines[0].continues);
    }

    #[test]
    fn test_length_limit_forces_partial_boundary() {
        let small = ReadOptions {
            whole_lines_only: false,
            max_line_bytes: 4,
        };
        let mut asm = LineAssembler::new();
        let lines = asm.push_bytes(b"abcdefgh\n", &small);
        // 4-byte chunks, all flagged partial except none silently dropped
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "abcd");
        assert!(lines[0].partial);
        assert_eq!(lines[1].text, "efgh");
        assert!(lines[1].partial);
        assert!(lines[1].continues);
        assert_eq!(lines[2].text, "");
        assert!(!lines[2].partial);
        assert!(lines[2].continues);
    }

    #[test]
    fn test_utf8_split_across_reads() {
        let mut asm = LineAssembler::new();
        let bytes = "héllo\n".as_bytes();
        // Split inside the two-byte é sequence
        assert!(asm.push_bytes(&bytes[..2], &opts()).is_empty());
        let lines = asm.push_bytes(&bytes[2..], &opts());
        assert_eq!(lines[0].text, "héllo");
    }

    #[test]
    fn test_byte_stream_identity() {
        // Concatenated emissions equal the input with \r removed and tabs
        // expanded, modulo one retained trailing partial.
        let input: &[u8] = b"first\r\nsec\tond\nlast";
        let mut asm = LineAssembler::new();
        let mut collected = String::new();
        for chunk in input.chunks(3) {
            for line in asm.push_bytes(chunk, &opts()) {
                collected.push_str(&line.text);
                collected.push('\n');
            }
        }
        if let Some(tail) = asm.end_of_data(&opts()) {
            collected.push_str(&tail.text);
        }
        assert_eq!(collected, "first\nsec     ond\nlast");
    }
}
