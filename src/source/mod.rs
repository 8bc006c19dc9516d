//! Log sources and their registry.
//!
//! A [`LogSource`] owns one input stream (file, FIFO, or stdin) together
//! with its read state: the open handle, the inode used for rotation
//! detection, the last observed size, and the line assembler holding
//! not-yet-terminated input. The [`SourceRegistry`] keeps sources in
//! configuration order; the read pass drains them in that order.
//!
//! Sources with inode 0 (stdin, FIFOs) are exempt from liveness checks;
//! their reads simply return no data until more arrives.

pub mod monitor;
pub mod reader;

use crate::config::SourceSpec;
use crate::error::EngineError;
use crate::segment::SegmentId;
use reader::{LineAssembler, LogicalLine, ReadOptions};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::os::unix::fs::{FileTypeExt, MetadataExt, OpenOptionsExt};
use tracing::warn;

/// Stable index of a source in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub usize);

/// The open input stream behind a source.
#[derive(Debug)]
pub enum SourceHandle {
    /// A regular file or FIFO opened from a path.
    File(File),
    /// The process's standard input.
    Stdin(io::Stdin),
}

impl Read for SourceHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::File(f) => f.read(buf),
            Self::Stdin(s) => s.read(buf),
        }
    }
}

/// How (re)opened files position themselves before reading.
#[derive(Debug, Clone, Copy)]
pub struct OpenPolicy {
    /// Seek straight to the end; show no existing content.
    pub no_initial_backlog: bool,
    /// Viewport rows, for the backlog estimate.
    pub rows: u64,
    /// Estimated bytes per row, for the backlog estimate.
    pub avg_row_bytes: u64,
}

impl OpenPolicy {
    /// Bytes of backlog worth showing: one viewport plus a row of slack.
    const fn backlog_threshold(&self) -> u64 {
        (self.rows + 1) * self.avg_row_bytes
    }

    /// Bytes to seek back from the end when the file exceeds the threshold.
    const fn seek_back(&self) -> u64 {
        (self.rows + 2) * self.avg_row_bytes
    }
}

/// One tailed input with its independent read state.
#[derive(Debug)]
pub struct LogSource {
    /// Registry position of this source.
    pub id: SourceId,
    /// The configuration entry this source was created from.
    pub spec: SourceSpec,
    handle: Option<SourceHandle>,
    inode: u64,
    last_size: u64,
    assembler: LineAssembler,
    /// Handle to the last display segment this source produced. Cleared on
    /// eviction; never dereferenced after.
    pub last_segment: Option<SegmentId>,
}

impl LogSource {
    /// Create an unopened source from its spec.
    pub fn new(id: SourceId, spec: SourceSpec) -> Self {
        Self {
            id,
            spec,
            handle: None,
            inode: 0,
            last_size: 0,
            assembler: LineAssembler::new(),
            last_segment: None,
        }
    }

    /// Whether the source currently has an open handle.
    pub const fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Inode of the open file; 0 for stdin/FIFOs ("skip liveness checks").
    pub const fn inode(&self) -> u64 {
        self.inode
    }

    /// File size at the last liveness check.
    pub const fn last_size(&self) -> u64 {
        self.last_size
    }

    pub(crate) fn set_last_size(&mut self, size: u64) {
        self.last_size = size;
    }

    /// Open (or reopen) the source and apply the initial-position policy.
    pub fn open(&mut self, policy: &OpenPolicy) -> io::Result<()> {
        self.handle = None;
        self.assembler.reset();

        let Some(path) = self.spec.path.clone() else {
            self.inode = 0;
            self.last_size = 0;
            self.handle = Some(SourceHandle::Stdin(io::stdin()));
            return Ok(());
        };

        let meta = std::fs::metadata(&path)?;
        if meta.file_type().is_fifo() {
            let file = OpenOptions::new()
                .read(true)
                .custom_flags(libc::O_NONBLOCK)
                .open(&path)?;
            self.inode = 0;
            self.last_size = 0;
            self.handle = Some(SourceHandle::File(file));
            return Ok(());
        }

        let mut file = File::open(&path)?;
        if policy.no_initial_backlog {
            file.seek(SeekFrom::End(0))?;
        } else if meta.len() > policy.backlog_threshold() {
            // The seek lands mid-line; drop the damaged prefix. Byte-width
            // estimate only, so this affects backlog volume, not
            // correctness.
            #[allow(clippy::cast_possible_wrap)]
            let back = policy.seek_back().min(meta.len()) as i64;
            file.seek(SeekFrom::End(-back))?;
            discard_partial_line(&mut file)?;
        }
        self.inode = meta.ino();
        self.last_size = meta.len();
        self.handle = Some(SourceHandle::File(file));
        Ok(())
    }

    /// Drop the handle; subsequent read passes skip this source until a
    /// liveness check reopens it.
    pub fn close(&mut self) {
        self.handle = None;
    }

    /// Rewind to offset 0 after in-place truncation.
    pub fn seek_to_start(&mut self) -> io::Result<()> {
        if let Some(SourceHandle::File(file)) = &mut self.handle {
            file.seek(SeekFrom::Start(0))?;
        }
        self.assembler.reset();
        Ok(())
    }

    /// Drain everything currently readable into logical lines.
    ///
    /// Returns immediately once the source has nothing more to offer this
    /// pass. `WouldBlock` (non-blocking pipes) and EOF both end the pass;
    /// other read errors are reported and retried next cycle.
    pub fn pull(&mut self, opts: &ReadOptions) -> Vec<LogicalLine> {
        let Some(handle) = &mut self.handle else {
            return Vec::new();
        };

        let mut out = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match handle.read(&mut buf) {
                Ok(0) => {
                    out.extend(self.assembler.end_of_data(opts));
                    break;
                }
                Ok(n) => out.extend(self.assembler.push_bytes(&buf[..n], opts)),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    out.extend(self.assembler.end_of_data(opts));
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!(source = %self.spec.effective_label(), error = %e, "read failed");
                    break;
                }
            }
        }
        out
    }
}

/// Read forward to the next newline so reading resumes on a line boundary.
fn discard_partial_line(file: &mut File) -> io::Result<()> {
    let mut buf = [0u8; 256];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        if let Some(idx) = buf[..n].iter().position(|&b| b == b'\n') {
            #[allow(clippy::cast_possible_wrap)]
            let rewind = (n - idx - 1) as i64;
            file.seek(SeekFrom::Current(-rewind))?;
            return Ok(());
        }
    }
}

/// Ordered collection of sources with registry-wide operations.
#[derive(Debug)]
pub struct SourceRegistry {
    sources: Vec<LogSource>,
}

impl SourceRegistry {
    /// Build the registry from configuration order.
    pub fn from_specs(specs: Vec<SourceSpec>) -> Self {
        let sources = specs
            .into_iter()
            .enumerate()
            .map(|(i, spec)| LogSource::new(SourceId(i), spec))
            .collect();
        Self { sources }
    }

    /// Open every source at startup.
    ///
    /// # Errors
    ///
    /// A file source that cannot be opened here is fatal; only runtime
    /// reopen failures are tolerated.
    pub fn open_all(&mut self, policy: &OpenPolicy) -> Result<(), EngineError> {
        for source in &mut self.sources {
            if let Err(e) = source.open(policy) {
                if let Some(path) = &source.spec.path {
                    return Err(EngineError::SourceOpen {
                        path: path.clone(),
                        source: e,
                    });
                }
                return Err(EngineError::Io(e));
            }
        }
        Ok(())
    }

    /// Close and reopen every checkable source (the `reopen-all` trigger).
    ///
    /// Stdin and FIFOs (inode 0) are left alone. Reopen failure is
    /// non-fatal: the handle stays empty and the monitor retries.
    pub fn reopen_all(&mut self, policy: &OpenPolicy) {
        for source in &mut self.sources {
            if source.inode() == 0 {
                continue;
            }
            source.close();
            if let Err(e) = source.open(policy) {
                warn!(source = %source.spec.effective_label(), error = %e, "reopen failed");
            }
        }
    }

    /// Clear any back-reference to an evicted segment.
    pub fn clear_segment(&mut self, id: SegmentId) {
        for source in &mut self.sources {
            if source.last_segment == Some(id) {
                source.last_segment = None;
            }
        }
    }

    /// Write the open-file list to the diagnostic stream.
    pub fn dump_open_files(&self) {
        tracing::info!("files opened:");
        for source in &self.sources {
            tracing::info!(
                "\t{} ({}){}",
                source
                    .spec
                    .path
                    .as_ref()
                    .map_or_else(|| "stdin".to_string(), |p| p.display().to_string()),
                source.spec.effective_label(),
                if source.is_open() { "" } else { " [closed]" },
            );
        }
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Borrow a source by id.
    pub fn get(&self, id: SourceId) -> Option<&LogSource> {
        self.sources.get(id.0)
    }

    /// Mutably borrow a source by id.
    pub fn get_mut(&mut self, id: SourceId) -> Option<&mut LogSource> {
        self.sources.get_mut(id.0)
    }

    /// Iterate sources in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &LogSource> {
        self.sources.iter()
    }

    /// Iterate sources mutably in configuration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LogSource> {
        self.sources.iter_mut()
    }
}
