//! Per-source liveness checks.
//!
//! Once per poll cycle, every seekable source is compared against the
//! filesystem: a missing file gets one short delay and a reopen attempt, an
//! inode change (log rotation) forces a reopen, and an in-place shrink
//! (truncation) rewinds to offset 0 without reopening. All failures are
//! recoverable; a source that cannot be reopened keeps an empty handle and
//! is retried every cycle while the remaining sources are still checked.

use super::{LogSource, OpenPolicy, SourceRegistry};
use std::os::unix::fs::MetadataExt;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of one liveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Nothing to repair.
    Ok,
    /// The file was replaced or went missing; the source was reopened.
    Reopened,
    /// The file shrank in place; reading restarts at offset 0.
    Truncated,
    /// The file is gone and could not be reopened yet.
    Missing,
}

/// Detects deletion, rotation, and truncation of tailed files.
#[derive(Debug, Clone, Copy)]
pub struct FileMonitor {
    /// Delay before the reopen attempt when the file is missing.
    pub retry_delay: Duration,
    /// Position policy applied on reopen.
    pub policy: OpenPolicy,
}

impl FileMonitor {
    /// Create a monitor with the given retry delay and reopen policy.
    pub const fn new(retry_delay: Duration, policy: OpenPolicy) -> Self {
        Self {
            retry_delay,
            policy,
        }
    }

    /// Check one source, repairing its state as needed.
    ///
    /// Sources with inode 0 (stdin, FIFOs) are never checked.
    pub fn check(&self, source: &mut LogSource) -> Liveness {
        if source.inode() == 0 {
            return Liveness::Ok;
        }
        let Some(path) = source.spec.path.clone() else {
            return Liveness::Ok;
        };

        // A source whose last reopen failed gets retried before any stat
        // comparison. The filesystem may hand the recreated file the old
        // inode number, which would mask the recreation below.
        if !source.is_open() {
            return match source.open(&self.policy) {
                Ok(()) => {
                    debug!(path = %path.display(), "closed source reopened");
                    Liveness::Reopened
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "reopen failed, will retry");
                    Liveness::Missing
                }
            };
        }

        let Ok(stats) = std::fs::metadata(&path) else {
            // Give a rotating writer a moment to recreate the file.
            std::thread::sleep(self.retry_delay);
            source.close();
            return match source.open(&self.policy) {
                Ok(()) => {
                    debug!(path = %path.display(), "missing file reappeared, reopened");
                    Liveness::Reopened
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "file missing, will retry");
                    Liveness::Missing
                }
            };
        };

        if stats.ino() != source.inode() {
            // Rotation: the path now names a different file.
            source.close();
            return match source.open(&self.policy) {
                Ok(()) => {
                    debug!(path = %path.display(), "rotated file reopened");
                    Liveness::Reopened
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "reopen after rotation failed");
                    Liveness::Missing
                }
            };
        }

        if stats.len() < source.last_size() {
            // Truncated in place: same inode, rewind instead of reopening.
            if let Err(e) = source.seek_to_start() {
                warn!(path = %path.display(), error = %e, "rewind after truncation failed");
            } else {
                debug!(path = %path.display(), "file truncated, rewound to start");
            }
            source.set_last_size(stats.len());
            return Liveness::Truncated;
        }

        source.set_last_size(stats.len());
        Liveness::Ok
    }

    /// Check every source; a dead source never stalls the rest.
    pub fn check_all(&self, registry: &mut SourceRegistry) {
        for source in registry.iter_mut() {
            self.check(source);
        }
    }
}
