//! The tailing engine and its poll loop.
//!
//! Single-threaded by construction: one [`Engine::poll`] call drains
//! control signals, reads every source, repairs liveness, and diffs the
//! display buffer. [`Engine::run`] wraps that in a loop whose only blocking
//! wait is a timed receive on the control channel, so a signal arriving
//! mid-sleep wakes the loop immediately instead of waiting out the
//! interval.
//!
//! Control signals come from a cloneable [`ControlHandle`]; hosts typically
//! feed it from OS signal handlers (SIGHUP reopen, SIGUSR1 dump, SIGWINCH
//! refresh) or UI events.

use crate::config::EngineConfig;
use crate::diff::DiffEngine;
use crate::error::EngineError;
use crate::metrics::FontMetrics;
use crate::scroll::ScrollBuffer;
use crate::segment::{DisplaySegment, SegmentFlags};
use crate::source::monitor::FileMonitor;
use crate::source::reader::{LogicalLine, ReadOptions};
use crate::source::{OpenPolicy, SourceId, SourceRegistry};
use crate::transform::Transformer;
use crate::wrap::LineWrapper;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::time::Instant;
use tracing::{debug, warn};

/// Asynchronous requests delivered to the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Close and reopen every file source (log rotation by agreement).
    ReopenAll,
    /// Redraw every row on the next tick, changed or not.
    ForceRefresh,
    /// Write the open-file list to the diagnostic stream.
    DumpOpenFiles,
    /// Finish the current tick, render it, and stop.
    Quit,
}

/// Cloneable sender half of the control channel.
///
/// Safe to use from signal handlers' delivery threads and UI callbacks;
/// sending to an engine that already stopped is a no-op.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    tx: Sender<ControlSignal>,
}

impl ControlHandle {
    /// Deliver one signal to the engine.
    pub fn send(&self, signal: ControlSignal) {
        let _ = self.tx.send(signal);
    }

    /// Request a reopen of every file source.
    pub fn reopen_all(&self) {
        self.send(ControlSignal::ReopenAll);
    }

    /// Request a full redraw on the next tick.
    pub fn force_refresh(&self) {
        self.send(ControlSignal::ForceRefresh);
    }

    /// Request the open-file diagnostic dump.
    pub fn dump_open_files(&self) {
        self.send(ControlSignal::DumpOpenFiles);
    }

    /// Ask the engine to stop after the current tick.
    pub fn quit(&self) {
        self.send(ControlSignal::Quit);
    }
}

/// What the host draws: the engine never touches a display itself.
pub trait Renderer {
    /// Draw the rows listed in `changed` from `rows`. `clear` means the
    /// whole surface should be repainted first (forced refresh).
    fn render(&mut self, rows: &ScrollBuffer, changed: &[usize], clear: bool);
}

/// Outcome of one poll cycle.
#[derive(Debug)]
pub struct Tick {
    /// Indices of display rows that changed this cycle.
    pub changed: Vec<usize>,
    /// The whole surface should be repainted, not just `changed`.
    pub clear: bool,
    /// A quit signal was received; this is the final tick.
    pub quit: bool,
}

/// The log-tailing engine: sources in, display rows and diffs out.
pub struct Engine<M> {
    config: EngineConfig,
    registry: SourceRegistry,
    monitor: FileMonitor,
    wrapper: LineWrapper<M>,
    buffer: ScrollBuffer,
    diff: DiffEngine,
    transform: Option<Transformer>,
    read_opts: ReadOptions,
    policy: OpenPolicy,
    signal_tx: Sender<ControlSignal>,
    signal_rx: Receiver<ControlSignal>,
    last_emitter: Option<SourceId>,
    reload_at: Option<Instant>,
    first_tick: bool,
    force_refresh: bool,
    pending_reopen: bool,
    pending_dump: bool,
    pending_quit: bool,
}

impl<M: FontMetrics> Engine<M> {
    /// Validate the configuration, open every source, and build the engine.
    ///
    /// # Errors
    ///
    /// Configuration conflicts and unopenable file sources are fatal here;
    /// everything after construction is recoverable except a glyph wider
    /// than the viewport.
    pub fn new(config: EngineConfig, metrics: M) -> Result<Self, EngineError> {
        config.validate()?;

        let policy = OpenPolicy {
            no_initial_backlog: config.no_initial_backlog,
            rows: config.rows as u64,
            avg_row_bytes: config.avg_row_bytes,
        };
        let read_opts = ReadOptions {
            whole_lines_only: config.whole_lines_only,
            max_line_bytes: config.max_line_bytes,
        };
        let wrapper = LineWrapper::new(
            metrics,
            config.width,
            config.cont_marker.clone(),
            config.effective_word_wrap(),
            config.justify,
            config.justify_threshold,
        );
        let buffer = ScrollBuffer::new(config.rows, config.reverse_order, config.default_color);
        let transform = config
            .transform
            .as_ref()
            .map(|t| Transformer::new(&t.pattern, &t.replacement));

        let mut registry = SourceRegistry::from_specs(config.sources.clone());
        registry.open_all(&policy)?;

        let (signal_tx, signal_rx) = unbounded();
        let reload_at = config.reload.as_ref().map(|r| Instant::now() + r.every);
        let monitor = FileMonitor::new(config.retry_delay, policy);

        Ok(Self {
            config,
            registry,
            monitor,
            wrapper,
            buffer,
            diff: DiffEngine::new(),
            transform,
            read_opts,
            policy,
            signal_tx,
            signal_rx,
            last_emitter: None,
            reload_at,
            first_tick: true,
            force_refresh: false,
            pending_reopen: false,
            pending_dump: false,
            pending_quit: false,
        })
    }

    /// A new sender for the control channel.
    pub fn control_handle(&self) -> ControlHandle {
        ControlHandle {
            tx: self.signal_tx.clone(),
        }
    }

    /// The display buffer in its current state.
    pub const fn buffer(&self) -> &ScrollBuffer {
        &self.buffer
    }

    /// Run one full cycle: signals, read pass, liveness, reload, diff.
    ///
    /// # Errors
    ///
    /// Only layout can fail here, and only when a single glyph exceeds the
    /// viewport width.
    pub fn poll(&mut self) -> Result<Tick, EngineError> {
        self.drain_signals();
        if self.pending_dump {
            self.pending_dump = false;
            self.registry.dump_open_files();
        }
        if self.pending_reopen {
            self.pending_reopen = false;
            self.registry.reopen_all(&self.policy);
        }

        // Read pass: drain every source in configuration order.
        let mut batches = Vec::new();
        for source in self.registry.iter_mut() {
            let lines = source.pull(&self.read_opts);
            if !lines.is_empty() {
                batches.push((source.id, lines));
            }
        }
        for (id, lines) in batches {
            for line in lines {
                self.process_line(id, line)?;
            }
        }

        self.monitor.check_all(&mut self.registry);
        self.maybe_reload();

        let force = self.force_refresh || self.first_tick;
        self.force_refresh = false;
        self.first_tick = false;
        let changed = self.diff.diff(&self.buffer, force);

        Ok(Tick {
            changed,
            clear: force,
            quit: self.pending_quit,
        })
    }

    /// Poll-render loop; returns after the tick that saw a quit signal.
    ///
    /// The timed receive below is the engine's only blocking wait: either
    /// the poll interval elapses or a control signal cuts the sleep short.
    ///
    /// # Errors
    ///
    /// Propagates fatal layout errors from [`Engine::poll`].
    pub fn run<R: Renderer>(&mut self, renderer: &mut R) -> Result<(), EngineError> {
        loop {
            let tick = self.poll()?;
            if tick.clear || !tick.changed.is_empty() {
                renderer.render(&self.buffer, &tick.changed, tick.clear);
            }
            if tick.quit {
                debug!("quit signal received, stopping");
                return Ok(());
            }
            match self.signal_rx.recv_timeout(self.config.poll_interval) {
                Ok(signal) => self.apply_signal(signal),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {}
            }
        }
    }

    fn drain_signals(&mut self) {
        while let Ok(signal) = self.signal_rx.try_recv() {
            self.apply_signal(signal);
        }
    }

    fn apply_signal(&mut self, signal: ControlSignal) {
        match signal {
            ControlSignal::ReopenAll => self.pending_reopen = true,
            ControlSignal::ForceRefresh => self.force_refresh = true,
            ControlSignal::DumpOpenFiles => self.pending_dump = true,
            ControlSignal::Quit => self.pending_quit = true,
        }
    }

    /// Run the periodic reload when its deadline has passed: optional shell
    /// command first, then a reopen of every file source.
    fn maybe_reload(&mut self) {
        let Some(at) = self.reload_at else {
            return;
        };
        if Instant::now() < at {
            return;
        }
        let Some(reload) = &self.config.reload else {
            return;
        };
        if let Some(cmd) = &reload.command {
            debug!(command = %cmd, "running reload command");
            match std::process::Command::new("sh").arg("-c").arg(cmd).status() {
                Ok(status) if !status.success() => {
                    warn!(command = %cmd, %status, "reload command failed");
                }
                Ok(_) => {}
                Err(e) => warn!(command = %cmd, error = %e, "cannot run reload command"),
            }
        }
        self.registry.reopen_all(&self.policy);
        self.reload_at = Some(Instant::now() + reload.every);
    }

    /// Route one logical line into the display buffer.
    fn process_line(&mut self, id: SourceId, line: LogicalLine) -> Result<(), EngineError> {
        let text = match &self.transform {
            Some(t) => t.apply(&line.text).into_owned(),
            None => line.text,
        };

        if line.continues && self.try_update_in_place(id, &text, line.partial)? {
            return Ok(());
        }

        // A bare terminator for a line already on screen: nothing to draw.
        if line.continues && text.is_empty() && !line.partial {
            if let Some(source) = self.registry.get_mut(id) {
                source.last_segment = None;
            }
            return Ok(());
        }

        let (color, label) = match self.registry.get(id) {
            Some(source) => (source.spec.color, source.spec.effective_label()),
            None => return Ok(()),
        };

        // Label row when a different source takes over the output. The
        // label defaults to the path string.
        if !self.config.hide_labels && self.last_emitter != Some(id) {
            let row = DisplaySegment::new(self.fit_label(&label), color, id, SegmentFlags::LABEL);
            let evicted = self.buffer.push(row);
            self.registry.clear_segment(evicted);
        }

        let continued = line.continues && self.config.allow_partial;
        let mut segments = self.wrapper.wrap(&text, color, id, continued)?;
        if line.partial {
            if let Some(last) = segments.last_mut() {
                last.flags |= SegmentFlags::PARTIAL;
            }
        }
        let tail_id = segments.last().map(|s| s.id);

        for evicted in self.buffer.append_segments(segments) {
            self.registry.clear_segment(evicted);
        }
        if let Some(source) = self.registry.get_mut(id) {
            source.last_segment = if line.partial { tail_id } else { None };
        }
        self.last_emitter = Some(id);
        Ok(())
    }

    /// Rewrap a partial line in place when its tail row is still on screen
    /// and no other source has written since. Returns false when the append
    /// path should handle the line instead.
    fn try_update_in_place(
        &mut self,
        id: SourceId,
        addition: &str,
        still_partial: bool,
    ) -> Result<bool, EngineError> {
        if !self.config.update_in_place || self.last_emitter != Some(id) {
            return Ok(false);
        }
        let Some(seg_id) = self.registry.get(id).and_then(|s| s.last_segment) else {
            return Ok(false);
        };
        let Some(old) = self.buffer.find(seg_id).and_then(|i| self.buffer.get(i)).cloned() else {
            return Ok(false);
        };

        let combined = format!("{}{addition}", old.text);
        let mut segments = self.wrapper.wrap(&combined, old.color, id, false)?;
        if let Some(first) = segments.first_mut() {
            // The old row's resumption state survives the rewrap.
            first.marker_len = old.marker_len;
            if old.wrapped_left() {
                first.flags |= SegmentFlags::WRAPPED_LEFT;
            }
        }
        if still_partial {
            if let Some(last) = segments.last_mut() {
                last.flags |= SegmentFlags::PARTIAL;
            }
        }
        let tail_id = segments.last().map(|s| s.id);

        let Some(evicted) = self.buffer.replace_segment(seg_id, segments) else {
            return Ok(false);
        };
        for old_id in evicted {
            self.registry.clear_segment(old_id);
        }
        if let Some(source) = self.registry.get_mut(id) {
            source.last_segment = if still_partial { tail_id } else { None };
        }
        Ok(true)
    }

    /// Shorten a label until its bracketed form fits the viewport.
    fn fit_label(&self, label: &str) -> String {
        let mut text = format!("[{label}]");
        while self.wrapper.measure(&text) > self.wrapper.viewport_width() {
            let mut chars: Vec<char> = text.chars().collect();
            if chars.len() <= 2 {
                break;
            }
            chars.remove(chars.len() - 2);
            text = chars.into_iter().collect();
        }
        text
    }
}
