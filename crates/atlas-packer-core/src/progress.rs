//! Nested, weighted progress reporting with cooperative cancellation.
//!
//! A [`ProgressListener`] maps the local `[0, 1]` progress of the innermost scope onto the
//! absolute `[0, 1]` range of the whole operation. Scopes nest with [`ProgressListener::start`]
//! and [`ProgressListener::end`]; every absolute value is forwarded to a [`ProgressSink`].
//!
//! ```
//! use atlas_packer_core::progress::ProgressListener;
//!
//! let mut seen = Vec::new();
//! let mut progress = ProgressListener::with_sink(|v: f32| seen.push(v));
//! progress.start(0.5);
//! progress.update(0.5);
//! progress.end();
//! drop(progress);
//! assert_eq!(seen, vec![0.25, 0.5]);
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Receives absolute progress values in `[0, 1]`.
pub trait ProgressSink {
    fn progress(&mut self, value: f32);

    /// Status text set with [`ProgressListener::set_message`]. Ignored by default.
    fn message(&mut self, _message: &str) {}
}

impl<F: FnMut(f32)> ProgressSink for F {
    fn progress(&mut self, value: f32) {
        self(value)
    }
}

/// Sink that ignores every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn progress(&mut self, _value: f32) {}
}

/// Cloneable cancellation flag shared with a [`ProgressListener`].
#[derive(Debug, Default, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
    fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy)]
struct Scale {
    /// Absolute progress when the scope started.
    base: f32,
    /// Absolute width of the scope.
    portion: f32,
    /// Scale to restore when the scope ends.
    parent: f32,
}

pub struct ProgressListener<'a> {
    sink: Box<dyn ProgressSink + 'a>,
    scales: Vec<Scale>,
    scale: f32,
    last_update: f32,
    count: usize,
    total: usize,
    message: String,
    cancel: CancelHandle,
}

impl fmt::Debug for ProgressListener<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressListener")
            .field("depth", &self.scales.len())
            .field("scale", &self.scale)
            .field("value", &self.last_update)
            .field("count", &self.count)
            .field("total", &self.total)
            .field("message", &self.message)
            .field("canceled", &self.cancel.is_canceled())
            .finish()
    }
}

impl Default for ProgressListener<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ProgressListener<'a> {
    /// Listener whose reports go nowhere; still tracks scopes and cancellation.
    pub fn new() -> Self {
        Self::with_sink(NoopSink)
    }

    pub fn with_sink(sink: impl ProgressSink + 'a) -> Self {
        Self {
            sink: Box::new(sink),
            scales: Vec::new(),
            scale: 1.0,
            last_update: 0.0,
            count: 0,
            total: 0,
            message: String::new(),
            cancel: CancelHandle::default(),
        }
    }

    /// Shares an existing cancellation flag instead of the listener's own.
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Clears all scopes, counters and the message, then reports 0.
    ///
    /// The cancellation flag is left alone; use [`ProgressListener::clear_canceled`].
    pub fn reset(&mut self) {
        self.scales.clear();
        self.scale = 1.0;
        self.count = 0;
        self.total = 0;
        self.message.clear();
        self.report(0.0);
    }

    /// Opens a nested scope covering `portion` of the current one.
    ///
    /// # Panics
    ///
    /// Panics if `portion` is zero: a zero-width scope can never report progress.
    pub fn start(&mut self, portion: f32) {
        assert!(portion != 0.0, "progress portion cannot be 0");
        self.scales.push(Scale {
            base: self.last_update,
            portion: self.scale * portion,
            parent: self.scale,
        });
        self.scale *= portion;
    }

    /// Reports `count` of `total` for the current scope. Returns true if canceled.
    pub fn update_count(&mut self, count: usize, total: usize) -> bool {
        self.count = count;
        self.total = total;
        let percent = if total == 0 {
            0.0
        } else {
            count as f32 / total as f32
        };
        self.update(percent);
        self.is_canceled()
    }

    /// Reports `percent` (0..=1) of the current scope.
    pub fn update(&mut self, percent: f32) {
        let (base, portion) = match self.scales.last() {
            Some(s) => (s.base, s.portion),
            None => (0.0, 1.0),
        };
        self.report(base + portion * percent);
    }

    /// Closes the innermost scope and reports its end point.
    ///
    /// # Panics
    ///
    /// Panics when no scope is open.
    pub fn end(&mut self) {
        let Some(s) = self.scales.pop() else {
            panic!("ProgressListener::end without a matching start");
        };
        self.scale = s.parent;
        self.report(s.base + s.portion);
    }

    /// Runs `f` inside a scope of `portion`, closing it afterwards.
    pub fn scoped<T>(&mut self, portion: f32, f: impl FnOnce(&mut Self) -> T) -> T {
        self.start(portion);
        let out = f(self);
        self.end();
        out
    }

    fn report(&mut self, value: f32) {
        self.last_update = value;
        self.sink.progress(value);
    }

    /// Last absolute value reported to the sink.
    pub fn value(&self) -> f32 {
        self.last_update
    }

    pub fn depth(&self) -> usize {
        self.scales.len()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Updates the status text and forwards it to the sink.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.sink.message(&self.message);
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn clear_canceled(&self) {
        self.cancel.clear();
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    /// Handle that can cancel this listener from a sink or another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }
}
