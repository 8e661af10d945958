//! [`MakeWriter`] implementations for the file and remote-mirror layers.
//!
//! Both writers buffer the bytes of one formatted event and hand them over
//! on [`Drop`], so a line is never split between two destinations.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing_subscriber::fmt::MakeWriter;

use crate::{LogConfig, RotatingLog, timestamp};

// ---------------------------------------------------------------------------
// LogSink
// ---------------------------------------------------------------------------

/// Shared handle to the rotating log file.
///
/// Cheap to clone. File logging can be switched off at runtime (the
/// `logging` setting); lines written while disabled are discarded.
#[derive(Clone)]
pub struct LogSink {
    log: Arc<Mutex<RotatingLog>>,
    enabled: Arc<AtomicBool>,
}

impl LogSink {
    pub fn new(config: LogConfig) -> Self {
        Self {
            log: Arc::new(Mutex::new(RotatingLog::new(config))),
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Appends a line to the log file, best effort.
    ///
    /// A failing write is reported on stderr and otherwise ignored; it is
    /// not routed back through `tracing`, which would recurse into this sink.
    pub fn write_line(&self, line: &str) {
        if !self.is_enabled() {
            return;
        }
        if let Err(e) = self.log.lock().write_line(line) {
            eprintln!("[{}] [ERR!] Failed to write log file: {e}", timestamp());
        }
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter {
            sink: self.clone(),
            buf: Vec::with_capacity(256),
        }
    }
}

/// Per-event writer for the log file.
pub struct SinkWriter {
    sink: LogSink,
    buf: Vec<u8>,
}

impl Write for SinkWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SinkWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&self.buf);
        for line in text.lines() {
            self.sink.write_line(line);
        }
    }
}

// ---------------------------------------------------------------------------
// LogMirror
// ---------------------------------------------------------------------------

/// Slot for the remote command client's outbound line channel.
///
/// The socket connection task attaches a sender when a client connects and
/// detaches it when the client goes away. Only one client is attached at a
/// time; attaching replaces the previous sender wholesale.
#[derive(Clone, Default)]
pub struct LogMirror {
    slot: Arc<Mutex<Option<mpsc::UnboundedSender<String>>>>,
}

impl LogMirror {
    pub fn attach(&self, sender: mpsc::UnboundedSender<String>) {
        *self.slot.lock() = Some(sender);
    }

    pub fn detach(&self) {
        *self.slot.lock() = None;
    }

    /// Detaches only if `sender` is the one currently attached.
    ///
    /// A connection that ends after being replaced must not clear the
    /// newer connection's channel.
    pub fn detach_sender(&self, sender: &mpsc::UnboundedSender<String>) {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|s| s.same_channel(sender)) {
            *slot = None;
        }
    }

    pub fn is_attached(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Forwards a line to the attached client. Dropped when nobody is attached.
    pub fn send(&self, line: String) {
        let mut slot = self.slot.lock();
        if let Some(sender) = slot.as_ref() {
            if sender.send(line).is_err() {
                // Receiver is gone: the connection task already ended.
                *slot = None;
            }
        }
    }
}

impl<'a> MakeWriter<'a> for LogMirror {
    type Writer = MirrorWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MirrorWriter {
            mirror: self.clone(),
            buf: Vec::new(),
        }
    }
}

/// Per-event writer for the remote mirror.
pub struct MirrorWriter {
    mirror: LogMirror,
    buf: Vec<u8>,
}

impl Write for MirrorWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MirrorWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() || !self.mirror.is_attached() {
            return;
        }
        let text = String::from_utf8_lossy(&self.buf);
        for line in text.lines() {
            self.mirror.send(line.to_string());
        }
    }
}
