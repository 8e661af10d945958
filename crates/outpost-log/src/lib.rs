//! Log sinks for the Outpost server.
//!
//! Every line the server prints goes through `tracing`. This crate provides
//! the three places those lines end up:
//!
//! - the **console** (stdout), timestamped and tagged with a severity
//!   marker such as `[INFO]` or `[ERR!]`;
//! - the **log file** ([`LogSink`] over a [`RotatingLog`]), same format,
//!   rotated once a file grows past [`MAX_LOG_BYTES`];
//! - the **remote mirror** ([`LogMirror`]), the connected command-socket
//!   client, which sees clean text without timestamp or tag.
//!
//! [`init`] wires all three into a `tracing-subscriber` registry.

mod error;
mod format;
mod rotate;
mod writer;

pub use error::LogError;
pub use format::{LineFormat, severity_tag, timestamp};
pub use rotate::{LogConfig, MAX_LOG_BYTES, RotatingLog};
pub use writer::{LogMirror, LogSink};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Handles to the sinks installed by [`init`].
///
/// The server keeps these to toggle file logging at runtime and to attach
/// the remote client's writer to the mirror.
#[derive(Clone)]
pub struct LogHandles {
    pub sink: LogSink,
    pub mirror: LogMirror,
}

/// Installs the global subscriber with console, file and mirror layers.
///
/// The filter defaults to `info` and can be overridden with `RUST_LOG`.
pub fn init(config: LogConfig) -> Result<LogHandles, LogError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let sink = LogSink::new(config);
    let mirror = LogMirror::default();

    let console = fmt::layer()
        .event_format(LineFormat::console())
        .with_writer(std::io::stdout);
    let file = fmt::layer()
        .event_format(LineFormat::console())
        .with_ansi(false)
        .with_writer(sink.clone());
    let remote = fmt::layer()
        .event_format(LineFormat::bare())
        .with_ansi(false)
        .with_writer(mirror.clone());

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .with(remote)
        .try_init()?;

    Ok(LogHandles { sink, mirror })
}
