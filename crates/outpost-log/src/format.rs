//! Line format shared by the console, file and mirror layers.

use std::fmt;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Timestamp layout used in every console and file line.
const TIMESTAMP_FORMAT: &str = "%m-%d-%Y | %H:%M:%S";

/// Current local time in the log timestamp layout, e.g. `10-19-2026 | 14:03:59`.
pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// The four-letter severity marker printed in front of a console line.
pub fn severity_tag(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "[ERR!]",
        Level::WARN => "[WARN]",
        Level::INFO => "[INFO]",
        Level::DEBUG | Level::TRACE => "[DEBG]",
    }
}

/// A [`FormatEvent`] producing one line per event.
///
/// Console/file lines look like `[10-19-2026 | 14:03:59] [INFO] Server loaded.`;
/// the bare variant used for the remote mirror drops both prefixes.
#[derive(Debug, Clone, Copy)]
pub struct LineFormat {
    timestamp: bool,
    tags: bool,
}

impl LineFormat {
    /// Timestamp and severity tag.
    pub fn console() -> Self {
        Self {
            timestamp: true,
            tags: true,
        }
    }

    /// Message and fields only.
    pub fn bare() -> Self {
        Self {
            timestamp: false,
            tags: false,
        }
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        if self.timestamp {
            write!(writer, "[{}] ", timestamp())?;
        }
        if self.tags {
            write!(writer, "{} ", severity_tag(event.metadata().level()))?;
        }
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
