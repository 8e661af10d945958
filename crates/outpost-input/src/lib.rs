//! Command input sources for Outpost.
//!
//! Every source is a *producer*: a task that reads lines from somewhere and
//! posts them as [`ControlTask`]s onto the server's unbounded queue. The
//! queue's FIFO order is the execution order; producers never touch server
//! state themselves.
//!
//! - [`spawn_console`] reads the local console (or any [`AsyncRead`]).
//! - [`SocketInput`] owns the optional remote command channel on
//!   `127.0.0.1:6859`.
//!
//! [`AsyncRead`]: tokio::io::AsyncRead

mod console;
mod error;
mod socket;

pub use console::spawn_console;
pub use error::InputError;
pub use socket::{COMMAND_SOCKET_PORT, SocketInput};

use std::fmt;

use outpost_timer::TaskId;
use tokio::sync::mpsc;

/// Opaque identifier for a remote command connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Where a command line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Console,
    Socket(ConnectionId),
    /// Command-line arguments processed before the loop starts.
    Startup,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Console => f.write_str("console"),
            Origin::Socket(id) => write!(f, "socket/{id}"),
            Origin::Startup => f.write_str("startup"),
        }
    }
}

/// One raw command line, as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub origin: Origin,
    pub text: String,
}

impl Line {
    pub fn new(origin: Origin, text: impl Into<String>) -> Self {
        Self {
            origin,
            text: text.into(),
        }
    }
}

/// A unit of work for the server's execution context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlTask {
    /// A command line from one of the input sources.
    Line(Line),
    /// A scheduled task came due.
    Timer(TaskId),
}

/// Producer side of the execution context's queue.
pub type TaskSender = mpsc::UnboundedSender<ControlTask>;

/// Consumer side of the execution context's queue.
pub type TaskReceiver = mpsc::UnboundedReceiver<ControlTask>;

/// Creates the execution context's queue.
pub fn task_queue() -> (TaskSender, TaskReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
        assert_eq!(ConnectionId::new(7).into_inner(), 7);
    }

    #[test]
    fn test_origin_display() {
        assert_eq!(Origin::Console.to_string(), "console");
        assert_eq!(Origin::Socket(ConnectionId::new(2)).to_string(), "socket/conn-2");
        assert_eq!(Origin::Startup.to_string(), "startup");
    }

    #[test]
    fn test_queue_is_fifo() {
        let (tx, mut rx) = task_queue();
        tx.send(ControlTask::Line(Line::new(Origin::Console, "status"))).unwrap();
        tx.send(ControlTask::Timer(TaskId(1))).unwrap();
        assert!(matches!(rx.try_recv().unwrap(), ControlTask::Line(l) if l.text == "status"));
        assert_eq!(rx.try_recv().unwrap(), ControlTask::Timer(TaskId(1)));
    }
}
