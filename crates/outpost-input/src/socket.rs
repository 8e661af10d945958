//! The remote command channel: newline-delimited commands over TCP.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};

use outpost_log::LogMirror;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{ConnectionId, ControlTask, InputError, Line, Origin, TaskSender};

/// Port of the remote command channel.
pub const COMMAND_SOCKET_PORT: u16 = 6859;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Aborts the wrapped task when dropped.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct Listening {
    task: JoinHandle<()>,
    local_addr: SocketAddr,
}

/// Owns the remote command channel.
///
/// At most one client is served at a time: a new connection replaces the
/// current one. While a client is connected, all log output is mirrored
/// to it through the [`LogMirror`].
///
/// Disabling aborts the listener. The port is only guaranteed to be free
/// once [`settle`](Self::settle) has completed, which the server's loop
/// awaits between tasks.
pub struct SocketInput {
    port: u16,
    mirror: LogMirror,
    listening: Option<Listening>,
    closing: Vec<JoinHandle<()>>,
}

impl SocketInput {
    /// Creates a disabled channel for `port`. Port 0 binds an ephemeral port.
    pub fn new(port: u16, mirror: LogMirror) -> Self {
        Self {
            port,
            mirror,
            listening: None,
            closing: Vec::new(),
        }
    }

    /// Binds the channel and starts accepting clients.
    ///
    /// Enabling an already enabled channel is a no-op.
    ///
    /// # Errors
    /// [`InputError::PortInUse`] when another process holds the port.
    pub fn enable(&mut self, tx: TaskSender) -> Result<SocketAddr, InputError> {
        if let Some(listening) = &self.listening {
            return Ok(listening.local_addr);
        }

        let listener = bind(self.port)?;
        let local_addr = listener.local_addr().map_err(InputError::Bind)?;
        let task = tokio::spawn(accept_loop(listener, tx, self.mirror.clone()));
        info!(port = local_addr.port(), "Opened command socket on port {}.", local_addr.port());

        self.listening = Some(Listening { task, local_addr });
        Ok(local_addr)
    }

    /// Stops accepting clients and drops the current one.
    ///
    /// Returns `false` if the channel was not enabled.
    pub fn disable(&mut self) -> bool {
        let Some(listening) = self.listening.take() else {
            return false;
        };
        listening.task.abort();
        self.closing.push(listening.task);
        self.mirror.detach();
        debug!(addr = %listening.local_addr, "command socket closing");
        true
    }

    /// Waits for disabled listeners to finish dropping their sockets.
    pub async fn settle(&mut self) {
        for task in self.closing.drain(..) {
            let _ = task.await;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.listening.is_some()
    }

    /// The configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The bound address, while enabled.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listening.as_ref().map(|l| l.local_addr)
    }
}

impl Drop for SocketInput {
    fn drop(&mut self) {
        if let Some(listening) = self.listening.take() {
            listening.task.abort();
        }
    }
}

/// Binds synchronously so that "port in use" is reported to the caller
/// instead of surfacing later inside the listener task.
fn bind(port: u16) -> Result<TcpListener, InputError> {
    let listener = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, port)).map_err(|e| {
        if e.kind() == io::ErrorKind::AddrInUse {
            InputError::PortInUse(port)
        } else {
            InputError::Bind(e)
        }
    })?;
    listener.set_nonblocking(true).map_err(InputError::Bind)?;
    TcpListener::from_std(listener).map_err(InputError::Bind)
}

async fn accept_loop(listener: TcpListener, tx: TaskSender, mirror: LogMirror) {
    let mut current: Option<AbortOnDrop> = None;
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
                if current.take().is_some() {
                    debug!(%id, "replacing previous command connection");
                }
                info!(%id, "Received command socket connection: {peer}");
                let task = tokio::spawn(serve(stream, peer, id, tx.clone(), mirror.clone()));
                current = Some(AbortOnDrop(task));
            }
            Err(e) => warn!(error = %e, "command socket accept failed"),
        }
    }
}

async fn serve(
    stream: TcpStream,
    peer: SocketAddr,
    id: ConnectionId,
    tx: TaskSender,
    mirror: LogMirror,
) {
    let (read, write) = stream.into_split();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let _writer = AbortOnDrop(tokio::spawn(write_mirror(write, out_rx)));
    mirror.attach(out_tx.clone());

    let mut lines = BufReader::new(read).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(text)) => {
                let task = ControlTask::Line(Line::new(Origin::Socket(id), text));
                if tx.send(task).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!(%id, error = %e, "command connection read failed");
                break;
            }
        }
    }

    mirror.detach_sender(&out_tx);
    info!(%id, "Lost command socket connection: {peer}");
}

async fn write_mirror(mut write: OwnedWriteHalf, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(mut line) = rx.recv().await {
        line.push('\n');
        if let Err(e) = write.write_all(line.as_bytes()).await {
            // Dropping `rx` on return makes the mirror detach itself on the
            // next send, so this is logged once.
            error!("Error occurred logging to socket: {}", e.kind());
            return;
        }
    }
}
