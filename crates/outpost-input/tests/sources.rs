//! Integration tests for the console and socket producers.
//!
//! The socket tests bind real loopback listeners on ephemeral ports and
//! talk to them with plain `TcpStream` clients.

use std::net::SocketAddr;
use std::time::Duration;

use outpost_input::{
    ControlTask, InputError, Origin, SocketInput, TaskReceiver, spawn_console, task_queue,
};
use outpost_log::LogMirror;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

// =========================================================================
// Helpers
// =========================================================================

async fn next_line(rx: &mut TaskReceiver) -> (Origin, String) {
    let task = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a line")
        .expect("queue closed");
    match task {
        ControlTask::Line(line) => (line.origin, line.text),
        other => panic!("expected a line, got {other:?}"),
    }
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never became true");
}

fn enabled_socket(mirror: &LogMirror) -> (SocketInput, SocketAddr, TaskReceiver) {
    let (tx, rx) = task_queue();
    let mut socket = SocketInput::new(0, mirror.clone());
    let addr = socket.enable(tx).expect("should bind");
    (socket, addr, rx)
}

// =========================================================================
// Console
// =========================================================================

#[tokio::test]
async fn test_console_posts_lines_in_order() {
    let (tx, mut rx) = task_queue();
    let handle = spawn_console(&b"status\nhost testmap survival\n\n"[..], tx);

    assert_eq!(next_line(&mut rx).await, (Origin::Console, "status".into()));
    assert_eq!(
        next_line(&mut rx).await,
        (Origin::Console, "host testmap survival".into())
    );
    assert_eq!(next_line(&mut rx).await, (Origin::Console, String::new()));

    // End of stream ends the producer.
    handle.await.unwrap();
    assert!(rx.recv().await.is_none());
}

// =========================================================================
// Socket
// =========================================================================

#[tokio::test]
async fn test_socket_lines_are_posted() {
    let mirror = LogMirror::default();
    let (_socket, addr, mut rx) = enabled_socket(&mirror);

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"status\nsay hello  there\n").await.unwrap();

    let (origin, text) = next_line(&mut rx).await;
    assert!(matches!(origin, Origin::Socket(_)));
    assert_eq!(text, "status");
    assert_eq!(next_line(&mut rx).await.1, "say hello  there");
}

#[tokio::test]
async fn test_console_and_socket_share_one_queue() {
    let mirror = LogMirror::default();
    let (tx, mut rx) = task_queue();
    let mut socket = SocketInput::new(0, mirror.clone());
    let addr = socket.enable(tx.clone()).unwrap();

    spawn_console(&b"status\n"[..], tx);
    assert_eq!(next_line(&mut rx).await, (Origin::Console, "status".into()));

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"version\n").await.unwrap();
    let (origin, text) = next_line(&mut rx).await;
    assert!(matches!(origin, Origin::Socket(_)));
    assert_eq!(text, "version");
}

#[tokio::test]
async fn test_log_output_is_mirrored_to_client() {
    let mirror = LogMirror::default();
    let (_socket, addr, _rx) = enabled_socket(&mirror);

    let mut client = TcpStream::connect(addr).await.unwrap();
    wait_until(|| mirror.is_attached()).await;

    mirror.send("Server loaded. Type 'help' for help.".into());
    let mut buf = vec![0u8; 64];
    let n = timeout(Duration::from_secs(2), client.read(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&buf[..n], b"Server loaded. Type 'help' for help.\n");
}

#[tokio::test]
async fn test_mirror_cleared_when_client_leaves() {
    let mirror = LogMirror::default();
    let (_socket, addr, _rx) = enabled_socket(&mirror);

    let client = TcpStream::connect(addr).await.unwrap();
    wait_until(|| mirror.is_attached()).await;
    drop(client);
    wait_until(|| !mirror.is_attached()).await;
}

#[tokio::test]
async fn test_new_connection_replaces_current() {
    let mirror = LogMirror::default();
    let (_socket, addr, mut rx) = enabled_socket(&mirror);

    let mut first = TcpStream::connect(addr).await.unwrap();
    first.write_all(b"status\n").await.unwrap();
    let (first_origin, _) = next_line(&mut rx).await;

    let mut second = TcpStream::connect(addr).await.unwrap();
    second.write_all(b"maps\n").await.unwrap();
    let (second_origin, text) = next_line(&mut rx).await;
    assert_eq!(text, "maps");
    assert_ne!(first_origin, second_origin);

    // The replaced stream is closed by the server.
    let mut buf = [0u8; 16];
    let n = timeout(Duration::from_secs(2), first.read(&mut buf))
        .await
        .unwrap()
        .unwrap_or(0);
    assert_eq!(n, 0);

    // Only the new client receives mirrored output.
    wait_until(|| mirror.is_attached()).await;
    mirror.send("mirrored".into());
    let n = timeout(Duration::from_secs(2), second.read(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&buf[..n], b"mirrored\n");
}

#[tokio::test]
async fn test_disable_releases_port() {
    let mirror = LogMirror::default();
    let (tx, _rx) = task_queue();

    // Find a free port, then run the channel on it explicitly.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let mut socket = SocketInput::new(port, mirror);
    socket.enable(tx.clone()).unwrap();
    assert!(socket.is_enabled());

    assert!(socket.disable());
    assert!(!socket.disable());
    socket.settle().await;
    assert!(!socket.is_enabled());
    assert!(socket.local_addr().is_none());

    // Re-enabling on the same port works once the old listener is gone.
    let addr = socket.enable(tx).unwrap();
    assert_eq!(addr.port(), port);
    assert_eq!(socket.port(), port);
}

#[tokio::test]
async fn test_port_in_use_is_reported() {
    let holder = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = holder.local_addr().unwrap().port();

    let (tx, _rx) = task_queue();
    let mut socket = SocketInput::new(port, LogMirror::default());
    let err = socket.enable(tx).unwrap_err();

    assert!(matches!(err, InputError::PortInUse(p) if p == port));
    assert_eq!(
        err.to_string(),
        "Command input socket already in use. Is another instance of the server running?"
    );
    assert!(!socket.is_enabled());
}
