//! Integration tests for the execution context: queue ordering across
//! sources, the command socket toggle, startup arguments and the
//! next-round timer.

use std::net::{IpAddr, Ipv4Addr, TcpListener};
use std::path::Path;
use std::time::Duration;

use outpost::{OutpostError, ServerControl, SettingsStore};
use outpost_input::{ControlTask, Line, Origin};
use outpost_log::{LogConfig, LogHandles, LogMirror, LogSink};
use outpost_round::{Phase, RoundConfig};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

// =========================================================================
// Helpers
// =========================================================================

fn log_handles(dir: &Path) -> LogHandles {
    LogHandles {
        sink: LogSink::new(LogConfig::new(dir.join("logs"))),
        mirror: LogMirror::default(),
    }
}

fn server_on(dir: &Path, socket_port: u16) -> ServerControl {
    ServerControl::builder(dir)
        .socket_port(socket_port)
        .game_ip(IpAddr::V4(Ipv4Addr::LOCALHOST))
        .prompt(false)
        .build(log_handles(dir))
        .unwrap()
}

fn console(text: &str) -> ControlTask {
    ControlTask::Line(Line::new(Origin::Console, text))
}

fn args(line: &str) -> Vec<String> {
    line.split(' ').map(str::to_string).collect()
}

// =========================================================================
// Ordering
// =========================================================================

#[tokio::test]
async fn test_console_and_socket_lines_run_in_post_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = server_on(dir.path(), 0);
    let addr = server.state_mut().enable_socket().unwrap();

    server.sender().send(console("name from console")).unwrap();
    server.sender().send(console("port 7200")).unwrap();

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"name from socket\nexit\n").await.unwrap();

    timeout(Duration::from_secs(5), server.run())
        .await
        .expect("server should stop on exit");

    let settings = SettingsStore::in_dir(dir.path()).load().unwrap();
    assert_eq!(settings.name, "from socket");
    assert_eq!(settings.port, 7200);
    assert!(!server.state().socket.is_enabled());
}

#[tokio::test]
async fn test_exit_stops_the_loop_before_later_lines() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = server_on(dir.path(), 0);
    let tx = server.sender();
    tx.send(console("port 7300")).unwrap();
    tx.send(console("exit")).unwrap();
    tx.send(console("port 7400")).unwrap();

    server.run().await;
    assert!(server.state().exit_requested());
    assert_eq!(server.state().settings.port, 7300);
}

// =========================================================================
// Command socket
// =========================================================================

#[tokio::test]
async fn test_socketinput_toggle_releases_port() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = server_on(dir.path(), 0);

    server.handle(console("socketinput on")).await;
    let addr = server.state().socket.local_addr().unwrap();
    assert!(SettingsStore::in_dir(dir.path()).load().unwrap().socket);

    server.handle(console("socketinput off")).await;
    assert!(!server.state().socket.is_enabled());
    assert!(!server.state().settings.socket);
    TcpListener::bind(addr).expect("port should be free after the line completes");
}

#[tokio::test]
async fn test_socketinput_on_taken_port_keeps_setting_off() {
    let dir = tempfile::tempdir().unwrap();
    let taken = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let port = taken.local_addr().unwrap().port();
    let mut server = server_on(dir.path(), port);

    let response = server.handle_line(&Line::new(Origin::Console, "socketinput on"));
    assert!(response.error.unwrap().contains("already in use"));
    assert!(!server.state().socket.is_enabled());
    assert!(!server.state().settings.socket);
}

#[tokio::test]
async fn test_socket_enabled_at_start_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut server = server_on(dir.path(), 0);
        server.handle(console("socketinput on")).await;
    }
    let mut server = server_on(dir.path(), 0);
    assert!(!server.state().socket.is_enabled());
    server.start();
    assert!(server.state().socket.is_enabled());
}

// =========================================================================
// Startup arguments
// =========================================================================

#[tokio::test]
async fn test_startup_commands_split_on_commas() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = server_on(dir.path(), 0);

    server
        .run_startup_commands(&args("port 0,host Craters pvp,name Arena"))
        .await
        .unwrap();
    let state = server.state();
    assert!(state.round.is_playing());
    assert!(state.round.state().rules.pvp);
    assert_eq!(state.settings.name, "Arena");
}

#[tokio::test]
async fn test_invalid_startup_command_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = server_on(dir.path(), 0);

    let err = server
        .run_startup_commands(&args("name Early,hots Craters,name Late"))
        .await
        .unwrap_err();
    assert!(matches!(err, OutpostError::Startup(ref chunk) if chunk == "hots Craters"));
    assert_eq!(server.state().settings.name, "Early");
}

#[tokio::test]
async fn test_failing_startup_handler_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = server_on(dir.path(), 0);
    server
        .run_startup_commands(&args("port 99999,name Still"))
        .await
        .unwrap();
    assert_eq!(server.state().settings.name, "Still");
}

#[tokio::test]
async fn test_startup_socket_toggle_rebinds_same_port() {
    let port = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let dir = tempfile::tempdir().unwrap();
    let mut server = server_on(dir.path(), port);

    server
        .run_startup_commands(&args("socketinput on,socketinput off,socketinput on"))
        .await
        .unwrap();
    assert!(server.state().socket.is_enabled());
    assert!(server.state().settings.socket);
    assert_eq!(server.state().socket.local_addr().unwrap().port(), port);
}

// =========================================================================
// Next-round timer
// =========================================================================

async fn hosting(dir: &Path) -> ServerControl {
    let mut server = ServerControl::builder(dir)
        .game_ip(IpAddr::V4(Ipv4Addr::LOCALHOST))
        .round_config(RoundConfig::default())
        .prompt(false)
        .build(log_handles(dir))
        .unwrap();
    server
        .run_startup_commands(&args("port 0,host Craters"))
        .await
        .unwrap();
    server
}

#[tokio::test(start_paused = true)]
async fn test_gameover_rotates_after_extra_round() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = hosting(dir.path()).await;

    server.handle(console("gameover")).await;
    assert!(server.state().round.in_extra_round());
    assert!(server.state().round.pending_task().is_some());

    // The only thing left to happen is the timer firing.
    assert!(server.run_once().await);
    let round = &server.state().round;
    assert!(!round.in_extra_round());
    assert!(round.pending_task().is_none());
    assert_eq!(round.phase(), Phase::Playing);
    assert_ne!(round.state().map.as_ref().unwrap().name, "Craters");
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_extra_round_cancels_next_round() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = hosting(dir.path()).await;

    server.handle(console("gameover")).await;
    server.handle(console("stop")).await;
    assert_eq!(server.state().round.phase(), Phase::Menu);

    let next = timeout(Duration::from_secs(60), server.run_once()).await;
    assert!(next.is_err(), "no task should arrive after stop");
    assert_eq!(server.state().round.phase(), Phase::Menu);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_gameover_schedules_one_round() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = hosting(dir.path()).await;

    server.handle(console("gameover")).await;
    let first = server.state().round.pending_task();
    server.handle(console("gameover")).await;
    let second = server.state().round.pending_task();
    assert_ne!(first, second);

    assert!(server.run_once().await);
    assert!(!server.state().round.in_extra_round());

    let next = timeout(Duration::from_secs(60), server.run_once()).await;
    assert!(next.is_err(), "the replaced timer must not fire");
}
