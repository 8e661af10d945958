//! The `outpost-server` binary.

use std::path::PathBuf;

use clap::Parser;
use outpost::{DataPaths, OutpostError, ServerControl};
use outpost_input::{COMMAND_SOCKET_PORT, spawn_console};
use outpost_log::LogConfig;

/// Dedicated game server with console and socket command input
#[derive(Parser, Debug)]
#[command(name = "outpost-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory for settings, maps, saves, plugins and logs
    #[arg(long, default_value = "config")]
    data_dir: PathBuf,

    /// Port of the local command socket
    #[arg(long, default_value_t = COMMAND_SOCKET_PORT)]
    socket_port: u16,

    /// Commands to run at startup, separated by commas
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    commands: Vec<String>,
}

async fn serve(args: Args) -> Result<(), OutpostError> {
    let paths = DataPaths::new(&args.data_dir);
    let log = outpost_log::init(LogConfig::new(&paths.logs))?;

    let mut server = ServerControl::builder(args.data_dir)
        .socket_port(args.socket_port)
        .build(log)?;
    spawn_console(tokio::io::stdin(), server.sender());

    server.start();
    server.run_startup_commands(&args.commands).await?;
    server.run().await;
    Ok(())
}

fn main() -> Result<(), OutpostError> {
    let args = Args::parse();
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(serve(args));
    // The console reader may still be parked in a blocking stdin read.
    runtime.shutdown_background();
    result
}
