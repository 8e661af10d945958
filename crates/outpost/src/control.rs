//! `ServerControl` builder and the execution context loop.
//!
//! This is where everything meets: producers post [`ControlTask`]s on one
//! queue, and [`ServerControl::run`] pops them one at a time and applies
//! them to the [`ServerState`] it owns.

use std::fs;
use std::io::{self, Write};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use outpost_command::{CommandInfo, Response, ResponseKind};
use outpost_input::{
    COMMAND_SOCKET_PORT, ControlTask, Line, Origin, SocketInput, TaskReceiver, TaskSender,
    task_queue,
};
use outpost_log::LogHandles;
use outpost_round::{MapRegistry, NetHost, RoundConfig, RoundLifecycle};
use tracing::{debug, error, info};

use crate::commands::register_builtin;
use crate::headless::{HeadlessWorld, LocalHost};
use crate::plugin::Plugin;
use crate::settings::SettingsStore;
use crate::state::{DataPaths, Registry, ServerState};
use crate::OutpostError;

const STARTUP_USAGE: &str = "<command-1> <command1-args...>,<command-2> <command-2-args2...>";

/// Builder for configuring a [`ServerControl`].
///
/// # Example
///
/// ```rust,ignore
/// let log = outpost_log::init(LogConfig::new("config/logs"))?;
/// let mut server = ServerControl::builder("config").build(log)?;
/// server.start();
/// server.run().await;
/// ```
pub struct ServerControlBuilder {
    data_dir: PathBuf,
    socket_port: u16,
    game_ip: IpAddr,
    round: RoundConfig,
    plugins: Vec<Box<dyn Plugin>>,
    prompt: bool,
}

impl ServerControlBuilder {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            socket_port: COMMAND_SOCKET_PORT,
            game_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            round: RoundConfig::default(),
            plugins: Vec::new(),
            prompt: true,
        }
    }

    /// Port of the command socket. 0 picks an ephemeral port.
    pub fn socket_port(mut self, port: u16) -> Self {
        self.socket_port = port;
        self
    }

    /// Interface the game port is opened on.
    pub fn game_ip(mut self, ip: IpAddr) -> Self {
        self.game_ip = ip;
        self
    }

    pub fn round_config(mut self, config: RoundConfig) -> Self {
        self.round = config;
        self
    }

    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Whether to print `> ` after each handled line.
    pub fn prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    /// Loads settings and maps, and registers built-in and plugin commands.
    ///
    /// # Errors
    /// Unreadable settings, an uncreatable data directory, or a plugin
    /// whose commands collide with existing ones.
    pub fn build(self, log: LogHandles) -> Result<ServerControl, OutpostError> {
        let paths = DataPaths::new(self.data_dir);
        fs::create_dir_all(&paths.maps)?;
        fs::create_dir_all(&paths.plugins)?;

        let store = SettingsStore::in_dir(paths.root());
        let settings = store.load()?;

        let (tx, rx) = task_queue();
        let timer_tx = tx.clone();
        let mut maps = MapRegistry::new(paths.maps.clone());
        maps.reload();
        let round = RoundLifecycle::new(
            HeadlessWorld::new(paths.saves.clone()),
            LocalHost::bound_to(self.game_ip),
            maps,
            self.round,
            move |id| {
                // The receiver only goes away when the server is shutting down.
                let _ = timer_tx.send(ControlTask::Timer(id));
            },
        );
        let socket = SocketInput::new(self.socket_port, log.mirror);
        let mut state = ServerState::new(settings, store, round, socket, paths, log.sink, tx.clone());

        let mut registry = Registry::new();
        register_builtin(&mut registry)?;
        for plugin in &self.plugins {
            plugin.register_server_commands(&mut registry)?;
            let meta = plugin.meta();
            debug!(plugin = %meta.name, "plugin registered");
            state.plugins.push(meta);
        }
        if !state.plugins.is_empty() {
            info!("{} plugin(s) loaded.", state.plugins.len());
        }

        Ok(ServerControl {
            state,
            registry,
            tx,
            rx,
            prompt: self.prompt,
        })
    }
}

// ---------------------------------------------------------------------------
// ServerControl
// ---------------------------------------------------------------------------

/// The single execution context.
///
/// Owns the server state and the command registry. Every mutation of
/// either happens inside [`run`](Self::run) (or the direct `handle_*`
/// calls tests use), one task at a time.
pub struct ServerControl {
    state: ServerState,
    registry: Registry,
    tx: TaskSender,
    rx: TaskReceiver,
    prompt: bool,
}

impl ServerControl {
    pub fn builder(data_dir: impl Into<PathBuf>) -> ServerControlBuilder {
        ServerControlBuilder::new(data_dir)
    }

    /// A handle producers use to post work.
    pub fn sender(&self) -> TaskSender {
        self.tx.clone()
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ServerState {
        &mut self.state
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Opens the command socket if the settings ask for it.
    pub fn start(&mut self) {
        if self.state.settings.socket {
            if let Err(e) = self.state.enable_socket() {
                error!("{e}");
            }
        }
        info!("Server loaded. Type 'help' for help.");
    }

    /// Runs the commands given on the command line.
    ///
    /// The arguments are joined with spaces and split on `,`, so
    /// `host Craters pvp,say hello` runs two commands.
    ///
    /// Each chunk runs like a queued line, so the command socket is settled
    /// before the next one.
    ///
    /// # Errors
    /// [`OutpostError::Startup`] on the first chunk that is not a valid
    /// command. A valid command whose handler fails does not stop startup.
    pub async fn run_startup_commands(&mut self, args: &[String]) -> Result<(), OutpostError> {
        if args.is_empty() {
            return Ok(());
        }
        let joined = args.join(" ");
        let chunks: Vec<&str> = joined.split(',').collect();
        info!("Found {} command-line arguments to parse.", chunks.len());

        for chunk in chunks {
            let response = self.handle_line(&Line::new(Origin::Startup, chunk));
            self.state.socket.settle().await;
            if !response.is_valid() {
                error!("Invalid command argument sent: '{chunk}': {:?}", response.kind);
                error!("Argument usage: {STARTUP_USAGE}");
                return Err(OutpostError::Startup(chunk.to_string()));
            }
        }
        Ok(())
    }

    /// Drains the queue until `exit` runs.
    pub async fn run(&mut self) {
        while !self.state.exit_requested() && self.run_once().await {}
        self.shutdown().await;
    }

    /// Waits for the next task and applies it. Returns `false` once the
    /// queue is closed.
    pub async fn run_once(&mut self) -> bool {
        match self.rx.recv().await {
            Some(task) => {
                self.handle(task).await;
                true
            }
            None => false,
        }
    }

    /// Applies one task.
    pub async fn handle(&mut self, task: ControlTask) {
        match task {
            ControlTask::Line(line) => {
                self.handle_line(&line);
                self.state.socket.settle().await;
                self.print_prompt();
            }
            ControlTask::Timer(id) => {
                self.state.round.on_timer(id);
            }
        }
    }

    /// Dispatches one line and reports an unusable one.
    pub fn handle_line(&mut self, line: &Line) -> Response {
        debug!(origin = %line.origin, command = %line.text, "handling line");
        let response = self.registry.dispatch(&mut self.state, &line.text);
        self.report(&response);
        response
    }

    fn report(&self, response: &Response) {
        let usage = || response.command.as_ref().map(CommandInfo::usage).unwrap_or_default();
        match response.kind {
            ResponseKind::UnknownCommand => match self.registry.suggest(&response.run_command) {
                Some(closest) => error!("Command not found. Did you mean \"{}\"?", closest.name),
                None => error!("Invalid command. Type 'help' for help."),
            },
            ResponseKind::FewArguments => {
                error!("Too few command arguments. Usage: {}", usage());
            }
            ResponseKind::ManyArguments => {
                error!("Too many command arguments. Usage: {}", usage());
            }
            ResponseKind::Valid | ResponseKind::Empty => {}
        }
    }

    fn print_prompt(&self) {
        if !self.prompt {
            return;
        }
        let mut out = io::stdout().lock();
        let _ = write!(out, "> ");
        let _ = out.flush();
    }

    async fn shutdown(&mut self) {
        self.state.socket.disable();
        self.state.socket.settle().await;
        self.state.round.net_mut().close();
        debug!("execution context stopped");
    }
}
