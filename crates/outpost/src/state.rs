//! The state every command handler works on.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use outpost_admin::KickReason;
use outpost_command::CommandRegistry;
use outpost_input::{InputError, SocketInput, TaskSender};
use outpost_log::LogSink;
use outpost_round::{GameOverOutcome, NetHost, Player, PlayerId, RoundLifecycle, Team};
use tracing::{info, warn};

use crate::headless::{HeadlessWorld, LocalHost};
use crate::plugin::PluginMeta;
use crate::settings::{Settings, SettingsError, SettingsStore};
use crate::OutpostError;

/// The round lifecycle with the headless collaborators.
pub type Round = RoundLifecycle<HeadlessWorld, LocalHost>;

/// The server's command registry.
pub type Registry = CommandRegistry<ServerState, OutpostError>;

// ---------------------------------------------------------------------------
// DataPaths
// ---------------------------------------------------------------------------

/// Where the server keeps its files, all under one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub root: PathBuf,
    pub maps: PathBuf,
    pub plugins: PathBuf,
    pub saves: PathBuf,
    pub logs: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            maps: root.join("maps"),
            plugins: root.join("plugins"),
            saves: root.join("saves"),
            logs: root.join("logs"),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

// ---------------------------------------------------------------------------
// ServerState
// ---------------------------------------------------------------------------

/// Everything the execution context owns.
///
/// Handlers get `&mut ServerState`; nothing here is shared with another
/// task, so there are no locks.
pub struct ServerState {
    pub settings: Settings,
    store: SettingsStore,
    pub round: Round,
    pub socket: SocketInput,
    pub plugins: Vec<PluginMeta>,
    pub paths: DataPaths,
    log: LogSink,
    tx: TaskSender,
    exit: bool,
}

impl ServerState {
    pub(crate) fn new(
        settings: Settings,
        store: SettingsStore,
        round: Round,
        socket: SocketInput,
        paths: DataPaths,
        log: LogSink,
        tx: TaskSender,
    ) -> Self {
        log.set_enabled(settings.logging);
        Self {
            settings,
            store,
            round,
            socket,
            plugins: Vec::new(),
            paths,
            log,
            tx,
            exit: false,
        }
    }

    /// Writes the current settings to disk.
    pub fn persist(&self) -> Result<(), SettingsError> {
        self.store.save(&self.settings)
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// Turns writing to the log file on or off.
    pub fn set_logging(&mut self, enabled: bool) {
        self.settings.logging = enabled;
        self.log.set_enabled(enabled);
    }

    pub fn is_logging(&self) -> bool {
        self.log.is_enabled()
    }

    /// Opens the command socket, posting its lines on the server's queue.
    pub fn enable_socket(&mut self) -> Result<SocketAddr, InputError> {
        self.socket.enable(self.tx.clone())
    }

    /// Asks the execution context to stop after the current task.
    pub fn request_exit(&mut self) {
        self.exit = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit
    }

    // -----------------------------------------------------------------------
    // Game events
    // -----------------------------------------------------------------------

    /// Admits a connecting player, or says why they are turned away.
    pub fn connect_player(&mut self, name: &str, uuid: &str, ip: &str) -> Result<PlayerId, KickReason> {
        if !self.round.is_playing() {
            return Err(KickReason::ServerClose);
        }
        let online = self.round.net().roster().len();
        self.settings.admin.admit(uuid, ip, online)?;

        self.settings.admin.record_join(uuid, name, ip);
        let id = self.round.net_mut().next_player_id();
        let mut player = Player::new(id, name, uuid, ip);
        player.admin = self.settings.admin.is_admin(uuid);
        self.round.add_player(player);
        info!(player = %id, "{name} has connected. [{uuid}]");

        if let Err(e) = self.persist() {
            warn!("{e}");
        }
        Ok(id)
    }

    pub fn disconnect_player(&mut self, id: PlayerId) -> Option<Player> {
        let player = self.round.net_mut().roster_mut().remove(id)?;
        info!(player = %id, "{} has disconnected.", player.name);
        Some(player)
    }

    /// A team's cores were all destroyed. Rotates or closes per `shuffle`.
    pub fn game_over(&mut self, winner: Team) -> GameOverOutcome {
        self.round.game_over(winner, self.settings.shuffle)
    }
}
