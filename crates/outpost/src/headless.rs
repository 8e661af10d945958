//! Headless collaborators for running the control plane without a game
//! simulation attached.
//!
//! [`HeadlessWorld`] keeps just enough world state to report status and to
//! write and restore save slots. [`LocalHost`] claims the game port and
//! keeps the roster in memory; players are added through
//! [`ServerState::connect_player`](crate::ServerState::connect_player).

use std::fs;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};
use std::path::PathBuf;
use std::time::Duration;

use outpost_admin::KickReason;
use outpost_round::{
    Map, MapError, NetHost, Player, PlayerId, Roster, Rules, SaveError, World,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// HeadlessWorld
// ---------------------------------------------------------------------------

/// On-disk layout of a save slot.
#[derive(Debug, Serialize, Deserialize)]
struct SaveFile {
    map: Map,
    custom: bool,
    file: Option<PathBuf>,
    rules: Rules,
    wave: u32,
}

/// World state without a simulation: map, rules and wave counter.
#[derive(Debug)]
pub struct HeadlessWorld {
    saves: PathBuf,
    map: Option<Map>,
    rules: Rules,
    wave: u32,
    playing: bool,
}

impl HeadlessWorld {
    /// A world whose save slots live in `saves` as `<slot>.json`.
    pub fn new(saves: impl Into<PathBuf>) -> Self {
        Self {
            saves: saves.into(),
            map: None,
            rules: Rules::default(),
            wave: 1,
            playing: false,
        }
    }

    pub fn slot_path(&self, slot: u32) -> PathBuf {
        self.saves.join(format!("{slot}.json"))
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }
}

impl World for HeadlessWorld {
    fn reset(&mut self) {
        self.map = None;
        self.rules = Rules::default();
        self.wave = 1;
        self.playing = false;
    }

    fn load_map(&mut self, map: &Map, rules: &Rules) -> Result<(), MapError> {
        // Custom descriptors may have changed or vanished since the scan.
        let map = match (&map.file, map.custom) {
            (Some(path), true) => Map::from_file(path)?,
            _ => map.clone(),
        };
        debug!(map = %map.name, "world loaded");
        self.map = Some(map);
        self.rules = rules.clone();
        self.wave = 1;
        Ok(())
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn run_wave(&mut self) {
        self.wave += 1;
    }

    fn wave(&self) -> u32 {
        self.wave
    }

    fn wave_countdown(&self) -> Duration {
        self.rules.wave_spacing
    }

    fn enemies(&self) -> usize {
        0
    }

    fn current_map(&self) -> Option<&Map> {
        self.map.as_ref()
    }

    fn save(&mut self, slot: u32) -> Result<(), SaveError> {
        let write_err = |source| SaveError::Write { slot, source };
        let Some(map) = &self.map else {
            return Err(write_err(io::Error::other("no map loaded")));
        };
        let file = SaveFile {
            map: map.clone(),
            custom: map.custom,
            file: map.file.clone(),
            rules: self.rules.clone(),
            wave: self.wave,
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| write_err(io::Error::other(e)))?;
        fs::create_dir_all(&self.saves).map_err(write_err)?;
        fs::write(self.slot_path(slot), json).map_err(write_err)
    }

    fn load(&mut self, slot: u32) -> Result<Rules, SaveError> {
        let corrupt = |reason: String| SaveError::Corrupt { slot, reason };
        let text = fs::read_to_string(self.slot_path(slot)).map_err(|e| corrupt(e.to_string()))?;
        let save: SaveFile = serde_json::from_str(&text).map_err(|e| corrupt(e.to_string()))?;

        let mut map = save.map;
        map.custom = save.custom;
        map.file = save.file;
        self.map = Some(map);
        self.rules = save.rules.clone();
        self.wave = save.wave;
        self.playing = true;
        Ok(save.rules)
    }

    fn is_save_valid(&self, slot: u32) -> bool {
        self.slot_path(slot).is_file()
    }
}

// ---------------------------------------------------------------------------
// LocalHost
// ---------------------------------------------------------------------------

/// Holds the game port and the in-memory roster.
#[derive(Debug)]
pub struct LocalHost {
    bind_ip: IpAddr,
    listener: Option<TcpListener>,
    roster: Roster,
    next_id: u64,
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalHost {
    /// Binds on all interfaces.
    pub fn new() -> Self {
        Self::bound_to(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }

    pub fn bound_to(bind_ip: IpAddr) -> Self {
        Self {
            bind_ip,
            listener: None,
            roster: Roster::new(),
            next_id: 1,
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// A fresh connection id.
    pub fn next_player_id(&mut self) -> PlayerId {
        let id = PlayerId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl NetHost for LocalHost {
    fn host(&mut self, port: u16) -> io::Result<()> {
        if self.listener.is_some() {
            self.close();
        }
        self.listener = Some(TcpListener::bind((self.bind_ip, port))?);
        Ok(())
    }

    fn close(&mut self) {
        if self.listener.take().is_some() {
            self.kick_all(KickReason::ServerClose);
            debug!("game port released");
        }
    }

    fn is_hosting(&self) -> bool {
        self.listener.is_some()
    }

    fn roster(&self) -> &Roster {
        &self.roster
    }

    fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    fn kick(&mut self, id: PlayerId, reason: KickReason) -> Option<Player> {
        let player = self.roster.remove(id)?;
        info!(player = %id, "{} has disconnected: {reason}", player.name);
        Some(player)
    }

    fn kick_all(&mut self, reason: KickReason) {
        for player in self.roster.clear() {
            debug!(player = %player.id, %reason, "player kicked");
        }
    }

    fn broadcast(&mut self, message: &str) {
        debug!(target: "outpost::chat", recipients = self.roster.len(), "{message}");
    }

    fn info_message(&mut self, message: &str) {
        debug!(target: "outpost::chat", recipients = self.roster.len(), "{message}");
    }

    fn world_data_begin(&mut self) {
        debug!("world data begin");
    }

    fn send_world_data(&mut self, player: PlayerId) {
        debug!(%player, "world data sent");
    }
}
