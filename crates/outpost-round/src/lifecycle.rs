//! The round lifecycle: hosting, game over, the extra round and the next
//! round's start.
//!
//! `RoundLifecycle` is owned by the server's execution context and only
//! ever touched from there. The one asynchronous piece, the delayed start
//! of the next round, goes through the [`Scheduler`]: the fired task id is
//! posted back onto the context's queue and handed to
//! [`RoundLifecycle::on_timer`].

use std::io;

use outpost_admin::KickReason;
use outpost_timer::{ScheduledTask, Scheduler, TaskId};
use tracing::{debug, error, info};

use crate::{
    Gamemode, Map, MapRegistry, NetHost, Phase, Player, PlayerId, RoundConfig, RoundError, Rules,
    SessionState, Team, World, assign_team,
};

/// What a game over led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOverOutcome {
    /// Already in an extra round, or nothing is being played.
    Ignored,
    /// An extra round started; `map` loads when `task` fires.
    NextRound { map: String, task: TaskId },
    /// Shuffle is on but there is no map to rotate to. Play continues.
    NoMaps,
    /// Shuffle is off: everyone was kicked and hosting closed.
    Closed,
}

struct PendingRound {
    task: ScheduledTask,
    map: Map,
}

/// The session state machine and the collaborators it drives.
pub struct RoundLifecycle<W, N> {
    world: W,
    net: N,
    maps: MapRegistry,
    config: RoundConfig,
    state: SessionState,
    scheduler: Scheduler,
    pending: Option<PendingRound>,
}

impl<W: World, N: NetHost> RoundLifecycle<W, N> {
    /// `post` must enqueue the fired task id on the execution context's
    /// queue; it is called from a timer task.
    pub fn new(
        world: W,
        net: N,
        maps: MapRegistry,
        config: RoundConfig,
        post: impl Fn(TaskId) + Send + Sync + 'static,
    ) -> Self {
        Self {
            world,
            net,
            maps,
            config,
            state: SessionState::default(),
            scheduler: Scheduler::new(post),
            pending: None,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn in_extra_round(&self) -> bool {
        self.state.in_extra_round
    }

    /// Rules of the current round. Changes apply until the next map loads.
    pub fn rules_mut(&mut self) -> &mut Rules {
        &mut self.state.rules
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn net(&self) -> &N {
        &self.net
    }

    pub fn net_mut(&mut self) -> &mut N {
        &mut self.net
    }

    pub fn maps(&self) -> &MapRegistry {
        &self.maps
    }

    pub fn maps_mut(&mut self) -> &mut MapRegistry {
        &mut self.maps
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    /// The scheduled next-round task, if one is pending.
    pub fn pending_task(&self) -> Option<TaskId> {
        self.pending.as_ref().map(|p| p.task.id())
    }

    // -----------------------------------------------------------------------
    // Hosting
    // -----------------------------------------------------------------------

    /// Loads `map_name` in `mode` (survival when absent) and opens the
    /// server on `port`.
    ///
    /// # Errors
    /// User errors (already hosting, unknown map or mode) leave the state
    /// untouched. Load and port failures leave the lifecycle in the menu.
    pub fn host(&mut self, map_name: &str, mode: Option<&str>, port: u16) -> Result<(), RoundError> {
        if self.state.is_playing() {
            return Err(RoundError::AlreadyHosting);
        }
        self.cancel_pending();

        let map = self
            .maps
            .find(map_name)
            .cloned()
            .ok_or_else(|| RoundError::MapNotFound(map_name.to_string()))?;
        let mode = match mode {
            Some(token) => token
                .parse::<Gamemode>()
                .map_err(|unknown| RoundError::InvalidGamemode(unknown.0))?,
            None => Gamemode::Survival,
        };

        info!("Loading map...");
        self.world.reset();
        let rules = map.apply_rules(mode);
        if let Err(e) = self.world.load_map(&map, &rules) {
            self.enter_menu();
            return Err(e.into());
        }
        self.world.play();
        self.state.rules = rules;
        self.state.map = Some(map);
        self.state.phase = Phase::Playing;
        info!("Map loaded.");

        self.open(port)?;
        self.state.mode = mode;
        Ok(())
    }

    fn open(&mut self, port: u16) -> Result<(), RoundError> {
        match self.net.host(port) {
            Ok(()) => {
                info!(port, "Opened a server on port {port}.");
                Ok(())
            }
            Err(e) => {
                self.net.close();
                self.enter_menu();
                if e.kind() == io::ErrorKind::AddrInUse {
                    Err(RoundError::PortInUse(port))
                } else {
                    Err(RoundError::Host(e))
                }
            }
        }
    }

    /// Closes hosting and returns to the menu, cancelling any pending round.
    pub fn stop(&mut self) {
        self.net.close();
        self.enter_menu();
        info!("Stopped server.");
    }

    /// Every way back to the menu drops the pending next round.
    fn enter_menu(&mut self) {
        self.cancel_pending();
        self.state.phase = Phase::Menu;
        self.state.map = None;
        self.state.in_extra_round = false;
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.cancel();
        }
    }

    // -----------------------------------------------------------------------
    // Game over and rotation
    // -----------------------------------------------------------------------

    /// Ends the current round.
    ///
    /// With `shuffle`, the next map is picked and announced, and the round
    /// starts after the extra-round delay. Without it, everyone is kicked
    /// and hosting closes.
    pub fn game_over(&mut self, winner: Team, shuffle: bool) -> GameOverOutcome {
        if self.state.in_extra_round || self.state.is_menu() {
            return GameOverOutcome::Ignored;
        }
        info!("Game over!");

        if !shuffle {
            self.net.kick_all(KickReason::GameOver);
            self.enter_menu();
            self.net.close();
            return GameOverOutcome::Closed;
        }

        let Some(next) = self
            .maps
            .select_next(self.state.map.as_ref(), &mut rand::rng())
            .cloned()
        else {
            return GameOverOutcome::NoMaps;
        };

        let message = self.round_message(winner, &next);
        self.net.info_message(&message);
        info!("Selected next map to be {}.", next.name);

        // A forced game over can land here with a round still pending.
        self.cancel_pending();
        self.state.in_extra_round = true;
        let task = self.scheduler.schedule(self.config.extra_round_delay);
        let id = task.id();
        let name = next.name.clone();
        self.pending = Some(PendingRound { task, map: next });

        GameOverOutcome::NextRound { map: name, task: id }
    }

    /// The `gameover` command: ends the round as a crux win.
    pub fn force_game_over(&mut self, shuffle: bool) -> GameOverOutcome {
        if self.state.is_menu() {
            info!("Not playing a map.");
            return GameOverOutcome::Ignored;
        }
        info!("Core destroyed.");
        self.state.in_extra_round = false;
        self.game_over(Team::Crux, shuffle)
    }

    fn round_message(&self, winner: Team, next: &Map) -> String {
        let headline = if self.state.rules.pvp {
            format!("[YELLOW]The {winner} team is victorious![]")
        } else {
            "[SCARLET]Game over![]".to_string()
        };
        let author = next
            .author()
            .map(|a| format!(" by[accent] {a}[]"))
            .unwrap_or_default();
        format!(
            "{headline}\nNext selected map:[accent] {}[]{author}.\nNew game begins in {}[] seconds.",
            next.name,
            self.config.extra_round_delay.as_secs()
        )
    }

    /// Handles a fired timer task. Returns `true` if it started a round.
    ///
    /// Ids of cancelled or superseded tasks are ignored.
    pub fn on_timer(&mut self, id: TaskId) -> bool {
        if self.pending.as_ref().is_none_or(|p| p.task.id() != id) {
            debug!(task = %id, "stale timer ignored");
            return false;
        }
        let Some(pending) = self.pending.take() else {
            return false;
        };
        if !pending.task.claim() {
            return false;
        }
        self.advance(pending.map);
        true
    }

    fn advance(&mut self, map: Map) {
        for player in self.net.roster_mut().iter_mut() {
            player.dead = true;
        }

        self.world.reset();
        self.net.world_data_begin();
        let rules = map.apply_rules(self.state.mode);
        if let Err(e) = self.world.load_map(&map, &rules) {
            error!("{e}");
            self.net.close();
            self.enter_menu();
            return;
        }
        self.world.play();
        debug!(map = %map.name, mode = %self.state.mode, "next round started");
        self.state.rules = rules;
        self.state.map = Some(map);
        self.state.phase = Phase::Playing;

        let roster = self.net.roster_mut();
        for player in roster.iter_mut() {
            player.reset();
        }
        if self.state.rules.pvp {
            roster.assign_teams(&self.state.rules);
        }
        for id in self.net.roster().ids() {
            self.net.send_world_data(id);
        }
        self.state.in_extra_round = false;
    }

    // -----------------------------------------------------------------------
    // Players
    // -----------------------------------------------------------------------

    /// Adds a connected player on the team the current rules give them.
    pub fn add_player(&mut self, mut player: Player) -> PlayerId {
        player.team = assign_team(&self.state.rules, self.net.roster().iter());
        let id = player.id;
        self.net.roster_mut().add(player);
        id
    }

    // -----------------------------------------------------------------------
    // Waves and saves
    // -----------------------------------------------------------------------

    pub fn run_wave(&mut self) -> Result<(), RoundError> {
        if !self.state.is_playing() {
            return Err(RoundError::NotHosting);
        }
        self.world.run_wave();
        info!("Wave spawned.");
        Ok(())
    }

    /// Saves the running session to `slot`.
    pub fn save(&mut self, slot: &str) -> Result<u32, RoundError> {
        if !self.state.is_playing() {
            return Err(RoundError::NotHosting);
        }
        let slot = parse_slot(slot)?;
        self.world.save(slot)?;
        info!("Saved to slot {slot}.");
        Ok(slot)
    }

    /// Restores `slot` and opens the server on `port`.
    ///
    /// # Errors
    /// Refused while playing. A corrupt save or a taken port leaves the
    /// lifecycle in the menu.
    pub fn load(&mut self, slot: &str, port: u16) -> Result<(), RoundError> {
        if self.state.is_playing() {
            return Err(RoundError::AlreadyHosting);
        }
        let slot = parse_slot(slot)?;
        if !self.world.is_save_valid(slot) {
            return Err(RoundError::NoSave);
        }
        self.cancel_pending();

        let rules = match self.world.load(slot) {
            Ok(rules) => rules,
            Err(e) => {
                self.enter_menu();
                return Err(e.into());
            }
        };
        info!("Save loaded.");
        self.state.rules = rules;
        self.state.map = self.world.current_map().cloned();
        self.state.phase = Phase::Playing;

        self.open(port)
    }
}

fn parse_slot(slot: &str) -> Result<u32, RoundError> {
    slot.parse()
        .map_err(|_| RoundError::InvalidSlot(slot.to_string()))
}
