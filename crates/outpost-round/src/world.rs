//! The collaborators the round lifecycle drives.
//!
//! The simulation and the game network live outside this crate. The
//! lifecycle only needs the narrow surface below; the server binary ships
//! headless implementations, and tests use in-memory mocks.

use std::io;
use std::time::Duration;

use outpost_admin::KickReason;

use crate::{Map, MapError, Player, PlayerId, Roster, Rules, SaveError};

/// The game simulation.
pub trait World: Send {
    /// Clears all world state.
    fn reset(&mut self);

    /// Loads `map` to be played under `rules`.
    fn load_map(&mut self, map: &Map, rules: &Rules) -> Result<(), MapError>;

    /// Starts simulating the loaded map.
    fn play(&mut self);

    /// Spawns the next wave immediately.
    fn run_wave(&mut self);

    fn wave(&self) -> u32;

    /// Time until the next wave spawns.
    fn wave_countdown(&self) -> Duration;

    /// Enemy units alive.
    fn enemies(&self) -> usize;

    fn current_map(&self) -> Option<&Map>;

    fn save(&mut self, slot: u32) -> Result<(), SaveError>;

    /// Restores a saved session, returning the rules it was played with.
    fn load(&mut self, slot: u32) -> Result<Rules, SaveError>;

    fn is_save_valid(&self, slot: u32) -> bool;
}

/// The game server's network side.
pub trait NetHost: Send {
    /// Starts accepting players on `port`.
    fn host(&mut self, port: u16) -> io::Result<()>;

    /// Stops hosting and disconnects everyone.
    fn close(&mut self);

    fn is_hosting(&self) -> bool;

    fn roster(&self) -> &Roster;

    fn roster_mut(&mut self) -> &mut Roster;

    /// Disconnects one player. Returns the removed player, if connected.
    fn kick(&mut self, id: PlayerId, reason: KickReason) -> Option<Player>;

    fn kick_all(&mut self, reason: KickReason);

    /// A chat line to every player.
    fn broadcast(&mut self, message: &str);

    /// A popup message to every player.
    fn info_message(&mut self, message: &str);

    /// Tells clients a new world is about to be streamed.
    fn world_data_begin(&mut self);

    fn send_world_data(&mut self, player: PlayerId);
}
