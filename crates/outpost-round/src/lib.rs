//! Round lifecycle management for Outpost.
//!
//! The server runs exactly one game session. This crate owns its state
//! machine and everything the state machine needs to decide on:
//!
//! - [`RoundLifecycle`]: host, stop, game over, extra round, next round
//! - [`MapRegistry`]: built-in and custom maps, rotation
//! - [`Gamemode`] / [`Rules`] / [`Difficulty`] / [`Team`]: rule presets
//! - [`World`] / [`NetHost`]: the collaborators the lifecycle drives
//! - [`Roster`]: connected players and team assignment

mod config;
mod error;
mod lifecycle;
mod map;
mod player;
mod rules;
mod world;

pub use config::{Phase, ROUND_EXTRA_TIME, RoundConfig, SessionState};
pub use error::{MapError, RoundError, SaveError};
pub use lifecycle::{GameOverOutcome, RoundLifecycle};
pub use map::{Map, MapRegistry, MapRules};
pub use player::{Player, PlayerId, Roster, assign_team};
pub use rules::{Difficulty, Gamemode, Rules, Team, UnknownName};
pub use world::{NetHost, World};
