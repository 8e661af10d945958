//! Player administration for Outpost.
//!
//! This crate is the server's memory of *who* has played on it, separate
//! from who is connected right now:
//!
//! 1. **Trace records** ([`PlayerInfo`]): every name and IP a player id
//!    has used, and how often it joined or was kicked.
//! 2. **Access control** ([`Administration`]): ID and IP bans, admin
//!    status, the whitelist, the player limit and strict mode.
//! 3. **Admission** ([`Administration::admit`]): the check a joining
//!    player must pass, answered with a [`KickReason`] on refusal.
//!
//! The whole [`Administration`] is `serde`-serializable and is persisted
//! as part of the server settings document.

mod admin;
mod error;
mod info;

pub use admin::Administration;
pub use error::AdminError;
pub use info::{KickReason, PlayerInfo};
