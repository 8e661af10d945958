//! Error types for the round layer.
//!
//! The `Display` text of [`RoundError`] is what the operator sees when a
//! command fails, so it reads as a sentence rather than a debug label.

/// A round operation was refused or failed.
#[derive(Debug, thiserror::Error)]
pub enum RoundError {
    #[error("Already hosting. Type 'stop' to stop hosting first.")]
    AlreadyHosting,

    #[error("Not hosting. Host a game first.")]
    NotHosting,

    #[error("No map with name '{0}' found.")]
    MapNotFound(String),

    #[error("No gamemode '{0}' found.")]
    InvalidGamemode(String),

    #[error("Invalid save slot '{0}'.")]
    InvalidSlot(String),

    #[error("No (valid) save data found for slot.")]
    NoSave,

    #[error(transparent)]
    MapLoad(#[from] MapError),

    #[error(transparent)]
    Save(#[from] SaveError),

    /// The game port is held by another process.
    #[error(
        "Unable to host: Port already in use! Make sure no other servers are running on the same port in your network."
    )]
    PortInUse(u16),

    #[error("Unable to host: {0}")]
    Host(#[source] std::io::Error),
}

/// A map could not be read or loaded.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("{map}: {source}")]
    Io {
        map: String,
        source: std::io::Error,
    },

    #[error("{map}: {reason}")]
    Invalid { map: String, reason: String },
}

/// A save slot could not be written or restored.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("Failed to load save. Outdated or corrupt file.")]
    Corrupt { slot: u32, reason: String },

    #[error("Failed to save to slot {slot}: {source}")]
    Write {
        slot: u32,
        source: std::io::Error,
    },
}
