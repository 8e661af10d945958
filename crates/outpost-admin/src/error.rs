//! Error types for the administration layer.

/// Errors returned by [`Administration`](crate::Administration) lookups.
///
/// The messages are shown to the operator as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdminError {
    /// No trace record exists for this player id.
    #[error("Player ID not found. You must use the ID displayed when a player joins a server.")]
    UnknownPlayer(String),

    /// Unban by IP for an address that is not banned.
    #[error("That IP is not banned!")]
    IpNotBanned(String),

    /// Unban by id for a player that is not banned.
    #[error("That ID is not banned!")]
    IdNotBanned(String),
}
