//! Player trace records and kick reasons.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Everything the server remembers about one player id.
///
/// Created on first join (or when an unknown id is banned) and never
/// removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// The player's persistent id (a client-generated UUID string).
    pub id: String,
    pub last_name: String,
    pub last_ip: String,
    /// Every distinct name used, oldest first.
    pub names: Vec<String>,
    /// Every distinct IP used, oldest first.
    pub ips: Vec<String>,
    pub times_joined: u32,
    pub times_kicked: u32,
    pub banned: bool,
    pub admin: bool,
    pub whitelisted: bool,
}

impl PlayerInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            last_name: "<unknown>".to_string(),
            last_ip: "<unknown>".to_string(),
            names: Vec::new(),
            ips: Vec::new(),
            times_joined: 0,
            times_kicked: 0,
            banned: false,
            admin: false,
            whitelisted: false,
        }
    }

    /// Records a name and IP, keeping the history lists free of repeats.
    pub(crate) fn seen_as(&mut self, name: &str, ip: &str) {
        self.last_name = name.to_string();
        self.last_ip = ip.to_string();
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_string());
        }
        if !self.ips.iter().any(|i| i == ip) {
            self.ips.push(ip.to_string());
        }
    }
}

/// Why a player was disconnected by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KickReason {
    Kick,
    Banned,
    GameOver,
    ServerClose,
    PlayerLimit,
    Whitelist,
}

impl fmt::Display for KickReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KickReason::Kick => "You have been kicked from the server.",
            KickReason::Banned => "You are banned on this server.",
            KickReason::GameOver => "The game is over!",
            KickReason::ServerClose => "The server has been closed.",
            KickReason::PlayerLimit => "This server is full.",
            KickReason::Whitelist => "You are not whitelisted here.",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_has_no_repeats() {
        let mut info = PlayerInfo::new("uuid-1");
        info.seen_as("anuke", "10.0.0.1");
        info.seen_as("Anuke", "10.0.0.1");
        info.seen_as("anuke", "10.0.0.2");
        assert_eq!(info.names, vec!["anuke", "Anuke"]);
        assert_eq!(info.ips, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(info.last_name, "anuke");
        assert_eq!(info.last_ip, "10.0.0.2");
    }

    #[test]
    fn test_kick_reason_serializes_camel_case() {
        let json = serde_json::to_string(&KickReason::ServerClose).unwrap();
        assert_eq!(json, "\"serverClose\"");
    }
}
