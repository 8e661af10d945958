//! The administration database: trace records plus access-control state.
//!
//! Like the rest of the server state, `Administration` is owned by the
//! single execution context and mutated through `&mut self`; there is no
//! interior locking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{AdminError, KickReason, PlayerInfo};

/// Bans, admins, whitelist and limits, keyed by player id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Administration {
    /// Trace records by player id. A `BTreeMap` so listings are stable.
    players: BTreeMap<String, PlayerInfo>,
    banned_ips: Vec<String>,
    whitelist_enabled: bool,
    /// `0` means no limit.
    player_limit: u32,
    strict: bool,
    custom_clients: bool,
}

impl Administration {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Trace records
    // -----------------------------------------------------------------------

    /// Records a successful join, creating the trace record if needed.
    pub fn record_join(&mut self, id: &str, name: &str, ip: &str) -> &PlayerInfo {
        let info = self
            .players
            .entry(id.to_string())
            .or_insert_with(|| PlayerInfo::new(id));
        info.seen_as(name, ip);
        info.times_joined += 1;
        debug!(player = id, name, ip, "player join recorded");
        info
    }

    pub fn record_kick(&mut self, id: &str) {
        if let Some(info) = self.players.get_mut(id) {
            info.times_kicked += 1;
        }
    }

    /// The trace record for `id`, if the player was ever seen.
    pub fn info(&self, id: &str) -> Option<&PlayerInfo> {
        self.players.get(id)
    }

    /// All trace records matching `query`.
    ///
    /// A record matches when `query` equals its last name (ignoring case),
    /// any name it has used, any IP it has used, or its id.
    pub fn find(&self, query: &str) -> Vec<&PlayerInfo> {
        self.players
            .values()
            .filter(|info| {
                info.last_name.eq_ignore_ascii_case(query)
                    || info.names.iter().any(|n| n == query)
                    || info.ips.iter().any(|ip| ip == query)
                    || info.id == query
            })
            .collect()
    }

    /// The most recent trace record that last used `ip`.
    pub fn find_by_ip(&self, ip: &str) -> Option<&PlayerInfo> {
        self.players.values().find(|info| info.last_ip == ip)
    }

    // -----------------------------------------------------------------------
    // Bans
    // -----------------------------------------------------------------------

    /// Bans a player id. Unknown ids get a fresh trace record.
    ///
    /// Returns `false` if the id was already banned.
    pub fn ban_id(&mut self, id: &str) -> bool {
        let info = self
            .players
            .entry(id.to_string())
            .or_insert_with(|| PlayerInfo::new(id));
        let newly = !info.banned;
        info.banned = true;
        info!(player = id, "player id banned");
        newly
    }

    /// Bans an IP, and every known player whose last IP it was.
    ///
    /// Returns `false` if the IP was already banned.
    pub fn ban_ip(&mut self, ip: &str) -> bool {
        for info in self.players.values_mut().filter(|i| i.last_ip == ip) {
            info.banned = true;
        }
        if self.banned_ips.iter().any(|b| b == ip) {
            return false;
        }
        self.banned_ips.push(ip.to_string());
        info!(ip, "ip banned");
        true
    }

    /// # Errors
    /// [`AdminError::IdNotBanned`] if the id is unknown or not banned.
    pub fn unban_id(&mut self, id: &str) -> Result<(), AdminError> {
        match self.players.get_mut(id) {
            Some(info) if info.banned => {
                info.banned = false;
                Ok(())
            }
            _ => Err(AdminError::IdNotBanned(id.to_string())),
        }
    }

    /// Lifts an IP ban, and the bans of players whose last IP it was.
    ///
    /// # Errors
    /// [`AdminError::IpNotBanned`] if nothing was banned under this IP.
    pub fn unban_ip(&mut self, ip: &str) -> Result<(), AdminError> {
        let mut found = false;
        for info in self.players.values_mut().filter(|i| i.last_ip == ip && i.banned) {
            info.banned = false;
            found = true;
        }
        let before = self.banned_ips.len();
        self.banned_ips.retain(|b| b != ip);
        found |= self.banned_ips.len() != before;

        if found {
            Ok(())
        } else {
            Err(AdminError::IpNotBanned(ip.to_string()))
        }
    }

    pub fn is_id_banned(&self, id: &str) -> bool {
        self.players.get(id).is_some_and(|info| info.banned)
    }

    pub fn is_ip_banned(&self, ip: &str) -> bool {
        self.banned_ips.iter().any(|b| b == ip)
    }

    /// Trace records of ID-banned players.
    pub fn banned(&self) -> Vec<&PlayerInfo> {
        self.players.values().filter(|info| info.banned).collect()
    }

    pub fn banned_ips(&self) -> &[String] {
        &self.banned_ips
    }

    // -----------------------------------------------------------------------
    // Admins
    // -----------------------------------------------------------------------

    /// Grants or revokes admin status. Unknown ids get a fresh trace record.
    pub fn set_admin(&mut self, id: &str, admin: bool) {
        let info = self
            .players
            .entry(id.to_string())
            .or_insert_with(|| PlayerInfo::new(id));
        info.admin = admin;
    }

    pub fn is_admin(&self, id: &str) -> bool {
        self.players.get(id).is_some_and(|info| info.admin)
    }

    pub fn admins(&self) -> Vec<&PlayerInfo> {
        self.players.values().filter(|info| info.admin).collect()
    }

    // -----------------------------------------------------------------------
    // Whitelist
    // -----------------------------------------------------------------------

    /// # Errors
    /// [`AdminError::UnknownPlayer`] if the id was never seen.
    pub fn whitelist(&mut self, id: &str) -> Result<&PlayerInfo, AdminError> {
        self.set_whitelisted(id, true)
    }

    /// # Errors
    /// [`AdminError::UnknownPlayer`] if the id was never seen.
    pub fn unwhitelist(&mut self, id: &str) -> Result<&PlayerInfo, AdminError> {
        self.set_whitelisted(id, false)
    }

    fn set_whitelisted(&mut self, id: &str, on: bool) -> Result<&PlayerInfo, AdminError> {
        let info = self
            .players
            .get_mut(id)
            .ok_or_else(|| AdminError::UnknownPlayer(id.to_string()))?;
        info.whitelisted = on;
        Ok(info)
    }

    pub fn whitelisted(&self) -> Vec<&PlayerInfo> {
        self.players.values().filter(|info| info.whitelisted).collect()
    }

    pub fn set_whitelist_enabled(&mut self, enabled: bool) {
        self.whitelist_enabled = enabled;
    }

    pub fn whitelist_enabled(&self) -> bool {
        self.whitelist_enabled
    }

    // -----------------------------------------------------------------------
    // Limits and flags
    // -----------------------------------------------------------------------

    /// `None` when there is no limit.
    pub fn player_limit(&self) -> Option<u32> {
        (self.player_limit > 0).then_some(self.player_limit)
    }

    pub fn set_player_limit(&mut self, limit: Option<u32>) {
        self.player_limit = limit.unwrap_or(0);
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn allows_custom_clients(&self) -> bool {
        self.custom_clients
    }

    pub fn set_custom_clients(&mut self, allowed: bool) {
        self.custom_clients = allowed;
    }

    // -----------------------------------------------------------------------
    // Admission
    // -----------------------------------------------------------------------

    /// Decides whether a joining player may enter.
    ///
    /// `online` is the number of players already connected. Admins are
    /// exempt from the player limit but not from bans or the whitelist.
    ///
    /// # Errors
    /// The [`KickReason`] the player should be disconnected with.
    pub fn admit(&self, id: &str, ip: &str, online: usize) -> Result<(), KickReason> {
        if self.is_id_banned(id) || self.is_ip_banned(ip) {
            return Err(KickReason::Banned);
        }
        if self.whitelist_enabled && !self.players.get(id).is_some_and(|i| i.whitelisted) {
            return Err(KickReason::Whitelist);
        }
        if let Some(limit) = self.player_limit() {
            if online >= limit as usize && !self.is_admin(id) {
                return Err(KickReason::PlayerLimit);
            }
        }
        Ok(())
    }
}
