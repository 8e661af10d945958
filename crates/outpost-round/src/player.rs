//! Connected players and team assignment.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Rules, Team};

/// Per-connection player identifier, assigned by the net host.
///
/// Not to be confused with the persistent `uuid` a client presents, which
/// is what bans and trace records are keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A currently connected player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub uuid: String,
    pub ip: String,
    pub team: Team,
    pub dead: bool,
    pub admin: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: &str, uuid: &str, ip: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            uuid: uuid.to_string(),
            ip: ip.to_string(),
            team: Team::Sharded,
            dead: false,
            admin: false,
        }
    }

    /// Back to a fresh spawn state for a new round.
    pub fn reset(&mut self) {
        self.dead = false;
    }
}

/// Connected players in join order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, player: Player) {
        self.players.push(player);
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.remove(index))
    }

    pub fn clear(&mut self) -> Vec<Player> {
        std::mem::take(&mut self.players)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Exact, case-sensitive name match.
    pub fn find_by_name(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn find_by_name_ignore_case(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Player> {
        self.players.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Re-balances every player's team under `rules`, in join order.
    pub fn assign_teams(&mut self, rules: &Rules) {
        for i in 0..self.players.len() {
            let team = assign_team(
                rules,
                self.players
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(_, p)| p),
            );
            self.players[i].team = team;
        }
    }
}

/// The team a player should join, given everyone else.
///
/// In pvp, the active team with the fewest of `others` on it; ties go to
/// the earlier team in [`Team::ACTIVE`]. Otherwise always sharded.
pub fn assign_team<'a>(rules: &Rules, others: impl Iterator<Item = &'a Player> + Clone) -> Team {
    if !rules.pvp {
        return Team::Sharded;
    }
    Team::ACTIVE
        .into_iter()
        .min_by_key(|&team| others.clone().filter(|p| p.team == team).count())
        .unwrap_or(Team::Sharded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Gamemode;

    fn player(id: u64, team: Team) -> Player {
        let mut p = Player::new(PlayerId(id), &format!("p{id}"), &format!("uuid-{id}"), "127.0.0.1");
        p.team = team;
        p
    }

    #[test]
    fn test_non_pvp_is_always_sharded() {
        let others = [player(1, Team::Crux)];
        assert_eq!(assign_team(&Gamemode::Survival.rules(), others.iter()), Team::Sharded);
    }

    #[test]
    fn test_pvp_picks_smaller_team() {
        let rules = Gamemode::Pvp.rules();
        let others = [player(1, Team::Sharded), player(2, Team::Sharded), player(3, Team::Crux)];
        assert_eq!(assign_team(&rules, others.iter()), Team::Crux);
    }

    #[test]
    fn test_pvp_tie_goes_to_first_team() {
        let rules = Gamemode::Pvp.rules();
        let others = [player(1, Team::Sharded), player(2, Team::Crux)];
        assert_eq!(assign_team(&rules, others.iter()), Team::Sharded);
        assert_eq!(assign_team(&rules, [].iter()), Team::Sharded);
    }

    #[test]
    fn test_assign_teams_balances_roster() {
        let mut roster = Roster::new();
        for id in 1..=4 {
            roster.add(player(id, Team::Sharded));
        }
        roster.assign_teams(&Gamemode::Pvp.rules());
        let crux = roster.iter().filter(|p| p.team == Team::Crux).count();
        assert_eq!(crux, 2);
    }

    #[test]
    fn test_newcomer_joins_smaller_team_of_roster() {
        let mut roster = Roster::new();
        roster.add(player(1, Team::Sharded));
        roster.add(player(2, Team::Sharded));
        roster.add(player(3, Team::Crux));
        assert_eq!(assign_team(&Gamemode::Pvp.rules(), roster.iter()), Team::Crux);
    }

    #[test]
    fn test_roster_lookup() {
        let mut roster = Roster::new();
        roster.add(player(1, Team::Sharded));
        assert!(roster.find_by_name("p1").is_some());
        assert!(roster.find_by_name("P1").is_none());
        assert!(roster.find_by_name_ignore_case("P1").is_some());
        assert_eq!(roster.remove(PlayerId(1)).unwrap().name, "p1");
        assert!(roster.is_empty());
    }
}
