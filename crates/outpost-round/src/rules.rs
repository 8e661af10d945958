//! Game modes, difficulties, teams and the rules they produce.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// The rule set a round is played with.
///
/// Built from a [`Gamemode`] preset, then adjusted by the map's own
/// overrides (see [`Map::apply_rules`](crate::Map::apply_rules)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Players are split into opposing teams.
    pub pvp: bool,
    /// Enemy waves spawn.
    pub waves: bool,
    /// Waves spawn on a countdown rather than on demand.
    pub wave_timer: bool,
    /// Time between two waves.
    pub wave_spacing: Duration,
    /// The goal is destroying enemy cores.
    pub attack_mode: bool,
    pub infinite_resources: bool,
    pub editor: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            pvp: false,
            waves: true,
            wave_timer: true,
            wave_spacing: Difficulty::Normal.wave_spacing(),
            attack_mode: false,
            infinite_resources: false,
            editor: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Gamemode
// ---------------------------------------------------------------------------

/// A rules preset selected when hosting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gamemode {
    Survival,
    Sandbox,
    Attack,
    Pvp,
    Editor,
}

impl Gamemode {
    pub const ALL: [Gamemode; 5] = [
        Gamemode::Survival,
        Gamemode::Sandbox,
        Gamemode::Attack,
        Gamemode::Pvp,
        Gamemode::Editor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Gamemode::Survival => "survival",
            Gamemode::Sandbox => "sandbox",
            Gamemode::Attack => "attack",
            Gamemode::Pvp => "pvp",
            Gamemode::Editor => "editor",
        }
    }

    /// The preset's rules, before map overrides.
    pub fn rules(self) -> Rules {
        let base = Rules::default();
        match self {
            Gamemode::Survival => base,
            Gamemode::Sandbox => Rules {
                infinite_resources: true,
                wave_timer: false,
                ..base
            },
            Gamemode::Attack => Rules {
                attack_mode: true,
                wave_timer: false,
                ..base
            },
            Gamemode::Pvp => Rules {
                pvp: true,
                waves: false,
                wave_timer: false,
                attack_mode: true,
                ..base
            },
            Gamemode::Editor => Rules {
                editor: true,
                infinite_resources: true,
                waves: false,
                wave_timer: false,
                ..base
            },
        }
    }
}

impl fmt::Display for Gamemode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognized enum token; carries the token as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName(pub String);

impl FromStr for Gamemode {
    type Err = UnknownName;

    /// Exact, lowercase match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gamemode::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Wave pacing preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Training,
    Easy,
    Normal,
    Hard,
    Insane,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Training,
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Insane,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Training => "training",
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Insane => "insane",
        }
    }

    /// Multiplier on the base wave spacing of two minutes.
    pub fn wave_time(self) -> f64 {
        match self {
            Difficulty::Training => 3.0,
            Difficulty::Easy => 1.4,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 0.5,
            Difficulty::Insane => 0.25,
        }
    }

    pub fn wave_spacing(self) -> Duration {
        Duration::from_secs_f64(self.wave_time() * 120.0)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Sharded,
    Crux,
    Green,
    Purple,
    Blue,
}

impl Team {
    /// Teams players are spread over in pvp, in tie-break order.
    pub const ACTIVE: [Team; 2] = [Team::Sharded, Team::Crux];

    pub fn name(self) -> &'static str {
        match self {
            Team::Sharded => "sharded",
            Team::Crux => "crux",
            Team::Green => "green",
            Team::Purple => "purple",
            Team::Blue => "blue",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gamemode_parse_is_exact() {
        assert_eq!("pvp".parse::<Gamemode>(), Ok(Gamemode::Pvp));
        assert_eq!("PVP".parse::<Gamemode>(), Err(UnknownName("PVP".into())));
        assert!("deathmatch".parse::<Gamemode>().is_err());
    }

    #[test]
    fn test_gamemode_presets() {
        assert!(Gamemode::Pvp.rules().pvp);
        assert!(!Gamemode::Survival.rules().pvp);
        assert!(Gamemode::Survival.rules().wave_timer);
        assert!(Gamemode::Sandbox.rules().infinite_resources);
        assert!(Gamemode::Editor.rules().editor);
    }

    #[test]
    fn test_difficulty_wave_spacing() {
        assert_eq!(Difficulty::Normal.wave_spacing(), Duration::from_secs(120));
        assert_eq!(Difficulty::Hard.wave_spacing(), Duration::from_secs(60));
        assert_eq!(Difficulty::Training.wave_spacing(), Duration::from_secs(360));
        assert_eq!("insane".parse::<Difficulty>(), Ok(Difficulty::Insane));
    }

    #[test]
    fn test_team_names() {
        assert_eq!(Team::Crux.to_string(), "crux");
        assert_eq!(Team::ACTIVE, [Team::Sharded, Team::Crux]);
    }
}
