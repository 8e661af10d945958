//! Round configuration and the session state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Gamemode, Map, Rules};

// ---------------------------------------------------------------------------
// RoundConfig
// ---------------------------------------------------------------------------

/// Delay between a game over and the next round, when shuffling maps.
pub const ROUND_EXTRA_TIME: Duration = Duration::from_secs(12);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundConfig {
    /// How long the extra round lasts before the next map is loaded.
    pub extra_round_delay: Duration,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            extra_round_delay: ROUND_EXTRA_TIME,
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Whether a game is being hosted.
///
/// ```text
/// Menu ──host/load──→ Playing ──stop / game over (no shuffle)──→ Menu
///                        │ ↑
///          game over     │ │ next round
///          (shuffle)     ▼ │
///                   [extra round]
/// ```
///
/// The extra round is a sub-state of `Playing`, tracked separately in
/// [`SessionState::in_extra_round`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Menu,
    Playing,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Menu => write!(f, "menu"),
            Self::Playing => write!(f, "playing"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The one game session the server runs.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: Phase,
    /// The map being played, while playing.
    pub map: Option<Map>,
    /// The mode of the last hosted game; reused for every rotated map.
    pub mode: Gamemode,
    pub rules: Rules,
    /// Between a game over and the next round's start.
    pub in_extra_round: bool,
}

impl SessionState {
    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn is_menu(&self) -> bool {
        self.phase == Phase::Menu
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: Phase::Menu,
            map: None,
            mode: Gamemode::Survival,
            rules: Gamemode::Survival.rules(),
            in_extra_round: false,
        }
    }
}
