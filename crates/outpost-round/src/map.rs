//! Maps and the map registry.
//!
//! Built-in maps ship with the server. Custom maps are small JSON
//! descriptors dropped into the custom map directory:
//!
//! ```json
//! { "name": "Twin Rivers", "author": "someone", "width": 200, "height": 150,
//!   "rules": { "waves": false } }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Gamemode, MapError, Rules};

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// Per-map adjustments applied on top of a mode preset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapRules {
    pub waves: Option<bool>,
    pub wave_timer: Option<bool>,
    pub wave_spacing_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Map {
    pub name: String,
    #[serde(default)]
    pub author: Option<String>,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub rules: MapRules,
    /// Loaded from the custom map directory rather than built in.
    #[serde(skip)]
    pub custom: bool,
    /// Descriptor path, for custom maps.
    #[serde(skip)]
    pub file: Option<PathBuf>,
}

impl Map {
    /// A built-in map with no rule overrides.
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            author: None,
            width,
            height,
            rules: MapRules::default(),
            custom: false,
            file: None,
        }
    }

    /// Reads a custom map descriptor.
    pub fn from_file(path: &Path) -> Result<Self, MapError> {
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let text = fs::read_to_string(path).map_err(|source| MapError::Io {
            map: label.clone(),
            source,
        })?;
        let mut map: Map = serde_json::from_str(&text).map_err(|e| MapError::Invalid {
            map: label,
            reason: e.to_string(),
        })?;
        map.custom = true;
        map.file = Some(path.to_path_buf());
        Ok(map)
    }

    /// The author, if one is set and not blank.
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref().map(str::trim).filter(|a| !a.is_empty())
    }

    /// `mode`'s preset with this map's overrides applied.
    pub fn apply_rules(&self, mode: Gamemode) -> Rules {
        let mut rules = mode.rules();
        if let Some(waves) = self.rules.waves {
            rules.waves = waves;
        }
        if let Some(timer) = self.rules.wave_timer {
            rules.wave_timer = timer;
        }
        if let Some(secs) = self.rules.wave_spacing_secs {
            rules.wave_spacing = Duration::from_secs(secs);
        }
        rules
    }

    /// Host-command lookup: case-insensitive, `_` may stand for a space.
    pub fn matches(&self, query: &str) -> bool {
        self.name.eq_ignore_ascii_case(query)
            || self.name.eq_ignore_ascii_case(&query.replace('_', " "))
    }
}

// ---------------------------------------------------------------------------
// MapRegistry
// ---------------------------------------------------------------------------

fn default_maps() -> Vec<Map> {
    vec![
        Map::new("Ground Zero", 200, 200),
        Map::new("Frozen Forest", 250, 250),
        Map::new("Craters", 150, 150),
        Map::new("Fortress", 300, 300),
        Map::new("Labyrinth", 200, 200),
        Map::new("Spiral", 180, 180),
        Map::new("Veins", 350, 200),
    ]
}

/// Every map the server can host.
#[derive(Debug, Clone)]
pub struct MapRegistry {
    defaults: Vec<Map>,
    custom: Vec<Map>,
    directory: PathBuf,
}

impl MapRegistry {
    /// Built-in maps only; call [`reload`](Self::reload) to scan `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            defaults: default_maps(),
            custom: Vec::new(),
            directory: directory.into(),
        }
    }

    /// A registry with the given built-in maps, for tests and embedding.
    pub fn with_defaults(defaults: Vec<Map>, directory: impl Into<PathBuf>) -> Self {
        Self {
            defaults,
            custom: Vec::new(),
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn defaults(&self) -> &[Map] {
        &self.defaults
    }

    pub fn custom(&self) -> &[Map] {
        &self.custom
    }

    /// Built-in maps, then custom maps.
    pub fn all(&self) -> impl Iterator<Item = &Map> {
        self.defaults.iter().chain(&self.custom)
    }

    pub fn len(&self) -> usize {
        self.defaults.len() + self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, query: &str) -> Option<&Map> {
        self.all().find(|map| map.matches(query))
    }

    /// Rescans the custom map directory.
    ///
    /// Unreadable descriptors are skipped with a warning. Returns how many
    /// more maps are known than before.
    pub fn reload(&mut self) -> usize {
        let before = self.len();
        self.custom = self.scan();
        self.len().saturating_sub(before)
    }

    fn scan(&self) -> Vec<Map> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %self.directory.display(), error = %e, "no custom map directory");
                return Vec::new();
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        paths
            .iter()
            .filter_map(|path| match Map::from_file(path) {
                Ok(map) => Some(map),
                Err(e) => {
                    warn!(path = %path.display(), "Failed to load custom map: {e}");
                    None
                }
            })
            .collect()
    }

    /// The maps rotation picks from: custom maps if any, else built-in.
    pub fn rotation_pool(&self) -> &[Map] {
        if self.custom.is_empty() {
            &self.defaults
        } else {
            &self.custom
        }
    }

    /// Picks the next map uniformly from the rotation pool.
    ///
    /// `current` is excluded unless it is the only map in the pool.
    pub fn select_next<R: Rng>(&self, current: Option<&Map>, rng: &mut R) -> Option<&Map> {
        let pool = self.rotation_pool();
        let candidates: Vec<&Map> = if pool.len() > 1 {
            pool.iter()
                .filter(|map| current.is_none_or(|cur| cur.name != map.name))
                .collect()
        } else {
            pool.iter().collect()
        };
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.random_range(0..candidates.len())])
    }
}
