//! # Outpost
//!
//! Control plane of a dedicated game server.
//!
//! Commands arrive from the local console, from the optional command
//! socket and from the command line; round transitions arrive from timers.
//! All of them become [`ControlTask`]s on one queue, and
//! [`ServerControl::run`] applies them in order to the state it owns.
//!
//! ```rust,no_run
//! use outpost::ServerControl;
//! use outpost_log::LogConfig;
//!
//! # async fn start() -> Result<(), outpost::OutpostError> {
//! let log = outpost_log::init(LogConfig::new("config/logs"))?;
//! let mut server = ServerControl::builder("config").build(log)?;
//! outpost_input::spawn_console(tokio::io::stdin(), server.sender());
//! server.start();
//! server.run().await;
//! # Ok(())
//! # }
//! ```
//!
//! [`ControlTask`]: outpost_input::ControlTask

pub mod commands;
pub mod control;
pub mod error;
pub mod headless;
pub mod plugin;
pub mod settings;
pub mod state;

pub use control::{ServerControl, ServerControlBuilder};
pub use error::OutpostError;
pub use headless::{HeadlessWorld, LocalHost};
pub use plugin::{Plugin, PluginMeta};
pub use settings::{DEFAULT_PORT, Settings, SettingsError, SettingsStore};
pub use state::{DataPaths, Registry, Round, ServerState};
