//! Server plugins.
//!
//! A plugin contributes commands through the same registry the built-ins
//! use. Plugins are linked in and handed to [`ServerControl`] at startup;
//! there is no dynamic discovery.
//!
//! [`ServerControl`]: crate::ServerControl

use outpost_command::RegistryError;
use serde::{Deserialize, Serialize};

use crate::Registry;

/// Descriptive metadata shown by the `plugins` and `plugin` commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMeta {
    pub name: String,
    pub version: String,
    pub author: String,
    pub description: String,
}

impl PluginMeta {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            author: String::new(),
            description: String::new(),
        }
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

/// A bundle of server commands.
pub trait Plugin: Send {
    fn meta(&self) -> PluginMeta;

    /// Adds this plugin's commands. Called once, after the built-ins.
    fn register_server_commands(&self, registry: &mut Registry) -> Result<(), RegistryError>;
}
