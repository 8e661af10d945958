//! Error types for the command layer.

/// Errors raised while registering commands.
///
/// These happen at startup (or when a plugin registers), never while
/// dispatching a line.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A command with this exact name already exists.
    #[error("duplicate command '{0}'")]
    DuplicateCommand(String),

    /// The parameter spec could not be parsed.
    ///
    /// For example `<a...> <b>` (greedy parameter not last) or
    /// `[a] <b>` (required parameter after an optional one).
    #[error("invalid parameter spec for '{name}': {reason}")]
    InvalidParams { name: String, reason: String },
}

/// A general-purpose handler error.
///
/// Handlers may use any error type that implements `Display`; this one is
/// handy for plugins and tests that need nothing richer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The operator supplied something unusable. Shown verbatim.
    #[error("{0}")]
    Invalid(String),

    /// The command ran but could not complete.
    #[error("command failed: {0}")]
    Failed(String),
}
