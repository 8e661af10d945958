//! Unified error type for the Outpost server.

use outpost_admin::AdminError;
use outpost_command::{CommandError, RegistryError};
use outpost_input::InputError;
use outpost_log::LogError;
use outpost_round::RoundError;

use crate::settings::SettingsError;

/// Top-level error that wraps all crate-specific errors.
///
/// Command handlers return this type, so `?` on any sub-crate result turns
/// into an operator-facing error line. Every wrapped error is transparent:
/// the message logged is the inner error's message.
#[derive(Debug, thiserror::Error)]
pub enum OutpostError {
    /// The operator supplied something unusable.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// A command or plugin failed to register.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The command socket could not be opened.
    #[error(transparent)]
    Input(#[from] InputError),

    /// A round operation was refused or failed.
    #[error(transparent)]
    Round(#[from] RoundError),

    /// An administration lookup failed.
    #[error(transparent)]
    Admin(#[from] AdminError),

    /// Settings could not be read or written.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The log subscriber could not be installed.
    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A startup argument was not a valid command.
    #[error("invalid startup command '{0}'")]
    Startup(String),
}

impl OutpostError {
    /// An operator error shown verbatim.
    pub fn user(message: impl Into<String>) -> Self {
        Self::Command(CommandError::Invalid(message.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_is_shown_verbatim() {
        let err = OutpostError::user("Invalid shuffle mode.");
        assert!(matches!(err, OutpostError::Command(_)));
        assert_eq!(err.to_string(), "Invalid shuffle mode.");
    }

    #[test]
    fn test_from_round_error() {
        let err: OutpostError = RoundError::AlreadyHosting.into();
        assert!(matches!(err, OutpostError::Round(_)));
        assert_eq!(err.to_string(), "Already hosting. Type 'stop' to stop hosting first.");
    }

    #[test]
    fn test_from_admin_error() {
        let err: OutpostError = AdminError::IpNotBanned("10.0.0.1".into()).into();
        assert!(matches!(err, OutpostError::Admin(_)));
        assert_eq!(err.to_string(), "That IP is not banned!");
    }

    #[test]
    fn test_from_input_error() {
        let err: OutpostError = InputError::PortInUse(6859).into();
        assert!(matches!(err, OutpostError::Input(_)));
        assert!(err.to_string().contains("already in use"));
    }

    #[test]
    fn test_from_registry_error() {
        let err: OutpostError = RegistryError::DuplicateCommand("help".into()).into();
        assert!(matches!(err, OutpostError::Registry(_)));
        assert!(err.to_string().contains("help"));
    }
}
