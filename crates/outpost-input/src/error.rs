/// Errors raised by the command input sources.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// Another process holds the command socket port.
    #[error("Command input socket already in use. Is another instance of the server running?")]
    PortInUse(u16),

    /// Binding the command socket failed for another reason.
    #[error("failed to open command socket: {0}")]
    Bind(#[source] std::io::Error),
}
