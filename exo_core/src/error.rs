use thiserror::Error;

/// Recoverable per-datagram and per-field errors. None of these may
/// terminate the process; each is handled at the channel or loop that
/// produced it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    #[error("malformed payload: {0}")]
    Decode(String),
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
    #[error("non-finite value for parameter {0}")]
    NonFinite(String),
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("timeout waiting for motor bus")]
    Timeout,
    #[error("io error: {0}")]
    Io(String),
}

/// Fatal startup conditions. These are the only errors that exit the
/// process with a non-zero status.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("safety configuration: {0}")]
    Config(String),
    #[error("binding {role} socket on port {port}: {source}")]
    Bind {
        role: &'static str,
        port: u16,
        source: std::io::Error,
    },
    #[error("no motors detected on the bus")]
    NoMotors,
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
