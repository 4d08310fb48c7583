use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure of `Prober::check` itself; no attempt has been issued when this fires.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("check needs a host")]
    MissingHost,

    #[error("check needs a non-zero port")]
    MissingPort,
}

/// Where a single attempt gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The secure context for the method could not be built on this platform.
    Context,
    Connect,
    Handshake,
    Timeout,
    /// The attempt task panicked or was aborted.
    Join,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Context => "context",
            ErrorKind::Connect => "connect",
            ErrorKind::Handshake => "handshake",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Join => "join",
        };
        write!(f, "{}", label)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct AttemptError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AttemptError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn context(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Context, message)
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connect, message)
    }

    pub fn handshake(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Handshake, message)
    }

    /// True when no network I/O was attempted.
    pub fn is_pre_connect(&self) -> bool {
        matches!(self.kind, ErrorKind::Context)
    }
}
