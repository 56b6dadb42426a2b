//! Error type shared by the agent, replay buffer, environments and driver.

use std::fmt;
use std::io;

/// Errors raised by the TD3 crate.
///
/// Nothing here is retried: every variant is meant to propagate up to the
/// caller and end the run.
#[derive(Debug)]
pub enum Td3Error {
    /// A caller-supplied value is out of range (e.g. sampling more transitions than stored).
    InvalidArgument(String),
    /// A vector or network does not have the expected dimensionality.
    ShapeMismatch {
        what: String,
        expected: usize,
        found: usize,
    },
    /// Burn recorder failure while saving or loading parameters.
    Recorder(String),
    /// Tensor data could not be converted back to host values.
    Tensor(String),
    /// IO error while writing checkpoints or results.
    Io(io::Error),
    /// JSON (de)serialization error.
    Serde(serde_json::Error),
}

impl Td3Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Td3Error::InvalidArgument(msg.into())
    }

    pub(crate) fn shape(what: impl Into<String>, expected: usize, found: usize) -> Self {
        Td3Error::ShapeMismatch {
            what: what.into(),
            expected,
            found,
        }
    }
}

impl fmt::Display for Td3Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Td3Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Td3Error::ShapeMismatch {
                what,
                expected,
                found,
            } => write!(
                f,
                "Shape mismatch for {}: expected {}, found {}",
                what, expected, found
            ),
            Td3Error::Recorder(e) => write!(f, "Recorder error: {}", e),
            Td3Error::Tensor(e) => write!(f, "Tensor data error: {}", e),
            Td3Error::Io(e) => write!(f, "IO error: {}", e),
            Td3Error::Serde(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for Td3Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Td3Error::Io(e) => Some(e),
            Td3Error::Serde(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Td3Error {
    fn from(e: io::Error) -> Self {
        Td3Error::Io(e)
    }
}

impl From<serde_json::Error> for Td3Error {
    fn from(e: serde_json::Error) -> Self {
        Td3Error::Serde(e)
    }
}

pub type Result<T> = std::result::Result<T, Td3Error>;
