//! Error types for the bridge protocol.

use thiserror::Error;

/// Failure to encode or decode a protocol line.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The line was not a valid envelope.
    #[error("malformed bridge message: {reason}")]
    Malformed { line: String, reason: String },

    /// The envelope's version falls outside what this host speaks.
    #[error("protocol_version {version} is outside supported range [{min}, {max}]")]
    UnsupportedVersion { version: i32, min: i32, max: i32 },

    /// Serialization of an outgoing message failed.
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ProtocolError {
    pub(crate) fn malformed(line: &str, reason: impl ToString) -> Self {
        Self::Malformed {
            line: line.to_string(),
            reason: reason.to_string(),
        }
    }
}
