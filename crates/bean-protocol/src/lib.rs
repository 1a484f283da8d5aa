//! Bean bridge protocol types
//!
//! Defines the JSON-lines envelopes exchanged between the `bean` host and the
//! compiler bridge process, plus the stats report a compile pass produces.
//! The host writes one [`HostMessage`] per line on the bridge's stdin; the
//! bridge answers with [`BridgeMessage`] lines on stdout.

pub mod error;
pub mod message;
pub mod stats;

pub use error::ProtocolError;
pub use message::{BridgeEvent, BridgeMessage, HostCommand, HostMessage};
pub use stats::{RelatedAsset, StatsAsset, StatsDiagnostic, StatsReport};

/// Minimum protocol version supported by this implementation.
pub const PROTOCOL_MIN: i32 = 1;

/// Maximum protocol version supported by this implementation.
pub const PROTOCOL_MAX: i32 = 1;

/// Version written on outgoing host messages.
pub const PROTOCOL_VERSION: i32 = PROTOCOL_MAX;
