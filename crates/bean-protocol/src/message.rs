//! Host commands and bridge events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::stats::StatsReport;
use crate::{PROTOCOL_MAX, PROTOCOL_MIN, PROTOCOL_VERSION};

/// Command sent from the host to the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostCommand {
    /// Run exactly one compile pass with the given configuration.
    Run { config: Value },
    /// Start a watching dev server bound to a compiler for `config`.
    Serve { config: Value, server: Value },
    /// Release the compiler and exit.
    Close,
}

/// Event reported by the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// A watched file changed; a new compile pass is starting.
    Invalid {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file: Option<String>,
    },
    /// A compile pass finished (possibly with errors in the stats).
    Done { stats: StatsReport },
    /// The compiler itself could not run.
    Failed { message: String },
    /// The compiler was closed.
    Closed,
}

/// Host-to-bridge envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostMessage {
    pub protocol_version: i32,
    pub command: HostCommand,
}

impl HostMessage {
    /// Wrap a command at the current protocol version.
    pub fn new(command: HostCommand) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            command,
        }
    }

    /// Encode as a single line (no trailing newline).
    pub fn to_line(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Bridge-to-host envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeMessage {
    pub protocol_version: i32,
    pub event: BridgeEvent,
}

impl BridgeMessage {
    pub fn new(event: BridgeEvent) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            event,
        }
    }

    /// Decode one line emitted by the bridge, checking the version range.
    pub fn from_line(line: &str) -> Result<Self, ProtocolError> {
        let message: BridgeMessage = serde_json::from_str(line.trim())
            .map_err(|e| ProtocolError::malformed(line, e))?;

        if message.protocol_version < PROTOCOL_MIN || message.protocol_version > PROTOCOL_MAX {
            return Err(ProtocolError::UnsupportedVersion {
                version: message.protocol_version,
                min: PROTOCOL_MIN,
                max: PROTOCOL_MAX,
            });
        }

        Ok(message)
    }

    pub fn to_line(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_host_command_wire_shape() {
        let msg = HostMessage::new(HostCommand::Run {
            config: json!({"mode": "production"}),
        });
        let value: Value = serde_json::from_str(&msg.to_line().unwrap()).unwrap();

        assert_eq!(value["protocol_version"], 1);
        assert_eq!(value["command"]["op"], "run");
        assert_eq!(value["command"]["config"]["mode"], "production");
    }

    #[test]
    fn test_close_command_has_only_op() {
        let msg = HostMessage::new(HostCommand::Close);
        let value: Value = serde_json::from_str(&msg.to_line().unwrap()).unwrap();
        assert_eq!(value["command"], json!({"op": "close"}));
    }

    #[test]
    fn test_decode_done_event() {
        let line = r#"{"protocol_version":1,"event":{"event":"done","stats":{"assets":[{"name":"js/index.js","size":120,"type":"asset"}],"warnings":[],"errors":["boom"],"time":42}}}"#;
        let msg = BridgeMessage::from_line(line).unwrap();

        match msg.event {
            BridgeEvent::Done { stats } => {
                assert_eq!(stats.assets.len(), 1);
                assert!(stats.has_errors());
                assert_eq!(stats.time_ms, Some(42));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decode_invalid_without_file() {
        let line = r#"{"protocol_version":1,"event":{"event":"invalid"}}"#;
        let msg = BridgeMessage::from_line(line).unwrap();
        assert_eq!(msg.event, BridgeEvent::Invalid { file: None });
    }

    #[test]
    fn test_decode_rejects_unsupported_version() {
        let line = r#"{"protocol_version":7,"event":{"event":"closed"}}"#;
        let err = BridgeMessage::from_line(line).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnsupportedVersion { version: 7, .. }
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = BridgeMessage::from_line("webpack compiled successfully").unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed { .. }));
    }
}
