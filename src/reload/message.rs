//! Live reload message protocol.
//!
//! JSON objects tagged by `type`, sent from the WebSocket server to the
//! reload client:
//!
//! - `{"type":"connected"}` right after the handshake
//! - `{"type":"reload","reason":"styles (main.scss)"}` after a rebuild

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Connection established
    Connected,
    /// Full page reload
    Reload {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl ReloadMessage {
    pub fn reload(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: Some(reason.into()),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}
