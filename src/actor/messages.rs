//! Actor Message Definitions
//!
//! ```text
//! FsActor --Changed--> BuilderActor --Reload--> WsActor
//!    ^                      |
//!    +------Suppress--------+
//! ```

use std::path::PathBuf;

use super::fs::ChangeScope;

/// Messages to the Builder Actor
#[derive(Debug)]
pub enum BuildMsg {
    /// A debounced batch of relevant changes
    Changed(ChangeScope),
    /// Shutdown
    Shutdown,
}

/// Messages to the FileSystem Actor
#[derive(Debug)]
pub enum FsMsg {
    /// Files the builder just wrote; their next change event is ignored
    Suppress(Vec<PathBuf>),
    /// Shutdown
    Shutdown,
}

/// Messages to the WebSocket Actor
#[derive(Debug)]
pub enum WsMsg {
    /// Tell every connected browser to reload
    Reload { reason: String },
    /// Handshake and register a new client
    AddClient(std::net::TcpStream),
    /// Shutdown
    Shutdown,
}
