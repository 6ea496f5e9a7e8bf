//! Live reload transport.
//!
//! ```text
//! BuilderActor -> WsActor --ws--> reload.js (in the page)
//!                                    ^
//! browser --http--> proxy --http--> upstream site
//! ```
//!
//! - `message` - JSON messages sent to the reload client
//! - `server` - WebSocket listener feeding the WsActor
//! - `proxy` - HTTP proxy injecting the reload client into HTML

pub mod message;
pub mod proxy;
pub mod server;
