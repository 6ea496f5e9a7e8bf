//! Actor System for watch mode
//!
//! Message-passing concurrency on one tokio runtime:
//!
//! ```text
//! FsActor --> BuilderActor --> WsActor
//! (watch)     (rebuild)       (broadcast)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing and scope classification
//! - `builder` - Reruns affected pipelines, coalescing queued changes
//! - `ws` - WebSocket broadcast
//! - `coordinator` - Wires up and runs actors

pub mod builder;
pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod ws;

pub use coordinator::Coordinator;
