//! Process-wide run state.
//!
//! - `PHASE`: where the orchestrator is (`Idle → Building → Watching ⇄ {Building, Reloading}`)
//! - `SHUTDOWN`: has Ctrl+C been received?

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Orchestrator phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Idle = 0,
    Building = 1,
    Watching = 2,
    Reloading = 3,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Building,
            2 => Self::Watching,
            3 => Self::Reloading,
            _ => Self::Idle,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Building => "building",
            Self::Watching => "watching",
            Self::Reloading => "reloading",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static PHASE: AtomicU8 = AtomicU8::new(Phase::Idle as u8);

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Proxy server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for the actor system
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

// =============================================================================
// PHASE
// =============================================================================

pub fn phase() -> Phase {
    Phase::from_u8(PHASE.load(Ordering::SeqCst))
}

/// Move to `next`, logging the transition. Returns the previous phase.
pub fn set_phase(next: Phase) -> Phase {
    let prev = Phase::from_u8(PHASE.swap(next as u8, Ordering::SeqCst));
    if prev != next {
        crate::debug!("phase"; "{} -> {}", prev, next);
    }
    prev
}

// =============================================================================
// SHUTDOWN
// =============================================================================

/// Install the Ctrl+C handler. Call once at program start.
///
/// Before the watch loop is registered, Ctrl+C exits right away. After it,
/// the actors are notified and the proxy server is unblocked.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        let Some(tx) = SHUTDOWN_TX.get() else {
            std::process::exit(130);
        };
        crate::log!("watch"; "shutting down ({})...", phase());
        let _ = tx.send(());
        if let Some(server) = SERVER.get() {
            server.unblock();
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Route Ctrl+C to the actor system instead of exiting.
pub fn register_shutdown(tx: crossbeam::channel::Sender<()>) {
    let _ = SHUTDOWN_TX.set(tx);
}

/// Register the proxy server so Ctrl+C unblocks its accept loop.
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
