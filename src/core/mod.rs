//! Core process state shared across the codebase.

mod state;

pub use state::{
    Phase, is_shutdown, register_server, register_shutdown, set_phase,
    setup_shutdown_handler,
};
