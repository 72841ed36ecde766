//! Client session
//!
//! Per-connection state, the control channel and the command loop.

pub mod control;
pub mod handler;
pub mod state;

pub use handler::Session;
pub use state::SessionState;
