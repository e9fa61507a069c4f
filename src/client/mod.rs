//! Console session management
//!
//! Handles client connections and per-connection state.

pub mod handler;
pub mod state;

pub use handler::handle_client;
pub use state::Session;
