//! Server core functionality
//!
//! The console listener that owns the root context and spawns one session
//! per connection.

pub mod core;

pub use self::core::Server;
