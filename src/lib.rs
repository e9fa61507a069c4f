//! Sandbox Explorer
//!
//! Confined filesystem operations for a file-browsing service: a path
//! confinement guard, a multipart upload decoder, and a conflict-safe
//! relocation engine, plus a line-oriented console that drives them.

pub mod client;
pub mod config;
pub mod error;
pub mod multipart;
pub mod protocol;
pub mod relocate;
pub mod server;
pub mod storage;

pub use config::{RootContext, ServerConfig};
pub use error::{ErrorKind, ExplorerError};
pub use server::Server;
