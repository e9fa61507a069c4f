//! Module `state`
//!
//! Defines the `Session` struct holding per-connection console state: the
//! current directory and the pending relocation source.

use std::net::SocketAddr;

/// State of one console connection.
///
/// Both paths are stored relative to the root, so replacing the root never
/// leaves a session pointing at an absolute location outside it.
#[derive(Debug, Default)]
pub struct Session {
    client_addr: Option<SocketAddr>,
    current_dir: String,
    pending_source: Option<String>,
}

impl Session {
    pub fn new(client_addr: SocketAddr) -> Self {
        Self {
            client_addr: Some(client_addr),
            ..Self::default()
        }
    }

    // --------------------
    // Getter methods
    // --------------------

    /// Returns the client's socket address if known.
    pub fn client_addr(&self) -> Option<&SocketAddr> {
        self.client_addr.as_ref()
    }

    /// Root-relative current directory; empty means the root.
    pub fn current_dir(&self) -> &str {
        &self.current_dir
    }

    /// Root-relative source remembered by the last `FROM`.
    pub fn pending_source(&self) -> Option<&str> {
        self.pending_source.as_deref()
    }

    // --------------------
    // Setter methods
    // --------------------

    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = dir;
    }

    pub fn set_pending_source(&mut self, source: Option<String>) {
        self.pending_source = source;
    }

    /// Removes and returns the pending source.
    pub fn take_pending_source(&mut self) -> Option<String> {
        self.pending_source.take()
    }
}
