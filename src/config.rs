//! Configuration management for Sandbox Explorer
//!
//! Separates startup configuration (requires restart) from the runtime root
//! context (replaceable through the console's `ROOT` command).

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{ExplorerError, Result};
use crate::storage::validation::normalize_path;

/// Complete server configuration with startup/runtime separation
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(flatten)]
    pub startup: StartupConfig,

    #[serde(flatten)]
    pub runtime: RuntimeConfig,
}

/// Configuration that requires a restart to take effect
#[derive(Debug, Deserialize, Clone)]
pub struct StartupConfig {
    /// IP address the console listens on
    pub bind_address: String,

    /// Port of the console listener
    pub control_port: u16,

    /// Longest accepted command line, in bytes
    pub max_command_length: usize,

    /// Maximum concurrent console connections
    pub max_clients: usize,

    /// Largest accepted upload body, in MB
    pub max_upload_size_mb: u64,
}

/// Configuration that seeds runtime-replaceable state
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// Initial confinement root
    /// Environment: SANDBOX_SERVER_ROOT
    pub server_root: String,
}

impl ServerConfig {
    /// Load configuration from ./config.toml with environment overrides
    pub fn load() -> std::result::Result<Self, config::ConfigError> {
        Self::load_from(Path::new("config"))
    }

    /// Load configuration from the given file (extension optional) with
    /// `SANDBOX_` environment overrides
    pub fn load_from(path: &Path) -> std::result::Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(&path.to_string_lossy()))
            .add_source(Environment::with_prefix("SANDBOX").try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Split into the immutable startup part and the shared root context
    pub fn split(self) -> Result<(StartupConfig, RootContext)> {
        let root = RootContext::new(&self.runtime.server_root)?;
        Ok((self.startup, root))
    }

    fn validate(&self) -> std::result::Result<(), config::ConfigError> {
        if self.startup.control_port == 0 {
            return Err(config::ConfigError::Message(
                "Control port cannot be 0".into(),
            ));
        }

        if self.startup.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.startup.max_upload_size_mb == 0 {
            return Err(config::ConfigError::Message(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }

        if self.runtime.server_root.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "server_root cannot be empty".into(),
            ));
        }

        Ok(())
    }
}

impl StartupConfig {
    /// Bind address and control port as a socket address string
    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.control_port)
    }

    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}

/// The confinement root shared by every connection.
///
/// Readers take a snapshot; `set` swaps the whole value, so a concurrent
/// reader sees either the old root or the new one.
#[derive(Debug, Clone)]
pub struct RootContext {
    current: Arc<RwLock<Arc<PathBuf>>>,
}

impl RootContext {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let root = absolute_root(path.as_ref())?;
        Ok(Self {
            current: Arc::new(RwLock::new(Arc::new(root))),
        })
    }

    pub async fn get(&self) -> Arc<PathBuf> {
        Arc::clone(&*self.current.read().await)
    }

    /// Replace the root, returning the normalized value now in effect
    pub async fn set(&self, path: impl AsRef<Path>) -> Result<Arc<PathBuf>> {
        let root = Arc::new(absolute_root(path.as_ref())?);
        *self.current.write().await = Arc::clone(&root);
        Ok(root)
    }
}

fn absolute_root(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(ExplorerError::InvalidArgument("Path is required".into()));
    }
    let absolute = std::path::absolute(path)
        .map_err(|e| ExplorerError::from_io(e, path.to_string_lossy()))?;
    Ok(normalize_path(&absolute))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
bind_address = "127.0.0.1"
control_port = 2121
server_root = "/srv/share"
max_command_length = 1024
max_clients = 4
max_upload_size_mb = 2
"#;

    #[test]
    fn loads_and_splits_toml() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("explorer.toml");
        fs::write(&file, SAMPLE).unwrap();

        let config = ServerConfig::load_from(&file).unwrap();
        assert_eq!(config.startup.control_socket(), "127.0.0.1:2121");
        assert_eq!(config.startup.max_upload_size_bytes(), 2 * 1024 * 1024);
        assert_eq!(config.runtime.server_root, "/srv/share");
    }

    #[test]
    fn rejects_zero_clients() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("explorer.toml");
        fs::write(&file, SAMPLE.replace("max_clients = 4", "max_clients = 0")).unwrap();

        let err = ServerConfig::load_from(&file).unwrap_err();
        assert!(err.to_string().contains("max_clients"));
    }

    #[test]
    fn environment_overrides_file_values() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("explorer.toml");
        fs::write(&file, SAMPLE).unwrap();

        // No other test reads max_command_length, so the override cannot leak
        // into their assertions.
        unsafe { std::env::set_var("SANDBOX_MAX_COMMAND_LENGTH", "2048") };
        let loaded = ServerConfig::load_from(&file);
        unsafe { std::env::remove_var("SANDBOX_MAX_COMMAND_LENGTH") };

        let config = loaded.unwrap();
        assert_eq!(config.startup.max_command_length, 2048);
        assert_eq!(config.startup.control_port, 2121);
    }

    #[test]
    fn upload_limit_saturates_instead_of_overflowing() {
        let startup = StartupConfig {
            bind_address: "127.0.0.1".into(),
            control_port: 2121,
            max_command_length: 1024,
            max_clients: 4,
            max_upload_size_mb: u64::MAX,
        };
        assert_eq!(startup.max_upload_size_bytes(), u64::MAX);
    }

    #[tokio::test]
    async fn root_context_is_replaced_as_a_whole() {
        let dir = tempdir().unwrap();
        let ctx = RootContext::new(dir.path()).unwrap();
        let before = ctx.get().await;
        assert!(before.is_absolute());

        let other = dir.path().join("nested").join("..").join("other");
        let after = ctx.set(&other).await.unwrap();
        assert_eq!(*after, dir.path().join("other"));
        assert_eq!(ctx.get().await, after);
        // The earlier snapshot is untouched.
        assert_eq!(*before, normalize_path(dir.path()));
    }

    #[tokio::test]
    async fn empty_root_is_rejected() {
        let dir = tempdir().unwrap();
        let ctx = RootContext::new(dir.path()).unwrap();
        let err = ctx.set("").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument: Path is required");
    }
}
