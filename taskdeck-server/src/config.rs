//! Configuration system for the Taskdeck server.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskdeck-server/config.toml`)
//! 4. Compiled defaults

use std::path::{Path, PathBuf};

use taskdeck_proto::task::OwnerId;

use crate::identity::BearerSessions;

/// Errors that can occur when loading server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure for the server.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerConfigFile {
    server: ServerFileConfig,
    storage: StorageFileConfig,
    sessions: Vec<SessionEntry>,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
}

/// `[storage]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StorageFileConfig {
    backend: Option<StorageBackend>,
    path: Option<PathBuf>,
}

/// Storage backend names accepted in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
enum StorageBackend {
    Memory,
    Sqlite,
}

/// One `[[sessions]]` entry: a bearer token and the owner it authenticates.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct SessionEntry {
    /// Bearer token presented by the client.
    pub token: String,
    /// Owner the token resolves to.
    pub owner: String,
}

/// Parses a `TOKEN=OWNER` CLI value.
fn parse_session(raw: &str) -> Result<SessionEntry, String> {
    match raw.split_once('=') {
        Some((token, owner)) if !token.is_empty() && !owner.is_empty() => Ok(SessionEntry {
            token: token.to_string(),
            owner: owner.to_string(),
        }),
        _ => Err(format!("expected TOKEN=OWNER, got '{raw}'")),
    }
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the task server.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Taskdeck task API server")]
pub struct ServerCliArgs {
    /// Address to bind the server to.
    #[arg(short, long, env = "TASKDECK_BIND")]
    pub bind: Option<String>,

    /// Path to config file (default: `~/.config/taskdeck-server/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// `SQLite` database file; selects the `SQLite` backend.
    #[arg(long, env = "TASKDECK_DATABASE")]
    pub database: Option<PathBuf>,

    /// Accept a bearer token for an owner (repeatable).
    #[arg(long = "session", value_name = "TOKEN=OWNER", value_parser = parse_session)]
    pub sessions: Vec<SessionEntry>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKDECK_LOG")]
    pub log_level: String,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Where tasks are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// In-process map; contents are lost on shutdown.
    Memory,
    /// `SQLite` database at the given path.
    Sqlite(PathBuf),
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to (e.g., `127.0.0.1:3000`).
    pub bind_addr: String,
    /// Storage backend.
    pub storage: StorageConfig,
    /// Accepted sessions, file entries first, CLI entries last.
    pub sessions: Vec<SessionEntry>,
    /// Log level filter string.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            storage: StorageConfig::Memory,
            sessions: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and missing file
    /// is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed.
    pub fn load(cli: &ServerCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, file))
    }

    /// Resolve a `ServerConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. Sessions from both sources are kept;
    /// a CLI token overrides a file token with the same value.
    fn resolve(cli: &ServerCliArgs, file: ServerConfigFile) -> Self {
        let defaults = Self::default();

        let storage = if let Some(path) = &cli.database {
            StorageConfig::Sqlite(path.clone())
        } else {
            match (file.storage.backend, file.storage.path) {
                (Some(StorageBackend::Memory), _) => StorageConfig::Memory,
                (Some(StorageBackend::Sqlite), path) => {
                    StorageConfig::Sqlite(path.unwrap_or_else(default_database_path))
                }
                (None, Some(path)) => StorageConfig::Sqlite(path),
                (None, None) => defaults.storage,
            }
        };

        let mut sessions = file.sessions;
        sessions.extend(cli.sessions.iter().cloned());

        Self {
            bind_addr: cli
                .bind
                .clone()
                .or(file.server.bind_addr)
                .unwrap_or(defaults.bind_addr),
            storage,
            sessions,
            log_level: cli.log_level.clone(),
        }
    }

    /// Builds the bearer-token table from the configured sessions.
    #[must_use]
    pub fn bearer_sessions(&self) -> BearerSessions {
        self.sessions
            .iter()
            .fold(BearerSessions::new(), |table, entry| {
                table.with_session(entry.token.clone(), OwnerId::new(entry.owner.clone()))
            })
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Default `SQLite` location when the file selects `sqlite` without a path.
fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("taskdeck")
        .join("tasks.sqlite3")
}

/// Load and parse a TOML config file for the server.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ServerConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ServerConfigFile::default());
        };
        config_dir.join("taskdeck-server").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ServerConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
