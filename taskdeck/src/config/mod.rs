//! Configuration system for the Taskdeck client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskdeck/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;

use taskdeck_proto::task::{Priority, TaskId};
use url::Url;

use crate::tasks::{SortDirection, SortKey, SortState};
use crate::transport::http::HttpTransport;

/// Default server base URL.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Errors that can occur when loading configuration.
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

    /// The server URL is not an absolute `http(s)` URL.
    #[error("invalid server url '{url}': {reason}")]
    InvalidUrl {
        /// The rejected value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A display setting has an unknown value.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// Config key.
        field: &'static str,
        /// Parse failure.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    server: ServerFileConfig,
    display: DisplayFileConfig,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    url: Option<String>,
    token: Option<String>,
}

/// `[display]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct DisplayFileConfig {
    sort_by: Option<String>,
    sort_direction: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the task server.
    pub server_url: Url,
    /// Bearer token identifying the owner.
    pub token: Option<String>,
    /// Initial list ordering.
    pub sort: SortState,
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path
    /// (`~/.config/taskdeck/config.toml`) is tried and silently ignored if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if a resolved value is invalid.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Result<Self, ConfigError> {
        let defaults = SortState::default();

        let server_url = parse_server_url(
            cli.server
                .as_deref()
                .or(file.server.url.as_deref())
                .unwrap_or(DEFAULT_SERVER_URL),
        )?;

        let key = match (cli.sort, file.display.sort_by.as_deref()) {
            (Some(key), _) => key,
            (None, Some(raw)) => raw.parse().map_err(|message| ConfigError::InvalidValue {
                field: "display.sort_by",
                message,
            })?,
            (None, None) => defaults.key(),
        };
        let direction = match (cli.direction, file.display.sort_direction.as_deref()) {
            (Some(direction), _) => direction,
            (None, Some(raw)) => raw.parse().map_err(|message| ConfigError::InvalidValue {
                field: "display.sort_direction",
                message,
            })?,
            (None, None) => defaults.direction(),
        };

        Ok(Self {
            server_url,
            token: cli.token.clone().or_else(|| file.server.token.clone()),
            sort: SortState::new(key, direction),
        })
    }

    /// Builds the HTTP transport for this configuration.
    #[must_use]
    pub fn transport(&self) -> HttpTransport {
        HttpTransport::new(self.server_url.clone(), self.token.clone())
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Personal task tracker")]
pub struct CliArgs {
    /// Base URL of the task server.
    #[arg(long, global = true, env = "TASKDECK_URL")]
    pub server: Option<String>,

    /// Session token sent as a bearer credential.
    #[arg(long, global = true, env = "TASKDECK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path to config file (default: `~/.config/taskdeck/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Sort key: priority, due-date, status or title.
    #[arg(long, global = true)]
    pub sort: Option<SortKey>,

    /// Sort direction: asc or desc.
    #[arg(long, global = true)]
    pub direction: Option<SortDirection>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn", env = "TASKDECK_LOG")]
    pub log_level: String,

    /// Write logs to this file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// What to do; lists tasks when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Client subcommands. Every command prints the list afterwards.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the task list.
    List,
    /// Create a task.
    Add {
        /// Task title (at least 3 characters).
        title: String,
        /// Longer description.
        #[arg(short, long)]
        description: Option<String>,
        /// Due date as YYYY-MM-DD.
        #[arg(long)]
        due: Option<String>,
        /// Priority: low, medium or high.
        #[arg(short, long)]
        priority: Option<Priority>,
        /// Label to attach (repeatable).
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Create the task already completed.
        #[arg(long)]
        completed: bool,
    },
    /// Mark a task completed.
    Done {
        /// Task id.
        id: TaskId,
    },
    /// Mark a task pending again.
    Reopen {
        /// Task id.
        id: TaskId,
    },
    /// Flip a task between pending and completed.
    Toggle {
        /// Task id.
        id: TaskId,
    },
    /// Delete a task.
    Rm {
        /// Task id.
        id: TaskId,
    },
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Parses and checks a server base URL.
fn parse_server_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() || url.host().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskdeck").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
