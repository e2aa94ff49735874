// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration, read once at engine init and again on reset. Recognized
//! keys: backend base URL, API key, log level, redaction settings,
//! auto-update flag. Everything but the credential comes from a TOML file;
//! the credential itself may also be supplied directly through
//! `CONFAB_API_KEY` since the auth flow that would otherwise write it into
//! the config file lives outside this crate.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_SYNC_JITTER: Duration = Duration::from_secs(10);
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TRANSCRIPT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_TRANSCRIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Shape of the on-disk TOML config file. Every field is optional: a missing
/// file, or a file missing some keys, just means defaults apply.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    backend_base_url: Option<String>,
    api_key: Option<String>,
    log_level: Option<String>,
    #[serde(default)]
    redaction: toml::value::Table,
    auto_update: Option<bool>,
}

/// The engine's current configuration. Owned by value, not behind a global —
/// rotation is just "construct a new one from a fresh load"; resetting drops
/// the cached engine rather than mutating a shared config.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_base_url: String,
    pub api_key: String,
    pub log_level: String,
    /// Opaque configuration handed to the external redactor collaborator;
    /// this crate interprets none of it.
    pub redaction_settings: serde_json::Value,
    /// Consumed by collaborators outside this crate; carried through so a
    /// future auto-update checker has somewhere to read it from.
    pub auto_update: bool,

    pub sync_interval: Duration,
    pub sync_jitter: Duration,
    pub shutdown_timeout: Duration,
    pub transcript_wait_timeout: Duration,
    pub transcript_poll_interval: Duration,
    pub max_chunk_bytes: usize,
}

impl Config {
    /// Default config file path: sibling of the sync state directory —
    /// `<confab-dir>/config.toml`, consistent with `CONFAB_CLAUDE_DIR`.
    fn default_config_path() -> Result<PathBuf, ConfigError> {
        let sync_dir =
            confab_storage::SessionPaths::sync_dir().map_err(|_| ConfigError::NoConfigDir)?;
        let claude_dir = sync_dir.parent().ok_or(ConfigError::NoConfigDir)?;
        Ok(claude_dir.join("config.toml"))
    }

    fn resolve_config_path() -> Result<PathBuf, ConfigError> {
        Ok(crate::env::config_path().map_or_else(Self::default_config_path, Ok)?)
    }

    fn load_file() -> Result<ConfigFile, ConfigError> {
        let path = Self::resolve_config_path()?;
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ConfigFile::default()),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Reads environment variables first, falling back to the TOML config
    /// file, then to built-in defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let file = Self::load_file()?;

        let redaction_settings = serde_json::to_value(&file.redaction).unwrap_or(serde_json::Value::Null);

        Ok(Self {
            backend_base_url: file.backend_base_url.unwrap_or_default(),
            api_key: crate::env::api_key().or(file.api_key).unwrap_or_default(),
            log_level: file.log_level.unwrap_or_else(|| "info".to_string()),
            redaction_settings,
            auto_update: file.auto_update.unwrap_or(true),

            sync_interval: crate::env::sync_interval_ms().unwrap_or(DEFAULT_SYNC_INTERVAL),
            sync_jitter: crate::env::sync_jitter_ms().unwrap_or(DEFAULT_SYNC_JITTER),
            shutdown_timeout: crate::env::shutdown_timeout_ms().unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT),
            transcript_wait_timeout: crate::env::transcript_wait_timeout_ms()
                .unwrap_or(DEFAULT_TRANSCRIPT_WAIT_TIMEOUT),
            transcript_poll_interval: crate::env::transcript_poll_ms()
                .unwrap_or(DEFAULT_TRANSCRIPT_POLL_INTERVAL),
            max_chunk_bytes: crate::env::sync_chunk_bytes()
                .unwrap_or(confab_sync::DEFAULT_MAX_CHUNK_BYTES),
        })
    }
}
