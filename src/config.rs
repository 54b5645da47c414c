// src/config.rs

//! Manages gateway configuration: loading from TOML, applying defaults, and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use tracing::warn;

/// Settings for the backend connection pool.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PoolConfig {
    /// Hard upper bound on open backend connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Idle connections kept open by the reaper regardless of age.
    #[serde(default = "default_min_idle")]
    pub min_idle: usize,
    /// How long `acquire` waits for a free connection before reporting exhaustion.
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
    /// Idle connections older than this (and above `min_idle`) are closed.
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_reap_interval_secs")]
    pub reap_interval_secs: u64,
}

impl PoolConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_idle: default_min_idle(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            idle_timeout_secs: default_pool_idle_timeout_secs(),
            reap_interval_secs: default_reap_interval_secs(),
        }
    }
}

fn default_max_connections() -> usize {
    20
}
fn default_min_idle() -> usize {
    2
}
fn default_acquire_timeout_ms() -> u64 {
    5000
}
fn default_pool_idle_timeout_secs() -> u64 {
    300
}
fn default_reap_interval_secs() -> u64 {
    30
}

/// Settings for logical session tracking.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionConfig {
    /// Sessions unused for longer than this are expired.
    #[serde(default = "default_session_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Upper bound on live sessions. `0` disables the limit.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_session_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_session_idle_timeout_secs() -> u64 {
    30 * 60 // 30 minutes
}
fn default_sweep_interval_secs() -> u64 {
    60
}
fn default_max_sessions() -> usize {
    1_000_000
}

/// A user that may authenticate against the gateway.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserConfig {
    pub username: String,
    /// The authentication database the user belongs to.
    #[serde(default = "default_auth_db")]
    pub db: String,
    /// The Argon2 password hash (PHC string format).
    pub password_hash: String,
}

fn default_auth_db() -> String {
    "admin".to_string()
}

/// Authentication settings.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AuthConfig {
    /// When true, commands other than session and handshake commands require
    /// the request's session to be authenticated.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

/// Settings for the built-in in-memory backend.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct BackendConfig {
    /// Artificial latency added to every backend operation.
    #[serde(default)]
    pub latency_ms: u64,
}

impl BackendConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct MetricsConfig {
    /// If true, an HTTP server will be started to expose Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,
    /// The port for the Prometheus metrics server.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    9216
}

/// The resolved gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    /// Largest accepted request frame, in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    27017
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_clients() -> usize {
    10000
}
fn default_max_frame_bytes() -> usize {
    48 * 1024 * 1024 // 48 MB
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            max_clients: default_max_clients(),
            max_frame_bytes: default_max_frame_bytes(),
            pool: PoolConfig::default(),
            sessions: SessionConfig::default(),
            auth: AuthConfig::default(),
            backend: BackendConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    /// Loads and validates the configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to load configuration from '{path}'"))
    }

    /// Parses and validates the configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.max_clients == 0 {
            return Err(anyhow!("max_clients cannot be 0"));
        }
        if self.max_frame_bytes < 1024 {
            return Err(anyhow!("max_frame_bytes must be at least 1024"));
        }
        if self.pool.max_connections == 0 {
            return Err(anyhow!("pool.max_connections cannot be 0"));
        }
        if self.pool.min_idle > self.pool.max_connections {
            return Err(anyhow!(
                "pool.min_idle ({}) cannot exceed pool.max_connections ({})",
                self.pool.min_idle,
                self.pool.max_connections
            ));
        }
        if self.pool.acquire_timeout_ms == 0 {
            return Err(anyhow!("pool.acquire_timeout_ms cannot be 0"));
        }
        if self.pool.reap_interval_secs == 0 {
            return Err(anyhow!("pool.reap_interval_secs cannot be 0"));
        }
        if self.sessions.idle_timeout_secs == 0 {
            return Err(anyhow!("sessions.idle_timeout_secs cannot be 0"));
        }
        if self.sessions.sweep_interval_secs == 0 {
            return Err(anyhow!("sessions.sweep_interval_secs cannot be 0"));
        }
        if self.auth.enabled && self.auth.users.is_empty() {
            warn!("auth is enabled but no users are configured; every protected command will be rejected.");
        }
        for user in &self.auth.users {
            if user.username.trim().is_empty() {
                return Err(anyhow!("auth.users entries must have a non-empty username"));
            }
            if argon2::PasswordHash::new(&user.password_hash).is_err() {
                return Err(anyhow!(
                    "auth user '{}' has an invalid password_hash (expected a PHC string)",
                    user.username
                ));
            }
        }
        if self.metrics.enabled && self.metrics.port == self.port {
            return Err(anyhow!("metrics.port cannot equal the gateway port"));
        }
        Ok(())
    }
}
