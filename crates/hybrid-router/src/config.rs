// File: src/config.rs
// Purpose: Configuration parsing from hybrid.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::RouteError;
use crate::instance_info::Delimiters;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub mounts: Vec<MountConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

/// What a listener callback gets when its instance is gone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpiredInstancePolicy {
    /// Fail the decode with `RouteError::InstanceExpired`
    #[default]
    Fail,
    /// Decode to `LogicalTarget::ExpiredInstance`
    Report,
    /// Decode to a fresh target for the mount's view
    Rebuild,
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Whether mount prefixes compare case-insensitively (default: false)
    #[serde(default = "default_false")]
    pub case_insensitive: bool,

    /// Redirect fresh hits on stateful views to their hybrid URL
    #[serde(default = "default_true")]
    pub redirect_on_bookmarkable: bool,

    /// Instance ids are unique per session, so URLs may drop the scope name
    #[serde(default = "default_false")]
    pub instance_ids_unique_per_session: bool,

    #[serde(default)]
    pub expired_instance: ExpiredInstancePolicy,

    #[serde(default = "default_begin_separator")]
    pub begin_separator: String,

    #[serde(default)]
    pub end_separator: String,
}

/// One `[[mounts]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountConfig {
    pub path: String,

    pub view: String,

    /// Whether instances of this view are stateful (used by the server)
    #[serde(default = "default_true")]
    pub stateful: bool,

    /// Overrides `routing.redirect_on_bookmarkable` for this mount
    #[serde(default)]
    pub redirect_on_bookmarkable: Option<bool>,
}

// Default values
fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_begin_separator() -> String {
    ".".to_string()
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            redirect_on_bookmarkable: true,
            instance_ids_unique_per_session: false,
            expired_instance: ExpiredInstancePolicy::Fail,
            begin_separator: default_begin_separator(),
            end_separator: String::new(),
        }
    }
}

impl RoutingConfig {
    /// Instance-info delimiters, validated
    pub fn delimiters(&self) -> Result<Delimiters, RouteError> {
        Delimiters::new(self.begin_separator.as_str(), self.end_separator.as_str())
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        // Surface delimiter mistakes at load time rather than on first request
        config
            .routing
            .delimiters()
            .with_context(|| format!("Invalid [routing] separators in {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./hybrid.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("hybrid.toml")
    }
}
