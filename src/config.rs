//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/twig/twig.toml`
//! 3. Explicit config file passed to [`Settings::load`]
//! 4. Environment variables: `TWIG_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, Map};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::TreeResult;

/// Tunables for arenas and rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Number of node slots reserved up front by `TreeArena::with_settings`
    pub initial_capacity: usize,
    /// Payload key used as a node label when rendering
    pub label_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            label_key: "name".into(),
        }
    }
}

/// Get the XDG config directory for twig.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "twig").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("twig.toml"))
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// Missing files are skipped; a file that exists but does not parse is an
    /// error.
    #[instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> TreeResult<Self> {
        let global_path = global_config_path();
        Self::load_from(global_path.as_deref(), path, None)
    }

    /// Layered load with every source given explicitly.
    ///
    /// `env` replaces the process environment as the source of `TWIG_*`
    /// variables when set.
    #[instrument(level = "debug", skip(env))]
    pub fn load_from(
        global_path: Option<&Path>,
        path: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> TreeResult<Self> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("initial_capacity", defaults.initial_capacity as u64)?
            .set_default("label_key", defaults.label_key)?;

        if let Some(global_path) = global_path {
            if global_path.exists() {
                debug!(path = %global_path.display(), "loading global config");
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        if let Some(path) = path {
            if path.exists() {
                debug!(path = %path.display(), "loading config");
                builder = builder.add_source(File::from(path).required(true));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("TWIG")
                .try_parsing(true)
                .source(env),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Serialize settings to TOML string.
    pub fn to_toml(&self) -> TreeResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("serialize settings: {}", e)).into())
    }
}
