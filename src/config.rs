//! Settings file and option resolution.
//!
//! Settings come from `config.toml` in the config directory (see
//! [`crate::paths`]); command-line flags override them.

use anyhow::{Context, Result, bail};
use patchkit::{EngineKind, EnvMarker, Environment, Fixed};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// Default catalog file name, relative to the working tree
pub const DEFAULT_CATALOG: &str = "patches.toml";

/// How to decide whether this is a managed cloud instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentMode {
    /// Look at the marker environment variable
    #[default]
    Auto,
    /// Always managed
    Managed,
    /// Never managed
    Unmanaged,
}

// ============================================================================
// Settings file
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub catalog: Option<String>,
    pub work_dir: Option<String>,
    pub engine: Option<String>,
    pub environment: EnvironmentSettings,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    pub mode: EnvironmentMode,
    /// Marker variable for `auto` mode
    pub marker: Option<String>,
}

impl Settings {
    /// Parse settings TOML
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid settings format")
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("In {}", path.display()))
    }

    /// Load `path`, or the default settings file when it exists
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default = paths::config_file()?;
        if default.exists() {
            log::debug!("Loading settings from {}", default.display());
            Self::load(&default)
        } else {
            Ok(Self::default())
        }
    }
}

// ============================================================================
// Resolved options
// ============================================================================

/// Command-line overrides
#[derive(Debug, Default)]
pub struct Overrides {
    pub catalog: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub engine: Option<String>,
    pub environment: Option<EnvironmentMode>,
}

/// Effective options after merging settings and flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub catalog: PathBuf,
    pub work_dir: PathBuf,
    pub engine: EngineKind,
    pub environment: EnvironmentMode,
    pub marker: String,
}

impl Options {
    pub fn resolve(settings: Settings, overrides: Overrides) -> Result<Self> {
        let work_dir = overrides
            .work_dir
            .or_else(|| settings.work_dir.as_deref().map(paths::expand))
            .unwrap_or_else(|| PathBuf::from("."));

        // A relative catalog from the settings file is relative to the tree
        let catalog = overrides
            .catalog
            .or_else(|| {
                settings.catalog.as_deref().map(|c| {
                    let path = paths::expand(c);
                    if path.is_absolute() {
                        path
                    } else {
                        work_dir.join(path)
                    }
                })
            })
            .unwrap_or_else(|| work_dir.join(DEFAULT_CATALOG));

        let engine_name = overrides.engine.or(settings.engine);
        let engine = match engine_name.as_deref() {
            None => EngineKind::default(),
            Some(name) => match EngineKind::from_name(name) {
                Some(kind) => kind,
                None => bail!("Unknown patch engine '{name}' (expected 'git' or 'patch')"),
            },
        };

        Ok(Self {
            catalog,
            work_dir,
            engine,
            environment: overrides.environment.unwrap_or(settings.environment.mode),
            marker: settings
                .environment
                .marker
                .unwrap_or_else(|| patchkit::environment::DEFAULT_MARKER.to_string()),
        })
    }

    /// Environment predicate for the configured mode
    pub fn environment(&self) -> Box<dyn Environment> {
        match self.environment {
            EnvironmentMode::Auto => Box::new(EnvMarker::new(&self.marker)),
            EnvironmentMode::Managed => Box::new(Fixed(true)),
            EnvironmentMode::Unmanaged => Box::new(Fixed(false)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
