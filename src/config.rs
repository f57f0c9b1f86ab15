//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/navtree/navtree.toml`
//! 3. Local config: `--config <file>` or `./navtree.toml`
//! 4. Environment variables: `NAVTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, IoResultExt, PUBLIC_NAVIGATION_MAIN};
use crate::domain::PageDescriptor;

/// A plugin contributing pages to a filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PluginConfig {
    /// Plugin name, also the merge key between config layers
    pub name: String,
    /// Filter the pages are contributed to
    pub filter: String,
    /// Disabled plugins contribute nothing, so their pages expire
    pub enabled: bool,
    pub pages: Vec<PageDescriptor>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            filter: PUBLIC_NAVIGATION_MAIN.into(),
            enabled: true,
            pages: Vec::new(),
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub store_path: Option<PathBuf>,
    pub option_name: Option<String>,
    pub filter_name: Option<String>,
    pub base_url: Option<String>,
    pub plugins: Option<Vec<PluginConfig>>,
}

/// Unified configuration for navtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// JSON file backing the option store
    pub store_path: PathBuf,
    /// Option holding the persisted navigation
    pub option_name: String,
    /// Filter consulted by `sync`
    pub filter_name: String,
    /// Prefix for assembled route hrefs
    pub base_url: String,
    pub plugins: Vec<PluginConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            option_name: PUBLIC_NAVIGATION_MAIN.into(),
            filter_name: PUBLIC_NAVIGATION_MAIN.into(),
            base_url: String::new(),
            plugins: Vec::new(),
        }
    }
}

fn default_store_path() -> PathBuf {
    ProjectDirs::from("", "", "navtree")
        .map(|dirs| dirs.data_dir().join("options.json"))
        .unwrap_or_else(|| PathBuf::from("~/.navtree/options.json"))
}

/// Get the XDG config directory for navtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "navtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("navtree.toml"))
}

/// Local config file picked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "navtree.toml";

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).with_path_context("read", path)?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Merge plugin lists by name.
///
/// - Overlay plugins replace base plugins of the same name, others are appended
/// - A plugin named `!name` removes the inherited plugin `name`
pub fn merge_plugins(base: &[PluginConfig], overlay: &[PluginConfig]) -> Vec<PluginConfig> {
    let mut result: Vec<PluginConfig> = base.to_vec();
    for plugin in overlay {
        if let Some(negated) = plugin.name.strip_prefix('!') {
            result.retain(|p| p.name != negated);
        } else if let Some(existing) = result.iter_mut().find(|p| p.name == plugin.name) {
            *existing = plugin.clone();
        } else {
            result.push(plugin.clone());
        }
    }
    result
}

impl Settings {
    /// Expand shell variables and tilde in the store path.
    fn expand_paths(&mut self) {
        let raw = self.store_path.to_string_lossy().into_owned();
        let expanded = shellexpand::full(&raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| raw.clone());
        self.store_path = PathBuf::from(expanded);
    }

    /// Merge overlay config onto self (base); plugins merge by name.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            store_path: overlay
                .store_path
                .clone()
                .unwrap_or_else(|| self.store_path.clone()),
            option_name: overlay
                .option_name
                .clone()
                .unwrap_or_else(|| self.option_name.clone()),
            filter_name: overlay
                .filter_name
                .clone()
                .unwrap_or_else(|| self.filter_name.clone()),
            base_url: overlay
                .base_url
                .clone()
                .unwrap_or_else(|| self.base_url.clone()),
            plugins: overlay
                .plugins
                .as_ref()
                .map(|o| merge_plugins(&self.plugins, o))
                .unwrap_or_else(|| self.plugins.clone()),
        }
    }

    /// Apply global config onto defaults; a specified plugin list REPLACES.
    fn apply_global(&self, global: &RawSettings) -> Self {
        let mut settings = self.merge_with(&RawSettings {
            plugins: None,
            ..global.clone()
        });
        if let Some(plugins) = &global.plugins {
            settings.plugins = plugins.clone();
        }
        settings
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_config` - Optional local config file (must exist if given)
    pub fn load(local_config: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(local_path) = local_config {
            let raw = load_raw_settings(local_path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply NAVTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("NAVTREE").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("store_path") {
            settings.store_path = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("option_name") {
            settings.option_name = val;
        }
        if let Ok(val) = config.get_string("filter_name") {
            settings.filter_name = val;
        }
        if let Ok(val) = config.get_string("base_url") {
            settings.base_url = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# navtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/navtree/navtree.toml  (defines your baseline)
#   Local:  ./navtree.toml or --config      (site-specific additions)
#   Env:    NAVTREE_* environment variables (explicit overrides)
#
# Plugin lists: global REPLACES the (empty) defaults, local merges by name.
# Use name = "!plugin" in local config to drop an inherited plugin.

# store_path = "~/.local/share/navtree/options.json"
# option_name = "public_navigation_main"
# filter_name = "public_navigation_main"
# base_url = ""

# [[plugins]]
# name = "exhibits"
# filter = "public_navigation_main"
#
# [[plugins.pages]]
# label = "Browse Exhibits"
# controller = "exhibits"
# action = "browse"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
