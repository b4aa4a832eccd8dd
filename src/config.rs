//! Configuration management for lapu-emu.
//!
//! Configuration is loaded from multiple sources in priority order:
//! 1. Environment variables (`LAPU_TILE_FACTOR`, `LAPU_MAX_CYCLES`,
//!    `LAPU_BRANCH_ON_IMAG`)
//! 2. Project-local config file (`./lapu-emu.toml`)
//! 3. User config file (`~/.config/lapu-emu/config.toml`)
//! 4. Built-in defaults
//!
//! Command-line flags of the `lapu-emu` binary override all of these.
//!
//! # Config File Format
//!
//! ```toml
//! # lapu-emu.toml
//!
//! # 8-lane tiles per matrix axis (matrix side = 8 × tile_factor)
//! tile_factor = 2
//!
//! # Tick budget for a run
//! max_cycles = 10000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::interpreter::state::DEFAULT_TILE_FACTOR;

/// Global cached configuration.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Default tick budget for `run`.
pub const DEFAULT_MAX_CYCLES: u64 = 10_000;

/// lapu-emu configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Tiles per matrix axis.
    /// Matrices are `8 × tile_factor` square.
    pub tile_factor: Option<usize>,

    /// Tick budget for a run.
    pub max_cycles: Option<u64>,

    /// Jump when the tested register's imaginary part is non-zero,
    /// not only its real part.
    pub branch_on_imag: Option<bool>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Project-local `lapu-emu.toml`
    /// 3. User config `~/.config/lapu-emu/config.toml`
    /// 4. Defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        // Load user config first (lowest priority of file configs)
        if let Some(user_config) = Self::load_user_config() {
            config.merge(user_config);
        }

        // Load project-local config (higher priority)
        if let Some(local_config) = Self::load_local_config() {
            config.merge(local_config);
        }

        // Environment variables override everything
        config.apply_env_overrides();

        config
    }

    /// Get the cached global configuration.
    ///
    /// Loads configuration on first call and caches it.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(|| {
            let config = Self::load();
            log::debug!("Loaded configuration: {:?}", config);
            config
        })
    }

    /// Tiles per matrix axis, at least 1.
    pub fn tile_factor(&self) -> usize {
        self.tile_factor.unwrap_or(DEFAULT_TILE_FACTOR).max(1)
    }

    /// Tick budget for a run.
    pub fn max_cycles(&self) -> u64 {
        self.max_cycles.unwrap_or(DEFAULT_MAX_CYCLES)
    }

    /// Whether jumps also test the imaginary part.
    pub fn branch_on_imag(&self) -> bool {
        self.branch_on_imag.unwrap_or(false)
    }

    /// Load user configuration from ~/.config/lapu-emu/config.toml
    fn load_user_config() -> Option<Self> {
        let config_path = Self::user_config_path()?;
        Self::load_from_file(&config_path)
    }

    /// Load project-local configuration from ./lapu-emu.toml
    fn load_local_config() -> Option<Self> {
        Self::load_from_file(Path::new("lapu-emu.toml"))
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Merge another config into this one.
    /// Only overrides fields that are Some in the other config.
    pub fn merge(&mut self, other: Self) {
        if other.tile_factor.is_some() {
            self.tile_factor = other.tile_factor;
        }
        if other.max_cycles.is_some() {
            self.max_cycles = other.max_cycles;
        }
        if other.branch_on_imag.is_some() {
            self.branch_on_imag = other.branch_on_imag;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from a variable lookup. Unparseable values are
    /// logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("LAPU_TILE_FACTOR") {
            match value.trim().parse::<usize>() {
                Ok(n) if n >= 1 => {
                    log::info!("Using LAPU_TILE_FACTOR from environment: {}", n);
                    self.tile_factor = Some(n);
                }
                _ => log::warn!("Ignoring invalid LAPU_TILE_FACTOR={:?}", value),
            }
        }
        if let Some(value) = lookup("LAPU_MAX_CYCLES") {
            match value.trim().parse::<u64>() {
                Ok(n) => {
                    log::info!("Using LAPU_MAX_CYCLES from environment: {}", n);
                    self.max_cycles = Some(n);
                }
                Err(_) => log::warn!("Ignoring invalid LAPU_MAX_CYCLES={:?}", value),
            }
        }
        if let Some(value) = lookup("LAPU_BRANCH_ON_IMAG") {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.branch_on_imag = Some(true),
                "0" | "false" | "no" | "off" => self.branch_on_imag = Some(false),
                _ => log::warn!("Ignoring invalid LAPU_BRANCH_ON_IMAG={:?}", value),
            }
        }
    }

    /// Get the path to the user config file (for display/creation).
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("lapu-emu").join("config.toml"))
    }

    /// Generate a sample config file content.
    pub fn sample_config() -> String {
        r#"# lapu-emu configuration
# Place this file at ~/.config/lapu-emu/config.toml or ./lapu-emu.toml

# 8-lane tiles per matrix axis; matrices are (8 * tile_factor) square
tile_factor = 2

# Tick budget for a run (each instruction takes 6 ticks)
max_cycles = 10000

# Jump when the tested register's imaginary part is non-zero as well
# branch_on_imag = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.tile_factor(), 2);
        assert_eq!(config.max_cycles(), 10_000);
        assert!(!config.branch_on_imag());
    }

    #[test]
    fn test_tile_factor_floor() {
        let config = Config { tile_factor: Some(0), ..Config::default() };
        assert_eq!(config.tile_factor(), 1);
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config {
            tile_factor: Some(4),
            max_cycles: None,
            branch_on_imag: Some(true),
        };

        let overlay = Config {
            tile_factor: None,
            max_cycles: Some(500),
            branch_on_imag: Some(false),
        };

        base.merge(overlay);

        // tile_factor unchanged (overlay was None)
        assert_eq!(base.tile_factor, Some(4));
        // max_cycles set from overlay
        assert_eq!(base.max_cycles, Some(500));
        // branch_on_imag overridden by overlay
        assert_eq!(base.branch_on_imag, Some(false));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("LAPU_TILE_FACTOR", "3"),
            ("LAPU_MAX_CYCLES", " 42 "),
            ("LAPU_BRANCH_ON_IMAG", "TRUE"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.tile_factor(), 3);
        assert_eq!(config.max_cycles(), 42);
        assert!(config.branch_on_imag());
    }

    #[test]
    fn test_invalid_overrides_ignored() {
        let mut config = Config { tile_factor: Some(4), ..Config::default() };
        config.apply_overrides(|name| match name {
            "LAPU_TILE_FACTOR" => Some("0".to_string()),
            "LAPU_MAX_CYCLES" => Some("lots".to_string()),
            _ => Some("maybe".to_string()),
        });

        assert_eq!(config, Config { tile_factor: Some(4), ..Config::default() });
    }

    #[test]
    fn test_sample_config_parses() {
        let sample = Config::sample_config();
        let config: Config = toml::from_str(&sample).expect("Sample config should parse");
        assert_eq!(config.tile_factor(), 2);
        assert_eq!(config.max_cycles(), 10_000);
    }

    #[test]
    fn test_missing_file_is_none() {
        assert!(Config::load_from_file(Path::new("/nonexistent/lapu-emu.toml")).is_none());
    }
}
