//! Per-call routing configuration

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Flags that steer dispatch
///
/// Passed into each resolve call by value. A resolve may hand back a changed
/// copy (see [`Resolution::config`](crate::dispatch::Resolution::config)),
/// which the caller is expected to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Run NES content on the fast core
    pub nes_in_quicknes: bool,
    /// Run Game Boy content through the SNES core's Super Game Boy mode
    pub gb_as_sgb: bool,
    /// Ask cores for deterministic emulation
    pub deterministic: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            nes_in_quicknes: false,
            gb_as_sgb: false,
            deterministic: true,
        }
    }
}

/// Flags that select between core variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigFlag {
    /// [`DispatchConfig::nes_in_quicknes`]
    NesInQuickNes,
    /// [`DispatchConfig::gb_as_sgb`]
    GbAsSgb,
}

impl ConfigFlag {
    /// All variant-selecting flags
    pub const ALL: [ConfigFlag; 2] = [ConfigFlag::NesInQuickNes, ConfigFlag::GbAsSgb];

    /// Get the config key name
    pub fn name(&self) -> &'static str {
        match self {
            ConfigFlag::NesInQuickNes => "nes_in_quicknes",
            ConfigFlag::GbAsSgb => "gb_as_sgb",
        }
    }

    /// Look up a flag by config key name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

impl fmt::Display for ConfigFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl DispatchConfig {
    /// Get a variant flag
    pub fn get(&self, flag: ConfigFlag) -> bool {
        match flag {
            ConfigFlag::NesInQuickNes => self.nes_in_quicknes,
            ConfigFlag::GbAsSgb => self.gb_as_sgb,
        }
    }

    /// Return a copy with a variant flag set
    pub fn with(mut self, flag: ConfigFlag, value: bool) -> Self {
        self.set(flag, value);
        self
    }

    /// Set a variant flag
    pub fn set(&mut self, flag: ConfigFlag, value: bool) {
        match flag {
            ConfigFlag::NesInQuickNes => self.nes_in_quicknes = value,
            ConfigFlag::GbAsSgb => self.gb_as_sgb = value,
        }
    }

    /// Reset a variant flag to its default
    pub fn reset(&mut self, flag: ConfigFlag) {
        self.set(flag, Self::default().get(flag));
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration, falling back to defaults if the file is missing or invalid
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
