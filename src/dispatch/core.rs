//! Core construction contract
//!
//! Cores themselves live outside this crate. A [`CoreBuilder`] turns a
//! [`BuildRequest`] into a running [`Core`]; builders are registered per
//! [`CoreKind`] on the [`CoreRegistry`](crate::dispatch::CoreRegistry).

use crate::disc::{Disc, DiscSectorReader, DiscStream};
use crate::game::GameRecord;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Emulation core variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CoreKind {
    /// SNES core (also hosts Super Game Boy mode)
    Libsnes,
    /// Master System / SG-1000 / Game Gear
    Sms,
    /// Atari 2600
    Atari2600,
    /// PC Engine, SuperGrafx and PC Engine CD
    PcEngine,
    /// Genesis / Mega Drive and Mega CD
    Gpgx,
    /// TI-83 calculator
    Ti83,
    /// Accurate NES core
    Nes,
    /// Fast NES core
    QuickNes,
    /// Game Boy / Game Boy Color
    Gambatte,
    /// Two linked Game Boys
    GambatteLink,
    /// ColecoVision
    ColecoVision,
    /// Intellivision
    Intellivision,
    /// Atari 7800
    Atari7800,
    /// Commodore 64
    C64,
    /// Game Boy Advance
    Gba,
    /// Nintendo 64
    N64,
    /// Libretro debug core
    LibretroDebug,
    /// Sega Saturn
    Yabause,
    /// PlayStation Portable
    Psp,
    /// PlayStation
    Octoshock,
}

impl fmt::Display for CoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A running emulation core
pub trait Core: fmt::Debug {
    /// Which core this is
    fn kind(&self) -> CoreKind;

    /// Extra status text shown alongside the ROM status
    fn status_details(&self) -> Option<String> {
        None
    }
}

/// Error raised by a core builder
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{core} failed to start: {message}")]
pub struct CoreError {
    /// Core that failed
    pub core: CoreKind,
    /// Reason
    pub message: String,
}

impl CoreError {
    /// Create a core error
    pub fn new<S: Into<String>>(core: CoreKind, message: S) -> Self {
        CoreError {
            core,
            message: message.into(),
        }
    }
}

/// Context handed to every core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreComm {
    /// Canonical path of the content
    pub canonical_path: String,
    /// Directory for cores that load companion files next to the content
    pub subfile_directory: Option<PathBuf>,
    /// Whether deterministic emulation was requested
    pub deterministic: bool,
}

/// A named asset of a linked multi-image title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedAsset {
    /// Slot name from the descriptor (e.g. `LeftRom`)
    pub slot: String,
    /// Identity of the asset
    pub record: GameRecord,
    /// Asset bytes
    pub data: Vec<u8>,
}

/// Content in the form a core consumes
#[derive(Debug)]
pub enum CoreContent<'a> {
    /// ROM payload without headers
    RomData(&'a [u8]),
    /// Whole file including headers
    FileData(&'a [u8]),
    /// Disc with random sector access
    Disc(&'a Disc),
    /// Disc as a byte stream over Mode 1 user data
    DiscStream(DiscStream<DiscSectorReader>),
    /// Path the core opens itself
    Path(&'a str),
    /// Assets of a linked title
    Linked(&'a [LinkedAsset]),
}

impl CoreContent<'_> {
    /// Describe the content form
    pub fn describe(&self) -> String {
        match self {
            CoreContent::RomData(data) => format!("ROM data ({} bytes)", data.len()),
            CoreContent::FileData(data) => format!("file data ({} bytes)", data.len()),
            CoreContent::Disc(disc) => format!("disc ({} sectors)", disc.leadout_lba()),
            CoreContent::DiscStream(stream) => format!("disc stream ({} bytes)", stream.len()),
            CoreContent::Path(path) => format!("path {}", path),
            CoreContent::Linked(assets) => format!("{} linked assets", assets.len()),
        }
    }
}

/// Everything a builder needs to construct a core
#[derive(Debug)]
pub struct BuildRequest<'a> {
    /// Core to build
    pub core: CoreKind,
    /// System id being loaded
    pub system_id: &'a str,
    /// Identity record
    pub record: &'a GameRecord,
    /// Content
    pub content: CoreContent<'a>,
    /// Lowercase extension of the content file
    pub extension: &'a str,
    /// Settings object, when the core takes one
    pub settings: Option<&'a serde_json::Value>,
    /// Sync settings object, when the core takes one
    pub sync_settings: Option<&'a serde_json::Value>,
    /// Firmware images the core declared
    pub firmware: &'a [Vec<u8>],
}

/// Constructs cores
pub trait CoreBuilder {
    /// Build a core or fail
    fn build(&self, comm: &CoreComm, request: BuildRequest<'_>) -> Result<Box<dyn Core>, CoreError>;
}

impl<F> CoreBuilder for F
where
    F: Fn(&CoreComm, BuildRequest<'_>) -> Result<Box<dyn Core>, CoreError>,
{
    fn build(&self, comm: &CoreComm, request: BuildRequest<'_>) -> Result<Box<dyn Core>, CoreError> {
        self(comm, request)
    }
}

/// Source of per-core settings objects
pub trait SettingsProvider {
    /// Get the settings object for a core
    fn settings(&self, core: CoreKind) -> Option<serde_json::Value>;

    /// Get the sync settings object for a core
    fn sync_settings(&self, core: CoreKind) -> Option<serde_json::Value>;
}

/// Provides no settings; cores use their defaults
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSettings;

impl SettingsProvider for NoSettings {
    fn settings(&self, _core: CoreKind) -> Option<serde_json::Value> {
        None
    }

    fn sync_settings(&self, _core: CoreKind) -> Option<serde_json::Value> {
        None
    }
}

/// Settings held in maps keyed by core
#[derive(Debug, Clone, Default)]
pub struct SettingsMap {
    settings: HashMap<CoreKind, serde_json::Value>,
    sync_settings: HashMap<CoreKind, serde_json::Value>,
}

impl SettingsMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a core's settings
    pub fn with_settings(mut self, core: CoreKind, value: serde_json::Value) -> Self {
        self.settings.insert(core, value);
        self
    }

    /// Set a core's sync settings
    pub fn with_sync_settings(mut self, core: CoreKind, value: serde_json::Value) -> Self {
        self.sync_settings.insert(core, value);
        self
    }
}

impl SettingsProvider for SettingsMap {
    fn settings(&self, core: CoreKind) -> Option<serde_json::Value> {
        self.settings.get(&core).cloned()
    }

    fn sync_settings(&self, core: CoreKind) -> Option<serde_json::Value> {
        self.sync_settings.get(&core).cloned()
    }
}

/// Placeholder core that records what it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCore {
    /// Core variant
    pub kind: CoreKind,
    /// System id it was built for
    pub system_id: String,
    /// Description of the content it received
    pub content: String,
    /// Status details the real core would report
    pub details: Option<String>,
}

impl Core for PlannedCore {
    fn kind(&self) -> CoreKind {
        self.kind
    }

    fn status_details(&self) -> Option<String> {
        self.details.clone()
    }
}

/// Builder that produces [`PlannedCore`]s without running anything
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunBuilder;

impl CoreBuilder for DryRunBuilder {
    fn build(&self, _comm: &CoreComm, request: BuildRequest<'_>) -> Result<Box<dyn Core>, CoreError> {
        let details = match request.core {
            CoreKind::Octoshock => Some("PSX etc.".to_string()),
            _ => None,
        };

        Ok(Box::new(PlannedCore {
            kind: request.core,
            system_id: request.system_id.to_string(),
            content: request.content.describe(),
            details,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comm() -> CoreComm {
        CoreComm {
            canonical_path: "game.nes".into(),
            subfile_directory: None,
            deterministic: true,
        }
    }

    #[test]
    fn test_dry_run_builder() {
        let record = GameRecord::new("PSX", "Game");
        let request = BuildRequest {
            core: CoreKind::Octoshock,
            system_id: "PSX",
            record: &record,
            content: CoreContent::Path("game.cue"),
            extension: "cue",
            settings: None,
            sync_settings: None,
            firmware: &[],
        };

        let core = DryRunBuilder.build(&comm(), request).unwrap();
        assert_eq!(core.kind(), CoreKind::Octoshock);
        assert_eq!(core.status_details().as_deref(), Some("PSX etc."));
    }

    #[test]
    fn test_function_builder() {
        fn failing(_: &CoreComm, req: BuildRequest<'_>) -> Result<Box<dyn Core>, CoreError> {
            Err(CoreError::new(req.core, "no BIOS"))
        }
        let record = GameRecord::new("SNES", "Game");
        let request = BuildRequest {
            core: CoreKind::Libsnes,
            system_id: "SNES",
            record: &record,
            content: CoreContent::FileData(&[]),
            extension: "gb",
            settings: None,
            sync_settings: None,
            firmware: &[],
        };

        let err = failing.build(&comm(), request).unwrap_err();
        assert_eq!(err.to_string(), "Libsnes failed to start: no BIOS");
    }

    #[test]
    fn test_settings_map() {
        let settings = SettingsMap::new().with_sync_settings(CoreKind::Nes, serde_json::json!({"region": "pal"}));
        assert!(settings.settings(CoreKind::Nes).is_none());
        assert_eq!(settings.sync_settings(CoreKind::Nes).unwrap()["region"], "pal");
        assert!(NoSettings.sync_settings(CoreKind::Nes).is_none());
    }
}
