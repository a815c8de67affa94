//! Firmware lookup and validation
//!
//! Firmware (system cards, BIOS ROMs) is located through a [`FirmwareStore`]
//! and, for requirements that ask for it, checked against the game database
//! before a core may use it.

use crate::dispatch::outcome::{FailureKind, LoadFailure};
use crate::game::rom::sha256_hex;
use crate::game::{DumpStatus, GameDatabase, GameRecord, RomImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Resolves firmware paths from user configuration
pub trait FirmwareStore {
    /// Get the configured path for a firmware, if any
    fn request_path(&self, system_id: &str, tag: &str) -> Option<PathBuf>;
}

/// Firmware paths held in a map
#[derive(Debug, Clone, Default)]
pub struct MapFirmwareStore {
    paths: HashMap<(String, String), PathBuf>,
}

impl MapFirmwareStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure a firmware path
    pub fn insert<P: Into<PathBuf>>(&mut self, system_id: &str, tag: &str, path: P) {
        self.paths
            .insert((system_id.to_string(), tag.to_string()), path.into());
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with<P: Into<PathBuf>>(mut self, system_id: &str, tag: &str, path: P) -> Self {
        self.insert(system_id, tag, path);
        self
    }
}

impl FirmwareStore for MapFirmwareStore {
    fn request_path(&self, system_id: &str, tag: &str) -> Option<PathBuf> {
        self.paths
            .get(&(system_id.to_string(), tag.to_string()))
            .cloned()
    }
}

/// A capability tier a firmware may provide and a game may need
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    /// Firmware option that grants the capability
    pub provides: &'static str,
    /// Game option that demands it
    pub required_by: &'static str,
}

/// Firmware a core needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareRequirement {
    /// System id the firmware is filed under
    pub system_id: &'static str,
    /// Firmware tag within the system
    pub tag: &'static str,
    /// Name used in messages
    pub label: &'static str,
    /// Whether the image must pass database checks
    pub validate: bool,
    /// Capability tiers checked against the game
    pub capabilities: &'static [Capability],
}

/// PC Engine CD system card
pub const PCECD_SYSTEM_CARD: FirmwareRequirement = FirmwareRequirement {
    system_id: "PCECD",
    tag: "Bios",
    label: "PCE-CD System Card",
    validate: true,
    capabilities: &[Capability {
        provides: "SuperSysCard",
        required_by: "NeedSuperSysCard",
    }],
};

/// Super Game Boy ROM, used when Game Boy content runs on the SNES core
pub const SGB_ROM: FirmwareRequirement = FirmwareRequirement {
    system_id: "SNES",
    tag: "Rom_SGB",
    label: "Super Game Boy ROM",
    validate: false,
    capabilities: &[],
};

/// Firmware that passed every check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFirmware {
    /// Firmware image without any copier header
    pub data: Vec<u8>,
    /// SHA-256 of the image, uppercase hex
    pub hash: String,
    /// Capabilities the firmware provides
    pub flags: Vec<String>,
}

impl ValidatedFirmware {
    /// Rebuild a game record to carry this firmware's hash and flags
    pub fn apply_to(&self, game: &GameRecord) -> GameRecord {
        game.clone().with_firmware(self.hash.clone(), &self.flags)
    }
}

/// Runs firmware through its gates
pub struct FirmwareValidator<'a> {
    store: &'a dyn FirmwareStore,
    database: &'a dyn GameDatabase,
}

impl<'a> FirmwareValidator<'a> {
    /// Create a validator
    pub fn new(store: &'a dyn FirmwareStore, database: &'a dyn GameDatabase) -> Self {
        FirmwareValidator { store, database }
    }

    /// Read a firmware image without database checks
    ///
    /// Failures are reported against `system_id`, the system being loaded.
    pub fn fetch(&self, requirement: &FirmwareRequirement, system_id: &str) -> Result<Vec<u8>, LoadFailure> {
        let path = self.locate(requirement, system_id)?;
        std::fs::read(&path).map_err(|e| {
            missing(
                requirement,
                system_id,
                format!("{} could not be read from {}: {}", requirement.label, path.display(), e),
            )
        })
    }

    /// Fetch and check firmware for a game
    ///
    /// Checks run in order and stop at the first failure: configured and
    /// readable, not a bad dump, known to the database, tagged as a BIOS,
    /// and of a tier the game can run with.
    pub fn validate(
        &self,
        requirement: &FirmwareRequirement,
        game: &GameRecord,
    ) -> Result<ValidatedFirmware, LoadFailure> {
        let system_id = game.system_id();
        let label = requirement.label;
        let data = self.fetch(requirement, system_id)?;

        let name = format!("{} {}", requirement.system_id, requirement.tag);
        let image = RomImage::new(name, "", data);
        let record = self.database.lookup_image(&image);

        let record = match record {
            Some(record) if record.status() == DumpStatus::BadDump => {
                return Err(LoadFailure::new(
                    FailureKind::FirmwareInvalid,
                    system_id,
                    format!("The {} you have selected is known to be a bad dump", label),
                ));
            }
            Some(record) => record,
            None => {
                return Err(LoadFailure::new(
                    FailureKind::FirmwareUnrecognized,
                    system_id,
                    format!("The {} you have selected is not recognized in the database", label),
                ));
            }
        };

        if !record.flag("BIOS") {
            return Err(LoadFailure::new(
                FailureKind::FirmwareWrongKind,
                system_id,
                format!("The {} you have selected is not a BIOS image", label),
            ));
        }

        let mut flags = Vec::new();
        for capability in requirement.capabilities {
            let provided = record.flag(capability.provides);
            if game.flag(capability.required_by) && !provided {
                return Err(LoadFailure::new(
                    FailureKind::FirmwareIncompatible,
                    system_id,
                    format!(
                        "This game requires {} and won't run with the {} you have selected",
                        capability.provides, label
                    ),
                ));
            }
            if provided {
                flags.push(capability.provides.to_string());
            }
        }

        let hash = sha256_hex(image.rom_data());
        log::info!("Validated {} ({}) for {}", label, record.name(), game.name());

        Ok(ValidatedFirmware {
            data: image.rom_data().to_vec(),
            hash,
            flags,
        })
    }

    fn locate(&self, requirement: &FirmwareRequirement, system_id: &str) -> Result<PathBuf, LoadFailure> {
        let path = self
            .store
            .request_path(requirement.system_id, requirement.tag)
            .ok_or_else(|| {
                missing(
                    requirement,
                    system_id,
                    format!("{} not configured", requirement.label),
                )
            })?;

        if !Path::new(&path).is_file() {
            return Err(missing(
                requirement,
                system_id,
                format!("{} not found at {}", requirement.label, path.display()),
            ));
        }
        Ok(path)
    }
}

fn missing(requirement: &FirmwareRequirement, system_id: &str, message: String) -> LoadFailure {
    log::debug!("Firmware {}/{} missing", requirement.system_id, requirement.tag);
    LoadFailure::new(FailureKind::FirmwareMissing, system_id, message)
}
