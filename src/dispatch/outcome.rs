//! Results of a dispatch

use crate::dispatch::config::DispatchConfig;
use crate::dispatch::core::{Core, CoreKind};
use crate::game::{GameRecord, RomImage, SystemRelabel};
use std::fmt;
use thiserror::Error;

/// Reason a dispatch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Media missing or could not be bound
    BindingError,
    /// Content not recognized, or no composite builder for it
    UnsupportedFormat,
    /// Required firmware not configured or not readable
    FirmwareMissing,
    /// Firmware is a known bad dump
    FirmwareInvalid,
    /// Firmware not in the database
    FirmwareUnrecognized,
    /// Firmware is not a BIOS image
    FirmwareWrongKind,
    /// Firmware tier too low for the content
    FirmwareIncompatible,
    /// A core builder failed
    CoreConstructionFailure,
    /// Recognized content with no usable core
    NoCoreMatched,
    /// Archive has several candidate members and none was chosen
    ArchiveAmbiguous,
}

impl FailureKind {
    /// Check whether this failure came from the firmware pipeline
    pub fn is_firmware(&self) -> bool {
        matches!(
            self,
            FailureKind::FirmwareMissing
                | FailureKind::FirmwareInvalid
                | FailureKind::FirmwareUnrecognized
                | FailureKind::FirmwareWrongKind
                | FailureKind::FirmwareIncompatible
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A dispatch failure: kind, attempted system id and message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} ({system_id}): {message}")]
pub struct LoadFailure {
    /// What went wrong
    pub kind: FailureKind,
    /// System id being loaded when the failure occurred (may be empty)
    pub system_id: String,
    /// Human-readable explanation
    pub message: String,
}

impl LoadFailure {
    /// Create a failure
    pub fn new<S: Into<String>, M: Into<String>>(kind: FailureKind, system_id: S, message: M) -> Self {
        LoadFailure {
            kind,
            system_id: system_id.into(),
            message: message.into(),
        }
    }
}

/// What was chosen to run the content
#[derive(Debug, Clone, PartialEq)]
pub struct CorePlan {
    /// System id the core was built for
    pub system_id: String,
    /// Core variant
    pub core: CoreKind,
    /// Auxiliary byte buffers handed to the core (firmware images)
    pub firmware: Vec<Vec<u8>>,
    /// Settings object handed to the core
    pub settings: Option<serde_json::Value>,
    /// Sync settings object handed to the core
    pub sync_settings: Option<serde_json::Value>,
}

/// A successfully dispatched game
#[derive(Debug)]
pub struct LoadedGame {
    /// The construction plan
    pub plan: CorePlan,
    /// The constructed core
    pub core: Box<dyn Core>,
    /// Final identity record
    pub record: GameRecord,
    /// ROM image, for cartridge content
    pub rom: Option<RomImage>,
    /// Canonical path of the content
    pub canonical_path: String,
}

impl LoadedGame {
    /// Get the core's status details, if it reports any
    pub fn status_details(&self) -> Option<String> {
        self.core.status_details()
    }
}

/// Either a loaded game or a failure, never both
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Content loaded
    Loaded(Box<LoadedGame>),
    /// Content could not be loaded
    Failed(LoadFailure),
}

/// Everything a resolve call hands back
#[derive(Debug)]
pub struct Resolution {
    /// Result of the dispatch
    pub outcome: DispatchOutcome,
    /// Configuration to persist; differs from the input only after a flag reset
    pub config: DispatchConfig,
    /// System id change made while routing, if any
    pub relabel: Option<SystemRelabel>,
    /// Canonical path of the bound media, set even on failure once bound
    pub canonical_path: Option<String>,
}

impl Resolution {
    /// Check whether a core was constructed
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, DispatchOutcome::Loaded(_))
    }

    /// Get the failure, if any
    pub fn failure(&self) -> Option<&LoadFailure> {
        match &self.outcome {
            DispatchOutcome::Failed(failure) => Some(failure),
            DispatchOutcome::Loaded(_) => None,
        }
    }

    /// Get the loaded game, if any
    pub fn loaded(&self) -> Option<&LoadedGame> {
        match &self.outcome {
            DispatchOutcome::Loaded(game) => Some(game.as_ref()),
            DispatchOutcome::Failed(_) => None,
        }
    }

    /// Take the loaded game, if any
    pub fn into_loaded(self) -> Option<LoadedGame> {
        match self.outcome {
            DispatchOutcome::Loaded(game) => Some(*game),
            DispatchOutcome::Failed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display() {
        let failure = LoadFailure::new(FailureKind::FirmwareMissing, "PCECD", "System card not found");
        assert_eq!(
            failure.to_string(),
            "FirmwareMissing (PCECD): System card not found"
        );
        assert!(failure.kind.is_firmware());
        assert!(!FailureKind::NoCoreMatched.is_firmware());
    }

    #[test]
    fn test_failed_resolution() {
        let resolution = Resolution {
            outcome: DispatchOutcome::Failed(LoadFailure::new(FailureKind::BindingError, "", "missing")),
            config: DispatchConfig::default(),
            relabel: None,
            canonical_path: None,
        };
        assert!(!resolution.is_success());
        assert!(resolution.loaded().is_none());
        assert_eq!(resolution.failure().map(|f| f.kind), Some(FailureKind::BindingError));
    }
}
