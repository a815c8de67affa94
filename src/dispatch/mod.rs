//! Dispatch: from bound media to one constructed core

/// Per-call routing configuration
pub mod config;
/// Core construction contract
pub mod core;
/// Linked multi-image descriptors
pub mod linked;
/// Dispatch results
pub mod outcome;
/// System id to core capability tables
pub mod registry;
/// The resolver
pub mod resolver;

pub use self::config::{ConfigFlag, DispatchConfig};
pub use self::core::{
    BuildRequest, Core, CoreBuilder, CoreComm, CoreContent, CoreError, CoreKind, DryRunBuilder,
    LinkedAsset, NoSettings, PlannedCore, SettingsMap, SettingsProvider,
};
pub use self::linked::LinkedDescriptor;
pub use self::outcome::{
    CorePlan, DispatchOutcome, FailureKind, LoadFailure, LoadedGame, Resolution,
};
pub use self::registry::{
    Availability, ContentKind, CoreRegistry, CoreVariant, Lane, RegistryEntry, RequiredInputs,
    Variants,
};
pub use self::resolver::{ArchiveChooser, LoadErrorObserver, Resolver};
