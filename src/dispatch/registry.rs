//! System id to core capability table
//!
//! Each dispatch lane has its own table. An entry says which core (or which
//! config-gated pair of cores) runs a system id, what content form the core
//! takes and which settings and firmware it needs. Builders are registered
//! separately per [`CoreKind`].

use crate::dispatch::config::{ConfigFlag, DispatchConfig};
use crate::dispatch::core::{CoreBuilder, CoreKind, DryRunBuilder};
use crate::firmware::{FirmwareRequirement, PCECD_SYSTEM_CARD, SGB_ROM};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Dispatch path chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lane {
    /// Optical disc images (`iso`, `cue`)
    Disc,
    /// Linked multi-image descriptors (`xml`)
    Compound,
    /// Everything else
    Generic,
}

impl Lane {
    /// All lanes
    pub const ALL: [Lane; 3] = [Lane::Disc, Lane::Compound, Lane::Generic];

    /// Classify a lowercase extension
    pub fn for_extension(extension: &str) -> Lane {
        match extension {
            "iso" | "cue" => Lane::Disc,
            "xml" => Lane::Compound,
            _ => Lane::Generic,
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lane::Disc => write!(f, "disc"),
            Lane::Compound => write!(f, "compound"),
            Lane::Generic => write!(f, "generic"),
        }
    }
}

/// Content form a core consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// ROM payload without headers
    RomData,
    /// Whole file including headers
    FileData,
    /// Disc with random sector access
    Disc,
    /// Disc as a byte stream
    DiscStream,
    /// Canonical path; the core opens the content itself
    Path,
    /// Linked assets
    Linked,
}

/// Auxiliary inputs a core needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredInputs {
    /// Needs its settings object
    pub settings: bool,
    /// Needs its sync settings object
    pub sync_settings: bool,
    /// Needs firmware
    pub firmware: Option<FirmwareRequirement>,
}

impl RequiredInputs {
    /// No auxiliary inputs
    pub const NONE: RequiredInputs = RequiredInputs {
        settings: false,
        sync_settings: false,
        firmware: None,
    };
    /// Settings only
    pub const SETTINGS: RequiredInputs = RequiredInputs {
        settings: true,
        ..Self::NONE
    };
    /// Sync settings only
    pub const SYNC_SETTINGS: RequiredInputs = RequiredInputs {
        sync_settings: true,
        ..Self::NONE
    };
    /// Settings and sync settings
    pub const BOTH: RequiredInputs = RequiredInputs {
        settings: true,
        sync_settings: true,
        firmware: None,
    };

    /// Add a firmware requirement
    pub const fn with_firmware(self, firmware: FirmwareRequirement) -> Self {
        RequiredInputs {
            firmware: Some(firmware),
            ..self
        }
    }
}

/// Build flavours an entry is available in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Every build
    Always,
    /// Only builds with the `interim` feature
    Interim,
}

impl Availability {
    /// Check availability in this build
    pub fn is_available(&self) -> bool {
        match self {
            Availability::Always => true,
            Availability::Interim => cfg!(feature = "interim"),
        }
    }
}

/// System id change applied before a variant is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relabel {
    /// New system id
    pub system_id: &'static str,
    /// Option set on the relabeled record
    pub option: Option<&'static str>,
}

/// One way to run a system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreVariant {
    /// Core to build
    pub core: CoreKind,
    /// Content form it takes
    pub content: ContentKind,
    /// Auxiliary inputs
    pub inputs: RequiredInputs,
    /// Relabel applied first, if any
    pub relabel: Option<Relabel>,
}

impl CoreVariant {
    /// Create a variant with no relabel
    pub const fn new(core: CoreKind, content: ContentKind, inputs: RequiredInputs) -> Self {
        CoreVariant {
            core,
            content,
            inputs,
            relabel: None,
        }
    }

    /// Relabel the record before building
    pub const fn relabeled(mut self, system_id: &'static str, option: Option<&'static str>) -> Self {
        self.relabel = Some(Relabel { system_id, option });
        self
    }
}

/// Core variants of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variants {
    /// One core
    Single(CoreVariant),
    /// Two cores chosen by a config flag
    Gated {
        /// Flag that selects the alternate
        flag: ConfigFlag,
        /// Variant used when the flag is off
        default: CoreVariant,
        /// Variant used when the flag is on
        alternate: CoreVariant,
    },
}

impl Variants {
    /// Pick a variant; the flag is returned when the alternate was chosen
    pub fn select(&self, config: &DispatchConfig) -> (&CoreVariant, Option<ConfigFlag>) {
        match self {
            Variants::Single(variant) => (variant, None),
            Variants::Gated {
                flag,
                default,
                alternate,
            } => {
                if config.get(*flag) {
                    (alternate, Some(*flag))
                } else {
                    (default, None)
                }
            }
        }
    }

    /// Get every core kind referenced
    pub fn cores(&self) -> Vec<CoreKind> {
        match self {
            Variants::Single(variant) => vec![variant.core],
            Variants::Gated {
                default, alternate, ..
            } => vec![default.core, alternate.core],
        }
    }
}

/// Table entry for a system id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Core variants
    pub variants: Variants,
    /// Builds the entry is available in
    pub availability: Availability,
}

impl RegistryEntry {
    /// Entry with one core
    pub const fn single(variant: CoreVariant) -> Self {
        RegistryEntry {
            variants: Variants::Single(variant),
            availability: Availability::Always,
        }
    }

    /// Entry with a config-gated pair
    pub const fn gated(flag: ConfigFlag, default: CoreVariant, alternate: CoreVariant) -> Self {
        RegistryEntry {
            variants: Variants::Gated {
                flag,
                default,
                alternate,
            },
            availability: Availability::Always,
        }
    }

    /// Restrict the entry to interim builds
    pub const fn interim(mut self) -> Self {
        self.availability = Availability::Interim;
        self
    }
}

/// Capability tables and core builders
#[derive(Default)]
pub struct CoreRegistry {
    tables: HashMap<Lane, BTreeMap<String, RegistryEntry>>,
    builders: HashMap<CoreKind, Box<dyn CoreBuilder>>,
}

impl fmt::Debug for CoreRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builders: Vec<_> = self.builders.keys().collect();
        builders.sort();
        f.debug_struct("CoreRegistry")
            .field("tables", &self.tables)
            .field("builders", &builders)
            .finish()
    }
}

impl CoreRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the standard tables, with no builders registered
    pub fn standard() -> Self {
        use ContentKind::*;
        use CoreKind::*;
        use RequiredInputs as In;

        let mut registry = Self::new();

        let generic: &[(&[&str], RegistryEntry)] = &[
            (&["SNES"], RegistryEntry::single(CoreVariant::new(Libsnes, FileData, In::BOTH))),
            (&["SMS", "SG", "GG"], RegistryEntry::single(CoreVariant::new(Sms, RomData, In::BOTH))),
            (&["A26"], RegistryEntry::single(CoreVariant::new(Atari2600, FileData, In::BOTH))),
            (
                &["PCE", "PCECD", "SGX"],
                RegistryEntry::single(CoreVariant::new(PcEngine, RomData, In::SETTINGS)),
            ),
            (&["GEN"], RegistryEntry::single(CoreVariant::new(Gpgx, RomData, In::SYNC_SETTINGS))),
            (&["TI83"], RegistryEntry::single(CoreVariant::new(Ti83, RomData, In::NONE))),
            (
                &["NES"],
                RegistryEntry::gated(
                    ConfigFlag::NesInQuickNes,
                    CoreVariant::new(Nes, FileData, In::BOTH),
                    CoreVariant::new(QuickNes, FileData, In::SETTINGS),
                ),
            ),
            (
                &["GB", "GBC"],
                RegistryEntry::gated(
                    ConfigFlag::GbAsSgb,
                    CoreVariant::new(Gambatte, FileData, In::BOTH),
                    CoreVariant::new(Libsnes, FileData, In::BOTH.with_firmware(SGB_ROM))
                        .relabeled("SNES", Some("SGB")),
                ),
            ),
            (
                &["Coleco"],
                RegistryEntry::single(CoreVariant::new(ColecoVision, RomData, In::SYNC_SETTINGS)),
            ),
            (&["INTV"], RegistryEntry::single(CoreVariant::new(Intellivision, RomData, In::NONE))),
            (&["A78"], RegistryEntry::single(CoreVariant::new(Atari7800, RomData, In::NONE))),
            (&["C64"], RegistryEntry::single(CoreVariant::new(C64, RomData, In::NONE))),
            (&["GBA"], RegistryEntry::single(CoreVariant::new(Gba, RomData, In::NONE)).interim()),
            (&["N64"], RegistryEntry::single(CoreVariant::new(N64, RomData, In::SYNC_SETTINGS))),
            (
                &["DEBUG"],
                RegistryEntry::single(CoreVariant::new(LibretroDebug, RomData, In::NONE)).interim(),
            ),
        ];

        let disc: &[(&[&str], RegistryEntry)] = &[
            (&["GEN"], RegistryEntry::single(CoreVariant::new(Gpgx, Disc, In::SETTINGS))),
            (&["SAT"], RegistryEntry::single(CoreVariant::new(Yabause, DiscStream, In::SYNC_SETTINGS))),
            (&["PSP"], RegistryEntry::single(CoreVariant::new(Psp, Path, In::NONE))),
            (&["PSX"], RegistryEntry::single(CoreVariant::new(Octoshock, Path, In::NONE))),
            (
                &["PCE", "PCECD"],
                RegistryEntry::single(CoreVariant::new(
                    PcEngine,
                    Disc,
                    In::SETTINGS.with_firmware(PCECD_SYSTEM_CARD),
                )),
            ),
        ];

        let compound: &[(&[&str], RegistryEntry)] = &[(
            &["DGB"],
            RegistryEntry::single(CoreVariant::new(GambatteLink, Linked, In::BOTH)),
        )];

        for (lane, table) in [(Lane::Generic, generic), (Lane::Disc, disc), (Lane::Compound, compound)] {
            for (ids, entry) in table {
                for id in ids.iter() {
                    registry.register(lane, id, *entry);
                }
            }
        }

        registry
    }

    /// Add or replace a table entry
    pub fn register(&mut self, lane: Lane, system_id: &str, entry: RegistryEntry) {
        self.tables
            .entry(lane)
            .or_default()
            .insert(system_id.to_string(), entry);
    }

    /// Register the builder for a core
    pub fn register_builder<B: CoreBuilder + 'static>(&mut self, core: CoreKind, builder: B) {
        self.builders.insert(core, Box::new(builder));
    }

    /// Builder-style [`register_builder`](Self::register_builder)
    pub fn with_builder<B: CoreBuilder + 'static>(mut self, core: CoreKind, builder: B) -> Self {
        self.register_builder(core, builder);
        self
    }

    /// Register [`DryRunBuilder`] for every core in the tables that has no builder yet
    pub fn with_dry_run_builders(mut self) -> Self {
        let cores: Vec<CoreKind> = self
            .tables
            .values()
            .flat_map(|table| table.values())
            .flat_map(|entry| entry.variants.cores())
            .collect();

        for core in cores {
            self.builders
                .entry(core)
                .or_insert_with(|| Box::new(DryRunBuilder) as Box<dyn CoreBuilder>);
        }
        self
    }

    /// Get the entry for a system id in a lane
    pub fn entry(&self, lane: Lane, system_id: &str) -> Option<&RegistryEntry> {
        self.tables.get(&lane)?.get(system_id)
    }

    /// Get the builder for a core
    pub fn builder(&self, core: CoreKind) -> Option<&dyn CoreBuilder> {
        self.builders.get(&core).map(|b| &**b)
    }

    /// Check whether any lane has an entry for a system id
    pub fn knows(&self, system_id: &str) -> bool {
        self.tables.values().any(|table| table.contains_key(system_id))
    }

    /// List the system ids of a lane, sorted
    pub fn system_ids(&self, lane: Lane) -> Vec<&str> {
        self.tables
            .get(&lane)
            .map(|table| table.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_for_extension() {
        assert_eq!(Lane::for_extension("iso"), Lane::Disc);
        assert_eq!(Lane::for_extension("cue"), Lane::Disc);
        assert_eq!(Lane::for_extension("xml"), Lane::Compound);
        assert_eq!(Lane::for_extension("nes"), Lane::Generic);
        assert_eq!(Lane::for_extension("weird"), Lane::Generic);
    }

    #[test]
    fn test_gated_selection() {
        let registry = CoreRegistry::standard();
        let entry = registry.entry(Lane::Generic, "NES").unwrap();

        let (variant, flag) = entry.variants.select(&DispatchConfig::default());
        assert_eq!(variant.core, CoreKind::Nes);
        assert_eq!(flag, None);

        let config = DispatchConfig::default().with(ConfigFlag::NesInQuickNes, true);
        let (variant, flag) = entry.variants.select(&config);
        assert_eq!(variant.core, CoreKind::QuickNes);
        assert_eq!(flag, Some(ConfigFlag::NesInQuickNes));
    }

    #[test]
    fn test_sgb_variant_relabels_and_needs_firmware() {
        let registry = CoreRegistry::standard();
        let config = DispatchConfig::default().with(ConfigFlag::GbAsSgb, true);
        let (variant, _) = registry
            .entry(Lane::Generic, "GBC")
            .unwrap()
            .variants
            .select(&config);

        assert_eq!(variant.core, CoreKind::Libsnes);
        assert_eq!(variant.relabel.unwrap().system_id, "SNES");
        assert_eq!(variant.inputs.firmware, Some(SGB_ROM));
    }

    #[test]
    fn test_lanes_are_separate() {
        let registry = CoreRegistry::standard();
        assert_eq!(
            registry.entry(Lane::Disc, "PCECD").unwrap().variants.cores(),
            vec![CoreKind::PcEngine]
        );
        assert!(registry.entry(Lane::Disc, "NES").is_none());
        assert!(registry.entry(Lane::Compound, "DGB").is_some());
        assert!(registry.knows("DGB"));
        assert!(!registry.knows("XYZ"));
    }

    #[test]
    fn test_interim_entries() {
        let registry = CoreRegistry::standard();
        let gba = registry.entry(Lane::Generic, "GBA").unwrap();
        assert_eq!(gba.availability, Availability::Interim);
        assert_eq!(gba.availability.is_available(), cfg!(feature = "interim"));
    }

    #[test]
    fn test_dry_run_builders_cover_table() {
        let registry = CoreRegistry::standard().with_dry_run_builders();
        for core in [CoreKind::Nes, CoreKind::QuickNes, CoreKind::GambatteLink, CoreKind::Yabause] {
            assert!(registry.builder(core).is_some(), "{} has no builder", core);
        }
        assert!(CoreRegistry::standard().builder(CoreKind::Nes).is_none());
    }
}
