//! Media to core resolution
//!
//! [`Resolver::resolve`] binds the media, classifies it by extension into a
//! [`Lane`], identifies the content and builds exactly one core, or reports
//! exactly one [`LoadFailure`].

use crate::disc::{identify, Disc, DiscSectorReader, DiscStream, SectorView};
use crate::dispatch::config::{ConfigFlag, DispatchConfig};
use crate::dispatch::core::{
    BuildRequest, CoreComm, CoreContent, CoreKind, LinkedAsset, NoSettings, SettingsProvider,
};
use crate::dispatch::linked::LinkedDescriptor;
use crate::dispatch::outcome::{
    CorePlan, DispatchOutcome, FailureKind, LoadFailure, LoadedGame, Resolution,
};
use crate::dispatch::registry::{ContentKind, CoreRegistry, Lane, RegistryEntry};
use crate::error::RomError;
use crate::firmware::{FirmwareStore, FirmwareValidator, MapFirmwareStore};
use crate::game::sniff::{DESCRIPTOR_EXTENSIONS, ROM_EXTENSIONS};
use crate::game::{GameDatabase, GameRecord, RomImage, SystemRelabel};
use crate::media::MediaSource;
use std::path::Path;

/// Picks an archive member when binding is ambiguous; `None` aborts the load
pub type ArchiveChooser = Box<dyn Fn(&MediaSource) -> Option<usize>>;

/// Receives every reported load failure
pub type LoadErrorObserver = Box<dyn Fn(&LoadFailure)>;

/// Content as produced by a lane, before it is shaped for a core
enum LaneInput<'a> {
    Rom(&'a RomImage),
    Disc(&'a Disc),
    Linked(&'a [LinkedAsset]),
}

impl LaneInput<'_> {
    fn lane(&self) -> Lane {
        match self {
            LaneInput::Rom(_) => Lane::Generic,
            LaneInput::Disc(_) => Lane::Disc,
            LaneInput::Linked(_) => Lane::Compound,
        }
    }
}

/// State carried through one resolve call
#[derive(Debug)]
struct Attempt {
    config: DispatchConfig,
    relabel: Option<SystemRelabel>,
    canonical_path: Option<String>,
    directory: std::path::PathBuf,
    extension: String,
}

/// Resolves media to a constructed core
pub struct Resolver {
    registry: CoreRegistry,
    database: Box<dyn GameDatabase>,
    firmware: Box<dyn FirmwareStore>,
    settings: Box<dyn SettingsProvider>,
    chooser: Option<ArchiveChooser>,
    observers: Vec<LoadErrorObserver>,
}

impl Resolver {
    /// Create a resolver with no firmware configured and default settings
    pub fn new<D: GameDatabase + 'static>(registry: CoreRegistry, database: D) -> Self {
        Resolver {
            registry,
            database: Box::new(database),
            firmware: Box::new(MapFirmwareStore::new()),
            settings: Box::new(NoSettings),
            chooser: None,
            observers: Vec::new(),
        }
    }

    /// Use a firmware store
    pub fn with_firmware_store<F: FirmwareStore + 'static>(mut self, store: F) -> Self {
        self.firmware = Box::new(store);
        self
    }

    /// Use a settings provider
    pub fn with_settings<S: SettingsProvider + 'static>(mut self, settings: S) -> Self {
        self.settings = Box::new(settings);
        self
    }

    /// Use an archive member chooser
    pub fn with_archive_chooser<C>(mut self, chooser: C) -> Self
    where
        C: Fn(&MediaSource) -> Option<usize> + 'static,
    {
        self.chooser = Some(Box::new(chooser));
        self
    }

    /// Register an observer for load failures
    pub fn on_load_error<O>(&mut self, observer: O)
    where
        O: Fn(&LoadFailure) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Get the registry
    pub fn registry(&self) -> &CoreRegistry {
        &self.registry
    }

    /// Get the game database
    pub fn database(&self) -> &dyn GameDatabase {
        self.database.as_ref()
    }

    /// Open a path and resolve it
    pub fn load_path<P: AsRef<Path>>(&self, path: P, config: DispatchConfig) -> Resolution {
        match MediaSource::open(path.as_ref()) {
            Ok(source) => self.resolve(source, config),
            Err(e) => {
                let failure = LoadFailure::new(FailureKind::BindingError, "", e.to_string());
                self.report(&failure);
                Resolution {
                    outcome: DispatchOutcome::Failed(failure),
                    config,
                    relabel: None,
                    canonical_path: None,
                }
            }
        }
    }

    /// Resolve media to a core
    ///
    /// The source is consumed and dropped before this returns. The returned
    /// config differs from `config` only when a gated alternate core failed
    /// and its flag was reset.
    pub fn resolve(&self, mut source: MediaSource, config: DispatchConfig) -> Resolution {
        let mut attempt = Attempt {
            config,
            relabel: None,
            canonical_path: None,
            directory: source.directory(),
            extension: String::new(),
        };

        let outcome = match self.dispatch(&mut source, &mut attempt) {
            Ok(game) => DispatchOutcome::Loaded(Box::new(game)),
            Err(failure) => {
                self.report(&failure);
                DispatchOutcome::Failed(failure)
            }
        };

        Resolution {
            outcome,
            config: attempt.config,
            relabel: attempt.relabel,
            canonical_path: attempt.canonical_path,
        }
    }

    fn report(&self, failure: &LoadFailure) {
        log::warn!("Load failed: {}", failure);
        for observer in &self.observers {
            observer(failure);
        }
    }

    fn dispatch(&self, source: &mut MediaSource, attempt: &mut Attempt) -> Result<LoadedGame, LoadFailure> {
        self.bind(source)?;
        attempt.canonical_path = Some(source.canonical_full_path());
        attempt.extension = source.extension();

        let lane = Lane::for_extension(&attempt.extension);
        log::debug!("{} goes to the {} lane", source.canonical_full_path(), lane);

        match lane {
            Lane::Disc => self.disc_lane(source, attempt),
            Lane::Compound => self.compound_lane(source, attempt),
            Lane::Generic => self.generic_lane(source, attempt),
        }
    }

    fn bind(&self, source: &mut MediaSource) -> Result<(), LoadFailure> {
        if !source.exists() {
            return Err(LoadFailure::new(
                FailureKind::BindingError,
                "",
                format!("File not found: {}", source.path().display()),
            ));
        }

        if !source.is_bound() && !source.bind_sole_item_of(DESCRIPTOR_EXTENSIONS) {
            source.bind_sole_item_of(ROM_EXTENSIONS);
        }

        if source.is_archive() && !source.is_bound() {
            let choice = self.chooser.as_ref().and_then(|choose| choose(&*source));
            match choice {
                Some(index) => source
                    .bind_member(index)
                    .map_err(|e| LoadFailure::new(FailureKind::BindingError, "", e.to_string()))?,
                None => {
                    return Err(LoadFailure::new(
                        FailureKind::ArchiveAmbiguous,
                        "",
                        format!(
                            "No member of {} was chosen ({} candidates)",
                            source.path().display(),
                            source.members().len()
                        ),
                    ))
                }
            }
        }

        Ok(())
    }

    fn generic_lane(&self, source: &MediaSource, attempt: &mut Attempt) -> Result<LoadedGame, LoadFailure> {
        let data = source.read_bound().map_err(binding_failure)?;
        let rom = RomImage::new(file_stem(&source.name()), &attempt.extension, data);
        let record = self.database.lookup_rom(&rom);

        if !record.is_resolved() {
            return Err(LoadFailure::new(
                FailureKind::UnsupportedFormat,
                "",
                format!("{} is not a recognized format", source.name()),
            ));
        }

        let entry = self.entry_for(Lane::Generic, record.system_id())?;
        let mut game = self.construct(entry, record, LaneInput::Rom(&rom), attempt)?;
        game.rom = Some(rom);
        Ok(game)
    }

    fn disc_lane(&self, source: &MediaSource, attempt: &mut Attempt) -> Result<LoadedGame, LoadFailure> {
        let disc = open_disc(source, &attempt.extension).map_err(disc_failure)?;
        let identity = identify(&disc).map_err(disc_failure)?;

        let record = match self.database.lookup_by_hash(&identity.hash) {
            Some(record) => record,
            None => {
                let system_id = identity.disc_type.default_system_id();
                log::debug!(
                    "Disc {} not in database; {} defaults to {}",
                    identity.hash,
                    identity.disc_type,
                    system_id
                );
                GameRecord::new(system_id, file_stem(&source.name())).with_hash(identity.hash)
            }
        };

        let entry = self.entry_for(Lane::Disc, record.system_id())?;
        self.construct(entry, record, LaneInput::Disc(&disc), attempt)
    }

    fn compound_lane(&self, source: &MediaSource, attempt: &mut Attempt) -> Result<LoadedGame, LoadFailure> {
        let text = source.read_bound().map_err(descriptor_failure)?;
        let descriptor =
            LinkedDescriptor::parse(&String::from_utf8_lossy(&text)).map_err(descriptor_failure)?;

        let mut assets = Vec::with_capacity(descriptor.assets.len());
        for slot in &descriptor.assets {
            let data = source.read_sibling(&slot.file_name).map_err(descriptor_failure)?;
            let record = self.database.lookup_by_content(&data, &slot.file_name);
            log::debug!("Linked slot {}: {}", slot.slot, record);
            assets.push(LinkedAsset {
                slot: slot.slot.clone(),
                record,
                data,
            });
        }

        let record = GameRecord::new(descriptor.system_id.as_str(), descriptor.name.as_str());
        let entry = self.registry.entry(Lane::Compound, record.system_id()).ok_or_else(|| {
            LoadFailure::new(
                FailureKind::UnsupportedFormat,
                record.system_id(),
                format!("No linked core for system {}", record.system_id()),
            )
        })?;

        self.construct(entry, record, LaneInput::Linked(&assets), attempt)
    }

    /// Find a lane entry; unknown ids are unsupported, known ones are unmatched
    fn entry_for(&self, lane: Lane, system_id: &str) -> Result<&RegistryEntry, LoadFailure> {
        match self.registry.entry(lane, system_id) {
            Some(entry) => Ok(entry),
            None if self.registry.knows(system_id) => Err(LoadFailure::new(
                FailureKind::NoCoreMatched,
                system_id,
                format!("No {} core handles system {}", lane, system_id),
            )),
            None => Err(LoadFailure::new(
                FailureKind::UnsupportedFormat,
                system_id,
                format!("Unsupported system {}", system_id),
            )),
        }
    }

    fn construct(
        &self,
        entry: &RegistryEntry,
        record: GameRecord,
        input: LaneInput<'_>,
        attempt: &mut Attempt,
    ) -> Result<LoadedGame, LoadFailure> {
        let system_id = record.system_id().to_string();

        if !entry.availability.is_available() {
            return Err(LoadFailure::new(
                FailureKind::NoCoreMatched,
                system_id.as_str(),
                format!("{} is only available in interim builds", system_id),
            ));
        }

        let (variant, gate) = entry.variants.select(&attempt.config);
        let builder = self.registry.builder(variant.core).ok_or_else(|| {
            LoadFailure::new(
                FailureKind::NoCoreMatched,
                system_id.as_str(),
                format!("No builder registered for {}", variant.core),
            )
        })?;

        let mut record = match variant.relabel {
            Some(relabel) => {
                let (relabeled, audit) = record.relabeled(relabel.system_id, relabel.option);
                log::info!("Routing {} content as {}", audit.from, audit.to);
                attempt.relabel = Some(audit);
                relabeled
            }
            None => record,
        };

        let mut firmware = Vec::new();
        if let Some(requirement) = variant.inputs.firmware {
            let validator = FirmwareValidator::new(self.firmware.as_ref(), self.database.as_ref());
            let fetched = if requirement.validate {
                match validator.validate(&requirement, &record) {
                    Ok(validated) => {
                        record = validated.apply_to(&record);
                        Ok(validated.data)
                    }
                    Err(failure) => Err(failure),
                }
            } else {
                validator.fetch(&requirement, &system_id)
            };

            match fetched {
                Ok(data) => firmware.push(data),
                Err(failure) => return Err(reset_on_failure(gate, variant.core, failure, attempt)),
            }
        }

        let settings = if variant.inputs.settings {
            self.settings.settings(variant.core)
        } else {
            None
        };
        let sync_settings = if variant.inputs.sync_settings {
            self.settings.sync_settings(variant.core)
        } else {
            None
        };

        let canonical_path = attempt.canonical_path.clone().unwrap_or_default();
        let comm = CoreComm {
            canonical_path: canonical_path.clone(),
            subfile_directory: (variant.core == CoreKind::Libsnes).then(|| attempt.directory.clone()),
            deterministic: attempt.config.deterministic,
        };

        let content = match (variant.content, &input) {
            (ContentKind::RomData, LaneInput::Rom(rom)) => CoreContent::RomData(rom.rom_data()),
            (ContentKind::FileData, LaneInput::Rom(rom)) => CoreContent::FileData(rom.file_data()),
            (ContentKind::Disc, LaneInput::Disc(disc)) => CoreContent::Disc(disc),
            (ContentKind::DiscStream, LaneInput::Disc(disc)) => {
                let stream = DiscStream::new(DiscSectorReader::new(disc), SectorView::Mode1, 0)
                    .map_err(|e| {
                        LoadFailure::new(FailureKind::CoreConstructionFailure, system_id.as_str(), e.to_string())
                    })?;
                CoreContent::DiscStream(stream)
            }
            (ContentKind::Path, LaneInput::Rom(_) | LaneInput::Disc(_)) => {
                CoreContent::Path(canonical_path.as_str())
            }
            (ContentKind::Linked, LaneInput::Linked(assets)) => CoreContent::Linked(assets),
            (kind, input) => {
                return Err(LoadFailure::new(
                    FailureKind::NoCoreMatched,
                    system_id.as_str(),
                    format!("{} cannot take {:?} content from the {} lane", variant.core, kind, input.lane()),
                ))
            }
        };

        let request = BuildRequest {
            core: variant.core,
            system_id: record.system_id(),
            record: &record,
            content,
            extension: &attempt.extension,
            settings: settings.as_ref(),
            sync_settings: sync_settings.as_ref(),
            firmware: &firmware,
        };

        let core = match builder.build(&comm, request) {
            Ok(core) => core,
            Err(e) => {
                let failure = LoadFailure::new(
                    FailureKind::CoreConstructionFailure,
                    system_id.as_str(),
                    e.to_string(),
                );
                return Err(reset_on_failure(gate, variant.core, failure, attempt));
            }
        };

        log::info!("Loaded {} on {}", record, variant.core);

        Ok(LoadedGame {
            plan: CorePlan {
                system_id: record.system_id().to_string(),
                core: variant.core,
                firmware,
                settings,
                sync_settings,
            },
            core,
            record,
            rom: None,
            canonical_path,
        })
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("registry", &self.registry)
            .field("chooser", &self.chooser.is_some())
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Turn a failure of a gated alternate core into a construction failure and
/// switch the alternate off in the returned config. Nothing is retried.
fn reset_on_failure(
    gate: Option<ConfigFlag>,
    core: CoreKind,
    failure: LoadFailure,
    attempt: &mut Attempt,
) -> LoadFailure {
    let Some(flag) = gate else {
        return failure;
    };

    attempt.config.reset(flag);
    log::info!("Disabling {} after {} failed", flag, core);

    let message = format!(
        "Failed to load {} content on {}: {}. Disabling {}.",
        failure.system_id, core, failure.message, flag
    );
    LoadFailure::new(FailureKind::CoreConstructionFailure, failure.system_id, message)
}

fn open_disc(source: &MediaSource, extension: &str) -> crate::error::Result<Disc> {
    match (extension, source.file_path()) {
        ("iso", Some(path)) => Disc::from_iso_path(path),
        ("iso", None) => Disc::from_iso_bytes(source.read_bound()?),
        _ => {
            let text = source.read_bound()?;
            Disc::from_cue(&String::from_utf8_lossy(&text), |name| source.sibling_blob(name))
        }
    }
}

fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

fn binding_failure(err: RomError) -> LoadFailure {
    LoadFailure::new(FailureKind::BindingError, "", err.to_string())
}

fn disc_failure(err: RomError) -> LoadFailure {
    match err {
        RomError::FileNotFound(_) | RomError::Io(_) => binding_failure(err),
        other => LoadFailure::new(FailureKind::UnsupportedFormat, "", other.to_string()),
    }
}

fn descriptor_failure(err: RomError) -> LoadFailure {
    LoadFailure::new(FailureKind::UnsupportedFormat, "", err.to_string())
}
