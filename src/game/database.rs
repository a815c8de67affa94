//! Game identity database contract and an in-memory implementation

use crate::error::Result;
use crate::game::record::GameRecord;
use crate::game::rom::RomImage;
use crate::game::sniff;
use std::collections::HashMap;
use std::path::Path;

/// Lookup of game records by content hash
pub trait GameDatabase {
    /// Look up a record by hash key
    fn lookup_by_hash(&self, hash: &str) -> Option<GameRecord>;

    /// Look up a ROM image by any of its hashes
    fn lookup_image(&self, rom: &RomImage) -> Option<GameRecord> {
        rom.hashes()
            .iter()
            .find_map(|hash| self.lookup_by_hash(hash))
    }

    /// Resolve a ROM image to a record, identifying it from content on a miss
    ///
    /// The returned record has an empty system id if nothing matched.
    fn lookup_rom(&self, rom: &RomImage) -> GameRecord {
        if let Some(record) = self.lookup_image(rom) {
            log::debug!("Database hit for {}: {}", rom.name(), record);
            return record;
        }

        let hashes = rom.hashes();
        let hash = hashes.first().cloned().unwrap_or_default();
        let system = sniff::identify_system(rom.file_data(), rom.extension()).unwrap_or("");
        log::debug!("Database miss for {}; identified as {:?}", rom.name(), system);

        GameRecord::new(system, rom.name()).with_hash(hash)
    }

    /// Resolve raw bytes to a record, naming it after `fallback_name` on a miss
    fn lookup_by_content(&self, data: &[u8], fallback_name: &str) -> GameRecord {
        let (stem, extension) = split_name(fallback_name);
        self.lookup_rom(&RomImage::new(stem, extension, data.to_vec()))
    }
}

fn split_name(name: &str) -> (&str, &str) {
    let file = name.rsplit(['/', '\\', '|']).next().unwrap_or(name);
    match file.rfind('.') {
        Some(dot) if dot > 0 => (&file[..dot], &file[dot + 1..]),
        _ => (file, ""),
    }
}

/// Hash-keyed records held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryGameDatabase {
    records: HashMap<String, GameRecord>,
}

impl MemoryGameDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record under a hash key
    pub fn insert<S: AsRef<str>>(&mut self, hash: S, record: GameRecord) {
        let key = hash.as_ref().to_ascii_uppercase();
        self.records.insert(key.clone(), record.with_hash(key));
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with<S: AsRef<str>>(mut self, hash: S, record: GameRecord) -> Self {
        self.insert(hash, record);
        self
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether the database is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Load records from a JSON array; each record's `hash` is its key
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let db = Self::from_json(&content)?;
        log::info!(
            "Loaded {} records from {}",
            db.len(),
            path.as_ref().display()
        );
        Ok(db)
    }

    /// Parse records from a JSON array
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<GameRecord> = serde_json::from_str(json)?;
        let mut db = Self::new();
        for record in records {
            if record.hash().is_empty() {
                log::warn!("Skipping record without hash: {}", record);
                continue;
            }
            let hash = record.hash().to_string();
            db.insert(hash, record);
        }
        Ok(db)
    }
}

impl GameDatabase for MemoryGameDatabase {
    fn lookup_by_hash(&self, hash: &str) -> Option<GameRecord> {
        self.records
            .get(&hash.to_ascii_uppercase())
            .map(|record| record.clone().from_database())
    }
}
