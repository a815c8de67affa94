//! Game identification
//!
//! Records, ROM images, content signatures and the database contract used to
//! turn bytes into a [`GameRecord`].

/// Database contract and in-memory database
pub mod database;
/// Game identity records
pub mod record;
/// Cartridge ROM images
pub mod rom;
/// Content signatures and extension mapping
pub mod sniff;

pub use database::{GameDatabase, MemoryGameDatabase};
pub use record::{DumpStatus, GameRecord, SystemRelabel};
pub use rom::RomImage;
