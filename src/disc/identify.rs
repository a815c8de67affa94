//! Disc identity hash and platform detection

use crate::disc::reader::{DiscSectorReader, SectorReader, UserData2048Mode};
use crate::disc::view::SectorView;
use crate::disc::{Disc, USER_DATA_SIZE};
use crate::error::{Result, RomError};
use std::fmt;

/// Number of leading data sectors folded into the identity hash
pub const HASHED_SECTORS: u32 = 26;

/// Sector holding the ISO 9660 primary volume descriptor
pub const PVD_SECTOR: u32 = 16;

/// Structural disc type, listed in detection priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscType {
    /// Sega Saturn
    SegaSaturn,
    /// Sony PlayStation Portable (UMD image)
    SonyPsp,
    /// Sony PlayStation
    SonyPsx,
    /// Sega Mega CD
    MegaCd,
    /// NEC PC Engine CD / TurboGrafx CD
    TurboCd,
    /// Some ISO 9660 filesystem not otherwise recognized
    UnknownCdfs,
    /// Nothing recognized
    UnknownFormat,
}

impl DiscType {
    /// Detection order; earlier entries win
    pub const PRIORITY: [DiscType; 7] = [
        DiscType::SegaSaturn,
        DiscType::SonyPsp,
        DiscType::SonyPsx,
        DiscType::MegaCd,
        DiscType::TurboCd,
        DiscType::UnknownCdfs,
        DiscType::UnknownFormat,
    ];

    /// System id assumed when the database does not know the disc
    ///
    /// Unrecognized discs fall into the PC Engine CD bucket, which is where
    /// discs went before the other types could be detected.
    pub fn default_system_id(&self) -> &'static str {
        match self {
            DiscType::SegaSaturn => "SAT",
            DiscType::SonyPsp => "PSP",
            DiscType::SonyPsx => "PSX",
            DiscType::MegaCd => "GEN",
            DiscType::TurboCd | DiscType::UnknownCdfs | DiscType::UnknownFormat => "PCECD",
        }
    }

    fn matches(&self, probe: &mut Probe) -> bool {
        match self {
            DiscType::SegaSaturn => probe.sector_starts_with(0, b"SEGA SEGASATURN"),
            DiscType::SonyPsp => probe.system_identifier().as_deref() == Some("PSP GAME"),
            DiscType::SonyPsx => probe.system_identifier().as_deref() == Some("PLAYSTATION"),
            DiscType::MegaCd => probe.sector_starts_with(0, b"SEGADISCSYSTEM"),
            DiscType::TurboCd => probe.sector_contains_at(1, 32, b"PC Engine CD-ROM SYSTEM"),
            DiscType::UnknownCdfs => probe.system_identifier().is_some(),
            DiscType::UnknownFormat => true,
        }
    }
}

impl fmt::Display for DiscType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiscType::SegaSaturn => "Sega Saturn",
            DiscType::SonyPsp => "Sony PSP",
            DiscType::SonyPsx => "Sony PlayStation",
            DiscType::MegaCd => "Sega Mega CD",
            DiscType::TurboCd => "PC Engine CD",
            DiscType::UnknownCdfs => "Unknown ISO 9660",
            DiscType::UnknownFormat => "Unknown",
        };
        f.write_str(name)
    }
}

/// Result of [`identify`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscIdentity {
    /// Identity hash, 8 uppercase hex digits
    pub hash: String,
    /// Detected structural type
    pub disc_type: DiscType,
}

/// Reads data-track sectors relative to the first data track
struct Probe {
    reader: DiscSectorReader,
    base: Option<u32>,
    limit: u32,
    pvd: Option<Option<String>>,
}

impl Probe {
    fn new(disc: &Disc) -> Self {
        let (base, limit) = match disc.first_data_track() {
            Some(track) => (Some(track.start_lba), track.length),
            None => (None, 0),
        };
        Probe {
            reader: DiscSectorReader::new(disc).with_policy(UserData2048Mode::InspectSectorMode),
            base,
            limit,
            pvd: None,
        }
    }

    fn sector(&mut self, relative: u32) -> Option<Vec<u8>> {
        let base = self.base?;
        if relative >= self.limit {
            return None;
        }
        let mut buf = vec![0u8; USER_DATA_SIZE as usize];
        match self.reader.read_sector(base + relative, SectorView::Mode1, &mut buf) {
            Ok(()) => Some(buf),
            Err(e) => {
                log::debug!("Probe read of sector {} failed: {}", relative, e);
                None
            }
        }
    }

    fn sector_starts_with(&mut self, relative: u32, magic: &[u8]) -> bool {
        self.sector_contains_at(relative, 0, magic)
    }

    fn sector_contains_at(&mut self, relative: u32, offset: usize, magic: &[u8]) -> bool {
        self.sector(relative)
            .map(|data| data.get(offset..offset + magic.len()) == Some(magic))
            .unwrap_or(false)
    }

    /// System identifier of the primary volume descriptor, if one exists
    fn system_identifier(&mut self) -> Option<String> {
        if self.pvd.is_none() {
            let id = self.sector(PVD_SECTOR).and_then(|data| {
                if data[0] == 1 && &data[1..6] == b"CD001" {
                    Some(String::from_utf8_lossy(&data[8..40]).trim().to_string())
                } else {
                    None
                }
            });
            self.pvd = Some(id);
        }
        self.pvd.clone().flatten()
    }
}

/// Compute the identity hash of a disc
///
/// The hash covers the table of contents and the user data of the first
/// data sectors, so an ISO and an equivalent raw BIN/CUE hash the same.
pub fn disc_hash(disc: &Disc) -> Result<String> {
    let mut hasher = crc32fast::Hasher::new();

    for track in disc.tracks() {
        hasher.update(&[track.number, u8::from(track.kind.is_data())]);
        hasher.update(&track.start_lba.to_le_bytes());
        hasher.update(&track.length.to_le_bytes());
    }
    hasher.update(&disc.leadout_lba().to_le_bytes());

    if let Some(track) = disc.first_data_track() {
        let mut reader = DiscSectorReader::new(disc).with_policy(UserData2048Mode::InspectSectorMode);
        let mut buf = vec![0u8; USER_DATA_SIZE as usize];
        for i in 0..HASHED_SECTORS.min(track.length) {
            reader.read_sector(track.start_lba + i, SectorView::Mode1, &mut buf)?;
            hasher.update(&buf);
        }
    }

    Ok(format!("{:08X}", hasher.finalize()))
}

/// Detect the structural type of a disc
pub fn detect_type(disc: &Disc) -> DiscType {
    let mut probe = Probe::new(disc);
    DiscType::PRIORITY
        .iter()
        .copied()
        .find(|t| t.matches(&mut probe))
        .unwrap_or(DiscType::UnknownFormat)
}

/// Compute the identity hash and structural type of a disc
pub fn identify(disc: &Disc) -> Result<DiscIdentity> {
    if disc.tracks().is_empty() {
        return Err(RomError::invalid_format("Disc has no tracks"));
    }

    let hash = disc_hash(disc)?;
    let disc_type = detect_type(disc);
    log::debug!("Disc {} detected as {}", hash, disc_type);

    Ok(DiscIdentity { hash, disc_type })
}
