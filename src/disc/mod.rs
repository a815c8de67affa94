//! Optical disc images
//!
//! A [`Disc`] is a table of contents (tracks with their kind and start LBA)
//! over one or more backing blobs. Discs are loaded from `.iso` images or from
//! `.cue` sheets that reference `.bin` files.

/// CUE sheet parsing
pub mod cue;
/// Content hash and disc type detection
pub mod identify;
/// Sector reader over a disc
pub mod reader;
/// Seekable byte stream over a disc
pub mod stream;
/// Logical sector views
pub mod view;

pub use cue::{CueFile, CueSheet, CueTrack};
pub use identify::{identify, DiscIdentity, DiscType};
pub use reader::{DiscSectorReader, SectorReader, UserData2048Mode};
pub use stream::{DiscStream, SectorCache};
pub use view::{DiscSectorView, SectorView};

use crate::error::{Result, RomError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Size of a raw CD sector (sync + header + user data + EDC/ECC)
pub const RAW_SECTOR_SIZE: u32 = 2352;

/// Size of the user data area of a Mode 1 or Mode 2 Form 1 sector
pub const USER_DATA_SIZE: u32 = 2048;

/// Backing storage for one image file
#[derive(Debug, Clone)]
pub enum Blob {
    /// File on disk, opened lazily by readers
    File(PathBuf),
    /// Bytes already in memory (archive members, tests)
    Memory(Arc<[u8]>),
}

impl Blob {
    /// Create an in-memory blob
    pub fn memory(data: Vec<u8>) -> Self {
        Blob::Memory(data.into())
    }

    /// Get the length of the blob in bytes
    pub fn len(&self) -> Result<u64> {
        match self {
            Blob::File(path) => Ok(std::fs::metadata(path)?.len()),
            Blob::Memory(data) => Ok(data.len() as u64),
        }
    }
}

/// Sector encoding of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    /// Red Book audio, 2352 bytes per sector
    Audio,
    /// Mode 1 user data only (ISO images), 2048 bytes per sector
    Mode1Cooked,
    /// Raw Mode 1 sectors, 2352 bytes per sector
    Mode1Raw,
    /// Raw Mode 2 sectors (XA), 2352 bytes per sector
    Mode2Raw,
}

impl TrackKind {
    /// Get the number of bytes each sector occupies in the backing blob
    pub fn stored_sector_size(&self) -> u32 {
        match self {
            TrackKind::Mode1Cooked => USER_DATA_SIZE,
            TrackKind::Audio | TrackKind::Mode1Raw | TrackKind::Mode2Raw => RAW_SECTOR_SIZE,
        }
    }

    /// Check whether this track carries data sectors
    pub fn is_data(&self) -> bool {
        !matches!(self, TrackKind::Audio)
    }

    /// Get the CUE sheet keyword for this kind
    pub fn name(&self) -> &'static str {
        match self {
            TrackKind::Audio => "AUDIO",
            TrackKind::Mode1Cooked => "MODE1/2048",
            TrackKind::Mode1Raw => "MODE1/2352",
            TrackKind::Mode2Raw => "MODE2/2352",
        }
    }

    /// Parse a CUE sheet track mode keyword
    pub fn from_cue_mode(mode: &str) -> Option<Self> {
        match mode.to_ascii_uppercase().as_str() {
            "AUDIO" => Some(TrackKind::Audio),
            "MODE1/2048" => Some(TrackKind::Mode1Cooked),
            "MODE1/2352" => Some(TrackKind::Mode1Raw),
            "MODE2/2352" => Some(TrackKind::Mode2Raw),
            _ => None,
        }
    }
}

/// A track in the disc's table of contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Track number (1-99)
    pub number: u8,
    /// Sector encoding
    pub kind: TrackKind,
    /// First sector of the track (INDEX 01)
    pub start_lba: u32,
    /// Number of sectors in the track
    pub length: u32,
    /// Index of the backing blob
    pub(crate) blob: usize,
    /// Byte offset of the first sector within the blob
    pub(crate) blob_offset: u64,
}

impl Track {
    /// Check whether a sector address falls inside this track
    pub fn contains(&self, lba: u32) -> bool {
        lba >= self.start_lba && lba - self.start_lba < self.length
    }
}

/// An optical disc image: table of contents plus backing blobs
#[derive(Debug, Clone)]
pub struct Disc {
    tracks: Vec<Track>,
    blobs: Vec<Blob>,
    leadout_lba: u32,
}

impl Disc {
    /// Open an ISO image (single Mode 1 track, 2048-byte sectors)
    pub fn from_iso_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RomError::FileNotFound(path.display().to_string()));
        }
        Self::from_iso_blob(Blob::File(path.to_path_buf()))
    }

    /// Create a disc from ISO image bytes
    pub fn from_iso_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_iso_blob(Blob::memory(data))
    }

    fn from_iso_blob(blob: Blob) -> Result<Self> {
        let len = blob.len()?;
        let sectors = len / USER_DATA_SIZE as u64;
        if sectors == 0 {
            return Err(RomError::invalid_format("ISO image is smaller than one sector"));
        }
        if len % USER_DATA_SIZE as u64 != 0 {
            log::warn!(
                "ISO image length {} is not a multiple of {}; trailing bytes ignored",
                len,
                USER_DATA_SIZE
            );
        }

        let length = u32::try_from(sectors)
            .map_err(|_| RomError::invalid_format("ISO image has too many sectors"))?;

        Ok(Disc {
            tracks: vec![Track {
                number: 1,
                kind: TrackKind::Mode1Cooked,
                start_lba: 0,
                length,
                blob: 0,
                blob_offset: 0,
            }],
            blobs: vec![blob],
            leadout_lba: length,
        })
    }

    /// Open a CUE sheet, resolving its FILE entries relative to the sheet
    pub fn from_cue_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        Self::from_cue(&text, |name| {
            let file = dir.join(name);
            if file.exists() {
                Ok(Blob::File(file))
            } else {
                Err(RomError::FileNotFound(file.display().to_string()))
            }
        })
    }

    /// Build a disc from CUE sheet text, using `open` to resolve FILE entries
    pub fn from_cue<F>(text: &str, mut open: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<Blob>,
    {
        let sheet = CueSheet::parse(text)?;

        let mut tracks = Vec::new();
        let mut blobs = Vec::with_capacity(sheet.files.len());
        let mut file_start_lba: u32 = 0;

        for (blob_index, file) in sheet.files.iter().enumerate() {
            let blob = open(&file.name)?;
            let blob_len = blob.len()?;
            blobs.push(blob);

            // Byte offsets accumulate per track since sector sizes may differ
            let mut offset: u64 = 0;
            let mut file_sectors: u32 = 0;

            for (i, cue_track) in file.tracks.iter().enumerate() {
                let size = cue_track.kind.stored_sector_size() as u64;

                if let Some(prev) = i.checked_sub(1).map(|p| &file.tracks[p]) {
                    let gap = cue_track.index01.saturating_sub(prev.index01) as u64;
                    offset += gap * prev.kind.stored_sector_size() as u64;
                } else {
                    offset = cue_track.index01 as u64 * size;
                }

                let length = match file.tracks.get(i + 1) {
                    Some(next) => next.index01.saturating_sub(cue_track.index01),
                    None => (blob_len.saturating_sub(offset) / size) as u32,
                };

                if length == 0 {
                    log::debug!("Track {} in {} has no sectors", cue_track.number, file.name);
                }

                tracks.push(Track {
                    number: cue_track.number,
                    kind: cue_track.kind,
                    start_lba: file_start_lba + cue_track.index01,
                    length,
                    blob: blob_index,
                    blob_offset: offset,
                });

                file_sectors = cue_track.index01 + length;
            }

            file_start_lba += file_sectors;
        }

        if tracks.is_empty() {
            return Err(RomError::invalid_format("CUE sheet defines no tracks"));
        }

        Ok(Disc {
            tracks,
            blobs,
            leadout_lba: file_start_lba,
        })
    }

    /// Get all tracks in table-of-contents order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Get the first track that carries data sectors
    pub fn first_data_track(&self) -> Option<&Track> {
        self.tracks.iter().find(|t| t.kind.is_data())
    }

    /// Find the track containing a sector
    pub fn track_for_lba(&self, lba: u32) -> Option<&Track> {
        self.tracks.iter().find(|t| t.contains(lba))
    }

    /// Get the lead-out address (total number of addressable sectors)
    pub fn leadout_lba(&self) -> u32 {
        self.leadout_lba
    }

    pub(crate) fn blob(&self, index: usize) -> Option<&Blob> {
        self.blobs.get(index)
    }

    pub(crate) fn blob_count(&self) -> usize {
        self.blobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_from_bytes() {
        let disc = Disc::from_iso_bytes(vec![0; 2048 * 10]).unwrap();

        assert_eq!(disc.leadout_lba(), 10);
        assert_eq!(disc.tracks().len(), 1);
        assert_eq!(disc.tracks()[0].kind, TrackKind::Mode1Cooked);
        assert!(disc.track_for_lba(9).is_some());
        assert!(disc.track_for_lba(10).is_none());
    }

    #[test]
    fn test_iso_too_small() {
        let result = Disc::from_iso_bytes(vec![0; 100]);
        assert!(matches!(result, Err(RomError::InvalidFormat(_))));
    }

    #[test]
    fn test_cue_multiple_tracks_one_file() {
        let cue = "FILE \"game.bin\" BINARY\n\
                   \x20 TRACK 01 MODE1/2352\n\
                   \x20   INDEX 01 00:00:00\n\
                   \x20 TRACK 02 AUDIO\n\
                   \x20   INDEX 01 00:00:10\n";
        let disc = Disc::from_cue(cue, |_| Ok(Blob::memory(vec![0; 2352 * 25]))).unwrap();

        let tracks = disc.tracks();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].length, 10);
        assert_eq!(tracks[1].start_lba, 10);
        assert_eq!(tracks[1].length, 15);
        assert_eq!(tracks[1].blob_offset, 2352 * 10);
        assert_eq!(disc.leadout_lba(), 25);
        assert_eq!(disc.first_data_track().unwrap().number, 1);
    }

    #[test]
    fn test_cue_multiple_files() {
        let cue = "FILE \"track1.bin\" BINARY\n\
                   TRACK 01 MODE2/2352\n\
                   INDEX 01 00:00:00\n\
                   FILE \"track2.bin\" BINARY\n\
                   TRACK 02 AUDIO\n\
                   INDEX 00 00:00:00\n\
                   INDEX 01 00:02:00\n";
        let disc = Disc::from_cue(cue, |name| {
            let sectors = if name == "track1.bin" { 20 } else { 200 };
            Ok(Blob::memory(vec![0; 2352 * sectors]))
        })
        .unwrap();

        let tracks = disc.tracks();
        assert_eq!(tracks[0].length, 20);
        assert_eq!(tracks[1].start_lba, 20 + 150);
        assert_eq!(tracks[1].length, 50);
        assert_eq!(tracks[1].blob, 1);
        assert_eq!(disc.leadout_lba(), 220);
        assert_eq!(disc.blob_count(), 2);
    }

    #[test]
    fn test_cue_missing_file() {
        let cue = "FILE \"missing.bin\" BINARY\nTRACK 01 MODE1/2352\nINDEX 01 00:00:00\n";
        let result = Disc::from_cue(cue, |name| Err(RomError::FileNotFound(name.to_string())));
        assert!(matches!(result, Err(RomError::FileNotFound(_))));
    }
}
