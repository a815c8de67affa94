//! Sector reader over a disc image

use crate::disc::view::SectorView;
use crate::disc::{Blob, Disc, TrackKind, USER_DATA_SIZE};
use crate::error::{Result, RomError};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

/// Offset of user data in a raw Mode 1 sector (12 sync + 4 header)
pub const MODE1_DATA_OFFSET: u64 = 16;

/// Offset of user data in a raw Mode 2 Form 1 sector (sync, header, subheader)
pub const MODE2_FORM1_DATA_OFFSET: u64 = 24;

/// Offset of the mode byte in a raw sector header
const MODE_BYTE_OFFSET: u64 = 15;

/// Source of single logical sectors
pub trait SectorReader {
    /// Total number of addressable sectors
    fn sector_count(&self) -> u32;

    /// Read one sector in the given view into `buf`
    ///
    /// `buf` must hold at least `view.sector_size()` bytes.
    fn read_sector(&mut self, lba: u32, view: SectorView, buf: &mut [u8]) -> Result<()>;
}

impl<R: SectorReader + ?Sized> SectorReader for &mut R {
    fn sector_count(&self) -> u32 {
        (**self).sector_count()
    }

    fn read_sector(&mut self, lba: u32, view: SectorView, buf: &mut [u8]) -> Result<()> {
        (**self).read_sector(lba, view, buf)
    }
}

/// How 2048-byte user data is located in raw Mode 2 sectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserData2048Mode {
    /// Treat every raw sector as Mode 1 (user data at offset 16)
    #[default]
    AssumeMode1,
    /// Treat raw Mode 2 sectors as Form 1 (user data at offset 24)
    AssumeMode2Form1,
    /// Read the mode byte of each sector header
    InspectSectorMode,
}

/// Reads sectors from a [`Disc`], opening backing files on first use
#[derive(Debug)]
pub struct DiscSectorReader {
    disc: Disc,
    files: Vec<Option<File>>,
    policy: UserData2048Mode,
}

impl DiscSectorReader {
    /// Create a reader over a disc
    pub fn new(disc: &Disc) -> Self {
        DiscSectorReader {
            disc: disc.clone(),
            files: (0..disc.blob_count()).map(|_| None).collect(),
            policy: UserData2048Mode::default(),
        }
    }

    /// Set how Mode 2 user data is located
    pub fn with_policy(mut self, policy: UserData2048Mode) -> Self {
        self.policy = policy;
        self
    }

    /// Get the disc being read
    pub fn disc(&self) -> &Disc {
        &self.disc
    }

    /// Read bytes from a blob, zero-filling past its end
    fn read_blob(&mut self, index: usize, offset: u64, buf: &mut [u8]) -> Result<()> {
        let blob = self
            .disc
            .blob(index)
            .ok_or_else(|| RomError::invalid_format(format!("No blob {}", index)))?;

        match blob {
            Blob::Memory(data) => {
                buf.fill(0);
                let start = offset.min(data.len() as u64) as usize;
                let end = (start + buf.len()).min(data.len());
                buf[..end - start].copy_from_slice(&data[start..end]);
                Ok(())
            }
            Blob::File(path) => {
                if self.files[index].is_none() {
                    log::debug!("Opening disc blob {}", path.display());
                    self.files[index] = Some(File::open(path)?);
                }
                let file = match self.files[index].as_mut() {
                    Some(file) => file,
                    None => return Err(RomError::FileNotFound(path.display().to_string())),
                };

                file.seek(SeekFrom::Start(offset))?;
                let mut filled = 0;
                while filled < buf.len() {
                    let n = file.read(&mut buf[filled..])?;
                    if n == 0 {
                        break;
                    }
                    filled += n;
                }
                buf[filled..].fill(0);
                Ok(())
            }
        }
    }

    fn user_data_offset(&mut self, kind: TrackKind, blob: usize, sector_start: u64) -> Result<u64> {
        Ok(match kind {
            TrackKind::Mode1Cooked => 0,
            TrackKind::Mode1Raw => MODE1_DATA_OFFSET,
            TrackKind::Mode2Raw => match self.policy {
                UserData2048Mode::AssumeMode1 => MODE1_DATA_OFFSET,
                UserData2048Mode::AssumeMode2Form1 => MODE2_FORM1_DATA_OFFSET,
                UserData2048Mode::InspectSectorMode => {
                    let mut mode = [0u8; 1];
                    self.read_blob(blob, sector_start + MODE_BYTE_OFFSET, &mut mode)?;
                    if mode[0] == 2 {
                        MODE2_FORM1_DATA_OFFSET
                    } else {
                        MODE1_DATA_OFFSET
                    }
                }
            },
            TrackKind::Audio => 0,
        })
    }
}

impl SectorReader for DiscSectorReader {
    fn sector_count(&self) -> u32 {
        self.disc.leadout_lba()
    }

    fn read_sector(&mut self, lba: u32, view: SectorView, buf: &mut [u8]) -> Result<()> {
        if view != SectorView::Mode1 {
            return Err(RomError::UnsupportedView(view.name().to_string()));
        }
        if lba >= self.disc.leadout_lba() {
            return Err(RomError::InvalidSector {
                lba,
                count: self.disc.leadout_lba(),
            });
        }

        let size = USER_DATA_SIZE as usize;
        let out = buf
            .get_mut(..size)
            .ok_or_else(|| RomError::invalid_format("Sector buffer too small"))?;

        let track = match self.disc.track_for_lba(lba) {
            Some(track) if track.kind.is_data() => track.clone(),
            // Pregaps and audio sectors carry no user data
            _ => {
                out.fill(0);
                return Ok(());
            }
        };

        let sector_start =
            track.blob_offset + (lba - track.start_lba) as u64 * track.kind.stored_sector_size() as u64;
        let data_offset = self.user_data_offset(track.kind, track.blob, sector_start)?;
        self.read_blob(track.blob, sector_start + data_offset, out)
    }
}
