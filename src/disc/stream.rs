//! Seekable read-only byte stream over disc sectors
//!
//! [`DiscStream`] maps a flat byte position onto `(lba, offset)` pairs and
//! keeps the most recently fetched sector in a [`SectorCache`], so sequential
//! reads touch the underlying reader once per sector.

use crate::disc::reader::SectorReader;
use crate::disc::view::{DiscSectorView, SectorView};
use crate::error::Result;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Holds at most one sector
#[derive(Debug, Clone)]
pub struct SectorCache {
    lba: Option<u32>,
    buffer: Vec<u8>,
}

impl SectorCache {
    fn new(sector_size: usize) -> Self {
        SectorCache {
            lba: None,
            buffer: vec![0; sector_size],
        }
    }

    /// Get the sector currently held, if any
    pub fn lba(&self) -> Option<u32> {
        self.lba
    }

    /// Get the cached sector bytes (meaningless when [`lba`](Self::lba) is `None`)
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    fn invalidate(&mut self) {
        self.lba = None;
    }
}

/// Byte stream over every sector of a disc
#[derive(Debug)]
pub struct DiscStream<R: SectorReader> {
    reader: R,
    geometry: DiscSectorView,
    position: u64,
    cache: SectorCache,
}

impl<R: SectorReader> DiscStream<R> {
    /// Create a stream positioned at the start of `from_lba`
    ///
    /// The stream always spans the whole disc; `from_lba` only sets the
    /// initial position. Fails without touching the reader if the view is not
    /// supported.
    pub fn new(reader: R, view: SectorView, from_lba: u32) -> Result<Self> {
        let geometry = DiscSectorView::new(view, reader.sector_count())?;

        Ok(DiscStream {
            reader,
            geometry,
            position: from_lba as u64 * geometry.sector_size() as u64,
            cache: SectorCache::new(geometry.sector_size() as usize),
        })
    }

    /// Get the stream geometry
    pub fn geometry(&self) -> &DiscSectorView {
        &self.geometry
    }

    /// Get the total length in bytes
    pub fn len(&self) -> u64 {
        self.geometry.len()
    }

    /// Check whether the stream is empty
    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }

    /// Get the current byte position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Set the byte position, invalidating the sector cache
    ///
    /// Positions past the end are allowed; reads there return 0 bytes.
    pub fn set_position(&mut self, position: u64) {
        self.position = position;
        self.cache.invalidate();
    }

    /// Get the sector cache
    pub fn cache(&self) -> &SectorCache {
        &self.cache
    }

    /// Get the underlying reader
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Consume the stream, returning the reader
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        let remaining = self.len().saturating_sub(self.position);
        let mut count = (buf.len() as u64).min(remaining) as usize;
        let sector_size = self.geometry.sector_size() as u64;
        let mut written = 0;

        while count > 0 {
            let lba = (self.position / sector_size) as u32;
            let within = (self.position % sector_size) as usize;

            if self.cache.lba != Some(lba) {
                // Mark invalid first so a failed fetch never leaves stale data
                self.cache.lba = None;
                self.reader
                    .read_sector(lba, self.geometry.view(), &mut self.cache.buffer)?;
                self.cache.lba = Some(lba);
            }

            let todo = count.min(sector_size as usize - within);
            buf[written..written + todo].copy_from_slice(&self.cache.buffer[within..within + todo]);

            written += todo;
            count -= todo;
            self.position += todo as u64;
        }

        Ok(written)
    }
}

impl<R: SectorReader> Read for DiscStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_into(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

impl<R: SectorReader> Seek for DiscStream<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => self.len().checked_add_signed(delta),
        };

        match target {
            Some(position) => {
                self.set_position(position);
                Ok(position)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}

impl<R: SectorReader> Write for DiscStream<R> {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "disc streams are read-only",
        ))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
