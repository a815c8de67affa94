//! Logical sector views
//!
//! A view selects which bytes of a raw sector a reader returns. Only the
//! Mode 1 user-data view is implemented; the others exist so callers can name
//! them and get a clear error up front.

use crate::error::{Result, RomError};
use std::fmt;

/// Closed set of logical sector views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectorView {
    /// Whole raw sector, 2352 bytes
    Mode0,
    /// Mode 1 user data, 2048 bytes
    Mode1,
    /// Mode 2 formless user data, 2336 bytes
    Mode2,
    /// Mode 2 Form 1 user data, 2048 bytes
    Mode2Form1,
    /// Mode 2 Form 2 user data, 2324 bytes
    Mode2Form2,
}

impl SectorView {
    /// All views, in declaration order
    pub const ALL: [SectorView; 5] = [
        SectorView::Mode0,
        SectorView::Mode1,
        SectorView::Mode2,
        SectorView::Mode2Form1,
        SectorView::Mode2Form2,
    ];

    /// Get the number of bytes one sector occupies in this view
    pub fn sector_size(&self) -> u32 {
        match self {
            SectorView::Mode0 => 2352,
            SectorView::Mode1 | SectorView::Mode2Form1 => 2048,
            SectorView::Mode2 => 2336,
            SectorView::Mode2Form2 => 2324,
        }
    }

    /// Check whether streams can be built over this view
    pub fn is_supported(&self) -> bool {
        matches!(self, SectorView::Mode1)
    }

    /// Get the conventional name of the view
    pub fn name(&self) -> &'static str {
        match self {
            SectorView::Mode0 => "Mode0_2352",
            SectorView::Mode1 => "Mode1_2048",
            SectorView::Mode2 => "Mode2_2336",
            SectorView::Mode2Form1 => "Mode2_Form1_2048",
            SectorView::Mode2Form2 => "Mode2_Form2_2324",
        }
    }
}

impl fmt::Display for SectorView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable geometry of a disc stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscSectorView {
    view: SectorView,
    sector_count: u32,
}

impl DiscSectorView {
    /// Create a view descriptor, failing if the view is not supported
    pub fn new(view: SectorView, sector_count: u32) -> Result<Self> {
        if !view.is_supported() {
            return Err(RomError::UnsupportedView(view.name().to_string()));
        }
        Ok(DiscSectorView { view, sector_count })
    }

    /// Get the sector view
    pub fn view(&self) -> SectorView {
        self.view
    }

    /// Get the bytes per logical sector
    pub fn sector_size(&self) -> u32 {
        self.view.sector_size()
    }

    /// Get the number of sectors covered
    pub fn sector_count(&self) -> u32 {
        self.sector_count
    }

    /// Get the total byte length covered
    pub fn len(&self) -> u64 {
        self.sector_count as u64 * self.sector_size() as u64
    }

    /// Check whether the view covers no sectors
    pub fn is_empty(&self) -> bool {
        self.sector_count == 0
    }
}
