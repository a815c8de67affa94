//! CUE sheet parser
//!
//! Supports the subset of the CUE format used by console disc dumps: `FILE`,
//! `TRACK` and `INDEX` entries. Other commands (`REM`, `PREGAP`, `FLAGS`,
//! `CATALOG`, ...) are accepted and ignored.

use crate::disc::TrackKind;
use crate::error::{Result, RomError};

/// Frames (sectors) per second of CD audio
pub const FRAMES_PER_SECOND: u32 = 75;

/// A parsed CUE sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueSheet {
    /// FILE entries in order of appearance
    pub files: Vec<CueFile>,
}

/// A FILE entry and the tracks stored in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueFile {
    /// File name as written in the sheet
    pub name: String,
    /// Tracks stored in this file
    pub tracks: Vec<CueTrack>,
}

/// A TRACK entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueTrack {
    /// Track number
    pub number: u8,
    /// Sector encoding
    pub kind: TrackKind,
    /// INDEX 01 position relative to the start of the file, in sectors
    pub index01: u32,
}

impl CueSheet {
    /// Parse CUE sheet text
    pub fn parse(text: &str) -> Result<Self> {
        let mut sheet = CueSheet::default();
        // Track being assembled: (line, number, kind, index01)
        let mut pending: Option<(usize, u8, TrackKind, Option<u32>)> = None;

        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let (command, rest) = split_command(line);
            match command.to_ascii_uppercase().as_str() {
                "FILE" => {
                    sheet.finish_track(&mut pending)?;
                    let name = parse_file_name(rest)
                        .ok_or_else(|| RomError::parse(line_no, "FILE entry has no name"))?;
                    sheet.files.push(CueFile {
                        name,
                        tracks: Vec::new(),
                    });
                }
                "TRACK" => {
                    sheet.finish_track(&mut pending)?;
                    if sheet.files.is_empty() {
                        return Err(RomError::parse(line_no, "TRACK before FILE"));
                    }

                    let mut parts = rest.split_whitespace();
                    let number = parts
                        .next()
                        .and_then(|n| n.parse::<u8>().ok())
                        .ok_or_else(|| RomError::parse(line_no, "Invalid track number"))?;
                    let mode = parts
                        .next()
                        .ok_or_else(|| RomError::parse(line_no, "TRACK entry has no mode"))?;
                    let kind = TrackKind::from_cue_mode(mode).ok_or_else(|| {
                        RomError::parse(line_no, format!("Unsupported track mode {}", mode))
                    })?;

                    pending = Some((line_no, number, kind, None));
                }
                "INDEX" => {
                    let mut parts = rest.split_whitespace();
                    let index = parts
                        .next()
                        .and_then(|n| n.parse::<u8>().ok())
                        .ok_or_else(|| RomError::parse(line_no, "Invalid index number"))?;
                    let position = parts
                        .next()
                        .and_then(parse_msf)
                        .ok_or_else(|| RomError::parse(line_no, "Invalid index position"))?;

                    match pending.as_mut() {
                        Some(track) if index == 1 => track.3 = Some(position),
                        Some(_) => {}
                        None => return Err(RomError::parse(line_no, "INDEX outside of TRACK")),
                    }
                }
                other => {
                    log::debug!("Ignoring CUE command {} at line {}", other, line_no);
                }
            }
        }

        sheet.finish_track(&mut pending)?;
        Ok(sheet)
    }

    fn finish_track(&mut self, pending: &mut Option<(usize, u8, TrackKind, Option<u32>)>) -> Result<()> {
        if let Some((line, number, kind, index01)) = pending.take() {
            let index01 = index01
                .ok_or_else(|| RomError::parse(line, format!("Track {} has no INDEX 01", number)))?;
            if let Some(file) = self.files.last_mut() {
                file.tracks.push(CueTrack {
                    number,
                    kind,
                    index01,
                });
            }
        }
        Ok(())
    }

    /// Count the tracks over all files
    pub fn track_count(&self) -> usize {
        self.files.iter().map(|f| f.tracks.len()).sum()
    }
}

fn split_command(line: &str) -> (&str, &str) {
    match line.find(char::is_whitespace) {
        Some(pos) => (&line[..pos], line[pos..].trim_start()),
        None => (line, ""),
    }
}

/// Parse the name out of `"name" BINARY` or `name BINARY`
fn parse_file_name(rest: &str) -> Option<String> {
    if let Some(quoted) = rest.strip_prefix('"') {
        let end = quoted.find('"')?;
        return Some(quoted[..end].to_string());
    }

    // Unquoted names may contain spaces; the file type is the last word
    let name = match rest.rfind(char::is_whitespace) {
        Some(pos) => rest[..pos].trim_end(),
        None => rest,
    };
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Parse an `mm:ss:ff` position into a sector count
pub fn parse_msf(text: &str) -> Option<u32> {
    let mut parts = text.split(':');
    let minutes: u32 = parts.next()?.parse().ok()?;
    let seconds: u32 = parts.next()?.parse().ok()?;
    let frames: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || seconds >= 60 || frames >= FRAMES_PER_SECOND {
        return None;
    }
    Some((minutes * 60 + seconds) * FRAMES_PER_SECOND + frames)
}
