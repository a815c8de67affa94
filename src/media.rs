//! Media sources: plain files and zip archive members
//!
//! A [`MediaSource`] is opened from a path (or bytes) and must be *bound* to
//! a single file before its content can be read. Plain files are bound on
//! open; archives are bound to one member with [`MediaSource::bind_sole_item_of`]
//! or [`MediaSource::bind_member`].

use crate::disc::Blob;
use crate::error::{Result, RomError};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zip::ZipArchive;

/// Largest buffer reserved up front for an archive member
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// Separator between archive path and member name in canonical paths
pub const ARCHIVE_SEPARATOR: char = '|';

trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

#[derive(Debug, Clone)]
enum Backing {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

/// A file inside an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    index: usize,
    name: String,
    size: u64,
}

impl ArchiveMember {
    /// Get the member's path inside the archive
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the uncompressed size
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Get the lowercase extension without the dot
    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }
}

/// An opened, possibly archive-bound, media file
#[derive(Debug, Clone)]
pub struct MediaSource {
    path: PathBuf,
    backing: Option<Backing>,
    members: Option<Vec<ArchiveMember>>,
    bound: Option<usize>,
}

impl MediaSource {
    /// Open a path; a missing file yields a source whose `exists()` is false
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            log::debug!("Media {} does not exist", path.display());
            return Ok(MediaSource {
                path,
                backing: None,
                members: None,
                bound: None,
            });
        }

        Self::with_backing(path.clone(), Backing::File(path))
    }

    /// Create a source over bytes, named as if read from `name`
    pub fn from_bytes<P: AsRef<Path>>(name: P, data: Vec<u8>) -> Result<Self> {
        Self::with_backing(name.as_ref().to_path_buf(), Backing::Memory(data.into()))
    }

    fn with_backing(path: PathBuf, backing: Backing) -> Result<Self> {
        let mut source = MediaSource {
            path,
            backing: Some(backing),
            members: None,
            bound: None,
        };

        if extension_of(&source.path.to_string_lossy()) == "zip" {
            let mut archive = source.open_archive()?;
            let mut members = Vec::new();
            for i in 0..archive.len() {
                let file = archive.by_index(i)?;
                if file.is_dir() {
                    continue;
                }
                members.push(ArchiveMember {
                    index: i,
                    name: file.name().to_string(),
                    size: file.size(),
                });
            }
            log::debug!(
                "Archive {} has {} members",
                source.path.display(),
                members.len()
            );
            source.members = Some(members);
        }

        Ok(source)
    }

    fn open_archive(&self) -> Result<ZipArchive<Box<dyn ReadSeek>>> {
        let reader: Box<dyn ReadSeek> = match &self.backing {
            Some(Backing::File(path)) => Box::new(BufReader::new(File::open(path)?)),
            Some(Backing::Memory(data)) => Box::new(Cursor::new(data.clone())),
            None => return Err(RomError::FileNotFound(self.path.display().to_string())),
        };
        Ok(ZipArchive::new(reader)?)
    }

    /// Check whether the underlying file exists
    pub fn exists(&self) -> bool {
        self.backing.is_some()
    }

    /// Check whether the source is an archive
    pub fn is_archive(&self) -> bool {
        self.members.is_some()
    }

    /// Check whether a single file is selected for reading
    pub fn is_bound(&self) -> bool {
        self.exists() && (!self.is_archive() || self.bound.is_some())
    }

    /// Get the archive members (empty for plain files)
    pub fn members(&self) -> &[ArchiveMember] {
        self.members.as_deref().unwrap_or(&[])
    }

    /// Bind the only member whose extension is in `extensions`
    ///
    /// Returns false, leaving the source unbound, if zero or several match.
    pub fn bind_sole_item_of(&mut self, extensions: &[&str]) -> bool {
        let candidates: Vec<usize> = self
            .members()
            .iter()
            .enumerate()
            .filter(|(_, m)| extensions.contains(&m.extension().as_str()))
            .map(|(i, _)| i)
            .collect();

        match candidates.as_slice() {
            [only] => {
                self.bound = Some(*only);
                true
            }
            _ => false,
        }
    }

    /// Bind a member by its position in [`members`](Self::members)
    pub fn bind_member(&mut self, index: usize) -> Result<()> {
        if index >= self.members().len() {
            return Err(RomError::archive(format!(
                "No member {} in {} ({} members)",
                index,
                self.path.display(),
                self.members().len()
            )));
        }
        self.bound = Some(index);
        Ok(())
    }

    fn bound_member(&self) -> Option<&ArchiveMember> {
        self.bound.and_then(|i| self.members().get(i))
    }

    /// Get the path the source was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the file name of the bound file
    pub fn name(&self) -> String {
        match self.bound_member() {
            Some(member) => file_name_of(&member.name).to_string(),
            None => self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// Get the lowercase extension of the bound file, without the dot
    pub fn extension(&self) -> String {
        match self.bound_member() {
            Some(member) => member.extension(),
            None => extension_of(&self.path.to_string_lossy()),
        }
    }

    /// Get the canonical path, `archive|member` for archive members
    pub fn canonical_full_path(&self) -> String {
        match self.bound_member() {
            Some(member) => format!("{}{}{}", self.path.display(), ARCHIVE_SEPARATOR, member.name),
            None => self.path.display().to_string(),
        }
    }

    /// Get the directory containing the source
    pub fn directory(&self) -> PathBuf {
        self.path.parent().map(Path::to_path_buf).unwrap_or_default()
    }

    /// Get the on-disk path of the bound file, if it is a plain file
    pub fn file_path(&self) -> Option<&Path> {
        match (&self.backing, self.is_archive()) {
            (Some(Backing::File(path)), false) => Some(path),
            _ => None,
        }
    }

    /// Read the whole bound file
    pub fn read_bound(&self) -> Result<Vec<u8>> {
        if !self.is_bound() {
            return Err(RomError::archive(format!(
                "{} is not bound to a file",
                self.path.display()
            )));
        }

        match (self.bound_member(), &self.backing) {
            (Some(member), _) => self.read_member(member.index),
            (None, Some(Backing::File(path))) => Ok(std::fs::read(path)?),
            (None, Some(Backing::Memory(data))) => Ok(data.to_vec()),
            (None, None) => Err(RomError::FileNotFound(self.path.display().to_string())),
        }
    }

    fn read_member(&self, index: usize) -> Result<Vec<u8>> {
        let mut archive = self.open_archive()?;
        let mut file = archive.by_index(index)?;
        // Sizes in the archive header are untrusted
        let mut data = Vec::with_capacity(file.size().min(MAX_PREALLOCATION) as usize);
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read a file next to the bound file (same directory or same archive)
    pub fn read_sibling(&self, name: &str) -> Result<Vec<u8>> {
        if self.is_archive() {
            let index = self.sibling_member(name)?;
            return self.read_member(index);
        }

        let path = self.directory().join(name);
        if !path.is_file() {
            return Err(RomError::FileNotFound(path.display().to_string()));
        }
        Ok(std::fs::read(path)?)
    }

    /// Get a disc blob for a file next to the bound file
    ///
    /// Plain files are opened lazily; archive members are read into memory.
    pub fn sibling_blob(&self, name: &str) -> Result<Blob> {
        if self.is_archive() || self.file_path().is_none() {
            return self.read_sibling(name).map(Blob::memory);
        }

        let path = self.directory().join(name);
        if path.is_file() {
            Ok(Blob::File(path))
        } else {
            Err(RomError::FileNotFound(path.display().to_string()))
        }
    }

    fn sibling_member(&self, name: &str) -> Result<usize> {
        let base = self
            .bound_member()
            .map(|m| match m.name.rfind('/') {
                Some(pos) => m.name[..=pos].to_string(),
                None => String::new(),
            })
            .unwrap_or_default();
        let wanted = format!("{}{}", base, name.replace('\\', "/"));

        self.members()
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(&wanted))
            .map(|m| m.index)
            .ok_or_else(|| {
                RomError::FileNotFound(format!("{}{}{}", self.path.display(), ARCHIVE_SEPARATOR, wanted))
            })
    }
}

fn file_name_of(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Lowercase extension of a path string, without the dot
pub fn extension_of(path: &str) -> String {
    let name = file_name_of(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => name[dot + 1..].to_ascii_lowercase(),
        _ => String::new(),
    }
}
