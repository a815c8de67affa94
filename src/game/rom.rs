//! Cartridge ROM images and content hashes

use sha2::{Digest, Sha256};

/// Size of a copier header prepended to some dumps
pub const COPIER_HEADER_SIZE: usize = 512;

/// Size of an iNES header
pub const INES_HEADER_SIZE: usize = 16;

/// A cartridge image with its header located
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomImage {
    name: String,
    extension: String,
    file_data: Vec<u8>,
    header_len: usize,
}

impl RomImage {
    /// Create an image from file bytes
    ///
    /// `extension` is lowercase without the dot.
    pub fn new<N: Into<String>>(name: N, extension: &str, file_data: Vec<u8>) -> Self {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        let header_len = detect_header(&extension, &file_data);
        if header_len > 0 {
            log::debug!("Skipping {}-byte header", header_len);
        }

        RomImage {
            name: name.into(),
            extension,
            file_data,
            header_len,
        }
    }

    /// Get the display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the extension
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Get the whole file including any header
    pub fn file_data(&self) -> &[u8] {
        &self.file_data
    }

    /// Get the ROM payload without its header
    pub fn rom_data(&self) -> &[u8] {
        &self.file_data[self.header_len..]
    }

    /// Get the header length in bytes
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Get the payload hashes as database keys, strongest first
    pub fn hashes(&self) -> Vec<String> {
        content_hashes(self.rom_data())
    }
}

/// Hash bytes into `SHA256:`, `MD5:` and `CRC32:` prefixed keys
pub fn content_hashes(data: &[u8]) -> Vec<String> {
    let mut sha = Sha256::new();
    sha.update(data);

    let mut md5 = md5::Context::new();
    md5.consume(data);

    let mut crc = crc32fast::Hasher::new();
    crc.update(data);

    vec![
        format!("SHA256:{:X}", sha.finalize()),
        format!("MD5:{:X}", md5.finalize()),
        format!("CRC32:{:08X}", crc.finalize()),
    ]
}

/// SHA-256 of bytes as uppercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    let mut sha = Sha256::new();
    sha.update(data);
    format!("{:X}", sha.finalize())
}

fn detect_header(extension: &str, data: &[u8]) -> usize {
    if extension == "nes" && data.starts_with(b"NES\x1A") && data.len() >= INES_HEADER_SIZE {
        INES_HEADER_SIZE
    } else if data.len() % 1024 == COPIER_HEADER_SIZE {
        COPIER_HEADER_SIZE
    } else {
        0
    }
}
