use thiserror::Error;

/// Result type alias for image and dispatch operations
pub type Result<T> = std::result::Result<T, RomError>;

/// Errors that can occur when reading media, discs and databases
#[derive(Debug, Error)]
pub enum RomError {
    /// I/O error occurred while reading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unrecognized image format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Requested sector view is not supported
    #[error("Unsupported sector view: {0}")]
    UnsupportedView(String),

    /// Sector address outside the disc
    #[error("Invalid sector: lba={lba} (sectors: {count})")]
    InvalidSector {
        /// Logical block address requested
        lba: u32,
        /// Number of sectors on the disc
        count: u32,
    },

    /// Parse error at a specific line of a text descriptor
    #[error("Parse error at line {line}: {message}")]
    ParseError {
        /// One-based line number where the error occurred
        line: usize,
        /// Error message
        message: String,
    },

    /// Archive could not be read or bound
    #[error("Archive error: {0}")]
    Archive(String),

    /// Referenced file does not exist
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Game database file could not be parsed
    #[error("Database error: {0}")]
    Database(#[from] serde_json::Error),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Config error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

impl RomError {
    /// Create a parse error with context
    pub fn parse<S: Into<String>>(line: usize, message: S) -> Self {
        RomError::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid format error
    pub fn invalid_format<S: Into<String>>(message: S) -> Self {
        RomError::InvalidFormat(message.into())
    }

    /// Create an archive error
    pub fn archive<S: Into<String>>(message: S) -> Self {
        RomError::Archive(message.into())
    }
}

impl From<zip::result::ZipError> for RomError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => RomError::Io(io),
            other => RomError::Archive(other.to_string()),
        }
    }
}
