//! Game identity records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Dump quality of a content hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DumpStatus {
    /// Known good dump
    Verified,
    /// Known bad dump
    BadDump,
    /// Not in the database
    #[default]
    Unknown,
}

impl fmt::Display for DumpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpStatus::Verified => write!(f, "Verified"),
            DumpStatus::BadDump => write!(f, "Bad dump"),
            DumpStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Audit entry for a system id change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemRelabel {
    /// System id before the change
    pub from: String,
    /// System id after the change
    pub to: String,
}

/// Identity of a piece of content
///
/// Records are immutable; the `with_*` methods return a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    #[serde(rename = "system")]
    system_id: String,
    name: String,
    #[serde(default)]
    status: DumpStatus,
    #[serde(default)]
    options: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    firmware_hash: Option<String>,
    #[serde(default)]
    hash: String,
    #[serde(skip)]
    in_database: bool,
}

impl GameRecord {
    /// Create a record with the given system id and name
    pub fn new<S: Into<String>, N: Into<String>>(system_id: S, name: N) -> Self {
        GameRecord {
            system_id: system_id.into(),
            name: name.into(),
            status: DumpStatus::Unknown,
            options: BTreeMap::new(),
            firmware_hash: None,
            hash: String::new(),
            in_database: false,
        }
    }

    /// Create a record with no system id
    pub fn unresolved<N: Into<String>>(name: N) -> Self {
        Self::new("", name)
    }

    /// Set the dump status
    pub fn with_status(mut self, status: DumpStatus) -> Self {
        self.status = status;
        self
    }

    /// Set a named option
    pub fn with_option<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Set a boolean option to true
    pub fn with_flag<K: Into<String>>(self, key: K) -> Self {
        self.with_option(key, "true")
    }

    /// Set the content hash
    pub fn with_hash<S: Into<String>>(mut self, hash: S) -> Self {
        self.hash = hash.into();
        self
    }

    /// Record the firmware this game will run with and the capabilities it provides
    pub fn with_firmware<S: Into<String>>(mut self, hash: S, flags: &[String]) -> Self {
        self.firmware_hash = Some(hash.into());
        for flag in flags {
            self.options.insert(flag.clone(), "true".to_string());
        }
        self
    }

    /// Mark the record as coming from the database
    pub(crate) fn from_database(mut self) -> Self {
        self.in_database = true;
        self
    }

    /// Produce a record for another system, returning the audit entry
    pub fn relabeled(&self, system_id: &str, option: Option<&str>) -> (GameRecord, SystemRelabel) {
        let mut record = self.clone();
        record.system_id = system_id.to_string();
        if let Some(option) = option {
            record.options.insert(option.to_string(), "true".to_string());
        }

        let audit = SystemRelabel {
            from: self.system_id.clone(),
            to: record.system_id.clone(),
        };
        (record, audit)
    }

    /// Get the system id (empty when unresolved)
    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    /// Get the display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the dump status
    pub fn status(&self) -> DumpStatus {
        self.status
    }

    /// Get the content hash
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Get the firmware hash, if firmware was validated
    pub fn firmware_hash(&self) -> Option<&str> {
        self.firmware_hash.as_deref()
    }

    /// Get a named option
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Get all options
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    /// Check a boolean option: present and not "false"
    pub fn flag(&self, key: &str) -> bool {
        self.option(key)
            .map(|v| !v.eq_ignore_ascii_case("false"))
            .unwrap_or(false)
    }

    /// Check whether the system id is known
    pub fn is_resolved(&self) -> bool {
        !self.system_id.is_empty()
    }

    /// Check whether the record came from the database
    pub fn in_database(&self) -> bool {
        self.in_database
    }
}

impl fmt::Display for GameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let system = if self.system_id.is_empty() { "?" } else { &self.system_id };
        write!(f, "[{}] {} ({})", system, self.name, self.status)
    }
}
