//! Common types shared across device implementations.
//!
//! This module defines the tag snapshot types produced by a read
//! attempt, plus generic device metadata.

use serde::{Deserialize, Serialize};

/// One successful decode of a tag present on the reader.
///
/// A snapshot is produced fresh by each read that found a tag and is
/// owned by the loop iteration that requested it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSnapshot {
    /// Customer identifier stored on the tag.
    pub cid: u32,

    /// Unique identifier stored on the tag.
    pub uid: u32,

    /// Checksum reported by the reader alongside the tag data.
    ///
    /// Used only for diagnostic display; the reader has already
    /// validated it before handing the payload over.
    pub crc: u16,

    /// Timestamp when the tag was read.
    pub read_at: chrono::DateTime<chrono::Utc>,
}

impl TagSnapshot {
    /// Create a new snapshot with the current timestamp.
    pub fn new(cid: u32, uid: u32, crc: u16) -> Self {
        Self {
            cid,
            uid,
            crc,
            read_at: chrono::Utc::now(),
        }
    }

    /// Get the checksum as a `0x`-prefixed hex string.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagpress_hardware::TagSnapshot;
    ///
    /// let snapshot = TagSnapshot::new(77, 1234567890, 0xBEEF);
    /// assert_eq!(snapshot.crc_hex(), "0xbeef");
    /// ```
    pub fn crc_hex(&self) -> String {
        format!("{:#06x}", self.crc)
    }
}

/// Outcome of one poll of the reader.
///
/// "Nothing on the reader" is a normal result, not an error, so
/// presence is modeled explicitly instead of with optional fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagRead {
    /// No tag in the reader field, or a tag without identity data.
    NoTag,

    /// A tag with identity data is present.
    Tag(TagSnapshot),
}

impl TagRead {
    /// Check if this read found a tag with identity data.
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Tag(_))
    }

    /// Get the snapshot if a tag was present.
    pub fn snapshot(&self) -> Option<&TagSnapshot> {
        match self {
            Self::Tag(snapshot) => Some(snapshot),
            Self::NoTag => None,
        }
    }
}

/// Generic device information.
///
/// Contains metadata about a reader/writer device such as name, model,
/// and optional serial number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "USB HID RFID Writer", "MockTagDevice").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional device serial number.
    pub serial_number: Option<String>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            serial_number: None,
        }
    }

    /// Set the serial number.
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }
}
