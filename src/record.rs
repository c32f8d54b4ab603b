//! Dictionary records.
//!
//! Each record is a list of tagged fields closed by [`DictionaryField::End`],
//! immediately followed by a 16-byte payload locator:
//!
//! ```text
//! [ tag u8 | field payload ]*  0x00  | offset u64 | size u64
//! ```
//!
//! | Tag | Field         | Payload                          |
//! |-----|---------------|----------------------------------|
//! | 0   | end of list   | none                             |
//! | 1   | global index  | `u32`                            |
//! | 2   | name          | NUL-terminated UTF-8             |
//! | 3   | dimensions    | `u32` width, `u32` height        |
//!
//! A `0x00` read where a record would start ends the whole dictionary.

use byteorder::{ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::fmt;
use std::io::{self, Read, Write};
use std::string::FromUtf8Error;
use thiserror::Error;

use crate::wire::{read_cstr, write_cstr, Endian};

/// Size of the offset + size pair that follows every field list.
pub const LOCATOR_SIZE: u64 = 16;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Unknown dictionary field tag {0}")]
    UnknownField(u8),
    #[error("Texture name is not valid UTF-8: {0}")]
    InvalidName(#[from] FromUtf8Error),
    #[error("Texture name contains a NUL byte: {0:?}")]
    NameContainsNul(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Field tags ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DictionaryField {
    End         = 0,
    GlobalIndex = 1,
    Name        = 2,
    Dimensions  = 3,
}

impl TryFrom<u8> for DictionaryField {
    type Error = RecordError;

    fn try_from(v: u8) -> Result<Self, RecordError> {
        match v {
            0 => Ok(DictionaryField::End),
            1 => Ok(DictionaryField::GlobalIndex),
            2 => Ok(DictionaryField::Name),
            3 => Ok(DictionaryField::Dimensions),
            other => Err(RecordError::UnknownField(other)),
        }
    }
}

// ── TextureEntry ─────────────────────────────────────────────────────────────

/// One texture descriptor, as found on a line of the text index.
///
/// `global_index` is optional on the wire: an archive may omit the field,
/// which is not the same thing as slot `0`.  A width or height of `0` means
/// "unspecified".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TextureEntry {
    pub global_index: Option<u32>,
    pub name:         String,
    pub width:        u32,
    pub height:       u32,
}

impl TextureEntry {
    pub fn new(global_index: u32, name: impl Into<String>) -> Self {
        Self {
            global_index: Some(global_index),
            name:         name.into(),
            width:        0,
            height:       0,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// True when the dimensions field is written / printed.
    pub fn has_dimensions(&self) -> bool {
        self.width != 0 || self.height != 0
    }
}

/// Formats the entry as a text index line (no line terminator).
///
/// Present fields appear in the fixed order global index, name, `WxH`,
/// separated by single commas.
impl fmt::Display for TextureEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if let Some(gbix) = self.global_index {
            write!(f, "{gbix}")?;
            sep = ",";
        }
        if !self.name.is_empty() {
            write!(f, "{sep}{}", self.name)?;
            sep = ",";
        }
        if self.has_dimensions() {
            write!(f, "{sep}{}x{}", self.width, self.height)?;
        }
        Ok(())
    }
}

// ── ArchiveRecord ────────────────────────────────────────────────────────────

/// Where a payload lives inside the archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PayloadLocation {
    pub offset: u64,
    pub size:   u64,
}

impl PayloadLocation {
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }
}

/// A dictionary record as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveRecord {
    #[serde(flatten)]
    pub entry:   TextureEntry,
    #[serde(flatten)]
    pub payload: PayloadLocation,
}

// ── Encoding ─────────────────────────────────────────────────────────────────

/// Write the tagged field list for `entry`, including the closing end tag.
///
/// The name is always written; the global index only when present and the
/// dimensions only when either side is non-zero.
pub fn write_fields<W: Write>(mut writer: W, entry: &TextureEntry) -> Result<(), RecordError> {
    if entry.name.as_bytes().contains(&0) {
        return Err(RecordError::NameContainsNul(entry.name.clone()));
    }

    if let Some(gbix) = entry.global_index {
        writer.write_u8(DictionaryField::GlobalIndex as u8)?;
        writer.write_u32::<Endian>(gbix)?;
    }

    writer.write_u8(DictionaryField::Name as u8)?;
    write_cstr(&mut writer, &entry.name)?;

    if entry.has_dimensions() {
        writer.write_u8(DictionaryField::Dimensions as u8)?;
        writer.write_u32::<Endian>(entry.width)?;
        writer.write_u32::<Endian>(entry.height)?;
    }

    writer.write_u8(DictionaryField::End as u8)?;
    Ok(())
}

pub fn write_locator<W: Write>(mut writer: W, loc: PayloadLocation) -> io::Result<()> {
    writer.write_u64::<Endian>(loc.offset)?;
    writer.write_u64::<Endian>(loc.size)?;
    Ok(())
}

// ── Decoding ─────────────────────────────────────────────────────────────────

/// Read one record, or `None` when the dictionary terminator is reached.
///
/// A repeated field overwrites the earlier value.
pub fn read_record<R: Read>(mut reader: R) -> Result<Option<ArchiveRecord>, RecordError> {
    let mut tag = DictionaryField::try_from(reader.read_u8()?)?;
    if tag == DictionaryField::End {
        return Ok(None);
    }

    let mut entry = TextureEntry::default();
    while tag != DictionaryField::End {
        match tag {
            DictionaryField::GlobalIndex => {
                entry.global_index = Some(reader.read_u32::<Endian>()?);
            }
            DictionaryField::Name => {
                entry.name = String::from_utf8(read_cstr(&mut reader)?)?;
            }
            DictionaryField::Dimensions => {
                entry.width = reader.read_u32::<Endian>()?;
                entry.height = reader.read_u32::<Endian>()?;
            }
            DictionaryField::End => break,
        }
        tag = DictionaryField::try_from(reader.read_u8()?)?;
    }

    let offset = reader.read_u64::<Endian>()?;
    let size = reader.read_u64::<Endian>()?;

    Ok(Some(ArchiveRecord {
        entry,
        payload: PayloadLocation { offset, size },
    }))
}
