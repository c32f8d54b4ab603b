use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use thiserror::Error;

pub const MAGIC: &[u8; 4] = b"PVMX";
pub const VERSION: u8 = 1;
/// Bytes occupied by the header; the dictionary starts here.
pub const HEADER_SIZE: u64 = 5;

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("File is not a PVMX archive (magic {0:02x?})")]
    InvalidMagic([u8; 4]),
    #[error("Incorrect PVMX archive version: {0} (expected {VERSION})")]
    UnsupportedVersion(u8),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 4],
    pub version: u8,
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

impl Header {
    pub fn new() -> Self {
        Self {
            magic: *MAGIC,
            version: VERSION,
        }
    }
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_u8(self.version)?;
        Ok(())
    }
    pub fn read<R: Read>(mut reader: R) -> Result<Self, HeaderError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(HeaderError::InvalidMagic(magic));
        }
        let version = reader.read_u8()?;
        if version != VERSION {
            return Err(HeaderError::UnsupportedVersion(version));
        }
        Ok(Self { magic, version })
    }
}
