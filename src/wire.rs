//! Binary primitives shared by the header, dictionary and data section.
//!
//! # Endianness
//! Every fixed-width integer in a PVMX archive is stored in the byte order
//! of the host that wrote it, with no alignment padding.  [`Endian`] is the
//! single alias used for all `byteorder` calls so the choice lives in one
//! place.
//!
//! # Strings
//! Names are stored as raw UTF-8 followed by a single `0x00` byte.  The
//! terminator is consumed on read and never part of the returned value.
//!
//! # Copies
//! Payloads move in bounded chunks.  The copy helpers report which side
//! failed so callers can name the right file in diagnostics.

use byteorder::{NativeEndian, ReadBytesExt};
use std::io::{self, Read, Write};

/// Byte order of every multi-byte integer in the format.
pub type Endian = NativeEndian;

/// Write `s` followed by a single NUL byte.
///
/// The caller is responsible for rejecting strings with interior NULs;
/// such a string would be truncated on read.
pub fn write_cstr<W: Write>(mut writer: W, s: &str) -> io::Result<()> {
    writer.write_all(s.as_bytes())?;
    writer.write_all(&[0u8])
}

/// Read bytes up to (and consuming) the next NUL byte.
///
/// Hitting end-of-stream before the terminator is `UnexpectedEof`.
pub fn read_cstr<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    loop {
        match reader.read_u8()? {
            0 => return Ok(out),
            b => out.push(b),
        }
    }
}

/// Side of a chunked copy that failed.
#[derive(Debug)]
pub enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

impl From<CopyError> for io::Error {
    fn from(e: CopyError) -> Self {
        match e {
            CopyError::Read(e) | CopyError::Write(e) => e,
        }
    }
}

/// Copy everything `reader` yields into `writer`, `buf.len()` bytes at a time.
///
/// Returns the number of bytes copied.
pub fn copy_to_end<R: Read, W: Write>(mut reader: R, mut writer: W, buf: &mut [u8]) -> Result<u64, CopyError> {
    let mut total = 0u64;
    loop {
        let n = match reader.read(buf) {
            Ok(0)  => return Ok(total),
            Ok(n)  => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        writer.write_all(&buf[..n]).map_err(CopyError::Write)?;
        total += n as u64;
    }
}

/// Copy exactly `len` bytes from `reader` to `writer` in `buf.len()` chunks.
///
/// A short source is `UnexpectedEof`; whatever was copied before that point
/// has already reached `writer`.
pub fn copy_exact<R: Read, W: Write>(mut reader: R, mut writer: W, len: u64, buf: &mut [u8]) -> Result<(), CopyError> {
    let mut remaining = len;
    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        reader.read_exact(&mut buf[..want]).map_err(CopyError::Read)?;
        writer.write_all(&buf[..want]).map_err(CopyError::Write)?;
        remaining -= want as u64;
    }
    Ok(())
}
