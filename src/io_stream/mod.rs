//! Streaming archive engine: writer and reader.
//!
//! # Writer
//! [`PvmxWriter`] writes the header on construction, then one dictionary
//! record per [`add_entry`](PvmxWriter::add_entry) call.  Every record ends
//! with a zeroed 16-byte locator whose absolute position is remembered.
//! Payloads are streamed into the data section afterwards, keyed by texture
//! name: the first payload supplied for a name wins and later entries with
//! the same name share it.  [`finalize`](PvmxWriter::finalize) seeks back
//! and patches every locator.
//!
//! # Reader
//! [`PvmxReader`] validates the header and reads the entire dictionary up
//! front.  Payload bytes are only touched on request, by seeking to the
//! record's offset and copying in bounded chunks.
//!
//! # Layout
//! ```text
//! "PVMX" | version u8 | record* | 0x00 | payload*
//! ```
//! The data section has no padding; each new payload starts where the
//! previous one ended.

use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom, Write};
use tracing::{debug, trace};

use crate::error::{PvmxError, Result};
use crate::header::{Header, HEADER_SIZE};
use crate::record::{
    read_record, write_fields, write_locator, ArchiveRecord, DictionaryField, PayloadLocation,
    TextureEntry, LOCATOR_SIZE,
};
use crate::wire::{copy_exact, copy_to_end, CopyError};

/// Default copy buffer: 4 KiB.  Not part of the format.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;
/// Smallest possible archive: header plus an empty dictionary.
pub const EMPTY_ARCHIVE_SIZE: u64 = HEADER_SIZE + 1;

// ── Writer ───────────────────────────────────────────────────────────────────

pub struct PvmxWriter<W: Write + Seek> {
    writer:          W,
    pub header:      Header,

    /// Name of each dictionary entry, by position.
    names:           Vec<String>,
    /// Absolute position of each entry's reserved locator, by position.
    reservations:    Vec<u64>,
    /// Payloads already in the data section, keyed by texture name.
    payloads:        HashMap<String, PayloadLocation>,
    dictionary_open: bool,
    /// Bytes written so far.  The stream is only seeked by `finalize`.
    position:        u64,

    buffer:          Vec<u8>,
    /// Scratch space for encoding one dictionary record.
    record:          Vec<u8>,
}

impl<W: Write + Seek> PvmxWriter<W> {
    pub fn new(writer: W) -> Result<Self> {
        Self::with_chunk_size(writer, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(mut writer: W, chunk_size: usize) -> Result<Self> {
        let header = Header::new();
        writer.seek(SeekFrom::Start(0))?;
        header.write(&mut writer)?;
        Ok(Self {
            writer,
            header,
            names:           Vec::new(),
            reservations:    Vec::new(),
            payloads:        HashMap::new(),
            dictionary_open: true,
            position:        HEADER_SIZE,
            buffer:          vec![0u8; chunk_size.max(1)],
            record:          Vec::new(),
        })
    }

    // ── Dictionary ──────────────────────────────────────────────────────────

    /// Append a dictionary record for `entry` with a placeholder locator.
    ///
    /// Returns the entry's position.
    pub fn add_entry(&mut self, entry: &TextureEntry) -> Result<usize> {
        if !self.dictionary_open {
            return Err(PvmxError::DictionaryClosed);
        }

        self.record.clear();
        write_fields(&mut self.record, entry)?;
        self.writer.write_all(&self.record)?;
        self.position += self.record.len() as u64;

        let reservation = self.position;
        write_locator(&mut self.writer, PayloadLocation::default())?;
        self.position += LOCATOR_SIZE;

        let position = self.names.len();
        trace!(position, name = %entry.name, reservation, "dictionary record");
        self.names.push(entry.name.clone());
        self.reservations.push(reservation);
        Ok(position)
    }

    /// Write the dictionary terminator.  Idempotent; called implicitly by the
    /// first payload and by `finalize`.
    pub fn end_dictionary(&mut self) -> Result<()> {
        if self.dictionary_open {
            self.writer.write_all(&[DictionaryField::End as u8])?;
            self.position += 1;
            self.dictionary_open = false;
            debug!(entries = self.names.len(), "dictionary closed");
        }
        Ok(())
    }

    pub fn entry_count(&self) -> usize {
        self.names.len()
    }

    /// Names in dictionary order, duplicates included.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    // ── Data section ────────────────────────────────────────────────────────

    pub fn has_payload(&self, name: &str) -> bool {
        self.payloads.contains_key(name)
    }

    pub fn payload(&self, name: &str) -> Option<PayloadLocation> {
        self.payloads.get(name).copied()
    }

    /// Number of distinct payloads written so far.
    pub fn payload_count(&self) -> usize {
        self.payloads.len()
    }

    /// Stream `source` into the data section as the payload for `name`.
    ///
    /// If `name` already has a payload, `source` is not read and the existing
    /// location is returned.
    pub fn add_payload<R: Read>(&mut self, name: &str, source: R) -> Result<PayloadLocation> {
        if let Some(&existing) = self.payloads.get(name) {
            debug!(name, offset = existing.offset, "payload already stored; deduplicated");
            return Ok(existing);
        }

        self.end_dictionary()?;

        let offset = self.position;
        let size = copy_to_end(source, &mut self.writer, &mut self.buffer).map_err(|e| match e {
            CopyError::Read(source) => PvmxError::PayloadSource { name: name.to_owned(), source },
            CopyError::Write(e)     => PvmxError::Io(e),
        })?;
        self.position += size;
        let loc = PayloadLocation { offset, size };

        debug!(name, offset, size, "payload stored");
        self.payloads.insert(name.to_owned(), loc);
        Ok(loc)
    }

    // ── Finalization ─────────────────────────────────────────────────────────

    /// Patch every reserved locator, then return the underlying writer
    /// positioned at the end of the archive.
    ///
    /// Fails if any entry's name never received a payload.
    pub fn finalize(mut self) -> Result<W> {
        self.end_dictionary()?;
        let end = self.position;

        for (position, (name, &reservation)) in self.names.iter().zip(&self.reservations).enumerate() {
            let loc = *self.payloads.get(name).ok_or_else(|| PvmxError::MissingPayload {
                position,
                name: name.clone(),
            })?;
            self.writer.seek(SeekFrom::Start(reservation))?;
            write_locator(&mut self.writer, loc)?;
        }

        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

// ── Reader ───────────────────────────────────────────────────────────────────

pub struct PvmxReader<R: Read + Seek> {
    reader:          R,
    pub header:      Header,
    pub records:     Vec<ArchiveRecord>,
    /// Offset of the first byte after the dictionary terminator.
    pub data_offset: u64,
    buffer:          Vec<u8>,
}

impl<R: Read + Seek> PvmxReader<R> {
    pub fn new(reader: R) -> Result<Self> {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// Open an archive: validate the header and read the whole dictionary.
    pub fn with_chunk_size(mut reader: R, chunk_size: usize) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = Header::read(&mut reader)?;

        let mut records = Vec::new();
        while let Some(record) = read_record(&mut reader)? {
            trace!(
                position = records.len(),
                name = %record.entry.name,
                offset = record.payload.offset,
                size = record.payload.size,
                "dictionary record"
            );
            records.push(record);
        }
        let data_offset = reader.stream_position()?;
        debug!(records = records.len(), data_offset, "dictionary read");

        Ok(Self {
            reader,
            header,
            records,
            data_offset,
            buffer: vec![0u8; chunk_size.max(1)],
        })
    }

    pub fn records(&self) -> &[ArchiveRecord] {
        &self.records
    }

    pub fn entries(&self) -> impl Iterator<Item = &TextureEntry> {
        self.records.iter().map(|r| &r.entry)
    }

    /// Copy the bytes at `loc` into `out`.
    ///
    /// Failures writing to `out` are [`PvmxError::PayloadSink`]; everything
    /// else concerns the archive.
    pub fn copy_payload<W: Write>(&mut self, loc: PayloadLocation, out: W) -> Result<()> {
        self.reader.seek(SeekFrom::Start(loc.offset))?;
        copy_exact(&mut self.reader, out, loc.size, &mut self.buffer).map_err(|e| match e {
            CopyError::Read(e) if e.kind() == io::ErrorKind::UnexpectedEof => PvmxError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("payload {}..{} runs past the end of the archive", loc.offset, loc.end()),
            )),
            CopyError::Read(e)       => PvmxError::Io(e),
            CopyError::Write(source) => PvmxError::PayloadSink { source },
        })
    }

    /// Return the payload at `loc` as a buffer.
    pub fn read_payload(&mut self, loc: PayloadLocation) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(loc.size.min(1 << 20) as usize);
        self.copy_payload(loc, &mut out)?;
        Ok(out)
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> std::fmt::Debug for PvmxReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PvmxReader")
            .field("header", &self.header)
            .field("records", &self.records.len())
            .field("data_offset", &self.data_offset)
            .finish()
    }
}
