//! High-level pack / unpack / list operations over archive files.
//!
//! ```no_run
//! use pvmx::archive::{pack, unpack, PackOptions, UnpackOptions};
//! use std::path::Path;
//!
//! // Directory containing index.txt and the textures it names.
//! let packed = pack(Path::new("mypack"), None, &PackOptions::default())?;
//!
//! // Recreates mypack/ next to the archive, index.txt included.
//! unpack(&packed.archive, Some(Path::new("restored")), &UnpackOptions::default())?;
//! # Ok::<(), pvmx::PvmxError>(())
//! ```
//!
//! Every operation is fail-fast: the first error aborts it, and whatever was
//! already written stays on disk.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{PathContext, PvmxError, Result};
use crate::index::{is_indexable_name, parse_index, write_index, INDEX_FILE_NAME};
use crate::io_stream::{PvmxReader, PvmxWriter, DEFAULT_CHUNK_SIZE};
use crate::paths;
use crate::record::{ArchiveRecord, TextureEntry};

// ── Options ───────────────────────────────────────────────────────────────────

/// Configuration for [`pack`] and [`pack_entries`].
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Copy buffer size used when streaming textures into the archive.
    pub chunk_size: usize,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE }
    }
}

/// Configuration for [`unpack`] and [`unpack_to`].
#[derive(Debug, Clone)]
pub struct UnpackOptions {
    /// Copy buffer size used when streaming payloads out of the archive.
    pub chunk_size: usize,
}

impl Default for UnpackOptions {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE }
    }
}

// ── Summaries ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackSummary {
    pub archive:    PathBuf,
    /// Dictionary records written.
    pub entries:    usize,
    /// Distinct payloads stored.
    pub payloads:   usize,
    /// Size of the data section.
    pub data_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackSummary {
    pub output_dir:    PathBuf,
    pub index_path:    PathBuf,
    pub records:       usize,
    pub files_written: usize,
}

// ── Pack ──────────────────────────────────────────────────────────────────────

/// Pack the texture pack at `input` (a directory holding `index.txt`, or an
/// index file) into `output`, or next to the pack directory when `None`.
///
/// The index is parsed completely before the archive is created, so a bad
/// index never leaves an archive behind.
pub fn pack(input: &Path, output: Option<&Path>, opts: &PackOptions) -> Result<PackSummary> {
    let index_path = paths::resolve_index_path(input)?;

    let entries = {
        let file = File::open(&index_path).with_path(&index_path)?;
        parse_index(BufReader::new(file)).map_err(PvmxError::from).with_path(&index_path)?
    };
    debug!(index = %index_path.display(), entries = entries.len(), "index parsed");

    let archive = match output {
        Some(p) if p.as_os_str().is_empty() => return Err(PvmxError::EmptyPath("Output")),
        Some(p) => p.to_owned(),
        None    => paths::default_archive_path(&index_path)?,
    };
    let root = paths::texture_root(&index_path);

    let file = File::create(&archive).with_path(&archive)?;
    let (out, stats) = pack_entries(&entries, &root, BufWriter::new(file), opts).with_path(&archive)?;
    out.into_inner().map_err(|e| e.into_error()).with_path(&archive)?;

    let summary = PackSummary { archive, ..stats };
    info!(
        archive = %summary.archive.display(),
        entries = summary.entries,
        payloads = summary.payloads,
        data_bytes = summary.data_bytes,
        "archive created"
    );
    Ok(summary)
}

/// Write an archive for `entries` into `out`, reading each distinct texture
/// name from `root`.
///
/// Returns the finalized writer and a summary whose `archive` path is empty.
/// Errors opening or reading a texture name the texture's path; bare IO
/// errors concern `out`.
pub fn pack_entries<W: Write + Seek>(
    entries: &[TextureEntry],
    root:    &Path,
    out:     W,
    opts:    &PackOptions,
) -> Result<(W, PackSummary)> {
    let mut writer = PvmxWriter::with_chunk_size(out, opts.chunk_size)?;

    for entry in entries {
        writer.add_entry(entry)?;
    }
    writer.end_dictionary()?;

    let mut data_bytes = 0u64;
    for entry in entries {
        if writer.has_payload(&entry.name) {
            continue;
        }
        let path = root.join(&entry.name);
        let texture = File::open(&path).with_path(&path)?;
        let loc = writer.add_payload(&entry.name, texture).map_err(|e| match e {
            PvmxError::PayloadSource { source, .. } => PvmxError::Path { path: path.clone(), source },
            other                                   => other,
        })?;
        data_bytes += loc.size;
    }

    let summary = PackSummary {
        archive:    PathBuf::new(),
        entries:    writer.entry_count(),
        payloads:   writer.payload_count(),
        data_bytes,
    };
    Ok((writer.finalize()?, summary))
}

// ── Unpack ────────────────────────────────────────────────────────────────────

/// Extract `input` into `output`, or into a directory named after the
/// archive when `None`.
///
/// The header and dictionary are validated before anything is created.
pub fn unpack(input: &Path, output: Option<&Path>, opts: &UnpackOptions) -> Result<UnpackSummary> {
    if input.as_os_str().is_empty() {
        return Err(PvmxError::EmptyPath("Input"));
    }
    let file = File::open(input).with_path(input)?;
    let mut reader = PvmxReader::with_chunk_size(BufReader::new(file), opts.chunk_size).with_path(input)?;

    let output_dir = match output {
        Some(p) if p.as_os_str().is_empty() => return Err(PvmxError::EmptyPath("Output")),
        Some(p) => p.to_owned(),
        None    => paths::default_extract_dir(input)?,
    };

    let summary = unpack_to(&mut reader, &output_dir).with_path(input)?;
    info!(
        output = %summary.output_dir.display(),
        records = summary.records,
        files = summary.files_written,
        "archive extracted"
    );
    Ok(summary)
}

/// Write `index.txt` and every payload of an opened archive under `output_dir`.
///
/// A name shared by several records is written once.  Names that would not
/// read back from `index.txt` are refused before anything is created.
pub fn unpack_to<R: Read + Seek>(reader: &mut PvmxReader<R>, output_dir: &Path) -> Result<UnpackSummary> {
    if let Some(entry) = reader.entries().find(|e| !is_indexable_name(&e.name)) {
        return Err(PvmxError::UnindexableName(entry.name.clone()));
    }
    paths::ensure_dir(output_dir)?;

    let index_path = output_dir.join(INDEX_FILE_NAME);
    {
        let file = File::create(&index_path).with_path(&index_path)?;
        write_index(BufWriter::new(file), reader.entries()).with_path(&index_path)?;
    }

    let records = reader.records.clone();
    let mut written: HashSet<&str> = HashSet::new();

    for record in &records {
        let name = record.entry.name.as_str();
        if !written.insert(name) {
            debug!(name, "duplicate texture name; already extracted");
            continue;
        }

        info!("Extracting: {name}");
        let path = paths::join_entry(output_dir, name)?;
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }

        let file = File::create(&path).with_path(&path)?;
        let mut out = BufWriter::new(file);
        reader.copy_payload(record.payload, &mut out).map_err(|e| match e {
            PvmxError::PayloadSink { source } => PvmxError::Path { path: path.clone(), source },
            other                             => other,
        })?;
        out.flush().with_path(&path)?;
    }

    Ok(UnpackSummary {
        output_dir:    output_dir.to_owned(),
        index_path,
        records:       records.len(),
        files_written: written.len(),
    })
}

// ── List ──────────────────────────────────────────────────────────────────────

/// Read the dictionary of `input` without touching payload bytes.
pub fn list(input: &Path) -> Result<Vec<ArchiveRecord>> {
    if input.as_os_str().is_empty() {
        return Err(PvmxError::EmptyPath("Input"));
    }
    let file = File::open(input).with_path(input)?;
    let reader = PvmxReader::new(BufReader::new(file)).with_path(input)?;
    Ok(reader.records)
}
