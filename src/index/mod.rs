//! Text index: the human-editable manifest of a texture pack.
//!
//! One texture per line:
//!
//! ```text
//! # comment
//! <gbix>,<name>[,<W>x<H>]
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.  Names are taken
//! verbatim between commas; numbers may carry surrounding ASCII whitespace.
//! Any malformed line aborts the whole parse with its 1-based line number.

use std::io::{self, BufRead, Write};
use std::num::ParseIntError;
use thiserror::Error;
use tracing::trace;

use crate::record::TextureEntry;

/// File name of the index inside a texture pack directory.
pub const INDEX_FILE_NAME: &str = "index.txt";

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Invalid texture index entry on line {line} (missing comma?)")]
    MissingComma { line: usize },
    #[error("Invalid global index on line {line}: {value:?} ({source})")]
    InvalidGlobalIndex {
        line:   usize,
        value:  String,
        source: ParseIntError,
    },
    #[error("Invalid format for texture dimensions on line {line}: {value}")]
    InvalidDimensions { line: usize, value: String },
    #[error("Invalid texture dimension on line {line}: {value:?} ({source})")]
    InvalidDimensionValue {
        line:   usize,
        value:  String,
        source: ParseIntError,
    },
    #[error("Texture index line {line} is not valid UTF-8")]
    InvalidUtf8 { line: usize },
    #[error("IO error reading texture index: {0}")]
    Io(#[from] io::Error),
}

// ── Parsing ──────────────────────────────────────────────────────────────────

/// Parse a single line.  `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str, line_number: usize) -> Result<Option<TextureEntry>, IndexError> {
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let comma = match line.find(',') {
        Some(pos) if pos > 0 => pos,
        _ => return Err(IndexError::MissingComma { line: line_number }),
    };

    let gbix_text = trim_number(&line[..comma]);
    let global_index = gbix_text.parse::<u32>().map_err(|source| IndexError::InvalidGlobalIndex {
        line: line_number,
        value: gbix_text.to_owned(),
        source,
    })?;

    let rest = &line[comma + 1..];
    let (name, dimensions) = match rest.split_once(',') {
        Some((name, dims)) => (name, Some(dims)),
        None               => (rest, None),
    };

    let mut entry = TextureEntry::new(global_index, name);
    if let Some(dims) = dimensions {
        let (width, height) = parse_dimensions(dims, line_number)?;
        entry = entry.with_dimensions(width, height);
    }
    Ok(Some(entry))
}

/// `<W>x<H>` or `<W>X<H>`.  A separator in first position counts as missing.
fn parse_dimensions(token: &str, line_number: usize) -> Result<(u32, u32), IndexError> {
    let separator = ['x', 'X']
        .into_iter()
        .filter_map(|c| token.find(c))
        .find(|&pos| pos > 0)
        .ok_or_else(|| IndexError::InvalidDimensions {
            line:  line_number,
            value: token.to_owned(),
        })?;

    let number = |text: &str| {
        let text = trim_number(text);
        text.parse::<u32>().map_err(|source| IndexError::InvalidDimensionValue {
            line: line_number,
            value: text.to_owned(),
            source,
        })
    };

    Ok((number(&token[..separator])?, number(&token[separator + 1..])?))
}

fn trim_number(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_ascii_whitespace())
}

/// Parse a whole index.  Nothing is returned unless every line is valid.
///
/// Lines end at `\n`; a trailing `\r` is dropped.
pub fn parse_index<R: BufRead>(reader: R) -> Result<Vec<TextureEntry>, IndexError> {
    let mut entries = Vec::new();
    for (i, line) in reader.split(b'\n').enumerate() {
        let line_number = i + 1;
        let mut bytes = line?;
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        let line = String::from_utf8(bytes)
            .map_err(|_| IndexError::InvalidUtf8 { line: line_number })?;
        if let Some(entry) = parse_line(&line, line_number)? {
            trace!(line = line_number, name = %entry.name, "parsed index entry");
            entries.push(entry);
        }
    }
    Ok(entries)
}

/// True when `name` survives a trip through an index line unchanged.
pub fn is_indexable_name(name: &str) -> bool {
    !name.contains([',', '\n', '\r'])
}

// ── Writing ──────────────────────────────────────────────────────────────────

/// Write one line per entry, in order.
pub fn write_index<'a, W, I>(mut writer: W, entries: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a TextureEntry>,
{
    for entry in entries {
        writeln!(writer, "{entry}")?;
    }
    writer.flush()
}
