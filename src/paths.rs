//! Default input/output locations and safe name joining.

use std::path::{Component, Path, PathBuf};

use crate::error::{PathContext, PvmxError, Result};
use crate::index::INDEX_FILE_NAME;

/// Archive file extension, without the dot.
pub const ARCHIVE_EXTENSION: &str = "pvmx";

/// A pack input may name the index file itself or the directory holding
/// `index.txt`.
pub fn resolve_index_path(input: &Path) -> Result<PathBuf> {
    if input.as_os_str().is_empty() {
        return Err(PvmxError::EmptyPath("Input"));
    }
    let index = if input.is_dir() { input.join(INDEX_FILE_NAME) } else { input.to_owned() };
    if !index.is_file() {
        return Err(PvmxError::NotFound(index));
    }
    Ok(index)
}

/// Directory the index's texture names are relative to.
pub fn texture_root(index_path: &Path) -> PathBuf {
    match index_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_owned(),
        _ => PathBuf::from("."),
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }
    let cwd = std::env::current_dir().with_path(Path::new("."))?;
    Ok(cwd.join(path))
}

/// `textures/mypack/index.txt` → `textures/mypack.pvmx`, next to the pack
/// directory.
pub fn default_archive_path(index_path: &Path) -> Result<PathBuf> {
    let index_path = absolute(index_path)?;
    let pack_dir = normalize(index_path.parent().unwrap_or(Path::new("/")));
    let name = pack_dir
        .file_name()
        .ok_or_else(|| PvmxError::NotFound(pack_dir.clone()))?;
    let parent = pack_dir.parent().unwrap_or(&pack_dir);

    let mut file_name = name.to_owned();
    file_name.push(".");
    file_name.push(ARCHIVE_EXTENSION);
    Ok(parent.join(file_name))
}

/// `mods/mypack.pvmx` → `mods/mypack/`.
pub fn default_extract_dir(archive_path: &Path) -> Result<PathBuf> {
    if archive_path.as_os_str().is_empty() {
        return Err(PvmxError::EmptyPath("Input"));
    }
    let archive_path = normalize(&absolute(archive_path)?);
    let stem = archive_path
        .file_stem()
        .ok_or_else(|| PvmxError::NotFound(archive_path.clone()))?;
    let dir = archive_path.parent().unwrap_or(Path::new("/"));
    Ok(dir.join(stem))
}

/// Create `dir` (and missing parents) unless it already exists.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        std::fs::create_dir_all(dir).with_path(dir)?;
    }
    Ok(())
}

/// Join a record name under `root`, refusing names that would land outside.
pub fn join_entry(root: &Path, name: &str) -> Result<PathBuf> {
    let rel = Path::new(name);
    let escapes = rel.components().any(|c| {
        matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
    });
    if name.is_empty() || escapes {
        return Err(PvmxError::UnsafeName(name.to_owned()));
    }
    Ok(root.join(rel))
}

/// Lexically drop `.` components and resolve `..` against earlier ones.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in path.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(c);
                }
            }
            other => out.push(other),
        }
    }
    out
}
