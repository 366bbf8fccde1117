//! Path and fingerprint helpers.

use crate::error::Result;
use camino::{Utf8Path, Utf8PathBuf};
use std::time::UNIX_EPOCH;
use xxhash_rust::xxh3::xxh3_64;

/// Name under which an archive is registered in the game's index.
///
/// The game resolves archive names relative to its `data` directory, so this
/// is `archive` relative to `data_dir` with forward slashes (for example
/// `../mods/foo/foo.arc`). Paths are canonicalized when they exist. If the two
/// paths share no common root, the absolute archive path is returned.
pub fn archive_name_relative_to(archive: &Utf8Path, data_dir: &Utf8Path) -> String {
    let archive = absolutize(archive);
    let data_dir = absolutize(data_dir);

    let archive_parts: Vec<&str> = archive.components().map(|c| c.as_str()).collect();
    let base_parts: Vec<&str> = data_dir.components().map(|c| c.as_str()).collect();

    let common = archive_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        return archive.as_str().replace('\\', "/");
    }

    let mut parts = vec![".."; base_parts.len() - common];
    parts.extend_from_slice(&archive_parts[common..]);
    parts.join("/")
}

fn absolutize(path: &Utf8Path) -> Utf8PathBuf {
    if let Ok(canonical) = path.canonicalize_utf8() {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .ok()
        .and_then(|cwd| Utf8PathBuf::from_path_buf(cwd).ok())
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|| path.to_path_buf())
}

/// Combine fingerprint parts into one value. Order matters.
///
/// Returns `0` for no parts.
pub fn combine_fingerprints(parts: &[u64]) -> u64 {
    if parts.is_empty() {
        return 0;
    }

    let mut buf = Vec::with_capacity(parts.len() * 8);
    for part in parts {
        buf.extend_from_slice(&part.to_le_bytes());
    }
    xxh3_64(&buf)
}

/// Cheap change detector for a file: size and modification time.
///
/// Returns `0` if the file's metadata cannot be read.
pub fn file_stamp(path: &Utf8Path) -> u64 {
    let Ok(metadata) = std::fs::metadata(path) else {
        return 0;
    };
    let modified = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |duration| duration.as_nanos() as u64);

    combine_fingerprints(&[metadata.len(), modified])
}

/// Write `contents` to `path` through a sibling temp file and a rename, so a
/// reader never sees a partially written file.
pub fn write_replacing(path: &Utf8Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file_name = path.file_name().unwrap_or("output");
    let temp_path = path.with_file_name(format!("{file_name}.tmp"));
    std::fs::write(&temp_path, contents)?;
    if let Err(err) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(err.into());
    }
    Ok(())
}
