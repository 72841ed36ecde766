//! Storage operations
//!
//! Filesystem work behind DELE and LIST.

use chrono::{DateTime, Duration as ChronoDuration, Local};
use log::{error, info, warn};
use std::fs::{self, Metadata};
use std::path::Path;

use crate::error::StorageError;

/// Deletes a single file.
///
/// Directories are refused with `StorageError::Io` rather than removed.
pub fn delete_file(path: &Path) -> Result<(), StorageError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(_) => return Err(StorageError::NotFound(path.to_path_buf())),
    };

    if metadata.is_dir() {
        return Err(StorageError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::Other, "path is a directory"),
        ));
    }

    fs::remove_file(path).map_err(|e| {
        error!("Failed to delete file {}: {}", path.display(), e);
        StorageError::io(path, e)
    })?;

    info!("Deleted file {}", path.display());
    Ok(())
}

/// Builds the listing lines for `path`.
///
/// A directory yields one line per entry, sorted by name. A file yields a
/// single line describing itself.
pub fn list_target(path: &Path) -> Result<Vec<String>, StorageError> {
    let metadata = fs::metadata(path).map_err(|_| StorageError::NotFound(path.to_path_buf()))?;
    let now = Local::now();

    if !metadata.is_dir() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        return Ok(vec![format_entry(&name, &metadata, now)]);
    }

    let mut entries = fs::read_dir(path)
        .map_err(|e| StorageError::io(path, e))?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", path.display(), e);
                None
            }
        })
        .collect::<Vec<_>>();
    entries.sort_by_key(|entry| entry.file_name());

    let mut lines = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        match entry.metadata() {
            Ok(metadata) => lines.push(format_entry(&name, &metadata, now)),
            Err(e) => warn!("Failed to stat {}: {}", entry.path().display(), e),
        }
    }

    info!("Listed {} - {} entries", path.display(), lines.len());
    Ok(lines)
}

/// Formats one `ls -l` style line, without the CRLF terminator.
pub fn format_entry(name: &str, metadata: &Metadata, now: DateTime<Local>) -> String {
    let size = metadata.len();
    let modified = metadata
        .modified()
        .map(DateTime::<Local>::from)
        .unwrap_or(now);

    format!(
        "{} {:>3} {:<8} {:<8} {:>12} {} {}",
        mode_string(metadata),
        link_count(metadata),
        owner(metadata),
        group(metadata),
        size,
        listing_date(modified, now),
        name
    )
}

/// Recent files show the time of day, older ones the year.
fn listing_date(modified: DateTime<Local>, now: DateTime<Local>) -> String {
    let six_months = ChronoDuration::days(182);
    if modified > now - six_months && modified <= now + ChronoDuration::hours(1) {
        modified.format("%b %e %H:%M").to_string()
    } else {
        modified.format("%b %e  %Y").to_string()
    }
}

fn mode_string(metadata: &Metadata) -> String {
    let kind = if metadata.is_dir() {
        'd'
    } else if metadata.file_type().is_symlink() {
        'l'
    } else {
        '-'
    };

    let bits = permission_bits(metadata);
    let mut out = String::with_capacity(10);
    out.push(kind);
    for shift in [6u32, 3, 0] {
        let triplet = (bits >> shift) & 0o7;
        out.push(if triplet & 0o4 != 0 { 'r' } else { '-' });
        out.push(if triplet & 0o2 != 0 { 'w' } else { '-' });
        out.push(if triplet & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata) -> u32 {
    match (metadata.is_dir(), metadata.permissions().readonly()) {
        (true, _) => 0o755,
        (false, true) => 0o444,
        (false, false) => 0o644,
    }
}

#[cfg(unix)]
fn link_count(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.nlink()
}

#[cfg(not(unix))]
fn link_count(_metadata: &Metadata) -> u64 {
    1
}

#[cfg(unix)]
fn owner(metadata: &Metadata) -> String {
    use std::os::unix::fs::MetadataExt;
    metadata.uid().to_string()
}

#[cfg(not(unix))]
fn owner(_metadata: &Metadata) -> String {
    "owner".to_string()
}

#[cfg(unix)]
fn group(metadata: &Metadata) -> String {
    use std::os::unix::fs::MetadataExt;
    metadata.gid().to_string()
}

#[cfg(not(unix))]
fn group(_metadata: &Metadata) -> String {
    "group".to_string()
}
