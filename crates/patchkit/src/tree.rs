//! Working tree checksums.
//!
//! Dry-run checks must never touch the tree. [`checksum`] hashes every file
//! path and its contents so callers can verify that.

use crate::error::Result;
use blake3::Hasher;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use walkdir::WalkDir;

/// BLAKE3 digest over all files below `root` (the `.git` directory excluded).
///
/// Entries are visited in file-name order so the digest only depends on
/// content and layout.
pub fn checksum(root: &Path) -> Result<blake3::Hash> {
    let mut hasher = Hasher::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(|e| {
            e.into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        hasher.update(relative.to_string_lossy().as_bytes());
        hasher.update(&[0]);

        let mut reader = BufReader::new(File::open(entry.path())?);
        let mut buffer = [0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
        hasher.update(&[0]);
    }

    Ok(hasher.finalize())
}
