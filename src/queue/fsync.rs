//! Low-level fsync operations for durability.
//!
//! Appends and renames are only crash-safe once both the file contents and
//! the containing directory entry have been synced; on POSIX systems a
//! renamed file can revert to its old name after power loss if only the file
//! itself was fsynced.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Syncs a file's contents and metadata to disk (`fsync(2)`).
pub fn fsync_file(file: &File) -> io::Result<()> {
    file.sync_all()
}

/// Syncs a directory to disk, making creates, renames and removals durable.
pub fn fsync_dir(dir_path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(dir_path)?;
    dir.sync_all()
}
