//! Atomic file replacement for fetched artifacts

use modsmith_core::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

/// Write `content` to a sibling temporary file, then rename it over `path`
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::configuration(format!("'{}' has no parent directory", path.display())))?;

    fs::create_dir_all(parent)
        .map_err(|e| Error::file_system(parent, "create parent directory", e))?;

    let part = parent.join(format!(".{}.part", Uuid::new_v4()));
    if let Err(e) = write_synced(&part, content).and_then(|()| {
        fs::rename(&part, path).map_err(|e| Error::file_system(path, "rename into place", e))
    }) {
        let _ = fs::remove_file(&part);
        return Err(e);
    }
    Ok(())
}

fn write_synced(part: &Path, content: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(part)
        .map_err(|e| Error::file_system(part, "create partial file", e))?;
    file.write_all(content)
        .map_err(|e| Error::file_system(part, "write partial file", e))?;
    file.sync_all()
        .map_err(|e| Error::file_system(part, "sync partial file", e))
}
