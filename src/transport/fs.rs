use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Create the parent directory of `path` when it has one.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Sibling path used while `path` is being written, e.g. `data.csv` -> `data.csv.part`.
pub fn staging_path(path: &Path, extension: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(OsString::new);
    name.push(".");
    name.push(extension);
    path.with_file_name(name)
}

/// Write `bytes` to `path` through a staging sibling, then rename into place.
///
/// Readers observe either the previous file or the complete new one. On
/// failure the staging file is removed and any previous file is untouched.
pub fn write_atomic(path: &Path, bytes: &[u8], staging_extension: &str) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let staging = staging_path(path, staging_extension);
    let result = write_and_sync(&staging, bytes).and_then(|()| fs::rename(&staging, path));
    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
