use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::Builder;

/// Replace `path` with `data` without ever exposing a half-written file.
///
/// The bytes go to a hidden tempfile beside the target, are flushed to disk,
/// then renamed over it. Missing parent directories are created.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(dir)?;
    let mut tmp = Builder::new().prefix(".chronology-").tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
