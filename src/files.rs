use crate::error::{AnokyeError, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `target` with `content` through a temp file in the same directory.
pub fn write_atomic(target: &Path, content: &str) -> Result<()> {
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(target).map_err(|e| {
        AnokyeError::Io(std::io::Error::new(
            e.error.kind(),
            format!("failed to write {}: {}", target.display(), e.error),
        ))
    })?;
    Ok(())
}

/// Pretty JSON with a trailing newline, as checked into `.github/`.
pub fn write_json<T: Serialize + ?Sized>(target: &Path, value: &T) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    write_atomic(target, &content)
}
