//! Grade report persistence under an exclusive file lock.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{info, instrument};

use crate::config::program_dir;
use crate::error::PortalError;

use super::query::GradeReport;

/// File name of the grade report written next to the executable.
pub const GRADE_FILE_NAME: &str = "grade_data.json";

/// `grade_data.json` in the executable's directory.
#[must_use]
pub fn default_grade_path() -> PathBuf {
    program_dir().join(GRADE_FILE_NAME)
}

/// Writes `report` to `path` as pretty-printed JSON (2-space indent).
///
/// The file is held under an exclusive lock for the whole write and is
/// truncated only after the lock is acquired. The lock is released when the
/// file handle drops, on every return path.
///
/// # Errors
///
/// Returns [`PortalError::FileIo`] if the file cannot be opened, locked, or written.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn save_grade_to_file(report: &GradeReport, path: &Path) -> Result<(), PortalError> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| PortalError::file_io(path, e))?;
    FileExt::lock_exclusive(&file).map_err(|e| PortalError::file_io(path, e))?;
    file.set_len(0).map_err(|e| PortalError::file_io(path, e))?;

    let mut writer = BufWriter::new(&file);
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|e| PortalError::file_io(path, e.into()))?;
    writer.flush().map_err(|e| PortalError::file_io(path, e))?;
    drop(writer);

    FileExt::unlock(&file).map_err(|e| PortalError::file_io(path, e))?;
    info!(path = %path.display(), "Grade report saved");
    Ok(())
}
