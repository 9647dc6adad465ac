//! File-system chores around the pipeline: archiving processed sources.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::PipelineResult;

/// Move `source` into `archive_dir`, keeping its file name, and return the destination.
///
/// The archive directory is created if missing. A plain rename is tried first; if that fails
/// because the archive is on another device, the file is copied and the source removed.
/// An existing file at the destination is replaced.
pub fn archive_file(source: &Path, archive_dir: &Path) -> PipelineResult<PathBuf> {
    fs::create_dir_all(archive_dir)?;
    let name = source.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cannot archive path without a file name: {}", source.display()),
        )
    })?;
    let dest = archive_dir.join(name);

    if fs::rename(source, &dest).is_err() {
        fs::copy(source, &dest)?;
        fs::remove_file(source)?;
    }
    Ok(dest)
}
