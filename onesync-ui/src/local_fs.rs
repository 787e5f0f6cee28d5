use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use onesync_core::ModificationTime;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum CopyError {
    #[error("Source file does not exist: {}", .0.display())]
    SourceMissing(PathBuf),
    #[error("Destination folder does not exist: {}", .0.display())]
    DestinationMissing(PathBuf),
    #[error("Failed to copy file: {0}")]
    Io(#[from] io::Error),
}

/// Modification time of `path` in the local timezone.
pub fn local_modification_time(path: &Path) -> ModificationTime {
    let modified = match fs::metadata(path).and_then(|meta| meta.modified()) {
        Ok(modified) => modified,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "Local file not found");
            return ModificationTime::FileNotFound;
        }
        Err(err) => {
            error!(path = %path.display(), error = %err, "Error getting local file modification date");
            return ModificationTime::FileNotFound;
        }
    };
    let local = ModificationTime::At(DateTime::<Local>::from(modified).fixed_offset());
    info!(%local, "Local file date");
    local
}

/// Copies `source` to `destination_folder/file_name`, overwriting, and
/// carries over permissions and access/modification times.
pub fn copy_to_folder(
    source: &Path,
    destination_folder: &Path,
    file_name: &str,
) -> Result<PathBuf, CopyError> {
    if !source.exists() {
        return Err(CopyError::SourceMissing(source.to_path_buf()));
    }
    if !destination_folder.exists() {
        return Err(CopyError::DestinationMissing(
            destination_folder.to_path_buf(),
        ));
    }

    let destination = destination_folder.join(file_name);
    if is_same_file(source, &destination) {
        return Err(CopyError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} and {} are the same file", source.display(), destination.display()),
        )));
    }
    let metadata = fs::metadata(source)?;
    let mut times = FileTimes::new().set_modified(metadata.modified()?);
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }

    let mut input = File::open(source)?;
    let mut output = File::create(&destination)?;
    io::copy(&mut input, &mut output)?;
    output.sync_all()?;
    output.set_times(times)?;
    drop(output);
    fs::set_permissions(&destination, metadata.permissions())?;

    info!(
        source = %source.display(),
        destination = %destination.display(),
        "Copied file"
    );
    Ok(destination)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
