use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::extractor::ScrapeResult;

pub const OUTPUT_FILE: &str = "pharmacies.json";
pub const BACKUP_FILE: &str = "backup.json";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Output location for one run.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub output: PathBuf,
    pub backup: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            output: dir.join(OUTPUT_FILE),
            backup: dir.join(BACKUP_FILE),
        }
    }
}

/// Copies the previous output over the backup file. Returns whether a
/// backup was made; failures are logged and never abort the run.
pub fn backup_previous(paths: &OutputPaths) -> bool {
    if !paths.output.exists() {
        info!(path = %paths.output.display(), "no previous output to back up");
        return false;
    }

    match fs::copy(&paths.output, &paths.backup) {
        Ok(bytes) => {
            info!(path = %paths.backup.display(), bytes, "previous output backed up");
            true
        }
        Err(err) => {
            warn!(
                error = %err,
                from = %paths.output.display(),
                to = %paths.backup.display(),
                "backup failed, continuing"
            );
            false
        }
    }
}

/// Writes `value` as indented UTF-8 JSON, creating the parent directory.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let write_err = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n").map_err(write_err)?;
    writer.flush().map_err(write_err)?;
    Ok(())
}

/// Backs up the previous document, then replaces it with `result`.
pub fn save(paths: &OutputPaths, result: &ScrapeResult) -> Result<(), StorageError> {
    backup_previous(paths);
    write_json(&paths.output, result)?;
    info!(
        path = %paths.output.display(),
        pharmacies = result.pharmacy_count(),
        "document written"
    );
    Ok(())
}
