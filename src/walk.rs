//! Source tree enumeration.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::ConfigError;

/// One file to upload into a destination folder. Immutable once
/// enumerated; consumed exactly once by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub local_path: PathBuf,
    pub destination_folder_id: String,
}

fn should_skip(name: &str) -> bool {
    name.is_empty() || name.starts_with(".DS_Store")
}

/// Walks `root` and returns one task per regular file, in lexical entry
/// order per directory. Symlinks are not followed. File contents are
/// never read.
pub fn enumerate_tasks(
    root: &Path,
    destination_folder_id: &str,
) -> Result<Vec<UploadTask>, ConfigError> {
    if !root.is_dir() {
        return Err(ConfigError::InvalidSourceRoot(root.to_path_buf()));
    }

    let mut tasks = Vec::new();
    visit_dir(root, destination_folder_id, &mut tasks)?;
    info!(
        count = tasks.len(),
        root = %root.display(),
        "enumerated upload tasks"
    );
    Ok(tasks)
}

fn visit_dir(
    dir: &Path,
    destination_folder_id: &str,
    tasks: &mut Vec<UploadTask>,
) -> Result<(), ConfigError> {
    let read_err = |source| ConfigError::UnreadableSourceDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = fs::read_dir(dir)
        .map_err(read_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_err)?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        // file_type() does not traverse symlinks, so links are skipped
        // rather than followed.
        let file_type = entry.file_type().map_err(|source| {
            ConfigError::UnreadableSourceDir {
                path: path.clone(),
                source,
            }
        })?;
        if file_type.is_symlink() {
            debug!(path = %path.display(), "skipping symlink");
            continue;
        }
        if file_type.is_dir() {
            visit_dir(&path, destination_folder_id, tasks)?;
        } else if file_type.is_file() {
            let name = entry.file_name();
            if should_skip(&name.to_string_lossy()) {
                debug!(path = %path.display(), "skipping file");
                continue;
            }
            tasks.push(UploadTask {
                local_path: path,
                destination_folder_id: destination_folder_id.to_string(),
            });
        }
    }
    Ok(())
}
