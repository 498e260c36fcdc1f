use std::path::{Path, PathBuf};

use tokio::fs;

use crate::FlowError;

/// Canonicalizes and checks the existence of a path. Also adds on better
/// information to errors.
///
/// Note: this does not prevent TOCTOU bugs.
pub async fn acquire_path(path_str: impl AsRef<Path>) -> Result<PathBuf, FlowError> {
    // note: we don't need fs::try_exists because the canonicalization deals with
    // testing for existence and the symbolic links
    let path = path_str.as_ref();
    let canonical = fs::canonicalize(path)
        .await
        .map_err(|e| FlowError::io(format!("acquire_path(path_str: {path:?})"), e))?;
    // avoids `\\?\` UNC paths on Windows, which docker does not understand
    Ok(dunce::simplified(&canonical).to_owned())
}

/// Canonicalizes and checks the existence of a file path
pub async fn acquire_file_path(file_path_str: impl AsRef<Path>) -> Result<PathBuf, FlowError> {
    let file_path_str = file_path_str.as_ref();
    let path = acquire_path(file_path_str).await?;
    if path.is_file() {
        Ok(path)
    } else {
        Err(FlowError::io(
            format!("acquire_file_path(file_path_str: {file_path_str:?}) -> is not a file"),
            std::io::Error::other("not a file"),
        ))
    }
}

/// Canonicalizes and checks the existence of a directory path
pub async fn acquire_dir_path(dir_path_str: impl AsRef<Path>) -> Result<PathBuf, FlowError> {
    let dir_path_str = dir_path_str.as_ref();
    let path = acquire_path(dir_path_str).await?;
    if path.is_dir() {
        Ok(path)
    } else {
        Err(FlowError::io(
            format!("acquire_dir_path(dir_path_str: {dir_path_str:?}) -> is not a directory"),
            std::io::Error::other("not a directory"),
        ))
    }
}

/// Returns if anything exists at `path`, propagating permission errors
/// instead of treating them as absence
pub async fn path_exists(path: impl AsRef<Path>) -> Result<bool, FlowError> {
    let path = path.as_ref();
    fs::try_exists(path)
        .await
        .map_err(|e| FlowError::io(format!("could not check existence of {path:?}"), e))
}

/// Creates the parent directory of `file_path` (and its ancestors) if it is
/// missing. Every routine that writes a host file goes through this.
pub async fn ensure_parent_dir(file_path: impl AsRef<Path>) -> Result<(), FlowError> {
    let file_path = file_path.as_ref();
    match file_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            if !path_exists(dir).await? {
                tracing::debug!("creating directory {dir:?}");
            }
            fs::create_dir_all(dir)
                .await
                .map_err(|e| FlowError::io(format!("could not create directory {dir:?}"), e))
        }
        // relative file name in the current directory
        _ => Ok(()),
    }
}
