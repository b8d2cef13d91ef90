use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("permission to access path was denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("path does not exist: {0}")]
    NotFound(PathBuf),
    #[error("path '{0}' is not a directory")]
    NotADirectory(PathBuf),
    #[error("path '{0}' is not a directory or a file")]
    NotAFileOrDirectory(PathBuf),
    #[error("could not access path {path}: {reason}")]
    Other { path: PathBuf, reason: String },
}

fn stat(path: &Path) -> Result<fs::Metadata, PathError> {
    fs::metadata(path).map_err(|err| match err.kind() {
        io::ErrorKind::PermissionDenied => PathError::PermissionDenied(path.to_path_buf()),
        io::ErrorKind::NotFound => PathError::NotFound(path.to_path_buf()),
        _ => PathError::Other {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
    })
}

pub fn validate_directory(path: &Path) -> Result<(), PathError> {
    if !stat(path)?.is_dir() {
        return Err(PathError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

pub fn validate_file_or_directory(path: &Path) -> Result<(), PathError> {
    let meta = stat(path)?;
    if !meta.is_dir() && !meta.is_file() {
        return Err(PathError::NotAFileOrDirectory(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn directory_checks() {
        let temp = tempdir().expect("tempdir");
        let file = temp.path().join("a.jpg");
        fs::write(&file, b"x").expect("write");

        assert!(validate_directory(temp.path()).is_ok());
        assert_eq!(
            validate_directory(&file),
            Err(PathError::NotADirectory(file.clone()))
        );
        assert_eq!(
            validate_directory(&temp.path().join("nope")),
            Err(PathError::NotFound(temp.path().join("nope")))
        );
    }

    #[test]
    fn file_or_directory_checks() {
        let temp = tempdir().expect("tempdir");
        let file = temp.path().join("a.jpg");
        fs::write(&file, b"x").expect("write");

        assert!(validate_file_or_directory(temp.path()).is_ok());
        assert!(validate_file_or_directory(&file).is_ok());
        assert!(matches!(
            validate_file_or_directory(&temp.path().join("nope")),
            Err(PathError::NotFound(_))
        ));
    }
}
