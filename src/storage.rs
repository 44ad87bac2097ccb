//! Durable file access
//!
//! lsfg-vk watches its config file by inode, so writes truncate and rewrite
//! the existing file instead of replacing it through a rename.

use std::fs::{self, OpenOptions, Permissions};
use std::io::{ErrorKind, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from reading or writing the durable files
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to set permissions on {path}: {source}")]
    Permissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Content read from disk
#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    Missing,
    Text(String),
    /// Present but not valid UTF-8
    Unreadable,
}

/// Read a text file, treating absence as a normal outcome
pub fn read_optional(path: &Path) -> Result<FileContent, StorageError> {
    match fs::read(path) {
        Ok(bytes) => Ok(match String::from_utf8(bytes) {
            Ok(text) => FileContent::Text(text),
            Err(_) => FileContent::Unreadable,
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(FileContent::Missing),
        Err(source) => Err(StorageError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Rewrite `path` in place and apply `mode`, creating parent directories as needed
pub fn write_in_place(path: &Path, content: &str, mode: u32) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let write_err = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(write_err)?;
    file.write_all(content.as_bytes()).map_err(write_err)?;
    file.flush().map_err(write_err)?;
    file.sync_all().map_err(write_err)?;

    fs::set_permissions(path, Permissions::from_mode(mode)).map_err(|source| {
        StorageError::Permissions {
            path: path.to_path_buf(),
            source,
        }
    })?;

    Ok(())
}
