use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoErrorKind {
    #[error("Failed to create {0}: {1}")]
    CreateDirectoryFailed(PathBuf, std::io::Error),

    #[error("Failed to create a temporary file in {0}: {1}")]
    CreateTempFileFailed(PathBuf, std::io::Error),

    #[error("Failed to read directory {0}: {1}")]
    ReadDirFailed(PathBuf, std::io::Error),

    #[error("Failed to read {0}: {1}")]
    ReadFileFailed(PathBuf, std::io::Error),

    #[error("Failed to read permissions of {0}: {1}")]
    ReadPermissionsFailed(PathBuf, std::io::Error),

    #[error("Failed to flush {0} to disk: {1}")]
    SyncFailed(PathBuf, std::io::Error),

    #[error("Failed to write to {0}: {1}")]
    WriteFileFailed(PathBuf, std::io::Error),

    #[error("Failed to set permissions of {0}: {1}")]
    WritePermissionsFailed(PathBuf, std::io::Error),
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct IoError(pub Box<IoErrorKind>);

impl IoError {
    pub fn new(kind: IoErrorKind) -> Self {
        IoError(Box::new(kind))
    }

    pub fn kind(&self) -> &IoErrorKind {
        &self.0
    }
}
