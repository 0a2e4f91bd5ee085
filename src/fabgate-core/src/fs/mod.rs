use crate::error::io::IoError;
use crate::error::io::IoErrorKind::{
    CreateDirectoryFailed, ReadDirFailed, ReadFileFailed, ReadPermissionsFailed, SyncFailed,
    WritePermissionsFailed,
};

use std::fs::Permissions;
use std::path::Path;

pub fn create_dir_all(path: &Path) -> Result<(), IoError> {
    std::fs::create_dir_all(path)
        .map_err(|err| IoError::new(CreateDirectoryFailed(path.to_path_buf(), err)))
}

pub fn read(path: &Path) -> Result<Vec<u8>, IoError> {
    std::fs::read(path).map_err(|err| IoError::new(ReadFileFailed(path.to_path_buf(), err)))
}

/// Returns the file names (not paths) of the entries in a directory.
pub fn read_dir_names(path: &Path) -> Result<Vec<String>, IoError> {
    let entries =
        std::fs::read_dir(path).map_err(|err| IoError::new(ReadDirFailed(path.to_path_buf(), err)))?;
    let mut names = vec![];
    for entry in entries {
        let entry = entry.map_err(|err| IoError::new(ReadDirFailed(path.to_path_buf(), err)))?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

pub fn read_permissions(path: &Path) -> Result<Permissions, IoError> {
    std::fs::metadata(path)
        .map_err(|err| IoError::new(ReadPermissionsFailed(path.to_path_buf(), err)))
        .map(|x| x.permissions())
}

pub fn set_permissions(path: &Path, permissions: Permissions) -> Result<(), IoError> {
    std::fs::set_permissions(path, permissions)
        .map_err(|err| IoError::new(WritePermissionsFailed(path.to_path_buf(), err)))
}

/// Makes a file read-only; owner-only read on *nix.
pub fn set_owner_read_only(path: &Path) -> Result<(), IoError> {
    let mut permissions = read_permissions(path)?;
    permissions.set_readonly(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(0o400);
    }
    set_permissions(path, permissions)
}

/// Flushes the entries of a directory to disk, so files just linked into it survive a crash.
/// Directories cannot be opened for syncing outside unix, where this does nothing.
pub fn sync_dir(path: &Path) -> Result<(), IoError> {
    #[cfg(unix)]
    std::fs::File::open(path)
        .and_then(|dir| dir.sync_all())
        .map_err(|err| IoError::new(SyncFailed(path.to_path_buf(), err)))?;
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
