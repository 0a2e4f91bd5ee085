use crate::error::config::ConfigError;
use crate::error::config::ConfigError::NoHomeInEnvironment;

use directories_next::ProjectDirs;
use std::path::PathBuf;

pub fn project_dirs() -> Result<&'static ProjectDirs, ConfigError> {
    lazy_static::lazy_static! {
        static ref DIRS: Option<ProjectDirs> = ProjectDirs::from("org", "fabgate", "fabgate");
    }
    DIRS.as_ref().ok_or(NoHomeInEnvironment())
}

pub fn get_user_config_dir() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

pub fn get_user_data_dir() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.data_local_dir().to_path_buf())
}
