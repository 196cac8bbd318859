//! Path Utilities
//!
//! Common path resolution for pfunc directories and files.

use std::path::PathBuf;

/// Library descriptor looked for in the working directory
pub const DEFAULT_LIBRARIES_FILE: &str = ".pfunc.libraries";

/// Get the pfunc base directory (`~/.pfunc/`)
pub fn pfunc_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not determine home directory")?;
    Ok(home.join(".pfunc"))
}

/// Get a path within the pfunc directory
pub fn pfunc_path(relative_path: &str) -> Result<PathBuf, String> {
    Ok(pfunc_dir()?.join(relative_path))
}

/// Get the user configuration file
pub fn config_path() -> Result<PathBuf, String> {
    pfunc_path("config.json")
}

/// Get the default local repository used as the resolution cache
pub fn local_repository_dir() -> Result<PathBuf, String> {
    pfunc_path("repository")
}
