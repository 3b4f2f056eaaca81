//! Where shellctl keeps its files.
//!
//! Resolution never touches the filesystem. Whoever writes a file creates
//! its directory (the log writer does; config is only ever read).

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "SHELLCTL_HOME";
const HOME_DIR_NAME: &str = ".shellctl";

/// `override_dir` wins when set and non-empty, then `<user_home>/.shellctl`,
/// then `./.shellctl`.
pub fn resolve_home(override_dir: Option<OsString>, user_home: Option<PathBuf>) -> PathBuf {
    match override_dir.filter(|dir| !dir.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => user_home
            .unwrap_or_else(|| PathBuf::from("."))
            .join(HOME_DIR_NAME),
    }
}

/// Home directory for the current process: `SHELLCTL_HOME` or `~/.shellctl`.
pub fn shellctl_home() -> PathBuf {
    resolve_home(std::env::var_os(HOME_ENV), dirs::home_dir())
}

pub fn config_path_in(home: &Path) -> PathBuf {
    home.join("config.toml")
}

pub fn logs_dir_in(home: &Path) -> PathBuf {
    home.join("logs")
}

pub fn default_config_path() -> PathBuf {
    config_path_in(&shellctl_home())
}

pub fn default_logs_dir() -> PathBuf {
    logs_dir_in(&shellctl_home())
}
