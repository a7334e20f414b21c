use dirs::home_dir;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::errors::Result;

const DEFAULT_DIR_NAME: &str = ".allowance_core";
const HOME_ENV: &str = "ALLOWANCE_CORE_HOME";
const ACCOUNTS_DIR: &str = "accounts";
const CONFIG_FILE: &str = "config.json";

/// Returns the application-specific data directory, defaulting to `~/.allowance_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn resolve_base(custom: Option<PathBuf>) -> PathBuf {
    custom.unwrap_or_else(app_data_dir)
}

pub fn accounts_dir_in(base: &Path) -> PathBuf {
    base.join(ACCOUNTS_DIR)
}

pub fn config_file_in(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
