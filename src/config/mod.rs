use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    errors::{LedgerError, Result},
    utils::{
        paths::{app_data_dir, config_file_in, ensure_dir},
        DEFAULT_LOG_DIRECTIVE,
    },
};

const TMP_SUFFIX: &str = "tmp";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Where account documents live; defaults to the application data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "SchedulerConfig::default_log_filter")]
    pub log_filter: String,
}

impl SchedulerConfig {
    fn default_log_filter() -> String {
        DEFAULT_LOG_DIRECTIVE.into()
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_filter: Self::default_log_filter(),
        }
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        Ok(Self {
            path: config_file_in(&base),
        })
    }

    /// Loads the configuration, falling back to defaults when no file exists yet.
    pub fn load(&self) -> Result<SchedulerConfig> {
        if !self.path.exists() {
            return Ok(SchedulerConfig::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|err| {
            LedgerError::ConfigError(format!("{}: {}", self.path.display(), err))
        })
    }

    pub fn save(&self, config: &SchedulerConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        let mut file = File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    tmp.set_extension(format!("json.{}", TMP_SUFFIX));
    tmp
}
