use crate::error::{DatasetError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Remote archive the runs are fetched from.
pub const BASE_URL: &str = "http://www.physionet.org/physiobank/database/eegmmidb/";

/// Environment variable naming the cache root, shared with MNE-Python installs.
pub const CACHE_DIR_ENV: &str = "MNE_DATASETS_EEGBCI_PATH";

/// Where and how runs are downloaded. Passed to the adapter at construction;
/// nothing here is global.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Cache root; files land under `<cache_dir>/MNE-eegbci-data/`.
    pub cache_dir: PathBuf,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Download again even when the file is already cached.
    pub force_update: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            base_url: BASE_URL.to_string(),
            timeout_secs: 60,
            force_update: false,
        }
    }
}

/// `<home>/mne_data`, or `./mne_data` when no home directory is known.
pub fn default_cache_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mne_data")
}

impl DatasetConfig {
    /// Defaults, with the cache root taken from `MNE_DATASETS_EEGBCI_PATH` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = env::var(CACHE_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.cache_dir = PathBuf::from(dir);
            }
        }
        config
    }

    /// Load a TOML file; missing keys keep their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
        Self::from_toml_str(&contents).map_err(|message| DatasetError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    fn from_toml_str(contents: &str) -> std::result::Result<Self, String> {
        let config: Self = toml::from_str(contents).map_err(|e| e.to_string())?;
        if config.base_url.trim().is_empty() {
            return Err("base_url must not be empty".to_string());
        }
        Ok(config)
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Directory the MNE eegbci loader uses beneath the cache root.
    pub fn data_dir(&self) -> PathBuf {
        self.cache_dir.join("MNE-eegbci-data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_points_at_mne_data() {
        let config = DatasetConfig::default();
        assert!(config.cache_dir.ends_with("mne_data"));
        assert_eq!(config.base_url, BASE_URL);
        assert!(!config.force_update);
    }

    #[test]
    fn toml_overrides_only_given_keys() {
        let config = DatasetConfig::from_toml_str(
            r#"
cache_dir = "/data/eeg"
force_update = true
"#,
        )
        .unwrap();
        assert_eq!(config.cache_dir, PathBuf::from("/data/eeg"));
        assert!(config.force_update);
        assert_eq!(config.base_url, BASE_URL);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(
            config.data_dir(),
            PathBuf::from("/data/eeg/MNE-eegbci-data")
        );
    }

    #[test]
    fn rejects_empty_base_url() {
        assert!(DatasetConfig::from_toml_str("base_url = \"\"").is_err());
    }

    #[test]
    fn config_file_errors_name_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eegmmi.toml");
        fs::write(&path, "timeout_secs = \"soon\"").unwrap();
        let err = DatasetConfig::from_toml_file(&path).unwrap_err();
        assert!(matches!(err, DatasetError::Config { .. }));
        assert!(err.to_string().contains("eegmmi.toml"));
    }
}
