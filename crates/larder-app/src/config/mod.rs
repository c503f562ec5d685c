//! Configuration loading and XDG path helpers.

use std::collections::BTreeMap;
use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingestion::SiteProfile;

const CONFIG_FILE: &str = "config/settings";

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("unable to resolve project directories")]
    MissingProjectDirs,
    #[error(transparent)]
    Build(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub http: HttpConfig,
    /// Site profiles keyed by source name. Built-in profiles are merged in
    /// after loading; a config entry with the same key overrides them.
    #[serde(default)]
    pub sites: BTreeMap<String, SiteProfile>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub requests_per_second: u32,
    pub retry_min_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub retry_max_attempts: usize,
    /// Fixed User-Agent override; when unset one is picked from the built-in
    /// browser rotation at client construction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            requests_per_second: 1,
            retry_min_delay_ms: 500,
            retry_max_delay_ms: 30_000,
            retry_max_attempts: 6,
            user_agent: None,
        }
    }
}

impl AppConfig {
    fn defaults() -> Result<Self, AppConfigError> {
        Ok(Self {
            storage: StorageConfig {
                path: default_data_path()?,
            },
            http: HttpConfig::default(),
            sites: BTreeMap::new(),
        })
    }
}

pub fn load() -> Result<AppConfig, AppConfigError> {
    let defaults = AppConfig::defaults()?;
    let builder = Config::builder()
        .add_source(Config::try_from(&defaults)?)
        .add_source(File::with_name(CONFIG_FILE).required(false))
        .add_source(Environment::with_prefix("LARDER").separator("__"));

    let cfg: AppConfig = builder.build()?.try_deserialize()?;
    Ok(with_builtin_sites(cfg))
}

pub fn project_dirs() -> Result<ProjectDirs, AppConfigError> {
    ProjectDirs::from("dev", "larder", "larder").ok_or(AppConfigError::MissingProjectDirs)
}

fn default_data_path() -> Result<PathBuf, AppConfigError> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

fn with_builtin_sites(mut cfg: AppConfig) -> AppConfig {
    cfg.sites
        .entry("jamieoliver".to_string())
        .or_insert_with(SiteProfile::jamie_oliver);
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profile_fills_empty_site_map() {
        let cfg = with_builtin_sites(AppConfig {
            storage: StorageConfig {
                path: PathBuf::from("/tmp/larder"),
            },
            http: HttpConfig::default(),
            sites: BTreeMap::new(),
        });
        assert!(cfg.sites.contains_key("jamieoliver"));
    }

    #[test]
    fn configured_profile_wins_over_builtin() {
        let mut sites = BTreeMap::new();
        let mut profile = SiteProfile::jamie_oliver();
        profile.name.class = "custom-title".to_string();
        sites.insert("jamieoliver".to_string(), profile);

        let cfg = with_builtin_sites(AppConfig {
            storage: StorageConfig {
                path: PathBuf::from("/tmp/larder"),
            },
            http: HttpConfig::default(),
            sites,
        });
        assert_eq!(cfg.sites["jamieoliver"].name.class, "custom-title");
    }
}
