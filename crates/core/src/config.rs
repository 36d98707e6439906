use crate::library::ImportOptions;
use anyhow::{Context, Result};
use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub library_root: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_root: Option<PathBuf>,
    pub skip_file_names: Vec<String>,
    pub file_time_fallback: bool,
    pub sanitize_make: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_collision_suffix: Option<u32>,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            library_root: default_library_root(),
            source_root: None,
            skip_file_names: vec!["desktop.ini".to_string()],
            file_time_fallback: true,
            sanitize_make: true,
            max_collision_suffix: None,
            log_level: "error".to_string(),
        }
    }
}

impl AppConfig {
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            library_root: self.library_root.clone(),
            file_time_fallback: self.file_time_fallback,
            sanitize_make: self.sanitize_make,
            max_collision_suffix: self.max_collision_suffix,
            dry_run: false,
        }
    }
}

fn default_library_root() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.picture_dir().map(|p| p.join("Library")))
        .unwrap_or_else(|| PathBuf::from("Library"))
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
    pub log_dir: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "photolib", "photolib")
        .context("could not resolve the OS configuration directory")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        log_dir: proj.data_local_dir().join("logs"),
        config_dir,
    })
}

pub fn load_config() -> Result<AppConfig> {
    let paths = app_paths()?;
    load_config_from(&paths.config_path)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read config file: {}", path.display()))?;

    let config = toml::from_str::<AppConfig>(&raw)
        .with_context(|| format!("could not parse config file: {}", path.display()))?;
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<PathBuf> {
    let paths = app_paths()?;
    save_config_to(config, &paths.config_path)?;
    Ok(paths.config_path)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("could not create config directory: {}", dir.display()))?;
    }
    let body = toml::to_string_pretty(config).context("could not serialize config")?;
    fs::write(path, body)
        .with_context(|| format!("could not write config file: {}", path.display()))?;
    Ok(())
}
