use heat_map::{ConfigError, GridConfig};
use heat_map_visualizer::{OutputSettings, RenderError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file")]
    Parse(#[from] serde_yml::Error),
    #[error("config is missing the `{0}` section")]
    MissingSection(&'static str),
    #[error("heat map parameters are invalid")]
    HeatMap(#[from] ConfigError),
    #[error("output settings are invalid")]
    Output(#[from] RenderError),
}

/// Only local directories of per-frame metadata are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceMode {
    Local,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocalDataSettings {
    /// Directory of per-frame detection JSON files.
    pub meta_dir: PathBuf,
    /// Directory of source frames matched to metadata by file stem.
    #[serde(default)]
    pub image_dir: Option<PathBuf>,
    /// Names the output animation.
    #[serde(default)]
    pub image_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct DataSourceSettings {
    mode: DataSourceMode,
    local_data_settings: Option<LocalDataSettings>,
}

#[derive(Debug, Clone, Deserialize)]
struct HeatMapSettings {
    param_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
struct RawAppConfig {
    data_source_settings: Option<DataSourceSettings>,
    heat_map_settings: Option<HeatMapSettings>,
    output_settings: Option<OutputSettings>,
}

/// Fully validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: LocalDataSettings,
    pub geometry: GridConfig,
    pub output: OutputSettings,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, AppConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| AppConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml_str(&yaml)?;
        info!(config = %path.display(), "application config loaded");
        Ok(config)
    }

    /// Parses the application config and loads the heat map parameter file it
    /// points to. Relative paths resolve against the working directory.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, AppConfigError> {
        let raw: RawAppConfig = serde_yml::from_str(yaml)?;

        let data_source = raw
            .data_source_settings
            .ok_or(AppConfigError::MissingSection("data_source_settings"))?;
        let source = match data_source.mode {
            DataSourceMode::Local => data_source
                .local_data_settings
                .ok_or(AppConfigError::MissingSection("local_data_settings"))?,
        };

        let heat_map = raw
            .heat_map_settings
            .ok_or(AppConfigError::MissingSection("heat_map_settings"))?;
        let geometry = GridConfig::from_yaml_file(&heat_map.param_file)?;

        let output = raw
            .output_settings
            .ok_or(AppConfigError::MissingSection("output_settings"))?;
        output.validate()?;

        Ok(Self {
            source,
            geometry,
            output,
        })
    }
}
