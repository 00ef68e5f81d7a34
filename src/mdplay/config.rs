use crate::error::{PlaygroundError, Result};
use crate::pipeline::PipelineOptions;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";
const HOME_ENV: &str = "MDPLAY_HOME";
pub const DEFAULT_EXPORT_TITLE: &str = "Markdown Content";
pub const DEFAULT_EXPORT_FILE_NAME: &str = "markdown-content.html";

/// Where mdplay keeps its records, config and samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaygroundPaths {
    pub data_dir: PathBuf,
}

impl PlaygroundPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// `$MDPLAY_HOME` wins over the platform data directory.
    pub fn discover() -> Result<Self> {
        if let Some(home) = std::env::var_os(HOME_ENV) {
            return Ok(Self::new(PathBuf::from(home)));
        }
        let dirs = ProjectDirs::from("com", "mdplay", "mdplay").ok_or_else(|| {
            PlaygroundError::Config("Could not determine a data directory".to_string())
        })?;
        Ok(Self::new(dirs.data_dir()))
    }

    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("db")
    }

    pub fn default_samples_dir(&self) -> PathBuf {
        self.data_dir.join("samples")
    }
}

/// Configuration for mdplay, stored in `<data_dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaygroundConfig {
    /// Title used for exported documents
    #[serde(default = "default_export_title")]
    pub export_title: String,

    /// File name used when exporting into a directory
    #[serde(default = "default_export_file_name")]
    pub export_file_name: String,

    /// Directory holding the canned sample documents. Relative to the data dir when unset.
    #[serde(default)]
    pub samples_dir: Option<PathBuf>,

    #[serde(default)]
    pub extensions: PipelineOptions,
}

fn default_export_title() -> String {
    DEFAULT_EXPORT_TITLE.to_string()
}

fn default_export_file_name() -> String {
    DEFAULT_EXPORT_FILE_NAME.to_string()
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            export_title: default_export_title(),
            export_file_name: default_export_file_name(),
            samples_dir: None,
            extensions: PipelineOptions::default(),
        }
    }
}

impl PlaygroundConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(PlaygroundError::Io)?;
        let config: PlaygroundConfig =
            serde_json::from_str(&content).map_err(PlaygroundError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(PlaygroundError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(PlaygroundError::Serialization)?;
        fs::write(config_path, content).map_err(PlaygroundError::Io)?;
        Ok(())
    }

    pub fn samples_dir(&self, paths: &PlaygroundPaths) -> PathBuf {
        match &self.samples_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => paths.data_dir.join(dir),
            None => paths.default_samples_dir(),
        }
    }

    /// Set a single key by its CLI name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "export-title" => self.export_title = value.to_string(),
            "export-file-name" => {
                if value.trim().is_empty() {
                    return Err(PlaygroundError::Config(
                        "export-file-name cannot be empty".to_string(),
                    ));
                }
                self.export_file_name = value.to_string();
            }
            "samples-dir" => self.samples_dir = Some(PathBuf::from(value)),
            "tables" => self.extensions.tables = parse_flag(key, value)?,
            "strikethrough" => self.extensions.strikethrough = parse_flag(key, value)?,
            "tasklists" => self.extensions.tasklists = parse_flag(key, value)?,
            "footnotes" => self.extensions.footnotes = parse_flag(key, value)?,
            "heading-attributes" => self.extensions.heading_attributes = parse_flag(key, value)?,
            other => {
                return Err(PlaygroundError::Config(format!(
                    "Unknown config key: {}",
                    other
                )))
            }
        }
        Ok(())
    }

    /// All keys with their current values, in display order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("export-title", self.export_title.clone()),
            ("export-file-name", self.export_file_name.clone()),
            (
                "samples-dir",
                self.samples_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "samples".to_string()),
            ),
            ("tables", self.extensions.tables.to_string()),
            ("strikethrough", self.extensions.strikethrough.to_string()),
            ("tasklists", self.extensions.tasklists.to_string()),
            ("footnotes", self.extensions.footnotes.to_string()),
            (
                "heading-attributes",
                self.extensions.heading_attributes.to_string(),
            ),
        ]
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(PlaygroundError::Config(format!(
            "{} expects true or false, got {}",
            key, value
        ))),
    }
}
