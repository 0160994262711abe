use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::annotator::AnnotatorConfig;
use crate::upload::UploadConfig;

/// Configuration for the media annotator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Annotation source settings.
    pub annotator: AnnotatorConfig,

    /// Upload/transcode service settings.
    pub upload: UploadConfig,

    /// Export settings.
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory for exported files.
    pub output_dir: PathBuf,

    /// Write a subtitle (.srt) document alongside the analysis.
    pub write_subtitles: bool,

    /// Write a plain-text transcript alongside the analysis.
    pub write_transcript: bool,

    /// Prefix transcript lines with the source's original timecodes.
    pub transcript_timestamps: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            write_subtitles: true,
            write_transcript: true,
            transcript_timestamps: true,
        }
    }
}

impl Config {
    /// Load configuration from the usual locations, first match wins.
    pub fn load() -> Result<Self> {
        let config_paths = [
            "media-annotator.toml",
            "config/media-annotator.toml",
            "~/.config/media-annotator/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Err(anyhow::anyhow!("no configuration file found"))
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&config_str)?)
    }

    /// Serialize to TOML, for writing a starter config.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
