use crate::chapters::ChapterSource;
use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_PATTERN: &str = "*.opus";

/// User defaults, overridden by command-line flags and interactive answers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub patterns: Vec<String>,
    pub bitrate: Option<String>,
    pub chapter_source: ChapterSource,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            patterns: vec![DEFAULT_PATTERN.to_string()],
            bitrate: None,
            chapter_source: ChapterSource::Embedded,
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl Config {
    /// Configured patterns, or the built-in default when the list is empty.
    pub fn patterns(&self) -> Vec<String> {
        if self.patterns.is_empty() {
            vec![DEFAULT_PATTERN.to_string()]
        } else {
            self.patterns.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new() -> Result<Self> {
        let base = BaseDirs::new().context("unable to resolve home directory")?;
        let path = base.home_dir().join(".config").join("ctfb.yaml");
        Ok(Self { path })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("read config {}", self.path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("parse config {}", self.path.display()))?;
        Ok(config)
    }
}
