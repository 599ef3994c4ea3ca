use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use lectern_evidence::OutlineDefaults;
use lectern_logging::LogLevel;
use serde::{Deserialize, Serialize};

use crate::ingestion::DEFAULT_MAX_CHARS;

/// Runtime configuration, usually read from `lectern.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LecternConfig {
    /// Document ingestion limits.
    #[serde(default)]
    pub ingestion: IngestionSettings,
    /// Placeholders for missing outline names.
    #[serde(default)]
    pub outline: OutlineSettings,
    /// Structuring collaborator settings.
    #[serde(default)]
    pub structuring: StructuringSettings,
    /// Log sink settings.
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl LecternConfig {
    /// Loads and validates a TOML file. A relative `telemetry.log_path` is
    /// resolved against the file's directory.
    ///
    /// # Errors
    /// Fails when the file is unreadable, not valid TOML, or holds invalid
    /// values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config =
            Self::from_toml_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        let source_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        if let Some(log_path) = config.telemetry.log_path.as_mut() {
            if log_path.is_relative() {
                *log_path = source_dir.join(&*log_path);
            }
        }
        Ok(config)
    }

    /// Parses and validates TOML text.
    ///
    /// # Errors
    /// Fails on malformed TOML, a zero `max_chars` or an unknown log level.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.ingestion.max_chars == 0 {
            bail!("ingestion.max_chars must be positive");
        }
        if self.structuring.model.trim().is_empty() {
            bail!("structuring.model must not be empty");
        }
        self.telemetry.level()?;
        Ok(())
    }

    /// Outline placeholders as used by the parser.
    #[must_use]
    pub fn outline_defaults(&self) -> OutlineDefaults {
        OutlineDefaults {
            course_placeholder: self.outline.course_placeholder.clone(),
            lecture_placeholder: self.outline.lecture_placeholder.clone(),
        }
    }
}

/// `[ingestion]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionSettings {
    /// Extracted text is cut to this many chars.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
        }
    }
}

/// `[outline]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineSettings {
    /// Course name used when the model gives none.
    #[serde(default = "default_course_placeholder")]
    pub course_placeholder: String,
    /// Lecture title used when the model gives none.
    #[serde(default = "default_lecture_placeholder")]
    pub lecture_placeholder: String,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            course_placeholder: default_course_placeholder(),
            lecture_placeholder: default_lecture_placeholder(),
        }
    }
}

/// `[structuring]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuringSettings {
    /// Model name forwarded to the structuring collaborator.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for StructuringSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
        }
    }
}

/// `[telemetry]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySettings {
    /// JSON-lines log file; logging is off when absent.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    /// Minimum level written (`debug`, `info`, `warn`, `error`).
    #[serde(default = "default_min_level")]
    pub min_level: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_path: None,
            min_level: default_min_level(),
        }
    }
}

impl TelemetrySettings {
    /// Parsed minimum level.
    ///
    /// # Errors
    /// Fails on an unknown level name.
    pub fn level(&self) -> Result<LogLevel> {
        self.min_level
            .parse()
            .with_context(|| format!("telemetry.min_level `{}`", self.min_level))
    }
}

const fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}

fn default_course_placeholder() -> String {
    OutlineDefaults::default().course_placeholder
}

fn default_lecture_placeholder() -> String {
    OutlineDefaults::default().lecture_placeholder
}

fn default_model() -> String {
    "deepseek-chat".into()
}

fn default_min_level() -> String {
    "info".into()
}
