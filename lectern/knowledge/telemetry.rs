use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use lectern_logging::{JsonLogger, LogLevel, LogRecord};
use serde_json::Value;

use crate::config::TelemetrySettings;

/// Builder configuring telemetry for lecture processing.
#[derive(Debug)]
pub struct LectureTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    min_level: LogLevel,
}

impl LectureTelemetryBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            min_level: LogLevel::default(),
        }
    }

    /// Sets the JSON log path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Drops records below `level`.
    #[must_use]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Applies a `[telemetry]` config section.
    ///
    /// # Errors
    /// Fails when the configured level is unknown.
    pub fn settings(mut self, settings: &TelemetrySettings) -> Result<Self> {
        if let Some(path) = &settings.log_path {
            self.log_path = Some(path.clone());
        }
        self.min_level = settings.level()?;
        Ok(self)
    }

    /// Finalizes the builder.
    ///
    /// # Errors
    /// Fails when the log file cannot be opened.
    pub fn build(self) -> Result<LectureTelemetry> {
        LectureTelemetry::new(self.module, self.log_path, self.min_level)
    }
}

/// Telemetry handle shared by the lecture runtime.
#[derive(Clone)]
pub struct LectureTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for LectureTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LectureTelemetry")
            .field("module", &self.inner.module)
            .field("enabled", &self.inner.logger.is_some())
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    logger: Option<JsonLogger>,
}

impl LectureTelemetry {
    fn new(module: String, log_path: Option<PathBuf>, min_level: LogLevel) -> Result<Self> {
        let logger = match log_path {
            Some(path) => Some(JsonLogger::new(path)?.with_min_level(min_level)),
            None => None,
        };
        Ok(Self {
            inner: Arc::new(TelemetryInner { module, logger }),
        })
    }

    /// Returns a builder for this telemetry helper.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> LectureTelemetryBuilder {
        LectureTelemetryBuilder::new(module)
    }

    /// Module name stamped on every record.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.inner.module
    }

    /// Logs a structured record. Object metadata becomes the record fields.
    ///
    /// # Errors
    /// Propagates write failures.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            let mut record = LogRecord::new(&self.inner.module, level, message);
            if let Value::Object(fields) = metadata {
                record.metadata = fields;
            }
            logger.log(&record)?;
        }
        Ok(())
    }
}
