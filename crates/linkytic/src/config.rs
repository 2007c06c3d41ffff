//! `linkytic.toml` configuration.
//!
//! Every section and key is optional; missing values take their defaults and
//! command-line flags override whatever the file says.

use std::path::{Path, PathBuf};
use std::time::Duration;

use linkytic_frame::{FrameConfig, ReaderConfig, TicMode, DEFAULT_MAX_FRAME_SIZE};
use linkytic_trend::DashboardConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::exit::{CliError, CliResult, CONFIG_ERROR};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub serial: SerialSection,
    pub reader: ReaderSection,
    pub display: DashboardConfig,
}

/// `[serial]`: where the meter is and how it talks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialSection {
    /// Device used when no source is given on the command line.
    pub device: Option<PathBuf>,
    /// Defaults to the line speed of the selected mode.
    pub baud_rate: Option<u32>,
    /// `historique` or `standard`.
    pub mode: Option<String>,
}

/// `[reader]`: polling and framing limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderSection {
    pub min_idle_ms: u64,
    pub max_idle_ms: u64,
    pub max_frame_size: usize,
}

impl Default for ReaderSection {
    fn default() -> Self {
        let defaults = ReaderConfig::default();
        Self {
            min_idle_ms: defaults.min_idle.as_millis() as u64,
            max_idle_ms: defaults.max_idle.as_millis() as u64,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl AppConfig {
    /// Load `path`, or return defaults when no file was given.
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|err| {
            CliError::new(
                CONFIG_ERROR,
                format!("failed to read config {}: {err}", path.display()),
            )
        })?;
        let config = Self::parse(&content).map_err(|message| {
            CliError::new(
                CONFIG_ERROR,
                format!("invalid config {}: {message}", path.display()),
            )
        })?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(content).map_err(|err| err.to_string())?;
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors.join("; "))
        }
    }

    /// Problems that would make the pipeline unusable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Err(err) = self.mode() {
            errors.push(err);
        }
        if self.reader.max_frame_size == 0 {
            errors.push("reader.max_frame_size must be at least 1".into());
        }
        if self.reader.min_idle_ms > self.reader.max_idle_ms {
            errors.push("reader.min_idle_ms must not exceed reader.max_idle_ms".into());
        }
        if self.display.history.width == 0 {
            errors.push("display.width must be at least 1".into());
        }
        if self.display.history.history_size == 0 {
            errors.push("display.history_size must be at least 1".into());
        }

        errors
    }

    /// Mode from the file, if set.
    pub fn mode(&self) -> Result<Option<TicMode>, String> {
        self.serial.mode.as_deref().map(str::parse).transpose()
    }

    pub fn reader_config(&self, mode: TicMode) -> ReaderConfig {
        ReaderConfig {
            mode,
            frame: FrameConfig {
                max_frame_size: self.reader.max_frame_size,
            },
            min_idle: Duration::from_millis(self.reader.min_idle_ms),
            max_idle: Duration::from_millis(self.reader.max_idle_ms),
        }
    }
}
