//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use quill_framework::Messages;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct QuillConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Texts the dispatcher sends on its own behalf.
    #[serde(default)]
    pub messages: Messages,

    /// Where command definitions come from.
    #[serde(default)]
    pub commands: CommandsConfig,
}

/// Command loading settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandsConfig {
    /// Namespace under which roots are also reachable as `prefix:name`.
    #[serde(default = "default_fallback_prefix")]
    pub fallback_prefix: String,

    /// Definition files loaded at startup, in order.
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            fallback_prefix: default_fallback_prefix(),
            files: Vec::new(),
        }
    }
}

fn default_fallback_prefix() -> String {
    "quill".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Base log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file path, used when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// How often the log file is rotated.
    #[serde(default)]
    pub rotation: LogRotation,

    /// Maximum number of rotated log files kept.
    #[serde(default = "default_max_files")]
    pub max_files: u32,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include file and line of the call site.
    #[serde(default)]
    pub file_location: bool,

    /// Span lifecycle events to log.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-module level overrides, e.g. `quill_framework = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            rotation: LogRotation::default(),
            max_files: default_max_files(),
            thread_ids: false,
            file_location: false,
            span_events: SpanEventConfig::default(),
            filters: HashMap::new(),
        }
    }
}

fn default_max_files() -> u32 {
    5
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    Json,
}

/// Log output destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stderr,
    Stdout,
    File,
}

/// Log file rotation period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}
