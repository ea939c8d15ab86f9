//! Environment-backed configuration for the Lambda entry points.
//!
//! Each config is resolved once through a lookup function so callers can pass
//! `std::env::var` in production and a map in tests.

use thiserror::Error;

pub const DEFAULT_MAX_MSGS_TO_PRODUCE: u32 = 5;
pub const DEFAULT_DATALAKE_PREFIX: &str = "stream-etl";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{key} has invalid value '{value}': expected {expected}")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Some(Self::Trace),
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARN" | "WARNING" => Some(Self::Warn),
            "ERROR" | "CRITICAL" => Some(Self::Error),
            _ => None,
        }
    }

    /// Filter directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerConfig {
    pub log_level: LogLevel,
    pub stream_name: String,
    pub region: Option<String>,
    /// Read for parity with the deployed environment; the loop is bounded by
    /// the invocation budget only.
    pub max_msgs_to_produce: u32,
    pub trigger_random_failures: bool,
    pub seed: Option<u64>,
}

impl ProducerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let stream_name =
            non_empty(lookup("STREAM_NAME")).ok_or(ConfigError::Missing("STREAM_NAME"))?;
        let region = non_empty(lookup("STREAM_AWS_REGION"))
            .or_else(|| non_empty(lookup("AWS_REGION")));

        let max_msgs_to_produce = match non_empty(lookup("MAX_MSGS_TO_PRODUCE")) {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "MAX_MSGS_TO_PRODUCE",
                value,
                expected: "a non-negative integer",
            })?,
            None => DEFAULT_MAX_MSGS_TO_PRODUCE,
        };

        let seed = match non_empty(lookup("PRODUCER_SEED")) {
            Some(value) => Some(value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "PRODUCER_SEED",
                value,
                expected: "an unsigned 64-bit integer",
            })?),
            None => None,
        };

        Ok(Self {
            log_level: log_level(&lookup)?,
            stream_name,
            region,
            max_msgs_to_produce,
            trigger_random_failures: flag(&lookup, "TRIGGER_RANDOM_FAILURES", true)?,
            seed,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    pub log_level: LogLevel,
    pub reliable_queue_name: Option<String>,
}

impl ConsumerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            log_level: log_level(&lookup)?,
            reliable_queue_name: non_empty(lookup("RELIABLE_QUEUE_NAME")),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEtlConfig {
    pub log_level: LogLevel,
    pub bucket: String,
    pub prefix: String,
}

impl StreamEtlConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bucket =
            non_empty(lookup("DATALAKE_BUCKET")).ok_or(ConfigError::Missing("DATALAKE_BUCKET"))?;
        let prefix = non_empty(lookup("DATALAKE_PREFIX"))
            .map(|value| value.trim_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_DATALAKE_PREFIX.to_string());

        Ok(Self {
            log_level: log_level(&lookup)?,
            bucket,
            prefix,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn log_level(lookup: &impl Fn(&str) -> Option<String>) -> Result<LogLevel, ConfigError> {
    match non_empty(lookup("LOG_LEVEL")) {
        Some(value) => LogLevel::parse(&value).ok_or(ConfigError::Invalid {
            key: "LOG_LEVEL",
            value,
            expected: "one of TRACE, DEBUG, INFO, WARN, ERROR",
        }),
        None => Ok(LogLevel::default()),
    }
}

fn flag(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(value) = non_empty(lookup(key)) else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            expected: "a boolean flag",
        }),
    }
}
