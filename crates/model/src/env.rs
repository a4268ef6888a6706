use std::str::FromStr;
use thiserror::Error;

/// Environment variable containing the approvals table name
pub const DYNAMO_DB_TABLE_NAME: &str = "DYNAMO_DB_TABLE_NAME";
/// Environment variable containing the minimum log level
pub const LOG_LEVEL: &str = "LOG_LEVEL";
/// Environment variable containing the service name attached to logs and metrics
pub const POWERTOOLS_SERVICE_NAME: &str = "POWERTOOLS_SERVICE_NAME";

const TABLE_NAME_LENGTH: std::ops::RangeInclusive<usize> = 3..=255;

/// Validated configuration of the approval function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVars {
    pub table_name: String,
    pub log_level: LogLevel,
    pub service_name: String,
}

impl EnvVars {
    /// Read and validate configuration from the process environment.
    pub fn from_env() -> Result<EnvVars, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<EnvVars, ConfigError> {
        let require = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let table_name: String = require(DYNAMO_DB_TABLE_NAME)?;
        let table_length: usize = table_name.chars().count();
        if !TABLE_NAME_LENGTH.contains(&table_length) {
            return Err(ConfigError::InvalidTableName(table_length));
        }

        let log_level: LogLevel = require(LOG_LEVEL)?.parse()?;

        let service_name: String = require(POWERTOOLS_SERVICE_NAME)?;
        if service_name.is_empty() {
            return Err(ConfigError::EmptyServiceName);
        }

        Ok(EnvVars {
            table_name,
            log_level,
            service_name,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    Exception,
}

impl LogLevel {
    /// The equivalent `tracing` filter directive.
    pub fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical | LogLevel::Exception => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            "EXCEPTION" => Ok(LogLevel::Exception),
            _ => Err(ConfigError::InvalidLogLevel(value.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing {0} environment variable")]
    Missing(&'static str),
    #[error("table name must be 3 to 255 characters, got {0}")]
    InvalidTableName(usize),
    #[error("unsupported log level {0}")]
    InvalidLogLevel(String),
    #[error("service name must not be empty")]
    EmptyServiceName,
}
