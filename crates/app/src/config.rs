//! Desk configuration, read from `LOANDESK_*` environment variables.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use loandesk_observability::LogFormat;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },

    #[error("inconsistent configuration: {0}")]
    Inconsistent(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// Loan length used when a request leaves the due date blank.
    pub default_loan_days: u32,
    pub log_format: LogFormat,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
            default_loan_days: 7,
            log_format: LogFormat::Json,
        }
    }
}

impl DeskConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(size) = parse(&lookup, "LOANDESK_DEFAULT_PAGE_SIZE")? {
            config.default_page_size = size;
        }
        if let Some(size) = parse(&lookup, "LOANDESK_MAX_PAGE_SIZE")? {
            config.max_page_size = size;
        }
        if let Some(days) = parse(&lookup, "LOANDESK_DEFAULT_LOAN_DAYS")? {
            config.default_loan_days = days;
        }
        if let Some(format) = parse(&lookup, "LOANDESK_LOG_FORMAT")? {
            config.log_format = format;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_size == 0 {
            return Err(ConfigError::Inconsistent("default page size must be positive".into()));
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::Inconsistent(format!(
                "default page size {} exceeds the maximum {}",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }

    /// Page size to use for a request: the default when none is asked for,
    /// capped at the maximum.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .filter(|&size| size > 0)
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size)
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::Invalid { key, value: raw })
}
