use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_PUBLISH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not found")]
    Missing(&'static str),

    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// What to do when a mutation call fails at the transport level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure and fail the invocation.
    #[default]
    Abort,
    /// Log the failure and move on to the next record.
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" => Ok(Self::Continue),
            other => Err(format!("expected `abort` or `continue`, got `{}`", other)),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => f.write_str("abort"),
            Self::Continue => f.write_str("continue"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub api_id: String,
    pub endpoint: Url,
    pub region: Option<String>,
    pub failure_policy: FailurePolicy,
    pub api_key: Option<String>,
    pub publish_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_id", &self.api_id)
            .field("endpoint", &self.endpoint.as_str())
            .field("region", &self.region)
            .field("failure_policy", &self.failure_policy)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("publish_timeout", &self.publish_timeout)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_id = var("APPSYNC_APIID").ok_or(ConfigError::Missing("APPSYNC_APIID"))?;

        let endpoint: Url = var("APPSYNC_ENDPOINT")
            .ok_or(ConfigError::Missing("APPSYNC_ENDPOINT"))?
            .parse()
            .map_err(|e: url::ParseError| ConfigError::Invalid {
                name: "APPSYNC_ENDPOINT",
                reason: e.to_string(),
            })?;

        let failure_policy = match var("PUBLISH_FAILURE_POLICY") {
            Some(v) => v.parse::<FailurePolicy>().map_err(|reason| ConfigError::Invalid {
                name: "PUBLISH_FAILURE_POLICY",
                reason,
            })?,
            None => FailurePolicy::default(),
        };

        let publish_timeout = match var("PUBLISH_TIMEOUT_SECS") {
            Some(v) => match v.trim().parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        name: "PUBLISH_TIMEOUT_SECS",
                        reason: "must be at least 1".to_string(),
                    })
                }
                Ok(secs) => Duration::from_secs(secs),
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        name: "PUBLISH_TIMEOUT_SECS",
                        reason: e.to_string(),
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_PUBLISH_TIMEOUT_SECS),
        };

        Ok(Self {
            api_id,
            endpoint,
            region: var("AWS_REGION"),
            failure_policy,
            api_key: var("APPSYNC_API_KEY"),
            publish_timeout,
        })
    }
}
