use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),
}

/// Broker settings, all required
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub redis_url: String,
    pub request_topic: String,
    pub response_topic: String,
}

impl WorkerConfig {
    /// Reads `REDIS_URL`, `PREDICT_REQUEST_TOPIC` and `PREDICT_RESPONSE_TOPIC`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        Ok(Self {
            redis_url: required("REDIS_URL")?,
            request_topic: required("PREDICT_REQUEST_TOPIC")?,
            response_topic: required("PREDICT_RESPONSE_TOPIC")?,
        })
    }
}
