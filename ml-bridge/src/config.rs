//! Sidecar configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default model served by the sidecar
pub const DEFAULT_MODEL: &str = "facebook/bart-large-mnli";

/// Default socket path for ML inference
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/zero_shot_infer.sock";

/// Default path to the Python inference worker script
pub const DEFAULT_WORKER_SCRIPT: &str = "scripts/zero_shot_worker.py";

/// Default interpreter used to run the worker script
pub const DEFAULT_PYTHON: &str = "python3";

/// Model loading dominates startup, so the default is generous.
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 300;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a whole number of seconds, got '{value}'")]
    InvalidSeconds { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Hugging Face model id passed to the sidecar as `ML_MODEL`
    pub model: String,
    pub socket_path: PathBuf,
    pub script_path: PathBuf,
    pub python: String,
    /// Upper bound on spawn + model load + connect
    pub startup_timeout: Duration,
    /// Per-request bound; `None` waits for as long as inference takes
    pub inference_timeout: Option<Duration>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            script_path: PathBuf::from(DEFAULT_WORKER_SCRIPT),
            python: DEFAULT_PYTHON.to_string(),
            startup_timeout: Duration::from_secs(DEFAULT_STARTUP_TIMEOUT_SECS),
            inference_timeout: None,
        }
    }
}

impl BridgeConfig {
    /// Reads `ML_MODEL`, `ML_SOCKET_PATH`, `ML_WORKER_SCRIPT`, `ML_PYTHON`,
    /// `ML_STARTUP_TIMEOUT_SECS` and `ML_INFERENCE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let startup_timeout = seconds(&lookup, "ML_STARTUP_TIMEOUT_SECS")?
            .unwrap_or(defaults.startup_timeout);

        Ok(Self {
            model: lookup("ML_MODEL").unwrap_or(defaults.model),
            socket_path: lookup("ML_SOCKET_PATH").map_or(defaults.socket_path, PathBuf::from),
            script_path: lookup("ML_WORKER_SCRIPT").map_or(defaults.script_path, PathBuf::from),
            python: lookup("ML_PYTHON").unwrap_or(defaults.python),
            startup_timeout,
            inference_timeout: seconds(&lookup, "ML_INFERENCE_TIMEOUT_SECS")?,
        })
    }
}

fn seconds<F>(lookup: &F, var: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidSeconds { var, value })
        })
        .transpose()
}
