//! Python Worker Bridge for zero-shot inference
//!
//! This module provides the `PythonWorker` struct that manages the Python
//! subprocess hosting the zero-shot pipeline, communicating via a Unix Domain
//! Socket (UDS) with length-prefixed JSON messages.
//!
//! # Protocol
//!
//! - Request: `{"text": "...", "candidate_labels": ["...", ...]}`
//! - Response: `{"labels": [...], "scores": [...], "processing_time_ms": n}`
//!   or `{"error": "..."}`
//!
//! The sidecar loads the model before it binds the socket, so a successful
//! connect means the model is ready to serve.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

use super::codec::{read_frame, write_frame};
use crate::config::BridgeConfig;

/// Interval between connection retry attempts (in milliseconds)
const CONNECTION_RETRY_INTERVAL_MS: u64 = 250;

/// Errors that can occur during ML bridge operations
#[derive(Error, Debug)]
pub enum PythonWorkerError {
    #[error("Failed to spawn Python process: {0}")]
    SpawnError(#[source] std::io::Error),

    #[error("Python worker exited unexpectedly with status: {0}")]
    WorkerExited(String),

    #[error("Connection to worker socket failed after {0:?}")]
    ConnectionTimeout(Duration),

    #[error("Failed to encode or decode payload: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IPC communication error: {0}")]
    IpcError(String),

    #[error("Inference timeout: worker did not respond within {0:?}")]
    InferenceTimeout(Duration),

    #[error("Worker reported an error: {0}")]
    WorkerError(String),
}

impl PythonWorkerError {
    /// Whether the socket may hold a partial or unread frame after this
    /// error, so the next reply could belong to this request.
    pub fn desyncs_connection(&self) -> bool {
        matches!(self, Self::IpcError(_) | Self::InferenceTimeout(_))
    }
}

/// Request sent to the sidecar for one text
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
    pub text: String,
    pub candidate_labels: Vec<String>,
}

impl InferenceRequest {
    pub fn new(text: impl Into<String>, candidate_labels: &[String]) -> Self {
        Self {
            text: text.into(),
            candidate_labels: candidate_labels.to_vec(),
        }
    }
}

/// Output of the Hugging Face pipeline, labels sorted by descending score
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct InferenceResponse {
    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(default)]
    pub scores: Vec<f64>,

    /// Processing time in milliseconds (if reported by worker)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,

    /// Set instead of labels/scores when inference failed in the worker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Python worker that manages the model subprocess via IPC
pub struct PythonWorker {
    /// Handle to the spawned Python process
    process: Child,

    /// Unix domain socket connection to the worker
    socket: UnixStream,
}

impl PythonWorker {
    /// Start the Python worker process and connect to its Unix socket.
    ///
    /// This method:
    /// 1. Removes any leftover socket file from previous runs
    /// 2. Spawns `<python> <script> <socket_path>` with `ML_MODEL` set
    /// 3. Waits for the worker to load the model and listen on the socket
    /// 4. Establishes a connection to the socket
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The Python process fails to spawn
    /// - The worker exits before creating the socket
    /// - Connection cannot be established within the startup timeout
    pub async fn start(config: &BridgeConfig) -> Result<Self, PythonWorkerError> {
        let socket_path = config.socket_path.as_path();
        info!(
            socket_path = %socket_path.display(),
            script_path = %config.script_path.display(),
            model = %config.model,
            "Starting Python zero-shot worker"
        );

        // Remove any leftover socket file from previous runs
        if socket_path.exists() {
            debug!(socket_path = %socket_path.display(), "Removing existing socket file");
            let _ = std::fs::remove_file(socket_path);
        }

        let mut child = Command::new(&config.python)
            .arg(&config.script_path)
            .arg(socket_path)
            .env("ML_MODEL", &config.model)
            .kill_on_drop(true) // Ensure cleanup if Rust process exits
            .spawn()
            .map_err(PythonWorkerError::SpawnError)?;

        info!(pid = child.id(), "Python worker process spawned");

        let socket = Self::connect_with_retry(socket_path, &mut child, config.startup_timeout).await?;

        info!(socket_path = %socket_path.display(), "Connected to Python worker socket");

        Ok(Self {
            process: child,
            socket,
        })
    }

    /// Attempt to connect to the worker socket until it appears, the child
    /// exits, or the timeout elapses.
    async fn connect_with_retry(
        socket_path: &Path,
        child: &mut Child,
        timeout: Duration,
    ) -> Result<UnixStream, PythonWorkerError> {
        let start = Instant::now();
        let retry_interval = Duration::from_millis(CONNECTION_RETRY_INTERVAL_MS);

        loop {
            match UnixStream::connect(socket_path).await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    if let Ok(Some(status)) = child.try_wait() {
                        error!(%status, "Python worker exited during startup");
                        return Err(PythonWorkerError::WorkerExited(status.to_string()));
                    }

                    if start.elapsed() > timeout {
                        error!(
                            socket_path = %socket_path.display(),
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "Connection timeout waiting for Python worker"
                        );
                        return Err(PythonWorkerError::ConnectionTimeout(timeout));
                    }

                    debug!(
                        socket_path = %socket_path.display(),
                        error = %e,
                        pid = ?child.id(),
                        "Socket not ready, retrying..."
                    );

                    tokio::time::sleep(retry_interval).await;
                }
            }
        }
    }

    /// Send one request to the worker and await its response.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding, I/O or decoding fails, or if the worker
    /// answered with an `error` field.
    pub async fn infer(
        &mut self,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, PythonWorkerError> {
        let request_bytes = serde_json::to_vec(request)?;
        debug!(payload_len = request_bytes.len(), labels = request.candidate_labels.len(), "Sending inference request");

        write_frame(&mut self.socket, &request_bytes)
            .await
            .map_err(|e| PythonWorkerError::IpcError(format!("Failed to write request: {e}")))?;

        let response_bytes = read_frame(&mut self.socket)
            .await
            .map_err(|e| PythonWorkerError::IpcError(format!("Failed to read response: {e}")))?;

        debug!(response_len = response_bytes.len(), "Response received");

        let response = serde_json::from_slice::<InferenceResponse>(&response_bytes)?;
        if let Some(message) = response.error {
            return Err(PythonWorkerError::WorkerError(message));
        }
        Ok(response)
    }

    /// Send an inference request with a timeout.
    ///
    /// On timeout the reply may still arrive later, so the connection must
    /// not be reused (see [`PythonWorkerError::desyncs_connection`]).
    ///
    /// # Errors
    ///
    /// Returns `PythonWorkerError::InferenceTimeout` if the worker doesn't
    /// respond within the specified duration.
    pub async fn infer_with_timeout(
        &mut self,
        request: &InferenceRequest,
        timeout: Duration,
    ) -> Result<InferenceResponse, PythonWorkerError> {
        match tokio::time::timeout(timeout, self.infer(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Inference request timed out");
                Err(PythonWorkerError::InferenceTimeout(timeout))
            }
        }
    }

    /// Check if the Python worker process is still running.
    pub fn is_alive(&mut self) -> bool {
        matches!(self.process.try_wait(), Ok(None))
    }
}

impl Drop for PythonWorker {
    fn drop(&mut self) {
        // The child process is killed by kill_on_drop(true)
        if let Some(pid) = self.process.id() {
            debug!(pid = pid, "Dropping PythonWorker, child will be killed");
        }
    }
}
