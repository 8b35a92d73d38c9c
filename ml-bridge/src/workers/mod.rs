//! Worker modules for ML inference processing
//!
//! This module contains the `PythonWorker` implementation for IPC-based
//! zero-shot inference using a Python sidecar process.

mod codec;
mod python_worker;

pub use codec::{read_frame, write_frame, MAX_FRAME_LEN};
pub use python_worker::{InferenceRequest, InferenceResponse, PythonWorker, PythonWorkerError};
