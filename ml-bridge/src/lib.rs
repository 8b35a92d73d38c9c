//! ML Bridge - zero-shot model sidecar
//!
//! This crate hosts the Hugging Face `zero-shot-classification` pipeline in a
//! Python subprocess and exposes it to the Rust front-ends through the
//! `classifier_core` gateway seam. The two processes talk over a Unix domain
//! socket with length-prefixed JSON messages.
//!
//! # Architecture
//!
//! The model runs out of process so that:
//! - CPU-heavy inference never blocks the Tokio event loop
//! - A crashing model process does not take the front-end down with it
//! - The model artifact and its Python stack stay isolated from the binaries
//!
//! # Example
//!
//! ```ignore
//! use classifier_core::{Classifier, ClassifierGateway};
//! use ml_bridge::{BridgeConfig, PythonPipelineLoader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let loader = PythonPipelineLoader::new(BridgeConfig::from_env()?);
//!     let gateway = ClassifierGateway::new(loader);
//!
//!     let labels = vec!["sad".to_string(), "happy".to_string()];
//!     let prediction = gateway.classify("This is great!", &labels).await?;
//!     println!("{}: {:.2}", prediction.label, prediction.score);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod pipeline;
pub mod workers;

// Re-export main types for convenience
pub use config::{BridgeConfig, ConfigError};
pub use pipeline::{PythonPipeline, PythonPipelineLoader};
pub use workers::{InferenceRequest, InferenceResponse, PythonWorker, PythonWorkerError};
