//! Queue Worker
//!
//! Blocks on a request list, classifies each message and pushes the answer
//! to a response list:
//! - success: `{"label", "score", "id"}`
//! - failure: `{"id", "error"}`
//! - message that is not JSON at all: `{"error"}`
//!
//! No single message, good or bad, stops the loop.

pub mod config;
pub mod message;
pub mod queue;
pub mod worker;

pub use config::{ConfigError, WorkerConfig};
pub use message::{handle_message, MessageFailure, QueueErrorReply, QueueReply};
pub use queue::{MemoryQueue, MessageQueue, QueueError, RedisQueue};
pub use worker::Worker;
