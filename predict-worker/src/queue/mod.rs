//! Broker abstraction with Redis list semantics.

mod memory;
mod redis_list;

use async_trait::async_trait;
use thiserror::Error;

pub use self::memory::MemoryQueue;
pub use self::redis_list::RedisQueue;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A list-based message queue.
#[async_trait]
pub trait MessageQueue: Send {
    /// Remove and return the head of `channel`, waiting indefinitely for
    /// one to arrive.
    async fn pop(&mut self, channel: &str) -> Result<Vec<u8>, QueueError>;

    /// Insert `payload` at the head of `channel`.
    async fn push(&mut self, channel: &str, payload: &str) -> Result<(), QueueError>;
}
