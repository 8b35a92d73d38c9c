use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use super::{MessageQueue, QueueError};

/// `BLPOP`/`LPUSH` over a Redis connection that re-establishes itself
/// after the link drops.
///
/// The call that observes a dropped link still fails; the reconnect happens
/// in the background and the following call uses the new link.
pub struct RedisQueue {
    conn: ConnectionManager,
}

impl RedisQueue {
    pub async fn connect(url: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        info!("Connected to Redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl MessageQueue for RedisQueue {
    async fn pop(&mut self, channel: &str) -> Result<Vec<u8>, QueueError> {
        loop {
            // A timeout of 0 blocks until a message arrives
            let reply: Option<(String, Vec<u8>)> = redis::cmd("BLPOP")
                .arg(channel)
                .arg(0)
                .query_async(&mut self.conn)
                .await?;

            if let Some((_, payload)) = reply {
                debug!(channel, payload_len = payload.len(), "Message popped");
                return Ok(payload);
            }
        }
    }

    async fn push(&mut self, channel: &str, payload: &str) -> Result<(), QueueError> {
        let _: () = self.conn.lpush(channel, payload).await?;
        Ok(())
    }
}
