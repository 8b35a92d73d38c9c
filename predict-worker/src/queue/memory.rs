use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{MessageQueue, QueueError};

#[derive(Default)]
struct Inner {
    channels: Mutex<HashMap<String, VecDeque<Vec<u8>>>>,
    pushed: Notify,
}

/// In-process queue with the same head-push/head-pop semantics as Redis
/// lists. Clones share the same channels.
#[derive(Clone, Default)]
pub struct MemoryQueue {
    inner: Arc<Inner>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages waiting on `channel`.
    pub fn len(&self, channel: &str) -> usize {
        self.lock().get(channel).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, channel: &str) -> bool {
        self.len(channel) == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, VecDeque<Vec<u8>>>> {
        self.inner
            .channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn take(&self, channel: &str) -> Option<Vec<u8>> {
        self.lock().get_mut(channel).and_then(VecDeque::pop_front)
    }

    fn put(&self, channel: &str, payload: Vec<u8>) {
        self.lock()
            .entry(channel.to_string())
            .or_default()
            .push_front(payload);
        self.inner.pushed.notify_waiters();
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn pop(&mut self, channel: &str) -> Result<Vec<u8>, QueueError> {
        loop {
            // Register interest before checking so a concurrent push is not missed
            let pushed = self.inner.pushed.notified();
            tokio::pin!(pushed);
            pushed.as_mut().enable();

            if let Some(payload) = self.take(channel) {
                return Ok(payload);
            }
            pushed.await;
        }
    }

    async fn push(&mut self, channel: &str, payload: &str) -> Result<(), QueueError> {
        self.put(channel, payload.as_bytes().to_vec());
        Ok(())
    }
}
