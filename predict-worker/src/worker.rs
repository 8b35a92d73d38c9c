use std::sync::Arc;
use std::time::Duration;

use classifier_core::{
    metrics::{record_request, Outcome},
    Classifier, RequestValidator, Surface,
};
use tracing::{debug, error, info, warn};

use crate::config::WorkerConfig;
use crate::message::{handle_message, MessageFailure};
use crate::queue::{MessageQueue, QueueError};

/// Pause after a broker error before the next attempt
const BROKER_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Consumes predict requests one at a time.
pub struct Worker<Q: MessageQueue> {
    queue: Q,
    classifier: Arc<dyn Classifier>,
    validator: RequestValidator,
    request_topic: String,
    response_topic: String,
}

impl<Q: MessageQueue> Worker<Q> {
    pub fn new(
        queue: Q,
        classifier: Arc<dyn Classifier>,
        request_topic: impl Into<String>,
        response_topic: impl Into<String>,
    ) -> Self {
        Self {
            queue,
            classifier,
            validator: RequestValidator::new(Surface::Service),
            request_topic: request_topic.into(),
            response_topic: response_topic.into(),
        }
    }

    pub fn from_config(queue: Q, classifier: Arc<dyn Classifier>, config: &WorkerConfig) -> Self {
        Self::new(
            queue,
            classifier,
            config.request_topic.clone(),
            config.response_topic.clone(),
        )
    }

    /// Wait for one request and push exactly one response for it.
    ///
    /// Only broker failures are returned; request failures become error
    /// replies.
    pub async fn process_next(&mut self) -> Result<(), QueueError> {
        debug!(topic = %self.request_topic, "Waiting for predict request message...");
        let raw = self.queue.pop(&self.request_topic).await?;

        let (id, payload) =
            match handle_message(self.classifier.as_ref(), &self.validator, &raw).await {
                Ok(reply) => {
                    record_request(Surface::Service, Outcome::Success);
                    info!(id = %reply.id, label = %reply.label, score = reply.score, "Prediction ready");
                    (Some(reply.id.clone()), serde_json::to_string(&reply)?)
                }
                Err(failure) => {
                    match &failure {
                        MessageFailure::Unparseable(e) => {
                            record_request(Surface::Service, Outcome::Rejected);
                            warn!(error = %e, "Unparseable predict request");
                        }
                        MessageFailure::Rejected { id, error } => {
                            record_request(Surface::Service, Outcome::Rejected);
                            warn!(id = %id, error = %error, "Rejected predict request");
                        }
                        MessageFailure::Failed { id, error } => {
                            record_request(Surface::Service, Outcome::Failed);
                            error!(id = %id, error = ?error, "Prediction failed");
                        }
                    }
                    let reply = failure.to_reply();
                    (reply.id.clone(), serde_json::to_string(&reply)?)
                }
            };

        self.push_reply(id.as_deref(), &payload).await
    }

    /// Push a reply, retrying once before it is given up.
    async fn push_reply(&mut self, id: Option<&str>, payload: &str) -> Result<(), QueueError> {
        if let Err(e) = self.queue.push(&self.response_topic, payload).await {
            warn!(id = ?id, error = %e, "Failed to push reply, retrying once");
            if let Err(e) = self.queue.push(&self.response_topic, payload).await {
                error!(id = ?id, payload, error = %e, "Reply dropped");
                return Err(e);
            }
        }
        debug!(id = ?id, topic = %self.response_topic, "Reply pushed");
        Ok(())
    }

    /// Process messages until the process is stopped.
    pub async fn run(mut self) {
        info!(
            request_topic = %self.request_topic,
            response_topic = %self.response_topic,
            "Queue worker started"
        );
        loop {
            if let Err(e) = self.process_next().await {
                error!(error = %e, "Broker error");
                tokio::time::sleep(BROKER_RETRY_DELAY).await;
            }
        }
    }
}
