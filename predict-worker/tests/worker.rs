//! Worker loop tests over the in-memory queue and the keyword stub model.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use classifier_core::testing::{KeywordLoader, StubCounters};
use classifier_core::{Classifier, ClassifierGateway};
use predict_worker::{MemoryQueue, MessageQueue, QueueError, Worker};
use serde_json::{json, Value};

const REQUESTS: &str = "predict-requests";
const RESPONSES: &str = "predict-responses";

fn worker_with(loader: KeywordLoader) -> (Worker<MemoryQueue>, MemoryQueue, Arc<StubCounters>) {
    let counters = loader.counters();
    let classifier: Arc<dyn Classifier> = Arc::new(ClassifierGateway::new(loader));
    let queue = MemoryQueue::new();
    let worker = Worker::new(queue.clone(), classifier, REQUESTS, RESPONSES);
    (worker, queue, counters)
}

fn worker() -> (Worker<MemoryQueue>, MemoryQueue, Arc<StubCounters>) {
    worker_with(KeywordLoader::sentiment())
}

async fn send(queue: &mut MemoryQueue, message: &str) {
    queue.push(REQUESTS, message).await.unwrap();
}

async fn reply(queue: &mut MemoryQueue) -> Value {
    let raw = tokio::time::timeout(Duration::from_secs(5), queue.pop(RESPONSES))
        .await
        .expect("no reply pushed")
        .unwrap();
    serde_json::from_slice(&raw).unwrap()
}

#[tokio::test]
async fn test_prediction_reply_carries_id() {
    let (mut worker, mut queue, _) = worker();
    let message = json!({
        "id": "abc",
        "text": "I feel great today",
        "candidate_labels": ["happy", "sad"]
    });
    send(&mut queue, &message.to_string()).await;

    worker.process_next().await.unwrap();

    let body = reply(&mut queue).await;
    assert_eq!(body["id"], "abc");
    assert_eq!(body["label"], "happy");
    let score = body["score"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&score));
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_too_many_labels_rejected_without_inference() {
    let (mut worker, mut queue, counters) = worker();
    let message = json!({
        "id": "xyz",
        "text": "Some text",
        "candidate_labels": ["a", "b", "c", "d", "e", "f"]
    });
    send(&mut queue, &message.to_string()).await;

    worker.process_next().await.unwrap();

    let body = reply(&mut queue).await;
    assert_eq!(body["id"], "xyz");
    assert_eq!(body["error"], "This service allows for up to 5 classes.");
    assert!(body.get("label").is_none());
    assert_eq!(counters.inferences(), 0);
}

#[tokio::test]
async fn test_missing_id_gets_generated_uuid() {
    let (mut worker, mut queue, _) = worker();
    let message = json!({ "text": "This is awful", "candidate_labels": ["happy", "sad"] });
    send(&mut queue, &message.to_string()).await;

    worker.process_next().await.unwrap();

    let body = reply(&mut queue).await;
    let id = body["id"].as_str().unwrap();
    assert_eq!(id.len(), 36);
    assert!(uuid::Uuid::parse_str(id).is_ok());
    assert_eq!(body["label"], "sad");
}

#[tokio::test]
async fn test_unparseable_message_reply_has_no_id() {
    let (mut worker, mut queue, counters) = worker();
    send(&mut queue, "this is not json").await;

    worker.process_next().await.unwrap();

    let body = reply(&mut queue).await;
    assert!(body.get("id").is_none());
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Unparseable message"));
    assert_eq!(counters.inferences(), 0);
}

#[tokio::test]
async fn test_schema_violation_keeps_id() {
    let (mut worker, mut queue, counters) = worker();
    send(&mut queue, &json!({ "id": "m-1", "text": "" }).to_string()).await;

    worker.process_next().await.unwrap();

    let body = reply(&mut queue).await;
    assert_eq!(body["id"], "m-1");
    assert!(!body["error"].as_str().unwrap().is_empty());
    assert_eq!(counters.inferences(), 0);
}

#[tokio::test]
async fn test_numeric_id_kept_as_text() {
    let (mut worker, mut queue, _) = worker();
    let message = json!({ "id": 42, "text": "good news", "candidate_labels": ["happy", "sad"] });
    send(&mut queue, &message.to_string()).await;

    worker.process_next().await.unwrap();

    assert_eq!(reply(&mut queue).await["id"], "42");
}

#[tokio::test]
async fn test_failed_load_then_next_message_succeeds() {
    let (mut worker, mut queue, counters) = worker_with(KeywordLoader::sentiment().failing_loads(1));
    let message = json!({ "id": "1", "text": "I love it", "candidate_labels": ["happy", "sad"] });

    send(&mut queue, &message.to_string()).await;
    worker.process_next().await.unwrap();
    let failed = reply(&mut queue).await;
    assert_eq!(failed["id"], "1");
    assert!(failed["error"]
        .as_str()
        .unwrap()
        .starts_with("Classification failed"));

    let message = json!({ "id": "2", "text": "I love it", "candidate_labels": ["happy", "sad"] });
    send(&mut queue, &message.to_string()).await;
    worker.process_next().await.unwrap();
    let ok = reply(&mut queue).await;
    assert_eq!(ok["id"], "2");
    assert_eq!(ok["label"], "happy");
    assert_eq!(counters.loads(), 2);
}

#[tokio::test]
async fn test_requests_pop_from_head() {
    let (mut worker, mut queue, _) = worker();
    for id in ["older", "newer"] {
        let message = json!({ "id": id, "text": "good", "candidate_labels": ["happy", "sad"] });
        send(&mut queue, &message.to_string()).await;
    }

    worker.process_next().await.unwrap();
    assert_eq!(reply(&mut queue).await["id"], "newer");
    worker.process_next().await.unwrap();
    assert_eq!(reply(&mut queue).await["id"], "older");
}

#[tokio::test]
async fn test_inference_failure_is_reported_per_message() {
    let (mut worker, mut queue, counters) = worker_with(KeywordLoader::sentiment().failing_inference());
    let message = json!({ "id": "boom", "text": "hello", "candidate_labels": ["happy", "sad"] });
    send(&mut queue, &message.to_string()).await;

    worker.process_next().await.unwrap();

    let body = reply(&mut queue).await;
    assert_eq!(body["id"], "boom");
    assert!(body["error"].as_str().unwrap().contains("stub inference failed"));
    assert_eq!(counters.inferences(), 1);
}

#[tokio::test]
async fn test_run_loop_answers_every_message() {
    let (worker, mut queue, _) = worker();
    let handle = tokio::spawn(worker.run());

    let first = json!({ "id": "a", "text": "great", "candidate_labels": ["happy", "sad"] });
    let last = json!({ "id": "c", "text": "bad", "candidate_labels": ["happy", "sad"] });
    send(&mut queue, &first.to_string()).await;
    send(&mut queue, "{broken").await;
    send(&mut queue, &last.to_string()).await;

    let mut replies = Vec::new();
    for _ in 0..3 {
        replies.push(reply(&mut queue).await);
    }
    handle.abort();

    let ids: Vec<Option<&str>> = replies.iter().map(|r| r["id"].as_str()).collect();
    assert!(ids.contains(&Some("a")));
    assert!(ids.contains(&Some("c")));
    assert!(ids.contains(&None));
    assert!(queue.is_empty(REQUESTS));
}

/// Memory queue whose next pops or pushes fail like a dropped Redis link.
#[derive(Clone, Default)]
struct FlakyQueue {
    inner: MemoryQueue,
    pop_failures: Arc<AtomicUsize>,
    push_failures: Arc<AtomicUsize>,
}

impl FlakyQueue {
    fn fail_pops(&self, count: usize) {
        self.pop_failures.store(count, Ordering::SeqCst);
    }

    fn fail_pushes(&self, count: usize) {
        self.push_failures.store(count, Ordering::SeqCst);
    }
}

fn take_failure(counter: &AtomicUsize) -> Result<(), QueueError> {
    let failing = counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        let dropped = redis::RedisError::from((redis::ErrorKind::IoError, "connection dropped"));
        return Err(QueueError::Redis(dropped));
    }
    Ok(())
}

#[async_trait]
impl MessageQueue for FlakyQueue {
    async fn pop(&mut self, channel: &str) -> Result<Vec<u8>, QueueError> {
        take_failure(&self.pop_failures)?;
        self.inner.pop(channel).await
    }

    async fn push(&mut self, channel: &str, payload: &str) -> Result<(), QueueError> {
        take_failure(&self.push_failures)?;
        self.inner.push(channel, payload).await
    }
}

fn flaky_worker() -> (Worker<FlakyQueue>, FlakyQueue, MemoryQueue) {
    let classifier: Arc<dyn Classifier> =
        Arc::new(ClassifierGateway::new(KeywordLoader::sentiment()));
    let queue = FlakyQueue::default();
    let memory = queue.inner.clone();
    (
        Worker::new(queue.clone(), classifier, REQUESTS, RESPONSES),
        queue,
        memory,
    )
}

#[tokio::test]
async fn test_run_loop_recovers_after_broker_errors() {
    let (worker, flaky, mut queue) = flaky_worker();
    flaky.fail_pops(2);
    let handle = tokio::spawn(worker.run());

    let message = json!({ "id": "after-outage", "text": "good", "candidate_labels": ["happy", "sad"] });
    send(&mut queue, &message.to_string()).await;

    let raw = tokio::time::timeout(Duration::from_secs(10), queue.pop(RESPONSES))
        .await
        .expect("worker did not recover")
        .unwrap();
    handle.abort();

    let body: Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(body["id"], "after-outage");
    assert_eq!(body["label"], "happy");
}

#[tokio::test]
async fn test_failed_push_is_retried_once() {
    let (mut worker, flaky, mut queue) = flaky_worker();
    flaky.fail_pushes(1);

    let message = json!({ "id": "retry-me", "text": "great", "candidate_labels": ["happy", "sad"] });
    send(&mut queue, &message.to_string()).await;
    worker.process_next().await.unwrap();

    assert_eq!(reply(&mut queue).await["id"], "retry-me");
}

#[tokio::test]
async fn test_reply_dropped_after_second_push_failure() {
    let (mut worker, flaky, mut queue) = flaky_worker();
    flaky.fail_pushes(2);

    let message = json!({ "id": "lost", "text": "great", "candidate_labels": ["happy", "sad"] });
    send(&mut queue, &message.to_string()).await;

    let err = worker.process_next().await.unwrap_err();
    assert!(matches!(err, QueueError::Redis(_)));
    assert!(queue.is_empty(RESPONSES));
}
