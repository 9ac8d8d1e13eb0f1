//! Company 变更事件
//!
//! 变更成功后构造 MutationEvent 放入有界队列，由独立的投递任务发送到
//! EventSink。投递失败只记录日志，不回滚、不重试，也不影响 HTTP 响应。

pub mod rabbitmq;

pub use rabbitmq::RabbitMqEventSink;

use crate::models::Company;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Created,
    Updated,
    Deleted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Created => "created",
            EventType::Updated => "updated",
            EventType::Deleted => "deleted",
        }
    }

    /// 消息路由键：company.<event_type>
    pub fn routing_key(&self) -> String {
        format!("company.{}", self.as_str())
    }
}

/// 事件负载：创建/更新携带完整记录，删除只携带 id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    Company(Company),
    Deleted { id: Uuid },
}

/// 变更事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationEvent {
    pub event_type: EventType,
    pub payload: EventPayload,
}

impl MutationEvent {
    pub fn created(company: Company) -> Self {
        Self {
            event_type: EventType::Created,
            payload: EventPayload::Company(company),
        }
    }

    pub fn updated(company: Company) -> Self {
        Self {
            event_type: EventType::Updated,
            payload: EventPayload::Company(company),
        }
    }

    pub fn deleted(id: Uuid) -> Self {
        Self {
            event_type: EventType::Deleted,
            payload: EventPayload::Deleted { id },
        }
    }

    /// 受影响的记录 id
    pub fn company_id(&self) -> Uuid {
        match &self.payload {
            EventPayload::Company(company) => company.id,
            EventPayload::Deleted { id } => *id,
        }
    }

    /// JSON 序列化：{"event_type": "...", "payload": {...}}
    pub fn to_json(&self) -> Result<Vec<u8>, EventError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// 事件投递错误
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<lapin::Error> for EventError {
    fn from(e: lapin::Error) -> Self {
        EventError::Transport(e.to_string())
    }
}

/// 事件接收端（消息中间件等）
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, event: &MutationEvent) -> Result<(), EventError>;
}

/// 变更流水线使用的发布接口：同步、不返回错误
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: MutationEvent);
}

/// 有界队列 + 后台投递任务
#[derive(Clone)]
pub struct EventDispatcher {
    sender: mpsc::Sender<MutationEvent>,
}

impl EventDispatcher {
    /// 启动投递任务
    ///
    /// 所有 EventDispatcher 句柄被 drop 后，任务发送完队列中剩余事件再退出。
    pub fn start(sink: Arc<dyn EventSink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<MutationEvent>(capacity);

        let handle = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                match sink.send(&event).await {
                    Ok(()) => {
                        metrics::counter!("company_events_published_total").increment(1);
                        tracing::debug!(
                            event_type = event.event_type.as_str(),
                            company_id = %event.company_id(),
                            "Mutation event published"
                        );
                    }
                    Err(e) => {
                        metrics::counter!("company_events_failed_total").increment(1);
                        tracing::warn!(
                            event_type = event.event_type.as_str(),
                            company_id = %event.company_id(),
                            error = %e,
                            "Failed to publish mutation event, dropping it"
                        );
                    }
                }
            }
            tracing::info!("Event dispatcher stopped");
        });

        (Self { sender }, handle)
    }
}

impl EventPublisher for EventDispatcher {
    fn publish(&self, event: MutationEvent) {
        if let Err(e) = self.sender.try_send(event) {
            let (reason, event) = match e {
                mpsc::error::TrySendError::Full(event) => ("queue full", event),
                mpsc::error::TrySendError::Closed(event) => ("dispatcher stopped", event),
            };
            metrics::counter!("company_events_dropped_total").increment(1);
            tracing::warn!(
                event_type = event.event_type.as_str(),
                company_id = %event.company_id(),
                reason,
                "Mutation event dropped"
            );
        }
    }
}

/// 只写日志的接收端，在关闭消息投递时使用
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

#[async_trait]
impl EventSink for LogEventSink {
    async fn send(&self, event: &MutationEvent) -> Result<(), EventError> {
        let body = event.to_json()?;
        tracing::info!(
            routing_key = %event.event_type.routing_key(),
            body = %String::from_utf8_lossy(&body),
            "Mutation event"
        );
        Ok(())
    }
}

/// 内存接收端，记录收到的事件，可切换为失败模式
#[derive(Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<MutationEvent>>,
    failing: AtomicBool,
    attempts: AtomicUsize,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为 true 时 send 返回传输错误且不记录事件
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn events(&self) -> Vec<MutationEvent> {
        self.events.lock().await.clone()
    }

    /// send 被调用的次数（包括失败的调用）
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// 等待至少 count 个事件到达，超时后返回当前已有的事件
    pub async fn wait_for_events(&self, count: usize, timeout: Duration) -> Vec<MutationEvent> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let events = self.events().await;
            if events.len() >= count || tokio::time::Instant::now() >= deadline {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// 等待至少 count 次投递尝试，超时后返回当前次数
    pub async fn wait_for_attempts(&self, count: usize, timeout: Duration) -> usize {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let attempts = self.attempts();
            if attempts >= count || tokio::time::Instant::now() >= deadline {
                return attempts;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl EventSink for MemoryEventSink {
    async fn send(&self, event: &MutationEvent) -> Result<(), EventError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(EventError::Transport("sink unavailable".to_string()));
        }
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::{Notify, Semaphore};

    /// Sink that parks every send until permits are released
    struct GatedSink {
        entered: Notify,
        gate: Semaphore,
        delivered: Mutex<Vec<MutationEvent>>,
    }

    impl GatedSink {
        fn new() -> Self {
            Self {
                entered: Notify::new(),
                gate: Semaphore::new(0),
                delivered: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EventSink for GatedSink {
        async fn send(&self, event: &MutationEvent) -> Result<(), EventError> {
            self.entered.notify_one();
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| EventError::Transport(e.to_string()))?;
            permit.forget();
            self.delivered.lock().await.push(event.clone());
            Ok(())
        }
    }

    fn company() -> Company {
        Company {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            description: Some("Anvils".to_string()),
            amount_of_employees: 10,
            registered: true,
            company_type: "LLC".to_string(),
        }
    }

    #[test]
    fn test_event_wire_format() {
        let c = company();
        let value: serde_json::Value =
            serde_json::from_slice(&MutationEvent::created(c.clone()).to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "event_type": "created",
                "payload": {
                    "id": c.id,
                    "name": "Acme",
                    "description": "Anvils",
                    "amount_of_employees": 10,
                    "registered": true,
                    "type": "LLC"
                }
            })
        );

        let value: serde_json::Value =
            serde_json::from_slice(&MutationEvent::deleted(c.id).to_json().unwrap()).unwrap();
        assert_eq!(value, json!({ "event_type": "deleted", "payload": { "id": c.id } }));
    }

    #[test]
    fn test_routing_keys() {
        assert_eq!(EventType::Created.routing_key(), "company.created");
        assert_eq!(EventType::Updated.routing_key(), "company.updated");
        assert_eq!(EventType::Deleted.routing_key(), "company.deleted");
    }

    #[tokio::test]
    async fn test_dispatcher_delivers_in_order_and_drains_on_drop() {
        let sink = Arc::new(MemoryEventSink::new());
        let (dispatcher, handle) = EventDispatcher::start(sink.clone(), 8);

        let c = company();
        dispatcher.publish(MutationEvent::created(c.clone()));
        dispatcher.publish(MutationEvent::updated(c.clone()));
        dispatcher.publish(MutationEvent::deleted(c.id));

        drop(dispatcher);
        handle.await.unwrap();

        let types: Vec<_> = sink.events().await.iter().map(|e| e.event_type).collect();
        assert_eq!(types, vec![EventType::Created, EventType::Updated, EventType::Deleted]);
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        let sink = Arc::new(MemoryEventSink::new());
        sink.set_failing(true);
        let (dispatcher, handle) = EventDispatcher::start(sink.clone(), 8);

        dispatcher.publish(MutationEvent::deleted(Uuid::new_v4()));
        dispatcher.publish(MutationEvent::deleted(Uuid::new_v4()));
        drop(dispatcher);

        // The drain task survives the failures and exits cleanly
        handle.await.unwrap();
        assert_eq!(sink.attempts(), 2);
        assert!(sink.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        const CAPACITY: usize = 4;
        let sink = Arc::new(GatedSink::new());
        let (dispatcher, handle) = EventDispatcher::start(sink.clone(), CAPACITY);

        // Park the drain task inside send so the queue stops draining
        let first = Uuid::new_v4();
        dispatcher.publish(MutationEvent::deleted(first));
        tokio::time::timeout(Duration::from_secs(5), sink.entered.notified())
            .await
            .unwrap();

        let queued: Vec<Uuid> = (0..CAPACITY).map(|_| Uuid::new_v4()).collect();
        for id in &queued {
            dispatcher.publish(MutationEvent::deleted(*id));
        }

        // Queue is full; this returns immediately and the event is lost
        let overflow = Uuid::new_v4();
        let started = std::time::Instant::now();
        dispatcher.publish(MutationEvent::deleted(overflow));
        assert!(started.elapsed() < Duration::from_millis(100));

        sink.gate.add_permits(CAPACITY + 1);
        drop(dispatcher);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        let delivered: Vec<Uuid> = sink
            .delivered
            .lock()
            .await
            .iter()
            .map(|e| e.company_id())
            .collect();
        let mut expected = vec![first];
        expected.extend(queued);
        assert_eq!(delivered, expected);
        assert!(!delivered.contains(&overflow));
    }

    #[tokio::test]
    async fn test_memory_sink_counts_failed_attempts() {
        let sink = MemoryEventSink::new();
        sink.set_failing(true);

        assert!(sink.send(&MutationEvent::deleted(Uuid::new_v4())).await.is_err());
        assert_eq!(sink.attempts(), 1);
        assert!(sink.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_publish_after_dispatcher_stopped_does_not_panic() {
        let sink = Arc::new(MemoryEventSink::new());
        let (dispatcher, handle) = EventDispatcher::start(sink.clone(), 1);
        handle.abort();
        let _ = handle.await;

        dispatcher.publish(MutationEvent::deleted(Uuid::new_v4()));
        dispatcher.publish(MutationEvent::deleted(Uuid::new_v4()));
        assert!(sink.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_log_sink_accepts_events() {
        let sink = LogEventSink;
        assert!(sink.send(&MutationEvent::created(company())).await.is_ok());
    }
}
