//! Best-effort objection event dispatch.
//!
//! Handlers enqueue with [`EventDispatcher::dispatch`], which never waits
//! and never fails. One detached worker drains the queue into an
//! [`ObjectionEventSink`]. A full queue drops the event. Sink errors and
//! sink timeouts are logged and counted, nothing more.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use parley_core::{
    Confidence, MarketData, ObjectionCategory, ObjectionResponse, ObjectionType, ResponseGraduation,
};

use crate::config::EventsConfig;

/// Errors a sink may report. Always swallowed by the dispatcher.
#[derive(Error, Debug, Clone)]
pub enum SinkError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    #[error("sink rejected event: {0}")]
    Rejected(String),
}

/// One handled objection, as recorded for metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectionEvent {
    pub contact_id: String,
    pub objection_type: ObjectionType,
    pub category: ObjectionCategory,
    pub confidence: Confidence,
    pub graduation_level: ResponseGraduation,
    pub variant: usize,
    pub response_text: String,
    pub market_data: MarketData,
    pub occurred_at: DateTime<Utc>,
}

impl ObjectionEvent {
    pub fn from_response(
        contact_id: &str,
        confidence: Confidence,
        response: &ObjectionResponse,
    ) -> Self {
        Self {
            contact_id: contact_id.to_string(),
            objection_type: response.objection_type,
            category: response.objection_type.category(),
            confidence,
            graduation_level: response.graduation_level,
            variant: response.variant,
            response_text: response.response_text.clone(),
            market_data: response.supporting_data.clone(),
            occurred_at: Utc::now(),
        }
    }
}

/// Destination for objection events (metrics store, analytics queue).
#[async_trait]
pub trait ObjectionEventSink: Send + Sync {
    async fn record(&self, event: &ObjectionEvent) -> Result<(), SinkError>;

    fn name(&self) -> &str;
}

/// In-memory sink for tests and demos.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ObjectionEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObjectionEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

#[async_trait]
impl ObjectionEventSink for MemorySink {
    async fn record(&self, event: &ObjectionEvent) -> Result<(), SinkError> {
        self.events.lock().push(event.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Delivery counters at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    dropped: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Bounded queue plus one worker task feeding a sink.
#[derive(Debug)]
pub struct EventDispatcher {
    tx: mpsc::Sender<ObjectionEvent>,
    counters: Arc<Counters>,
    worker: JoinHandle<()>,
}

impl EventDispatcher {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(sink: Arc<dyn ObjectionEventSink>, config: &EventsConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let counters = Arc::new(Counters::default());
        let worker = tokio::spawn(drain(rx, sink, config.sink_timeout, counters.clone()));

        Self {
            tx,
            counters,
            worker,
        }
    }

    /// Enqueue without waiting. Returns false if the event was dropped.
    pub fn dispatch(&self, event: ObjectionEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                let reason = match e {
                    mpsc::error::TrySendError::Full(_) => "queue full",
                    mpsc::error::TrySendError::Closed(_) => "worker stopped",
                };
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(reason, "Objection event dropped");
                false
            }
        }
    }

    pub fn dropped(&self) -> u64 {
        self.counters.dropped.load(Ordering::Relaxed)
    }

    pub fn delivered(&self) -> u64 {
        self.counters.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    /// Close the queue, wait for queued events to drain, and report totals.
    pub async fn shutdown(self) -> DispatchStats {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            tracing::warn!(error = %e, "Objection event worker ended abnormally");
        }

        DispatchStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }
}

async fn drain(
    mut rx: mpsc::Receiver<ObjectionEvent>,
    sink: Arc<dyn ObjectionEventSink>,
    sink_timeout: Duration,
    counters: Arc<Counters>,
) {
    while let Some(event) = rx.recv().await {
        match tokio::time::timeout(sink_timeout, sink.record(&event)).await {
            Ok(Ok(())) => {
                counters.delivered.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    sink = sink.name(),
                    contact_id = %event.contact_id,
                    error = %e,
                    "Objection event persistence failed"
                );
            }
            Err(_) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    sink = sink.name(),
                    contact_id = %event.contact_id,
                    timeout = ?sink_timeout,
                    "Objection event persistence timed out"
                );
            }
        }
    }
    tracing::debug!(sink = sink.name(), "Objection event worker stopped");
}
