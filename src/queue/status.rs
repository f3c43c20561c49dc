//! # Queue Status Aggregator
//!
//! Serves the coalesced [`QueueStatus`] on request and pushes it to
//! clients after queue changes. Change notifications arrive far more often
//! than clients need updates, so broadcasts go through a [`Debouncer`].

use async_trait::async_trait;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::models::{PendingRelease, QueueItem, QueueStatus};
use crate::config::QueueStatusConfig;
use crate::constants::events;
use crate::error::{HealthError, HealthResult};
use crate::events::DomainEvent;
use crate::utils::Debouncer;

#[async_trait]
pub trait QueueProvider: Send + Sync {
    async fn queue(&self) -> HealthResult<Vec<QueueItem>>;
}

#[async_trait]
pub trait PendingReleaseProvider: Send + Sync {
    async fn pending_queue(&self) -> HealthResult<Vec<PendingRelease>>;
}

/// Push transport towards connected clients
#[async_trait]
pub trait StatusBroadcaster: Send + Sync {
    async fn broadcast_queue_status(&self, status: &QueueStatus) -> HealthResult<()>;
}

pub struct QueueStatusAggregator {
    queue: Arc<dyn QueueProvider>,
    pending: Arc<dyn PendingReleaseProvider>,
    broadcaster: Arc<dyn StatusBroadcaster>,
    debouncer: Debouncer,
}

impl std::fmt::Debug for QueueStatusAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueStatusAggregator")
            .field("debouncer", &self.debouncer)
            .finish()
    }
}

impl QueueStatusAggregator {
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new(
        queue: Arc<dyn QueueProvider>,
        pending: Arc<dyn PendingReleaseProvider>,
        broadcaster: Arc<dyn StatusBroadcaster>,
        broadcast_window: Duration,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let debouncer = Debouncer::new("queue_status_broadcast", broadcast_window, move || {
                let weak = weak.clone();
                async move {
                    match weak.upgrade() {
                        Some(aggregator) => aggregator.broadcast_change().await,
                        None => Ok(()),
                    }
                }
            });

            Self {
                queue,
                pending,
                broadcaster,
                debouncer,
            }
        })
    }

    /// Aggregator broadcasting at most once per configured window
    pub fn from_config(
        queue: Arc<dyn QueueProvider>,
        pending: Arc<dyn PendingReleaseProvider>,
        broadcaster: Arc<dyn StatusBroadcaster>,
        config: &QueueStatusConfig,
    ) -> Arc<Self> {
        Self::new(queue, pending, broadcaster, config.broadcast_debounce())
    }

    /// Current status; holds back pending broadcasts while computing
    pub async fn get_queue_status(&self) -> HealthResult<QueueStatus> {
        let _paused = self.debouncer.pause_guard();

        let queue = self.queue.queue().await?;
        let pending = self.pending.pending_queue().await?;

        Ok(QueueStatus::from_queues(&queue, &pending))
    }

    /// Schedule a broadcast for queue change notifications
    pub fn handle_event(&self, event: &DomainEvent) {
        if event.is(events::QUEUE_UPDATED) || event.is(events::PENDING_RELEASES_UPDATED) {
            debug!(event_name = %event.name, "Queue changed, scheduling status broadcast");
            self.debouncer.execute();
        }
    }

    pub fn spawn_event_listener(
        self: &Arc<Self>,
        mut receiver: broadcast::Receiver<DomainEvent>,
    ) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        let Some(aggregator) = weak.upgrade() else {
                            break;
                        };
                        aggregator.handle_event(&event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            skipped = skipped,
                            "Queue status listener lagged, scheduling broadcast"
                        );
                        if let Some(aggregator) = weak.upgrade() {
                            aggregator.debouncer.execute();
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    async fn broadcast_change(&self) -> anyhow::Result<()> {
        let status = self.get_queue_status().await?;
        self.broadcaster
            .broadcast_queue_status(&status)
            .await
            .map_err(|e| match e {
                HealthError::BroadcastError(_) => e,
                other => HealthError::BroadcastError(other.to_string()),
            })?;
        debug!(
            total = status.total_count,
            unknown = status.unknown_count,
            "Queue status broadcast"
        );
        Ok(())
    }
}
