//! In-process change feed
//!
//! Repositories publish committed row changes here; subscriptions fan them
//! out to handlers. Backed by a `tokio::sync::broadcast` channel, so a slow
//! subscriber lags and skips events instead of blocking publishers.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use super::event::{ChangeEvent, EventKind};
use super::subscription::ChannelBuilder;

#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<Arc<ChangeEvent>>,
}

impl ChangeFeed {
    /// `capacity` is how many events a subscriber may fall behind before lagging
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event, returning how many subscribers received it
    pub fn publish(&self, event: ChangeEvent) -> usize {
        tracing::trace!(table = %event.table, kind = %event.kind, "Publishing change");
        // An error only means nobody is listening
        self.tx.send(Arc::new(event)).unwrap_or(0)
    }

    pub fn publish_insert<T: Serialize>(&self, table: &str, row: &T) {
        if let Some(record) = to_json(table, row) {
            self.publish(ChangeEvent {
                table: table.to_string(),
                kind: EventKind::Insert,
                record,
                old_record: None,
                committed_at: Utc::now(),
            });
        }
    }

    pub fn publish_update<T: Serialize>(&self, table: &str, old: &T, new: &T) {
        if let (Some(old_record), Some(record)) = (to_json(table, old), to_json(table, new)) {
            self.publish(ChangeEvent {
                table: table.to_string(),
                kind: EventKind::Update,
                record,
                old_record: Some(old_record),
                committed_at: Utc::now(),
            });
        }
    }

    pub fn publish_delete<T: Serialize>(&self, table: &str, old: &T) {
        if let Some(old_record) = to_json(table, old) {
            self.publish(ChangeEvent {
                table: table.to_string(),
                kind: EventKind::Delete,
                record: Value::Null,
                old_record: Some(old_record),
                committed_at: Utc::now(),
            });
        }
    }

    /// Start configuring a named subscription channel
    pub fn channel(&self, name: impl Into<String>) -> ChannelBuilder {
        ChannelBuilder::new(self.tx.subscribe(), name.into())
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

fn to_json<T: Serialize>(table: &str, row: &T) -> Option<Value> {
    match serde_json::to_value(row) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(table = %table, error = %e, "Failed to serialize change event row");
            None
        }
    }
}
