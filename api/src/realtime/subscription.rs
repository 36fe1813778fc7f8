//! Subscriptions: table + filter + event mask, dispatching to a handler

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use super::event::{ChangeEvent, EventKind, EventMask};
use super::filter::RowFilter;
use crate::error::FilterError;

/// Connection state of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Connecting,
    Connected,
    Closed,
    /// Events were missed; the subscription keeps running
    Error,
}

/// Callbacks invoked for delivered events. Exactly one runs per event.
#[async_trait]
pub trait ChangeHandler: Send + Sync {
    async fn on_insert(&self, _event: &ChangeEvent) {}

    async fn on_update(&self, _event: &ChangeEvent) {}

    async fn on_delete(&self, _event: &ChangeEvent) {}
}

/// Builder returned by `ChangeFeed::channel`
pub struct ChannelBuilder {
    rx: broadcast::Receiver<Arc<ChangeEvent>>,
    name: String,
    table: Option<String>,
    filter: Option<RowFilter>,
    mask: EventMask,
}

impl ChannelBuilder {
    pub(super) fn new(rx: broadcast::Receiver<Arc<ChangeEvent>>, name: String) -> Self {
        Self {
            rx,
            name,
            table: None,
            filter: None,
            mask: EventMask::All,
        }
    }

    /// Only events for this table. Without it every table is delivered.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Only rows matching `column=op.value`
    pub fn filter(mut self, filter: &str) -> Result<Self, FilterError> {
        self.filter = Some(RowFilter::parse(filter)?);
        Ok(self)
    }

    pub fn events(mut self, mask: EventMask) -> Self {
        self.mask = mask;
        self
    }

    /// Start delivering events to `handler`
    pub fn subscribe<H>(self, handler: Arc<H>) -> Subscription
    where
        H: ChangeHandler + 'static,
    {
        let (status_tx, status_rx) = watch::channel(ChannelStatus::Connecting);
        let status_tx = Arc::new(status_tx);

        let selector = Selector {
            table: self.table,
            filter: self.filter,
            mask: self.mask,
        };

        let task = tokio::spawn(run(
            self.rx,
            selector,
            handler,
            status_tx.clone(),
            self.name.clone(),
        ));

        Subscription {
            name: self.name,
            status_tx,
            status_rx,
            task,
        }
    }
}

struct Selector {
    table: Option<String>,
    filter: Option<RowFilter>,
    mask: EventMask,
}

impl Selector {
    fn accepts(&self, event: &ChangeEvent) -> bool {
        if let Some(table) = &self.table {
            if table != &event.table {
                return false;
            }
        }
        if !self.mask.matches(event.kind) {
            return false;
        }
        match &self.filter {
            Some(filter) => filter.matches(event.filter_target()),
            None => true,
        }
    }
}

async fn run<H>(
    mut rx: broadcast::Receiver<Arc<ChangeEvent>>,
    selector: Selector,
    handler: Arc<H>,
    status: Arc<watch::Sender<ChannelStatus>>,
    name: String,
) where
    H: ChangeHandler + 'static,
{
    status.send_replace(ChannelStatus::Connected);
    tracing::debug!(channel = %name, "Realtime channel connected");

    loop {
        match rx.recv().await {
            Ok(event) => {
                if selector.accepts(&event) {
                    match event.kind {
                        EventKind::Insert => handler.on_insert(&event).await,
                        EventKind::Update => handler.on_update(&event).await,
                        EventKind::Delete => handler.on_delete(&event).await,
                    }
                }
                mark_connected(&status);
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(channel = %name, missed, "Realtime channel lagged, events skipped");
                status.send_replace(ChannelStatus::Error);
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::debug!(channel = %name, "Realtime feed closed");
                status.send_replace(ChannelStatus::Closed);
                break;
            }
        }
    }
}

fn mark_connected(status: &watch::Sender<ChannelStatus>) {
    status.send_if_modified(|s| {
        if *s != ChannelStatus::Connected {
            *s = ChannelStatus::Connected;
            true
        } else {
            false
        }
    });
}

/// A live subscription. Dropping it stops delivery.
pub struct Subscription {
    name: String,
    status_tx: Arc<watch::Sender<ChannelStatus>>,
    status_rx: watch::Receiver<ChannelStatus>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ChannelStatus {
        *self.status_rx.borrow()
    }

    /// Observe status changes
    pub fn status_watch(&self) -> watch::Receiver<ChannelStatus> {
        self.status_rx.clone()
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
        self.status_tx.send_replace(ChannelStatus::Closed);
        tracing::debug!(channel = %self.name, "Realtime channel unsubscribed");
    }
}
