//! One scheduled tick: pick a message, number it, hand it to the display side.
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

use crate::clock::Clock;
use crate::config::NotifierConfig;
use crate::engine::{MessageSource, RotationEngine, TickError};
use crate::store::PersistedStore;

/// A notification ready for the host to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub channel_id: String,
    pub title: String,
    pub body: String,
    pub source: MessageSource,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("notification display unavailable: {0}")]
    Unavailable(String),
}

/// Host collaborator that actually shows notifications.
pub trait NotificationSink {
    /// Display `notification`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host could not display it.
    fn deliver(&self, notification: &Notification) -> Result<(), SinkError>;
}

/// Sink that only logs, for headless hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, notification: &Notification) -> Result<(), SinkError> {
        log::info!(
            "[{}#{}] {}: {}",
            notification.channel_id,
            notification.id,
            notification.title,
            notification.body
        );
        Ok(())
    }
}

/// Sink that keeps every delivered notification in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    delivered: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, notification: &Notification) -> Result<(), SinkError> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
        Ok(())
    }
}

/// Outcome reported back to the host scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkResult {
    Success,
    /// Run this tick again later.
    Retry,
}

#[derive(Debug, Error)]
enum WorkError {
    #[error(transparent)]
    Tick(#[from] TickError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// The hourly reminder worker.
pub struct HourlyWorker<S, C, K>
where
    S: PersistedStore,
    C: Clock,
    K: NotificationSink,
{
    engine: Arc<RotationEngine<S>>,
    clock: C,
    sink: K,
    channel_id: String,
    title: String,
}

impl<S, C, K> HourlyWorker<S, C, K>
where
    S: PersistedStore,
    C: Clock,
    K: NotificationSink,
{
    #[must_use]
    pub fn new(
        engine: Arc<RotationEngine<S>>,
        clock: C,
        sink: K,
        config: &NotifierConfig,
    ) -> Self {
        Self {
            engine,
            clock,
            sink,
            channel_id: config.channel_id.clone(),
            title: config.title.clone(),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &RotationEngine<S> {
        &self.engine
    }

    #[must_use]
    pub const fn sink(&self) -> &K {
        &self.sink
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Run one tick. Any failure asks the scheduler to retry.
    pub fn do_work(&self) -> WorkResult {
        match self.try_work() {
            Ok(notification) => {
                log::debug!("delivered notification #{}", notification.id);
                WorkResult::Success
            }
            Err(err) => {
                log::warn!("hourly reminder failed, will retry: {err}");
                WorkResult::Retry
            }
        }
    }

    fn try_work(&self) -> Result<Notification, WorkError> {
        let (picked, id) = self.engine.next_notification_with_clock(&self.clock)?;
        let notification = Notification {
            id,
            channel_id: self.channel_id.clone(),
            title: self.title.clone(),
            body: picked.body,
            source: picked.source,
        };
        self.sink.deliver(&notification)?;
        Ok(notification)
    }
}
