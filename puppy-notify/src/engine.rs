//! The message rotation engine: one call per scheduled tick.
//!
//! Each tick runs read → decide → write under a single lock, and the write
//! is one `put_all`. A tick that cannot record its outcome returns an error
//! instead of a message.
use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::catalog::MessageCatalog;
use crate::clock::{Clock, iso_date};
use crate::config::NotifierConfig;
use crate::constants::{FIRST_NOTIFICATION_ID, KEY_NOTIFICATION_ID};
use crate::festival::{FestivalSentLog, check_festival};
use crate::rotation::{RotationState, advance};
use crate::store::{PersistedStore, StoreValue};

/// Errors surfaced by a tick.
#[derive(Debug, Error)]
pub enum TickError {
    /// The store could not be read or written. Retry later.
    #[error("persisted store unavailable: {source}")]
    StoreUnavailable {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl TickError {
    fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::StoreUnavailable {
            source: Box::new(err),
        }
    }

    /// Whether the host should schedule another attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}

/// Where a picked message came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageSource {
    Festival { key: String },
    Rotation { index: usize, reshuffled: bool },
    /// Empty pool; nothing was persisted.
    Fallback,
}

/// Message chosen for one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickedMessage {
    pub body: String,
    pub source: MessageSource,
}

impl PickedMessage {
    #[must_use]
    pub const fn is_festive(&self) -> bool {
        matches!(self.source, MessageSource::Festival { .. })
    }

    #[must_use]
    pub const fn rotation_index(&self) -> Option<usize> {
        match self.source {
            MessageSource::Rotation { index, .. } => Some(index),
            _ => None,
        }
    }
}

/// Persisted engine state, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub rotation: RotationState,
    pub festival_log: FestivalSentLog,
    pub next_notification_id: i64,
}

struct EngineInner<S> {
    store: S,
    rng: ChaCha20Rng,
}

/// Message rotation engine bound to a catalog and a persisted store.
pub struct RotationEngine<S>
where
    S: PersistedStore,
{
    catalog: Arc<MessageCatalog>,
    inner: Mutex<EngineInner<S>>,
    first_notification_id: i64,
}

impl<S> RotationEngine<S>
where
    S: PersistedStore,
{
    /// Create an engine whose shuffles draw from OS entropy.
    #[must_use]
    pub fn new(catalog: Arc<MessageCatalog>, store: S) -> Self {
        Self::with_rng(catalog, store, ChaCha20Rng::from_entropy())
    }

    /// Create an engine with a deterministic shuffle sequence.
    #[must_use]
    pub fn with_seed(catalog: Arc<MessageCatalog>, store: S, seed: u64) -> Self {
        Self::with_rng(catalog, store, ChaCha20Rng::seed_from_u64(seed))
    }

    /// Create an engine using the host configuration's notification id base.
    #[must_use]
    pub fn from_config(catalog: Arc<MessageCatalog>, store: S, config: &NotifierConfig) -> Self {
        Self::new(catalog, store).with_first_notification_id(config.first_notification_id)
    }

    fn with_rng(catalog: Arc<MessageCatalog>, store: S, rng: ChaCha20Rng) -> Self {
        Self {
            catalog,
            inner: Mutex::new(EngineInner { store, rng }),
            first_notification_id: FIRST_NOTIFICATION_ID,
        }
    }

    /// Override the first id handed out by [`Self::allocate_notification_id`].
    #[must_use]
    pub fn with_first_notification_id(mut self, id: i64) -> Self {
        self.first_notification_id = id;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pick the message for a tick on `today`.
    ///
    /// A festival not yet sent today wins and leaves the rotation untouched;
    /// otherwise the rotation advances by one.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::StoreUnavailable`] if state cannot be read or written.
    pub fn pick_next(&self, today: NaiveDate) -> Result<PickedMessage, TickError> {
        let mut guard = self.lock();
        let (picked, entries) = self.decide(&mut guard, &iso_date(today))?;
        if !entries.is_empty() {
            guard.store.put_all(&entries).map_err(TickError::store)?;
        }
        Ok(picked)
    }

    /// Pick the message for `today` and number it, committing both in one write.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::StoreUnavailable`] if state cannot be read or written;
    /// nothing is recorded in that case.
    pub fn next_notification(
        &self,
        today: NaiveDate,
    ) -> Result<(PickedMessage, i64), TickError> {
        let mut guard = self.lock();
        let (picked, mut entries) = self.decide(&mut guard, &iso_date(today))?;
        let id = self.peek_notification_id(&guard.store)?;
        entries.push((
            KEY_NOTIFICATION_ID.to_string(),
            StoreValue::Int(id.wrapping_add(1)),
        ));
        guard.store.put_all(&entries).map_err(TickError::store)?;
        Ok((picked, id))
    }

    fn peek_notification_id(&self, store: &S) -> Result<i64, TickError> {
        Ok(store
            .get_int(KEY_NOTIFICATION_ID)
            .map_err(TickError::store)?
            .unwrap_or(self.first_notification_id))
    }

    /// Choose the tick's message and the entries that record it, without writing.
    fn decide(
        &self,
        inner: &mut EngineInner<S>,
        today: &str,
    ) -> Result<(PickedMessage, Vec<(String, StoreValue)>), TickError> {
        let EngineInner { store, rng } = inner;

        if let Some(decision) =
            check_festival(&self.catalog, &*store, today).map_err(TickError::store)?
        {
            if decision.used_fallback {
                log::warn!(
                    "festival `{}` has no messages; sent fallback",
                    decision.festival_key
                );
            }
            log::info!("festive message for `{}` on {today}", decision.festival_key);
            let entries = vec![decision.log_entry()];
            return Ok((
                PickedMessage {
                    body: decision.body,
                    source: MessageSource::Festival {
                        key: decision.festival_key,
                    },
                },
                entries,
            ));
        }

        let state = RotationState::load(&*store).map_err(TickError::store)?;
        let Some(step) = advance(&state, self.catalog.pool_len(), rng) else {
            log::warn!("normal message pool is empty; sending fallback");
            return Ok((
                PickedMessage {
                    body: self.catalog.fallback_message().to_string(),
                    source: MessageSource::Fallback,
                },
                Vec::new(),
            ));
        };

        if step.healed {
            log::warn!("stored rotation order did not match the pool; regenerated");
        }
        if step.reshuffled {
            log::info!(
                "new rotation cycle of {} messages",
                self.catalog.pool_len()
            );
        }

        let body = self
            .catalog
            .normal_message(step.emitted)
            .unwrap_or_else(|| self.catalog.fallback_message())
            .to_string();
        log::debug!(
            "rotation emitted {} (cursor {}/{})",
            step.emitted,
            step.next.index,
            self.catalog.pool_len()
        );
        Ok((
            PickedMessage {
                body,
                source: MessageSource::Rotation {
                    index: step.emitted,
                    reshuffled: step.reshuffled,
                },
            },
            step.next.to_entries(),
        ))
    }

    /// Pick the message for the clock's current date.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::StoreUnavailable`] if state cannot be read or written.
    pub fn pick_with_clock(&self, clock: &dyn Clock) -> Result<PickedMessage, TickError> {
        self.pick_next(clock.today())
    }

    /// [`Self::next_notification`] for the clock's current date.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::StoreUnavailable`] if state cannot be read or written.
    pub fn next_notification_with_clock(
        &self,
        clock: &dyn Clock,
    ) -> Result<(PickedMessage, i64), TickError> {
        self.next_notification(clock.today())
    }

    /// Hand out the next notification id.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::StoreUnavailable`] if the counter cannot be read or written.
    pub fn allocate_notification_id(&self) -> Result<i64, TickError> {
        let mut guard = self.lock();
        let id = self.peek_notification_id(&guard.store)?;
        guard
            .store
            .put_all(&[(
                KEY_NOTIFICATION_ID.to_string(),
                StoreValue::Int(id.wrapping_add(1)),
            )])
            .map_err(TickError::store)?;
        Ok(id)
    }

    /// Read the persisted state without changing it.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::StoreUnavailable`] if the store cannot be read.
    pub fn snapshot(&self) -> Result<EngineSnapshot, TickError> {
        let guard = self.lock();
        let rotation = RotationState::load(&guard.store).map_err(TickError::store)?;
        let festival_log =
            FestivalSentLog::load(&guard.store, &self.catalog).map_err(TickError::store)?;
        let next_notification_id = self.peek_notification_id(&guard.store)?;
        Ok(EngineSnapshot {
            rotation,
            festival_log,
            next_notification_id,
        })
    }

    /// Consume the engine, returning the store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .store
    }
}
